use thiserror::Error;

/// Errors surfaced by the gateway client.
///
/// Callers see exactly one of these per call: a fatal configuration problem
/// caught at construction, a local pre-network rate-limit rejection, a
/// terminal upstream response, a transport failure that survived the retry
/// budget, or a response body that could not be decoded.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// Missing or invalid credentials; raised synchronously at construction
    /// and never retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A local fixed-window ceiling was hit before any network call.
    ///
    /// `scope` is `"global"` for the client-wide window, otherwise the
    /// masked wallet identifier; raw scope keys never appear in error text.
    #[error("rate limit exceeded for {scope}: {ceiling} requests per {window_ms}ms window")]
    RateLimitExceeded {
        scope: String,
        ceiling: u32,
        window_ms: u64,
    },

    /// The gateway answered with a non-success status. The response body is
    /// masked into the logs and never carried here.
    #[error("gateway request failed with status {status} {status_text}")]
    Upstream { status: u16, status_text: String },

    /// Transport-level failure (connect, timeout, interrupted body read).
    #[error("network error: {0}")]
    Network(String),

    /// A 2xx response whose body was not valid JSON.
    #[error("failed to decode gateway response: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Decode(err.to_string())
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        let kind = classify_reqwest_error(&err);
        // Strip the URL from the message; request paths embed wallet ids.
        GatewayError::Network(format!("{}: {}", kind, err.without_url()))
    }
}

/// Coarse failure kind for log readability; the full error text follows it.
fn classify_reqwest_error(err: &reqwest::Error) -> &'static str {
    if err.is_timeout() {
        "timeout"
    } else if err.is_connect() {
        "connect"
    } else if err.is_request() {
        "request"
    } else if err.is_body() || err.is_decode() {
        "body"
    } else {
        "transport"
    }
}

impl GatewayError {
    /// Whether a caller could reasonably try the same call again later.
    ///
    /// Rate-limit rejections clear on the next window and transport failures
    /// are transient by nature. Upstream errors are only worth repeating for
    /// server-side statuses; configuration and decode failures need a fix,
    /// not a retry.
    pub fn is_recoverable(&self) -> bool {
        match self {
            GatewayError::Configuration(_) => false,
            GatewayError::RateLimitExceeded { .. } => true,
            GatewayError::Upstream { status, .. } => *status == 429 || *status >= 500,
            GatewayError::Network(_) => true,
            GatewayError::Decode(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
