//! Request dispatch: admission control, signing, and the bounded retry loop.
//!
//! Every attempt, retries included, re-enters the rate limiter before any
//! network activity, so a burst of retries can never bypass local admission
//! control.

use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};
use serde_json::Value;
use tokio::time::sleep;
use url::Url;

use crate::api::headers::{build_headers, RequestIdSource, HEADER_REQUEST_ID};
use crate::api::rate_limiter::{FixedWindowLimiter, RateLimitConfig};
use crate::api::transport::{GatewayTransport, HttpMethod, TransportRequest, TransportResponse};
use crate::config::GatewayConfig;
use crate::error::{GatewayError, Result};
use crate::masking::mask;

pub const DEFAULT_RETRY_BUDGET: u32 = 3;

/// One logical gateway call. The dispatcher regenerates the concrete
/// attempt (URL, headers) from this descriptor on every try, so each
/// attempt's parameters stay explicit and replayable.
#[derive(Debug, Clone)]
pub struct GatewayRequest {
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    /// Wallet identifier for endpoints under a per-wallet ceiling; absent
    /// for calls limited by the global window only.
    pub scope_key: Option<String>,
    /// Caller-supplied correlation id. When absent, every attempt gets a
    /// freshly generated one.
    pub request_id: Option<String>,
    /// Per-call override of the configured retry budget.
    pub retry_budget: Option<u32>,
}

impl GatewayRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            scope_key: None,
            request_id: None,
            retry_budget: None,
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_scope(mut self, scope_key: impl Into<String>) -> Self {
        self.scope_key = Some(scope_key.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_retry_budget(mut self, retries: u32) -> Self {
        self.retry_budget = Some(retries);
        self
    }
}

/// Tunables for the dispatch pipeline.
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub retry_budget: u32,
    pub backoff_base: Duration,
    pub backoff_cap: Duration,
    pub rate_limits: RateLimitConfig,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            retry_budget: DEFAULT_RETRY_BUDGET,
            backoff_base: Duration::from_millis(1000),
            backoff_cap: Duration::from_secs(300),
            rate_limits: RateLimitConfig::default(),
        }
    }
}

impl DispatchSettings {
    /// Delay inserted before the retry that will leave `retries_remaining`
    /// attempts: the base doubles with every retry already spent, up to the
    /// cap.
    pub fn backoff_delay(&self, budget: u32, retries_remaining: u32) -> Duration {
        let spent = budget.saturating_sub(retries_remaining);
        let factor = 2_u128.saturating_pow(spent);
        let delay_ms = self.backoff_base.as_millis().saturating_mul(factor);
        Duration::from_millis(delay_ms.min(self.backoff_cap.as_millis()) as u64)
    }
}

/// Runs gateway calls through admission control, signing, transport, and
/// the retry policy. Owns the limiter: rate state lives and dies with the
/// client instance, never in process-wide statics.
pub struct Dispatcher {
    config: GatewayConfig,
    settings: DispatchSettings,
    limiter: FixedWindowLimiter,
    transport: Arc<dyn GatewayTransport>,
    ids: Arc<dyn RequestIdSource>,
}

impl Dispatcher {
    pub fn new(
        config: GatewayConfig,
        settings: DispatchSettings,
        transport: Arc<dyn GatewayTransport>,
        ids: Arc<dyn RequestIdSource>,
    ) -> Self {
        let limiter = FixedWindowLimiter::new(settings.rate_limits.clone());
        Self {
            config,
            settings,
            limiter,
            transport,
            ids,
        }
    }

    pub fn limiter(&self) -> &FixedWindowLimiter {
        &self.limiter
    }

    /// Executes one logical call to completion.
    ///
    /// Per attempt: rate-limiter admission, then URL and header build, then
    /// the network call. A 429 response or a transport failure is retried
    /// with exponential backoff while budget remains; a limiter rejection
    /// propagates immediately and consumes no retries. Any other non-2xx
    /// status is terminal. Success returns the parsed JSON body as-is.
    pub async fn dispatch(&self, request: &GatewayRequest) -> Result<Value> {
        let budget = request.retry_budget.unwrap_or(self.settings.retry_budget);
        let mut retries_remaining = budget;

        loop {
            self.limiter.admit(request.scope_key.as_deref())?;

            let attempt = self.prepare(request)?;
            let correlation_id = request_id_of(&attempt);
            match self.transport.execute(attempt).await {
                Ok(response) if response.is_success() => {
                    if retries_remaining < budget {
                        info!(
                            "✅ {} request succeeded after {} retries",
                            request.method.as_str(),
                            budget - retries_remaining
                        );
                    }
                    return decode_body(&response);
                }
                Ok(response) if response.is_rate_limited() && retries_remaining > 0 => {
                    let delay = self.settings.backoff_delay(budget, retries_remaining);
                    warn!(
                        "⏳ gateway throttled {} request, retrying in {:?} ({} retries left)",
                        request.method.as_str(),
                        delay,
                        retries_remaining - 1
                    );
                    sleep(delay).await;
                    retries_remaining -= 1;
                }
                Ok(response) => {
                    if response.is_rate_limited() && budget > 0 {
                        error!(
                            "all {} retry attempts failed for {} request",
                            budget,
                            request.method.as_str()
                        );
                    }
                    warn!(
                        "❌ gateway {} request {} failed with status {} {}: {}",
                        request.method.as_str(),
                        correlation_id,
                        response.status,
                        response.status_text,
                        mask(&response.body)
                    );
                    return Err(GatewayError::Upstream {
                        status: response.status,
                        status_text: response.status_text,
                    });
                }
                Err(err @ GatewayError::Network(_)) if retries_remaining > 0 => {
                    let delay = self.settings.backoff_delay(budget, retries_remaining);
                    warn!(
                        "transport failure on {} request: {}, retrying in {:?} ({} retries left)",
                        request.method.as_str(),
                        err,
                        delay,
                        retries_remaining - 1
                    );
                    sleep(delay).await;
                    retries_remaining -= 1;
                }
                Err(err) => {
                    if matches!(err, GatewayError::Network(_)) && budget > 0 {
                        error!(
                            "all {} retry attempts failed for {} request {}: {}",
                            budget,
                            request.method.as_str(),
                            correlation_id,
                            err
                        );
                    }
                    return Err(err);
                }
            }
        }
    }

    fn prepare(&self, request: &GatewayRequest) -> Result<TransportRequest> {
        let url = build_url(self.config.base_url(), request)?;
        let headers = build_headers(
            &self.config,
            request.request_id.as_deref(),
            self.ids.as_ref(),
        );
        Ok(TransportRequest {
            method: request.method,
            url,
            headers,
            body: request.body.clone(),
        })
    }
}

fn request_id_of(attempt: &TransportRequest) -> String {
    attempt
        .headers
        .iter()
        .find(|(name, _)| *name == HEADER_REQUEST_ID)
        .map(|(_, value)| value.clone())
        .unwrap_or_default()
}

fn build_url(base: &str, request: &GatewayRequest) -> Result<Url> {
    let absolute = format!("{}{}", base, request.path);
    // The message stays path-free; wallet ids are embedded in paths.
    let mut url = Url::parse(&absolute)
        .map_err(|e| GatewayError::Configuration(format!("failed to build request URL: {e}")))?;
    if !request.query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in &request.query {
            pairs.append_pair(key, value);
        }
    }
    Ok(url)
}

fn decode_body(response: &TransportResponse) -> Result<Value> {
    // 204s and ack-only endpoints answer with no body at all; that is a
    // successful call carrying null, not a decode failure.
    if response.body.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&response.body)?)
}
