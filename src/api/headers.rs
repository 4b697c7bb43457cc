//! Outbound request signing: the fixed header set every gateway call carries.

use uuid::Uuid;

use crate::config::GatewayConfig;

pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const HEADER_API_KEY: &str = "x-api-key";
pub const HEADER_CLIENT_NAME: &str = "x-client-name";
pub const HEADER_REQUEST_ID: &str = "x-request-id";

/// Source of request-correlation identifiers.
///
/// One method, so tests can substitute a deterministic sequence. Production
/// wiring uses [`UuidRequestIds`].
pub trait RequestIdSource: Send + Sync {
    fn next_id(&self) -> String;
}

/// Version-4 UUIDs, the correlation format the gateway expects.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidRequestIds;

impl RequestIdSource for UuidRequestIds {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Builds the complete header set for one outbound attempt.
///
/// Uses the caller's request id when supplied, otherwise generates one; the
/// `x-request-id` header is never omitted because the gateway and support
/// tooling correlate on it. Headers are rebuilt per attempt, so a generated id is
/// fresh on every retry while a caller-supplied id stays fixed.
pub fn build_headers(
    config: &GatewayConfig,
    request_id: Option<&str>,
    ids: &dyn RequestIdSource,
) -> Vec<(&'static str, String)> {
    let request_id = request_id
        .map(str::to_string)
        .unwrap_or_else(|| ids.next_id());

    vec![
        (HEADER_CONTENT_TYPE, "application/json".to_string()),
        (HEADER_API_KEY, config.api_key().to_string()),
        (HEADER_CLIENT_NAME, config.client_name().to_string()),
        (HEADER_REQUEST_ID, request_id),
    ]
}
