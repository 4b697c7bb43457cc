// src/api/mod.rs
//! Gateway API plumbing
//!
//! Everything between a typed endpoint call and the wire:
//! - Fixed-window rate limiting (global and per-wallet ceilings)
//! - Request signing with correlation ids
//! - Dispatch with bounded exponential-backoff retries
//! - The transport seam for substituting mock gateways in tests

pub mod dispatcher;
pub mod headers;
pub mod rate_limiter;
pub mod transport;

pub use dispatcher::{DispatchSettings, Dispatcher, GatewayRequest, DEFAULT_RETRY_BUDGET};

pub use headers::{
    build_headers, RequestIdSource, UuidRequestIds, HEADER_API_KEY, HEADER_CLIENT_NAME,
    HEADER_CONTENT_TYPE, HEADER_REQUEST_ID,
};

pub use rate_limiter::{FixedWindowLimiter, RateLimitConfig, RateLimiterUsage};

pub use transport::{
    GatewayTransport, HttpMethod, HttpTransport, TransportRequest, TransportResponse,
};
