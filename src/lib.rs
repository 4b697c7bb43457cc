pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod masking;

// Re-export the surface most integrations need
pub use client::GatewayClient;
pub use config::{ConfigOverrides, GatewayConfig};
pub use error::{GatewayError, Result};

// Re-export pipeline pieces for callers that wire their own transport or ids
pub use api::{
    DispatchSettings, GatewayRequest, GatewayTransport, HttpMethod, HttpTransport,
    RateLimitConfig, RateLimiterUsage, RequestIdSource, TransportRequest, TransportResponse,
    UuidRequestIds,
};
pub use masking::mask;
