use std::fmt;

use log::info;

use crate::config::env::{
    var_non_empty, ENV_API_KEY, ENV_CLIENT_HASH_ID, ENV_CLIENT_NAME, ENV_ENVIRONMENT,
};
use crate::error::{GatewayError, Result};
use crate::masking::mask;

/// The gateway exposes one host for every environment tag; sandbox and
/// production traffic are told apart upstream by the api key, not the URL.
pub const GATEWAY_BASE_URL: &str = "https://gateway.payoutrail.com/api/v1";

pub const DEFAULT_ENVIRONMENT: &str = "sandbox";
pub const DEFAULT_CLIENT_NAME: &str = "payout-gateway-client";

/// Partial configuration supplied by the integrating application.
///
/// Every field is optional; unset or blank fields fall back to the process
/// environment (`PAYOUT_GATEWAY_*`) and then to crate defaults.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_key: Option<String>,
    pub client_hash_id: Option<String>,
    pub client_name: Option<String>,
    pub environment: Option<String>,
}

/// Validated client configuration, immutable after construction.
#[derive(Clone)]
pub struct GatewayConfig {
    api_key: String,
    client_hash_id: String,
    client_name: String,
    environment: String,
}

impl GatewayConfig {
    /// Resolves a complete configuration: explicit overrides win, then the
    /// process environment, then defaults.
    ///
    /// Fails with [`GatewayError::Configuration`] when the api key or the
    /// client hash id resolve empty. This is the only fatal error in the
    /// client and it happens here, before any rate-limiter or network
    /// activity.
    pub fn resolve(overrides: ConfigOverrides) -> Result<Self> {
        let api_key = pick(overrides.api_key, ENV_API_KEY);
        let client_hash_id = pick(overrides.client_hash_id, ENV_CLIENT_HASH_ID);
        let client_name = pick(overrides.client_name, ENV_CLIENT_NAME)
            .unwrap_or_else(|| DEFAULT_CLIENT_NAME.to_string());
        let environment = pick(overrides.environment, ENV_ENVIRONMENT)
            .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());

        let mut missing = Vec::new();
        if api_key.is_none() {
            missing.push(format!("api key ({})", ENV_API_KEY));
        }
        if client_hash_id.is_none() {
            missing.push(format!("client hash id ({})", ENV_CLIENT_HASH_ID));
        }
        if !missing.is_empty() {
            return Err(GatewayError::Configuration(format!(
                "missing required credentials: {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            api_key: api_key.unwrap_or_default(),
            client_hash_id: client_hash_id.unwrap_or_default(),
            client_name,
            environment,
        })
    }

    /// Resolves entirely from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::resolve(ConfigOverrides::default())
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn client_hash_id(&self) -> &str {
        &self.client_hash_id
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Base URL for every outbound call. The environment tag does not select
    /// a host.
    pub fn base_url(&self) -> &'static str {
        GATEWAY_BASE_URL
    }

    /// Masked client identifier, safe to show callers who need to display
    /// which account is in use.
    pub fn masked_client_hash_id(&self) -> String {
        mask(&self.client_hash_id)
    }

    /// Logs the resolved configuration with sensitive fields masked.
    pub fn log_summary(&self) {
        info!(
            "gateway client configured: client {} ({}), environment {}, host {}",
            self.masked_client_hash_id(),
            self.client_name,
            self.environment,
            GATEWAY_BASE_URL
        );
    }
}

// Sensitive fields never reach logs unmasked, including via {:?}.
impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("api_key", &mask(&self.api_key))
            .field("client_hash_id", &mask(&self.client_hash_id))
            .field("client_name", &self.client_name)
            .field("environment", &self.environment)
            .finish()
    }
}

// Explicit beats environment, and a blank override falls through the same as
// an absent one.
fn pick(explicit: Option<String>, env_key: &str) -> Option<String> {
    explicit
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .or_else(|| var_non_empty(env_key))
}
