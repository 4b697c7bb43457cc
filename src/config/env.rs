//! Process-environment lookup for gateway credentials.

use std::sync::Once;

pub const ENV_API_KEY: &str = "PAYOUT_GATEWAY_API_KEY";
pub const ENV_CLIENT_HASH_ID: &str = "PAYOUT_GATEWAY_CLIENT_HASH_ID";
pub const ENV_CLIENT_NAME: &str = "PAYOUT_GATEWAY_CLIENT_NAME";
pub const ENV_ENVIRONMENT: &str = "PAYOUT_GATEWAY_ENVIRONMENT";

static LOAD_DOTENV: Once = Once::new();

/// Reads an environment variable, treating unset and blank values alike.
pub fn var_non_empty(key: &str) -> Option<String> {
    load_dotenv();
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

// Local development keeps credentials in a .env file; load it once per
// process before the first environment read.
fn load_dotenv() {
    LOAD_DOTENV.call_once(|| {
        dotenv::dotenv().ok();
    });
}
