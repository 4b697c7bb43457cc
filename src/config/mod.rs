pub mod env;
pub mod settings;

pub use settings::{ConfigOverrides, GatewayConfig};
