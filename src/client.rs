//! Public client facade: typed endpoint wrappers over the dispatch pipeline.
//!
//! Construction resolves and validates credentials before anything else; a
//! client that exists holds a complete configuration. Each client owns its
//! rate-limiter state, so independent instances never share windows.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::api::{
    DispatchSettings, Dispatcher, GatewayRequest, GatewayTransport, HttpTransport,
    RateLimiterUsage, RequestIdSource, UuidRequestIds,
};
use crate::config::{ConfigOverrides, GatewayConfig};
use crate::error::Result;

pub struct GatewayClient {
    config: GatewayConfig,
    dispatcher: Dispatcher,
}

impl GatewayClient {
    /// Builds a client with the default pipeline: resolved credentials,
    /// default ceilings and retry policy, reqwest transport, UUID ids.
    ///
    /// Fails with [`crate::GatewayError::Configuration`] when the API key or
    /// client hash id resolve empty, before any network activity.
    pub fn new(overrides: ConfigOverrides) -> Result<Self> {
        Self::with_settings(overrides, DispatchSettings::default())
    }

    /// Same as [`GatewayClient::new`] with credentials taken entirely from
    /// the environment.
    pub fn from_env() -> Result<Self> {
        Self::new(ConfigOverrides::default())
    }

    pub fn with_settings(overrides: ConfigOverrides, settings: DispatchSettings) -> Result<Self> {
        Self::with_transport(
            overrides,
            settings,
            Arc::new(HttpTransport::new()),
            Arc::new(UuidRequestIds),
        )
    }

    /// Full wiring control; tests substitute scripted transports and
    /// deterministic id sources here.
    pub fn with_transport(
        overrides: ConfigOverrides,
        settings: DispatchSettings,
        transport: Arc<dyn GatewayTransport>,
        ids: Arc<dyn RequestIdSource>,
    ) -> Result<Self> {
        let config = GatewayConfig::resolve(overrides)?;
        config.log_summary();
        let dispatcher = Dispatcher::new(config.clone(), settings, transport, ids);
        Ok(Self { config, dispatcher })
    }

    /// Requests an FX quote. Quotes are not bound to a wallet, so only the
    /// global ceiling applies.
    pub async fn create_quote(&self, payload: Value) -> Result<Value> {
        let path = format!("/client/{}/quotes", self.config.client_hash_id());
        self.dispatcher
            .dispatch(&GatewayRequest::post(path).with_body(payload))
            .await
    }

    /// Initiates a transfer out of a wallet. Wallet-scoped: counted against
    /// both the global window and the wallet's own ceiling.
    pub async fn create_transfer(&self, wallet_hash_id: &str, payload: Value) -> Result<Value> {
        let path = self.wallet_path(wallet_hash_id, "transfers");
        self.dispatcher
            .dispatch(
                &GatewayRequest::post(path)
                    .with_body(payload)
                    .with_scope(wallet_hash_id),
            )
            .await
    }

    pub async fn fetch_transfer(&self, wallet_hash_id: &str, transfer_id: &str) -> Result<Value> {
        let path = format!(
            "{}/{}",
            self.wallet_path(wallet_hash_id, "transfers"),
            transfer_id
        );
        self.dispatcher
            .dispatch(&GatewayRequest::get(path).with_scope(wallet_hash_id))
            .await
    }

    pub async fn add_beneficiary(&self, wallet_hash_id: &str, payload: Value) -> Result<Value> {
        let path = self.wallet_path(wallet_hash_id, "beneficiaries");
        self.dispatcher
            .dispatch(
                &GatewayRequest::post(path)
                    .with_body(payload)
                    .with_scope(wallet_hash_id),
            )
            .await
    }

    /// Lists a wallet's beneficiaries. `query` carries optional filters and
    /// pagination, e.g. `&[("page", "2")]`.
    pub async fn list_beneficiaries(
        &self,
        wallet_hash_id: &str,
        query: &[(&str, &str)],
    ) -> Result<Value> {
        let path = self.wallet_path(wallet_hash_id, "beneficiaries");
        let mut request = GatewayRequest::get(path).with_scope(wallet_hash_id);
        for (key, value) in query {
            request = request.with_query(*key, *value);
        }
        self.dispatcher.dispatch(&request).await
    }

    /// Issues a virtual funding account under an existing wallet.
    pub async fn issue_virtual_account(
        &self,
        wallet_hash_id: &str,
        payload: Value,
    ) -> Result<Value> {
        let path = self.wallet_path(wallet_hash_id, "accounts");
        self.dispatcher
            .dispatch(
                &GatewayRequest::post(path)
                    .with_body(payload)
                    .with_scope(wallet_hash_id),
            )
            .await
    }

    /// Escape hatch for endpoints without a typed wrapper. The descriptor
    /// goes through the same admission, signing, and retry pipeline.
    pub async fn send(&self, request: GatewayRequest) -> Result<Value> {
        self.dispatcher.dispatch(&request).await
    }

    /// Like [`GatewayClient::send`], deserializing the response into the
    /// caller's type. Schema choices stay with the caller; this client never
    /// validates gateway payloads itself.
    pub async fn send_as<T: DeserializeOwned>(&self, request: GatewayRequest) -> Result<T> {
        let payload = self.dispatcher.dispatch(&request).await?;
        Ok(serde_json::from_value(payload)?)
    }

    /// Masked client identifier, safe for UI and logs.
    pub fn masked_client_hash_id(&self) -> String {
        self.config.masked_client_hash_id()
    }

    pub fn environment(&self) -> &str {
        self.config.environment()
    }

    /// Point-in-time limiter occupancy, for dashboards and tests.
    pub fn rate_limiter_usage(&self) -> RateLimiterUsage {
        self.dispatcher.limiter().usage()
    }

    /// Drops scope windows whose interval has fully elapsed and returns how
    /// many were removed. Admission semantics are unaffected; this only
    /// bounds memory on long-running processes with many wallets.
    pub fn sweep_rate_windows(&self) -> usize {
        self.dispatcher.limiter().sweep_expired()
    }

    fn wallet_path(&self, wallet_hash_id: &str, resource: &str) -> String {
        format!(
            "/client/{}/wallet/{}/{}",
            self.config.client_hash_id(),
            wallet_hash_id,
            resource
        )
    }
}
