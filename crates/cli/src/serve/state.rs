//! Application state shared across request handlers.

use std::sync::Arc;

use axum::http::header::InvalidHeaderName;
use axum::http::HeaderName;
use lilit_astro::Ephemeris;
use lilit_gateway::{AccessGateway, Clock, GatewayConfig, KeyRegistry};

pub(crate) struct AppState {
    /// Rate limiting, abuse blocking and key checks.
    pub(crate) gateway: AccessGateway,
    /// Header carrying the credential; the same name is used for the query
    /// parameter.
    pub(crate) credential_header: HeaderName,
    pub(crate) ephemeris: Arc<dyn Ephemeris>,
}

impl AppState {
    /// Fails when the configured key name is not a valid header name.
    pub(crate) fn new(
        config: &GatewayConfig,
        keys: KeyRegistry,
        clock: Arc<dyn Clock>,
        ephemeris: Arc<dyn Ephemeris>,
    ) -> Result<Self, InvalidHeaderName> {
        let credential_header = HeaderName::from_bytes(config.key_name.as_bytes())?;
        Ok(Self {
            gateway: AccessGateway::new(config, keys, clock),
            credential_header,
            ephemeris,
        })
    }
}
