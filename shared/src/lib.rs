pub mod config;
pub mod errors;
pub mod image_proxy;
pub mod responses;
pub mod target;
pub mod upstream;

use config::ProxyConfig;
use reqwest::Client;
use std::sync::Arc;

/// Shared application state
pub struct AppState {
    pub config: ProxyConfig,
    pub http_client: Client,
}

impl AppState {
    pub fn new(config: ProxyConfig) -> Result<Arc<Self>, reqwest::Error> {
        let http_client = upstream::build_client(&config)?;
        Ok(Arc::new(Self { config, http_client }))
    }
}
