use image_relay_shared::{config::ProxyConfig, AppState};
use lambda_http::{run, service_fn, Error, Request};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod http_handler;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .without_time()
        .init();

    // Build config and HTTP client once at cold start
    let config = ProxyConfig::from_env()?;
    tracing::info!(
        allowed_hosts = config.allowed_hosts.len(),
        timeout_secs = config.upstream_timeout.as_secs(),
        "image proxy configured"
    );
    let state = AppState::new(config)?;

    run(service_fn(move |event: Request| {
        let state = Arc::clone(&state);
        async move { http_handler::function_handler(event, state).await }
    }))
    .await
}
