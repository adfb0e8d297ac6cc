use lambda_http::{Body, Error, Response, http::StatusCode};

use crate::config::ProxyConfig;
use crate::errors::ProxyError;
use crate::upstream::UpstreamImage;

const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
const NO_STORE: &str = "no-store";

/// Answer a CORS preflight without touching the upstream
pub fn cors_preflight() -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type")
        .body(Body::Empty)
        .map_err(Box::new)?)
}

/// Re-serve a fetched image.
/// Body::Binary goes out base64-encoded with isBase64Encoded set by the runtime.
pub fn image_response(image: UpstreamImage, config: &ProxyConfig) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", image.content_type)
        .header("Cache-Control", format!("public, max-age={}", config.cache_max_age_secs))
        .header("Access-Control-Allow-Origin", "*")
        .body(Body::Binary(image.bytes))
        .map_err(Box::new)?)
}

/// Plain-text error response. Mirrored upstream errors are briefly cacheable, our own are not.
pub fn error_response(err: &ProxyError, config: &ProxyConfig) -> Result<Response<Body>, Error> {
    let cache_control = match err {
        ProxyError::Upstream { .. } => format!("public, max-age={}", config.error_cache_max_age_secs),
        _ => NO_STORE.to_string(),
    };

    Ok(Response::builder()
        .status(err.status())
        .header("Content-Type", TEXT_CONTENT_TYPE)
        .header("Cache-Control", cache_control)
        .header("Access-Control-Allow-Origin", "*")
        .body(Body::Text(err.to_string()))
        .map_err(Box::new)?)
}
