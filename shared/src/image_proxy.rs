use lambda_http::{Body, Error, Response};

use crate::errors::ProxyError;
use crate::upstream::{fetch_image, UpstreamImage};
use crate::{responses, target, AppState};

/// Proxy a remote image through Lambda.
/// Every failure becomes an error response; the only `Err` left is a broken response builder.
pub async fn proxy_image(state: &AppState, url_param: Option<&str>) -> Result<Response<Body>, Error> {
    match fetch_target(state, url_param).await {
        Ok(image) => responses::image_response(image, &state.config),
        Err(err) => {
            if err.is_transport() {
                tracing::error!(error = %err, "image proxy failed");
            } else {
                tracing::warn!(status = err.status().as_u16(), error = %err, "image proxy rejected");
            }
            responses::error_response(&err, &state.config)
        }
    }
}

async fn fetch_target(state: &AppState, url_param: Option<&str>) -> Result<UpstreamImage, ProxyError> {
    let target = target::resolve_target(url_param, &state.config)?;
    let host = target.host_str().unwrap_or_default().to_string();

    let image = fetch_image(&state.http_client, &state.config, &target).await?;

    tracing::info!(
        host = %host,
        status = image.status.as_u16(),
        content_type = %image.content_type,
        bytes = image.bytes.len(),
        "image fetched"
    );

    Ok(image)
}
