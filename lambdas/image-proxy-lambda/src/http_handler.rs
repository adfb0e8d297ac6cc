use image_relay_shared::{image_proxy, responses, AppState};
use lambda_http::{Body, Error, Request, RequestExt, Response, http::Method};
use std::sync::Arc;

/// Main Lambda handler - answers preflight, proxies everything else
pub(crate) async fn function_handler(
    event: Request,
    state: Arc<AppState>,
) -> Result<Response<Body>, Error> {
    let method = event.method();
    let request_id = event.lambda_context_ref().map(|ctx| ctx.request_id.clone());
    tracing::info!(method = %method, request_id = ?request_id, "Image proxy invoked");

    // Handle CORS preflight
    if method == Method::OPTIONS {
        return responses::cors_preflight();
    }

    let url_param = event
        .query_string_parameters_ref()
        .and_then(|params| params.first("url"));

    image_proxy::proxy_image(&state, url_param).await
}
