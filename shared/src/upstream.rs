use lambda_http::http::StatusCode;
use reqwest::{header, redirect, Client};
use std::error::Error as _;
use url::Url;

use crate::config::ProxyConfig;
use crate::errors::{truncate_snippet, ProxyError};

const MAX_REDIRECTS: usize = 10;

/// Content type used when the upstream does not send one
pub const FALLBACK_CONTENT_TYPE: &str = "image/jpeg";

/// Fully buffered image fetched from the upstream host
#[derive(Debug)]
pub struct UpstreamImage {
    pub status: StatusCode,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Build the shared HTTP client. Created once per cold start and reused across invocations.
pub fn build_client(config: &ProxyConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(config.upstream_timeout)
        .redirect(redirect::Policy::limited(MAX_REDIRECTS))
        // Keep our Referer on redirect hops instead of the previous URL
        .referer(false)
        .build()
}

/// GET the target with the spoofed browser headers and buffer the body.
/// Single attempt; redirects are followed by the client.
pub async fn fetch_image(
    client: &Client,
    config: &ProxyConfig,
    target: &Url,
) -> Result<UpstreamImage, ProxyError> {
    let mut response = client
        .get(target.clone())
        .header(header::USER_AGENT, &config.headers.user_agent)
        .header(header::REFERER, &config.headers.referer)
        .header(header::ACCEPT, &config.headers.accept)
        .send()
        .await
        .map_err(|e| transport_error(e, config))?;

    let status = response.status();

    if !status.is_success() {
        let body = read_error_prefix(&mut response, config.error_snippet_chars).await;
        return Err(ProxyError::Upstream {
            status,
            snippet: truncate_snippet(&body, config.error_snippet_chars),
        });
    }

    let limit = config.max_image_bytes;
    if response.content_length().is_some_and(|len| len > limit as u64) {
        return Err(ProxyError::TooLarge { limit });
    }

    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(FALLBACK_CONTENT_TYPE)
        .to_string();

    // Read chunk by chunk so a lying or missing Content-Length can't blow the limit
    let mut bytes = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(|e| transport_error(e, config))? {
        if bytes.len() + chunk.len() > limit {
            return Err(ProxyError::TooLarge { limit });
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(UpstreamImage { status, content_type, bytes })
}

/// Read just enough of an error body to fill the snippet, then stop.
/// Best effort: the status alone is enough if the body can't be read.
async fn read_error_prefix(response: &mut reqwest::Response, max_chars: usize) -> String {
    // A UTF-8 character is at most 4 bytes, plus room for one cut-off character
    let max_bytes = max_chars.saturating_mul(4).saturating_add(3);
    let mut buf = Vec::new();
    while buf.len() < max_bytes {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                let take = chunk.len().min(max_bytes - buf.len());
                buf.extend_from_slice(&chunk[..take]);
            }
            _ => break,
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn transport_error(err: reqwest::Error, config: &ProxyConfig) -> ProxyError {
    if err.is_timeout() {
        ProxyError::Timeout { after: config.upstream_timeout }
    } else {
        // Drop the URL so the caller-visible message stays short, but keep the cause chain
        let err = err.without_url();
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        ProxyError::Transport(message)
    }
}
