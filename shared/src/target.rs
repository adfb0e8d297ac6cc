use url::Url;

use crate::config::ProxyConfig;
use crate::errors::{truncate_snippet, ProxyError};

/// Turn the raw `url` query value into a validated, allow-listed target.
///
/// Callers sometimes encode the whole target (`https%3A%2F%2Fi.redd.it%2F...`) and
/// sometimes pass it verbatim. A literal `://` means the value is already usable; anything
/// else gets one round of percent-decoding first, so escapes inside a real URL path survive.
pub fn resolve_target(raw: Option<&str>, config: &ProxyConfig) -> Result<Url, ProxyError> {
    let raw = raw.map(str::trim).filter(|v| !v.is_empty()).ok_or(ProxyError::MissingUrl)?;

    let max_chars = config.error_snippet_chars;
    let decoded = decode_param(raw, max_chars)?;
    let target = parse_absolute(&decoded, max_chars)?;

    // parse_absolute guarantees a host
    let host = target.host_str().unwrap_or_default();
    if !config.is_host_allowed(host) {
        return Err(ProxyError::HostNotAllowed { host: host.to_string() });
    }

    Ok(target)
}

fn decode_param(raw: &str, max_chars: usize) -> Result<String, ProxyError> {
    if raw.contains("://") {
        return Ok(raw.to_string());
    }

    urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .map_err(|_| invalid_url(raw, max_chars))
}

fn parse_absolute(value: &str, max_chars: usize) -> Result<Url, ProxyError> {
    let invalid = || invalid_url(value, max_chars);

    let url = Url::parse(value).map_err(|_| invalid())?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid());
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid());
    }

    Ok(url)
}

// Echo only a bounded prefix of what the caller sent
fn invalid_url(value: &str, max_chars: usize) -> ProxyError {
    ProxyError::InvalidUrl { url: truncate_snippet(value, max_chars) }
}
