use std::collections::HashSet;
use std::time::Duration;

const ALLOWED_HOSTS: &str = "ALLOWED_HOSTS"; // Comma separated
const UPSTREAM_USER_AGENT: &str = "UPSTREAM_USER_AGENT";
const UPSTREAM_REFERER: &str = "UPSTREAM_REFERER";
const UPSTREAM_ACCEPT: &str = "UPSTREAM_ACCEPT";
const CACHE_MAX_AGE_SECS: &str = "CACHE_MAX_AGE_SECS";
const ERROR_CACHE_MAX_AGE_SECS: &str = "ERROR_CACHE_MAX_AGE_SECS";
const UPSTREAM_TIMEOUT_SECS: &str = "UPSTREAM_TIMEOUT_SECS";
const MAX_IMAGE_BYTES: &str = "MAX_IMAGE_BYTES";

/// Image CDNs we are willing to fetch from
pub const DEFAULT_ALLOWED_HOSTS: &[&str] = &[
    "i.redd.it",
    "preview.redd.it",
    "external-preview.redd.it",
    "a.thumbs.redditmedia.com",
    "b.thumbs.redditmedia.com",
    "i.imgur.com",
];

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120 Safari/537.36";
pub const DEFAULT_REFERER: &str = "https://www.reddit.com/";
pub const DEFAULT_ACCEPT: &str = "image/*,*/*;q=0.8";

const DEFAULT_CACHE_MAX_AGE_SECS: u64 = 86_400; // 1 day
const DEFAULT_ERROR_CACHE_MAX_AGE_SECS: u64 = 60;
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 15;
const DEFAULT_MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024; // 10MB

/// Upstream error bodies are cut to this many characters before being echoed
pub const ERROR_SNIPPET_CHARS: usize = 200;

/// Headers sent with every upstream fetch.
/// Hotlink-protected hosts only serve the image when the Referer looks like their own site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamHeaders {
    pub user_agent: String,
    pub referer: String,
    pub accept: String,
}

impl Default for UpstreamHeaders {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            referer: DEFAULT_REFERER.to_string(),
            accept: DEFAULT_ACCEPT.to_string(),
        }
    }
}

/// Proxy configuration, built once per cold start and never mutated
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub allowed_hosts: HashSet<String>,
    pub headers: UpstreamHeaders,
    pub cache_max_age_secs: u64,
    pub error_cache_max_age_secs: u64,
    pub upstream_timeout: Duration,
    pub max_image_bytes: usize,
    pub error_snippet_chars: usize,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            allowed_hosts: DEFAULT_ALLOWED_HOSTS.iter().map(|h| h.to_string()).collect(),
            headers: UpstreamHeaders::default(),
            cache_max_age_secs: DEFAULT_CACHE_MAX_AGE_SECS,
            error_cache_max_age_secs: DEFAULT_ERROR_CACHE_MAX_AGE_SECS,
            upstream_timeout: Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            error_snippet_chars: ERROR_SNIPPET_CHARS,
        }
    }
}

impl ProxyConfig {
    /// Load configuration from the Lambda environment, falling back to defaults
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key -> value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let allowed_hosts = match lookup(ALLOWED_HOSTS) {
            Some(raw) => parse_host_list(&raw),
            None => defaults.allowed_hosts,
        };

        let headers = UpstreamHeaders {
            user_agent: lookup(UPSTREAM_USER_AGENT).unwrap_or(defaults.headers.user_agent),
            referer: lookup(UPSTREAM_REFERER).unwrap_or(defaults.headers.referer),
            accept: lookup(UPSTREAM_ACCEPT).unwrap_or(defaults.headers.accept),
        };

        let cache_max_age_secs =
            parse_number(&lookup, CACHE_MAX_AGE_SECS)?.unwrap_or(defaults.cache_max_age_secs);
        let error_cache_max_age_secs = parse_number(&lookup, ERROR_CACHE_MAX_AGE_SECS)?
            .unwrap_or(defaults.error_cache_max_age_secs);
        let upstream_timeout = parse_number(&lookup, UPSTREAM_TIMEOUT_SECS)?
            .map(Duration::from_secs)
            .unwrap_or(defaults.upstream_timeout);
        let max_image_bytes =
            parse_number(&lookup, MAX_IMAGE_BYTES)?.unwrap_or(defaults.max_image_bytes);

        if upstream_timeout.is_zero() {
            return Err(format!("{} must be greater than zero", UPSTREAM_TIMEOUT_SECS));
        }

        Ok(Self {
            allowed_hosts,
            headers,
            cache_max_age_secs,
            error_cache_max_age_secs,
            upstream_timeout,
            max_image_bytes,
            error_snippet_chars: defaults.error_snippet_chars,
        })
    }

    /// Replace the allow-list, mostly useful for pointing tests at a local upstream
    pub fn with_allowed_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_hosts = hosts.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_host_allowed(&self, host: &str) -> bool {
        self.allowed_hosts.contains(host)
    }
}

fn parse_host_list(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_number<F, T>(lookup: &F, key: &str) -> Result<Option<T>, String>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| format!("{} must be a non-negative integer, got '{}'", key, raw)),
        None => Ok(None),
    }
}
