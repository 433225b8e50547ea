//! Gateway configuration

use std::collections::HashSet;
use std::env;
use std::time::Duration;

/// Client table key used when a request's prefix is not configured
pub const DEFAULT_PREFIX: &str = "default";

/// One backend instance served by the HTTP front-end
#[derive(Debug, Clone, PartialEq)]
pub struct BackendConfig {
    pub prefix: String,
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

/// Gateway configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Backend
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,

    // Stdio front-end
    pub tool_prefix: String,

    // HTTP front-end
    pub http_host: String,
    pub http_port: u16,
    pub backends: Vec<BackendConfig>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = env::var("LIGHTRAG_BASE_URL").unwrap_or_else(|_| "http://localhost:9621".to_string());
        let api_key = env::var("LIGHTRAG_API_KEY").ok().filter(|k| !k.is_empty());

        let timeout = {
            let raw = env::var("LIGHTRAG_TIMEOUT").unwrap_or_else(|_| "30".to_string());
            let secs: f64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "LIGHTRAG_TIMEOUT",
                reason: format!("'{}' is not a number", raw),
            })?;
            if !secs.is_finite() || secs <= 0.0 {
                return Err(ConfigError::Invalid {
                    var: "LIGHTRAG_TIMEOUT",
                    reason: "must be greater than zero".to_string(),
                });
            }
            Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::Invalid {
                var: "LIGHTRAG_TIMEOUT",
                reason: format!("'{}' is out of range", raw),
            })?
        };

        let http_port = {
            let raw = env::var("LIGHTRAG_HTTP_PORT").unwrap_or_else(|_| "8765".to_string());
            raw.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "LIGHTRAG_HTTP_PORT",
                reason: format!("'{}' is not a valid port", raw),
            })?
        };

        let backends = match env::var("LIGHTRAG_HTTP_PREFIXES") {
            Ok(list) if !list.trim().is_empty() => parse_backends(&list, timeout)?,
            _ => vec![BackendConfig {
                prefix: DEFAULT_PREFIX.to_string(),
                base_url: base_url.clone(),
                api_key: api_key.clone(),
                timeout,
            }],
        };

        Ok(Self {
            base_url,
            api_key,
            timeout,

            tool_prefix: env::var("LIGHTRAG_TOOL_PREFIX").unwrap_or_default(),

            http_host: env::var("LIGHTRAG_HTTP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            http_port,
            backends,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

/// Parse a multi-backend list: `prefix:url[:key]` entries separated by `;` or `,`.
///
/// The prefix is everything before the first `:`. After the URL scheme, a
/// segment that is all digits (optionally followed by a path) is a port;
/// a trailing non-port segment is the API key. Keys containing `:` are not
/// representable.
pub fn parse_backends(list: &str, timeout: Duration) -> Result<Vec<BackendConfig>, ConfigError> {
    let mut seen = HashSet::new();
    let mut backends = Vec::new();

    for entry in list.split([';', ',']).map(str::trim).filter(|e| !e.is_empty()) {
        let backend = parse_backend_entry(entry, timeout)?;
        if !seen.insert(backend.prefix.clone()) {
            return Err(ConfigError::DuplicatePrefix(backend.prefix));
        }
        backends.push(backend);
    }

    Ok(backends)
}

fn parse_backend_entry(entry: &str, timeout: Duration) -> Result<BackendConfig, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidBackend {
        entry: entry.to_string(),
        reason: reason.to_string(),
    };

    let (prefix, rest) = entry.split_once(':').ok_or_else(|| invalid("expected prefix:url[:key]"))?;
    let prefix = prefix.trim();
    if prefix.is_empty() {
        return Err(invalid("prefix is empty"));
    }

    let rest = rest.trim();
    if rest.is_empty() {
        return Err(invalid("URL is missing"));
    }
    let (scheme, authority) = rest
        .split_once("://")
        .ok_or_else(|| invalid("URL must include a scheme such as http://"))?;
    if scheme.is_empty() || authority.is_empty() {
        return Err(invalid("URL is missing"));
    }

    let segments: Vec<&str> = authority.split(':').collect();
    let (url, key) = match segments.as_slice() {
        [_] => (rest.to_string(), None),
        [host, second] if is_port(second) => (format!("{}://{}:{}", scheme, host, second), None),
        [host, key] => (format!("{}://{}", scheme, host), Some(*key)),
        [host, port, key] if is_port(port) => (format!("{}://{}:{}", scheme, host, port), Some(*key)),
        [_, _, _] => return Err(invalid("port must be numeric")),
        _ => return Err(invalid("too many ':' separators")),
    };

    Ok(BackendConfig {
        prefix: prefix.to_string(),
        base_url: url,
        api_key: key.map(str::trim).filter(|k| !k.is_empty()).map(str::to_string),
        timeout,
    })
}

/// Digits, then end of string or a path
fn is_port(segment: &str) -> bool {
    let digits = segment.bytes().take_while(u8::is_ascii_digit).count();
    digits > 0 && (digits == segment.len() || segment.as_bytes()[digits] == b'/')
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
    #[error("Invalid backend entry '{entry}': {reason}")]
    InvalidBackend { entry: String, reason: String },
    #[error("Duplicate backend prefix: {0}")]
    DuplicatePrefix(String),
}
