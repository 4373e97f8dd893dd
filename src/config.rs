//! Client configuration

use std::path::PathBuf;
use std::time::Duration;

/// Local development API address
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Configuration for the platform client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API base address, without a trailing slash
    pub base_url: String,
    /// Per-request timeout; `None` keeps the HTTP client default
    pub timeout: Option<Duration>,
    /// Assistant context sent with every question
    pub level: String,
    pub major: String,
    /// Downloaded template naming: `<prefix>_<level>_Unit<unit>_Template.<ext>`
    pub template_prefix: String,
    pub template_extension: String,
    /// Durable token file, if the host wants the token kept across restarts
    pub token_file: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
            level: "L2".to_string(),
            major: "Business".to_string(),
            template_prefix: "BTEC".to_string(),
            template_extension: "docx".to_string(),
            token_file: None,
        }
    }
}

impl ClientConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            base_url: var("BTEC_API_URL")
                .map_or(defaults.base_url, |url| url.trim_end_matches('/').to_string()),
            timeout: var("BTEC_HTTP_TIMEOUT_SECS")
                .and_then(|s| s.trim().parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            level: var("BTEC_DEFAULT_LEVEL").unwrap_or(defaults.level),
            major: var("BTEC_DEFAULT_MAJOR").unwrap_or(defaults.major),
            template_prefix: var("BTEC_TEMPLATE_PREFIX").unwrap_or(defaults.template_prefix),
            template_extension: var("BTEC_TEMPLATE_EXT")
                .map_or(defaults.template_extension, |ext| {
                    ext.trim_start_matches('.').to_string()
                }),
            token_file: var("BTEC_TOKEN_FILE").map(PathBuf::from),
        }
    }
}
