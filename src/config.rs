use crate::constants::{
    BULK_CSV_URL, DEFAULT_FILTER_CONCURRENCY, LISTING_API_URL, MERCADO_PUBLICO_URL, OCDS_API_URL, TED_API_URL, TED_URL,
};
use crate::errors::{AppError, AppResult};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Client settings with all values filled in (no Options).
///
/// This struct carries the library defaults and can be deserialized by the TOML
/// loader. Every field has a concrete value, so callers read it directly.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    // Cache
    /// Whether HTTP responses are stored in the on-disk cache
    pub use_cache: bool,
    /// Directory holding cached responses
    pub cache_dir: PathBuf,
    /// Seconds a cached response stays valid
    pub cache_expire_after_secs: u64,

    // Network
    /// Timeout applied to every request, in seconds
    pub request_timeout_secs: u64,
    /// Value sent in the `User-Agent` header
    pub user_agent: String,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial delay in milliseconds before the first retry
    pub retry_initial_delay_ms: u64,
    /// Maximum delay in milliseconds between retries
    pub retry_max_delay_ms: u64,

    // Concurrency
    /// Concurrent publication-date lookups and bulk downloads
    pub concurrency: usize,
    /// Concurrent status evaluations when filtering collections
    pub filter_concurrency: usize,

    // Output
    /// Directory for bulk archives (EU packages)
    pub download_dir: PathBuf,
    /// Hide progress bars
    pub disable_progress_bar: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            use_cache: true,
            cache_dir: PathBuf::from(".licitpy/cache"),
            cache_expire_after_secs: 3600,
            request_timeout_secs: 30,
            user_agent: format!("licitpy/{}", env!("CARGO_PKG_VERSION")),
            max_retries: 3,
            retry_initial_delay_ms: 1000,
            retry_max_delay_ms: 10000,
            concurrency: 16,
            filter_concurrency: DEFAULT_FILTER_CONCURRENCY,
            download_dir: PathBuf::from("data/eu"),
            disable_progress_bar: false,
        }
    }
}

impl Settings {
    /// Loads and validates settings from a TOML file.
    ///
    /// Missing keys keep their defaults. Unknown keys are rejected so typos are not
    /// silently ignored.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the TOML settings file
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the TOML is malformed, unknown keys are present,
    /// or a concurrency/timeout value is zero.
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let contents = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&contents)
            .map_err(|e| AppError::InvalidInput(format!("Failed to parse config: {e}")))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Checks the values that would make the client unusable.
    pub fn validate(&self) -> AppResult<()> {
        if self.concurrency == 0 {
            return Err(AppError::InvalidInput(
                "Concurrency must be greater than 0".into(),
            ));
        }
        if self.filter_concurrency == 0 {
            return Err(AppError::InvalidInput(
                "Filter concurrency must be greater than 0".into(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(AppError::InvalidInput(
                "Request timeout must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_expire_after_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Base URLs of the remote services, without trailing slash.
///
/// Defaults point at the production hosts; tests swap them for a mock server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub mercado_publico: String,
    pub ocds_api: String,
    pub listing_api: String,
    pub bulk_csv: String,
    pub ted: String,
    pub ted_api: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            mercado_publico: MERCADO_PUBLICO_URL.into(),
            ocds_api: OCDS_API_URL.into(),
            listing_api: LISTING_API_URL.into(),
            bulk_csv: BULK_CSV_URL.into(),
            ted: TED_URL.into(),
            ted_api: TED_API_URL.into(),
        }
    }
}

impl Endpoints {
    /// Every service served from a single host, as with a mock server.
    pub fn single_host(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/').to_string();
        Self {
            mercado_publico: base.clone(),
            ocds_api: base.clone(),
            listing_api: base.clone(),
            bulk_csv: base.clone(),
            ted: base.clone(),
            ted_api: base,
        }
    }

    /// Checks that every endpoint is an absolute http(s) URL.
    pub fn validate(&self) -> AppResult<()> {
        let endpoints = [
            &self.mercado_publico,
            &self.ocds_api,
            &self.listing_api,
            &self.bulk_csv,
            &self.ted,
            &self.ted_api,
        ];
        for endpoint in endpoints {
            let parsed = Url::parse(endpoint)?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(AppError::UrlError(format!(
                    "Unsupported scheme in endpoint: {endpoint}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn default_settings_values() {
        let settings = Settings::default();
        assert!(settings.use_cache);
        assert_eq!(settings.cache_expire_after_secs, 3600);
        assert_eq!(settings.concurrency, 16);
        assert_eq!(settings.filter_concurrency, 8);
        assert!(!settings.disable_progress_bar);
        assert!(settings.user_agent.starts_with("licitpy/"));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(
            tmp,
            r#"
            use_cache = false
            concurrency = 4
            "#,
        )
        .unwrap();

        let settings = Settings::from_toml_file(tmp.path()).unwrap();
        assert!(!settings.use_cache);
        assert_eq!(settings.concurrency, 4);
        assert_eq!(settings.max_retries, 3);
        assert_eq!(settings.cache_ttl(), Duration::from_secs(3600));
    }

    #[test]
    fn unknown_key_errors() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(
            tmp,
            r#"
            use_cache = true
            cache_expire = 10
            "#,
        )
        .unwrap();

        assert!(Settings::from_toml_file(tmp.path()).is_err());
    }

    #[test]
    fn single_host_endpoints_drop_trailing_slash() {
        let endpoints = Endpoints::single_host("http://127.0.0.1:8080/");
        assert_eq!(endpoints.ocds_api, "http://127.0.0.1:8080");
        assert_eq!(endpoints.ted_api, "http://127.0.0.1:8080");
        assert_eq!(Endpoints::default().ted, "https://ted.europa.eu");
    }

    #[test]
    fn endpoints_must_be_http_urls() {
        assert!(Endpoints::default().validate().is_ok());
        assert!(Endpoints::single_host("http://127.0.0.1:8080").validate().is_ok());
        assert!(Endpoints::single_host("not a url").validate().is_err());
        assert!(Endpoints::single_host("ftp://example.com").validate().is_err());
    }

    #[test]
    fn zero_concurrency_errors() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(tmp, "concurrency = 0").unwrap();

        let err = Settings::from_toml_file(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("Concurrency"));
    }
}
