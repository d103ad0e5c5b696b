use crate::config::Settings;
use crate::errors::AppResult;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// How the delay grows between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// `min(initial * 2^attempt, max)`
    Exponential,
    /// `min(initial * (attempt + 1), max)`
    Linear,
}

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff: Backoff,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 1000,
            max_delay_ms: 10000,
            backoff: Backoff::Exponential,
        }
    }
}

impl RetryConfig {
    /// Exponential policy from the client settings, used for OCDS records.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            max_retries: settings.max_retries,
            initial_delay_ms: settings.retry_initial_delay_ms,
            max_delay_ms: settings.retry_max_delay_ms,
            backoff: Backoff::Exponential,
        }
    }

    /// Attachment downloads: three attempts, waiting 3s then 6s.
    pub fn attachment_download() -> Self {
        Self {
            max_retries: 2,
            initial_delay_ms: 3000,
            max_delay_ms: 9000,
            backoff: Backoff::Linear,
        }
    }

    /// Same policy with the delays scaled down to `delay_ms`, for tests.
    pub fn with_initial_delay(mut self, delay_ms: u64) -> Self {
        self.initial_delay_ms = delay_ms;
        self.max_delay_ms = self.max_delay_ms.min(delay_ms.saturating_mul(8));
        self
    }
}

/// Calculates the delay in milliseconds before retry `attempt + 1`.
pub(crate) fn calculate_backoff(attempt: u32, config: &RetryConfig) -> u64 {
    let delay = match config.backoff {
        Backoff::Exponential => config
            .initial_delay_ms
            .saturating_mul(2_u64.saturating_pow(attempt)),
        Backoff::Linear => config
            .initial_delay_ms
            .saturating_mul(u64::from(attempt) + 1),
    };
    delay.min(config.max_delay_ms)
}

/// Runs `operation` until it succeeds, fails with a non-transient error, or the
/// attempts run out. The last error is returned unchanged.
pub async fn with_retry<T, F, Fut>(config: &RetryConfig, what: &str, mut operation: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < config.max_retries && e.is_transient() => {
                let delay_ms = calculate_backoff(attempt, config);
                warn!(
                    operation = what,
                    attempt = attempt + 1,
                    max_retries = config.max_retries + 1,
                    delay_ms = delay_ms,
                    error = %e,
                    "Retrying after error"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_exponential_backoff_is_capped() {
        let config = RetryConfig::default();
        assert_eq!(calculate_backoff(0, &config), 1000);
        assert_eq!(calculate_backoff(1, &config), 2000);
        assert_eq!(calculate_backoff(2, &config), 4000);
        assert_eq!(calculate_backoff(5, &config), 10000);
    }

    #[test]
    fn test_linear_backoff() {
        let config = RetryConfig::attachment_download();
        assert_eq!(calculate_backoff(0, &config), 3000);
        assert_eq!(calculate_backoff(1, &config), 6000);
        assert_eq!(calculate_backoff(10, &config), 9000);
    }

    #[tokio::test]
    async fn test_retries_transient_until_success() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let config = RetryConfig::default().with_initial_delay(1);

        let result = with_retry(&config, "test", move || async move {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(AppError::IncompleteRecord("3955-54-LE24".into()))
            } else {
                Ok(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let config = RetryConfig::default().with_initial_delay(1);

        let result: AppResult<()> = with_retry(&config, "test", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(AppError::HttpStatus {
                status: 404,
                url: "https://example.com".into(),
            })
        })
        .await;

        assert!(matches!(result, Err(AppError::HttpStatus { status: 404, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhaustion_surfaces_last_error() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let config = RetryConfig::default().with_initial_delay(1);

        let result: AppResult<()> = with_retry(&config, "test", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(AppError::NetworkError("connection reset".into()))
        })
        .await;

        assert!(matches!(result, Err(AppError::NetworkError(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }
}
