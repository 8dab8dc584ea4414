use std::time::Duration;

use reqwest::StatusCode;
use tracing::warn;

use crate::error::Result;

/// Configuration for retry behaviour on login and fixture setup.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub delays: Vec<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delays: vec![1, 2, 4],
        }
    }
}

impl RetryConfig {
    /// A config that sends exactly once.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            delays: Vec::new(),
        }
    }

    fn delay_for(&self, attempt: usize) -> Option<Duration> {
        if attempt >= self.max_retries {
            return None;
        }
        let secs = self
            .delays
            .get(attempt)
            .or(self.delays.last())
            .copied()
            .unwrap_or(0);
        Some(Duration::from_secs(secs))
    }
}

/// Which failures are worth sending the request again for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOn {
    /// Network errors, 5xx and 429. For requests that are safe to repeat.
    Transient,
    /// 429 only: the server refused before doing any work. For creates.
    RateLimit,
}

impl RetryOn {
    fn status(self, status: StatusCode) -> bool {
        match self {
            Self::Transient => status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS,
            Self::RateLimit => status == StatusCode::TOO_MANY_REQUESTS,
        }
    }

    fn network_error(self) -> bool {
        self == Self::Transient
    }
}

/// Send a request with backoff, retrying the failures `on` selects.
/// Returns immediately on success or any other status.
pub async fn retry_send<F>(
    build: F,
    config: &RetryConfig,
    on: RetryOn,
) -> Result<reqwest::Response>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let max_attempts = config.max_retries + 1;
    let mut attempt = 0;

    loop {
        match build().send().await {
            Ok(resp) if on.status(resp.status()) => match config.delay_for(attempt) {
                Some(delay) => {
                    warn!(
                        "attempt {}/{} failed (HTTP {}), retrying in {}s…",
                        attempt + 1,
                        max_attempts,
                        resp.status(),
                        delay.as_secs(),
                    );
                    tokio::time::sleep(delay).await;
                }
                None => return Ok(resp),
            },
            Ok(resp) => return Ok(resp),
            Err(e) if !on.network_error() => return Err(e.into()),
            Err(e) => match config.delay_for(attempt) {
                Some(delay) => {
                    warn!(
                        "attempt {}/{} failed ({}), retrying in {}s…",
                        attempt + 1,
                        max_attempts,
                        e,
                        delay.as_secs(),
                    );
                    tokio::time::sleep(delay).await;
                }
                None => return Err(e.into()),
            },
        }
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_ladder_reuses_last_step() {
        let cfg = RetryConfig {
            max_retries: 4,
            delays: vec![1, 2],
        };
        assert_eq!(cfg.delay_for(0), Some(Duration::from_secs(1)));
        assert_eq!(cfg.delay_for(1), Some(Duration::from_secs(2)));
        assert_eq!(cfg.delay_for(3), Some(Duration::from_secs(2)));
        assert_eq!(cfg.delay_for(4), None);
    }

    #[test]
    fn none_never_retries() {
        assert_eq!(RetryConfig::none().delay_for(0), None);
    }

    #[test]
    fn transient_retries_rate_limit_and_server_errors() {
        let on = RetryOn::Transient;
        assert!(on.status(StatusCode::TOO_MANY_REQUESTS));
        assert!(on.status(StatusCode::BAD_GATEWAY));
        assert!(!on.status(StatusCode::UNAUTHORIZED));
        assert!(!on.status(StatusCode::OK));
        assert!(on.network_error());
    }

    #[test]
    fn rate_limit_leaves_server_errors_and_timeouts_alone() {
        let on = RetryOn::RateLimit;
        assert!(on.status(StatusCode::TOO_MANY_REQUESTS));
        assert!(!on.status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!on.status(StatusCode::GATEWAY_TIMEOUT));
        assert!(!on.network_error());
    }
}
