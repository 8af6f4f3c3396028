//! Shared HTTP transport with a bounded retry policy.
//!
//! Every external client holds a clone of one [`Transport`]. It owns the
//! `reqwest::Client` (and therefore the per-call timeout) and knows how to
//! resend a request when the failure looks transient.
//!
//! # Retry Strategy
//!
//! - Retries on 429, 500, 502, 503 and 504, and on connect/timeout errors
//! - At most `max_retries` extra attempts (3 by default)
//! - Exponential backoff starting at `base_delay` (1 second by default)
//! - Delay capped at `max_delay` (30 seconds by default)
//! - Random jitter (0-250ms) added to each delay
//!
//! Business logic never retries on its own; a caller either goes through
//! [`Transport::send_with_retry`] or sends exactly once with
//! [`Transport::send_once`].

use crate::config::HttpSettings;
use crate::error::{ApiError, ConfigError};
use rand::{Rng, rng};
use reqwest::{RequestBuilder, Response, StatusCode};
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{error, instrument, warn};

const RETRYABLE_STATUSES: [StatusCode; 5] = [
    StatusCode::TOO_MANY_REQUESTS,
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

/// Backoff parameters for [`Transport::send_with_retry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt.
    pub max_retries: usize,
    /// Delay before the first retry; doubles with every further retry.
    pub base_delay: StdDuration,
    /// Cap applied before jitter.
    pub max_delay: StdDuration,
}

impl RetryPolicy {
    /// Backoff before retry number `attempt` (1-based), without jitter.
    ///
    /// ```text
    /// delay = min(base_delay * 2^(attempt-1), max_delay)
    /// ```
    pub fn delay_for(&self, attempt: usize) -> StdDuration {
        let exp = attempt.saturating_sub(1).min(31) as u32;
        self.base_delay
            .saturating_mul(1u32 << exp)
            .min(self.max_delay)
    }
}

impl From<&HttpSettings> for RetryPolicy {
    fn from(settings: &HttpSettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            base_delay: StdDuration::from_millis(settings.base_delay_ms),
            max_delay: StdDuration::from_secs(settings.max_delay_secs),
        }
    }
}

/// Whether a response status is worth another attempt.
pub fn is_retryable_status(status: StatusCode) -> bool {
    RETRYABLE_STATUSES.contains(&status)
}

fn is_retryable_error(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect()
}

/// The HTTP client plus the retry policy every component shares.
#[derive(Clone)]
pub struct Transport {
    http: reqwest::Client,
    policy: RetryPolicy,
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("policy", &self.policy)
            .finish()
    }
}

impl Transport {
    pub fn new(settings: &HttpSettings) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout())
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            policy: RetryPolicy::from(settings),
        })
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Send a request exactly once.
    pub async fn send_once(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        Ok(request.send().await?)
    }

    /// Send the request built by `build`, rebuilding and resending it while
    /// the failure is transient and retries remain.
    ///
    /// Returns the last response even when its status is still retryable;
    /// status interpretation is left to the caller.
    #[instrument(level = "debug", skip_all)]
    pub async fn send_with_retry<F>(&self, build: F) -> Result<Response, ApiError>
    where
        F: Fn(&reqwest::Client) -> RequestBuilder,
    {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            let outcome = build(&self.http).send().await.map_err(ApiError::from);

            let reason = match &outcome {
                Ok(resp) if is_retryable_status(resp.status()) => Some(resp.status().to_string()),
                Err(ApiError::Transport(e)) if is_retryable_error(e) => Some(e.to_string()),
                _ => None,
            };
            let Some(reason) = reason else {
                return outcome;
            };

            attempt += 1;
            let attempt_dt = attempt_t0.elapsed();
            let total_dt = total_t0.elapsed();

            if attempt > self.policy.max_retries {
                error!(
                    attempt,
                    max = self.policy.max_retries,
                    elapsed_ms_attempt = attempt_dt.as_millis(),
                    elapsed_ms_total = total_dt.as_millis(),
                    %reason,
                    "request exhausted retries"
                );
                return outcome;
            }

            let jitter_ms: u64 = rng().random_range(0..=250);
            let delay = self.policy.delay_for(attempt) + StdDuration::from_millis(jitter_ms);

            warn!(
                attempt,
                max = self.policy.max_retries,
                elapsed_ms_attempt = attempt_dt.as_millis(),
                elapsed_ms_total = total_dt.as_millis(),
                ?delay,
                %reason,
                "request attempt failed; backing off"
            );
            sleep(delay).await;
        }
    }
}

/// Turn a non-success response into [`ApiError::Status`], keeping the body
/// for diagnostics.
pub async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status { status, body })
}
