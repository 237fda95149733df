//! LLM API interaction with timeouts and exponential backoff.
//!
//! - [`AskAsync`]: async "send text, get a reply" abstraction
//! - [`AskFnWrapper`]: calls `awful_aj::api::ask`, bounded by a timeout
//! - [`RetryAsk`]: decorator adding retries with backoff and jitter
//!
//! # Retry Strategy
//!
//! ```text
//! delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
//! ```

use awful_aj::api::ask;
use awful_aj::{config::AwfulJadeConfig, template::ChatTemplate};
use rand::{Rng, rng};
use std::error::Error;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::{sleep, timeout};
use tracing::{error, info, instrument, warn};

/// Trait for async LLM interaction.
pub trait AskAsync {
    /// The type of response returned by the LLM.
    type Response;

    /// Send text to the LLM and receive a response.
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>>;
}

/// Wrapper that adds exponential backoff retry logic to any [`AskAsync`] implementation.
pub struct RetryAsk<T> {
    inner: T,
    max_retries: usize,
    base_delay: StdDuration,
    max_delay: StdDuration,
}

impl<T> RetryAsk<T>
where
    T: AskAsync,
{
    /// Wrap `inner`, retrying up to `max_retries` times after the first
    /// attempt. Delays start at `base_delay` and are capped at 30 seconds.
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }

    #[cfg(test)]
    pub(crate) fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T> fmt::Debug for RetryAsk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAsk")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> AskAsync for RetryAsk<T>
where
    T: AskAsync + fmt::Debug,
{
    type Response = T::Response;

    #[instrument(level = "info", skip_all)]
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.ask(text).await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis() as u64,
                            elapsed_ms_total = total_dt.as_millis() as u64,
                            error = %e,
                            "ask() exhausted retries"
                        );
                        return Err(e);
                    }

                    let shift = (attempt - 1).min(16) as u32;
                    let delay = self.base_delay.saturating_mul(1 << shift).min(self.max_delay);
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis() as u64,
                        elapsed_ms_total = total_dt.as_millis() as u64,
                        ?delay,
                        error = %e,
                        "ask() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Calls `awful_aj::api::ask`, giving up after `timeout`.
#[derive(Debug)]
pub struct AskFnWrapper<'a> {
    pub config: &'a AwfulJadeConfig,
    pub template: &'a ChatTemplate,
    pub timeout: StdDuration,
}

impl<'a> AskAsync for AskFnWrapper<'a> {
    type Response = String;

    #[instrument(level = "info", skip_all)]
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        let t0 = Instant::now();
        let res = match timeout(
            self.timeout,
            ask(self.config, text.to_string(), self.template, None, None),
        )
        .await
        {
            Ok(res) => res,
            Err(elapsed) => Err(Box::new(elapsed) as Box<dyn Error>),
        };
        let dt = t0.elapsed();

        if let Err(e) = &res {
            warn!(elapsed_ms = dt.as_millis() as u64, error = %e, "API call failed");
        }
        res
    }
}

/// Ask the LLM once, retrying transient failures with backoff.
#[instrument(level = "info", skip_all)]
pub async fn ask_with_backoff<A>(api: &RetryAsk<A>, prompt: &str) -> Result<String, Box<dyn Error>>
where
    A: AskAsync<Response = String> + fmt::Debug,
{
    let t0 = Instant::now();
    let res = api.ask(prompt).await;
    let dt = t0.elapsed();

    match &res {
        Ok(_) => info!(elapsed_ms_total = dt.as_millis() as u64, "ask_with_backoff succeeded"),
        Err(e) => {
            error!(elapsed_ms_total = dt.as_millis() as u64, error = %e, "ask_with_backoff failed")
        }
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Fails `failures` times, then answers with `reply`.
    #[derive(Debug)]
    struct Flaky {
        failures: usize,
        calls: Cell<usize>,
        reply: String,
    }

    impl AskAsync for Flaky {
        type Response = String;

        async fn ask(&self, _text: &str) -> Result<String, Box<dyn Error>> {
            let n = self.calls.get() + 1;
            self.calls.set(n);
            if n <= self.failures {
                Err(format!("transient failure {n}").into())
            } else {
                Ok(self.reply.clone())
            }
        }
    }

    fn flaky(failures: usize) -> Flaky {
        Flaky {
            failures,
            calls: Cell::new(0),
            reply: "{}".to_string(),
        }
    }

    #[tokio::test]
    async fn test_retry_recovers() {
        let api = RetryAsk::new(flaky(2), 3, StdDuration::from_millis(1));
        let reply = ask_with_backoff(&api, "prompt").await.unwrap();

        assert_eq!(reply, "{}");
        assert_eq!(api.inner.calls.get(), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up() {
        let api = RetryAsk::new(flaky(10), 2, StdDuration::from_millis(1));
        let err = api.ask("prompt").await.unwrap_err();

        assert_eq!(err.to_string(), "transient failure 3");
        assert_eq!(api.inner.calls.get(), 3);
    }

    #[test]
    fn test_retry_debug_hides_inner() {
        let api = RetryAsk::new(flaky(0), 5, StdDuration::from_secs(1));
        let debug = format!("{:?}", api);
        assert!(debug.contains("max_retries: 5"));
        assert!(!debug.contains("Flaky"));
    }
}
