//! Bounded retry with fixed backoff, reporting exhaustion through a callback.

use backon::{BlockingRetryable, ConstantBuilder, Retryable};
use log::{error, warn};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::error::{CardError, CardResult};

/// Invoked once per exhausted retry sequence. The host is expected to rebuild the card.
pub type ErrorCallback = Arc<dyn Fn() + Send + Sync>;

/// Retry policy shared by resource loads and paint steps.
#[derive(Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
    on_exhausted: Option<ErrorCallback>,
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("config", &self.config)
            .field("on_exhausted", &self.on_exhausted.is_some())
            .finish()
    }
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config,
            on_exhausted: None,
        }
    }

    pub fn with_error_callback(mut self, callback: ErrorCallback) -> Self {
        self.on_exhausted = Some(callback);
        self
    }

    /// Total attempts including the first one.
    pub fn attempts(&self) -> usize {
        self.config.max_retries + 1
    }

    fn backoff(&self) -> ConstantBuilder {
        ConstantBuilder::default()
            .with_delay(self.config.delay())
            .with_max_times(self.config.max_retries)
    }

    /// Run a synchronous operation, sleeping the thread between attempts.
    pub fn run_blocking<T>(
        &self,
        what: &str,
        op: impl FnMut() -> CardResult<T>,
    ) -> CardResult<T> {
        BlockingRetryable::retry(op, self.backoff())
            .sleep(std::thread::sleep)
            .when(CardError::is_transient)
            .notify(|err: &CardError, dur: Duration| {
                warn!("Retrying {} in {}ms: {}", what, dur.as_millis(), err);
            })
            .call()
            .map_err(|err| self.give_up(what, err))
    }

    /// Run an asynchronous operation, sleeping on the tokio timer between attempts.
    pub async fn run<T, Fut, F>(&self, what: &str, op: F) -> CardResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = CardResult<T>>,
    {
        Retryable::retry(op, self.backoff())
            .sleep(tokio::time::sleep)
            .when(CardError::is_transient)
            .notify(|err: &CardError, dur: Duration| {
                warn!("Retrying {} in {}ms: {}", what, dur.as_millis(), err);
            })
            .await
            .map_err(|err| self.give_up(what, err))
    }

    /// Turn the last transient error into a terminal one and fire the callback.
    fn give_up(&self, what: &str, err: CardError) -> CardError {
        if !err.is_transient() {
            return err;
        }
        error!(
            "Giving up on {} after {} attempts: {}",
            what,
            self.attempts(),
            err
        );
        if let Some(callback) = &self.on_exhausted {
            callback();
        }
        CardError::RetriesExhausted {
            what: what.to_string(),
            attempts: self.attempts(),
            last_error: err.to_string(),
        }
    }
}
