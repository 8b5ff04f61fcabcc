use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Fixed-delay retry: `attempts` tries in total, sleeping `delay` between them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        RetryPolicy {
            attempts: attempts.max(1),
            delay,
        }
    }

    /// Runs `operation` until it succeeds or the attempts are used up, returning the last error.
    pub async fn run<T, E, F, Fut>(&self, what: &str, operation: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.run_if(what, |_| true, operation).await
    }

    /// Like `run`, but gives up immediately on errors for which `retryable` is false.
    pub async fn run_if<T, E, F, Fut, R>(
        &self,
        what: &str,
        retryable: R,
        mut operation: F,
    ) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        R: Fn(&E) -> bool,
    {
        let mut attempt = 1;
        loop {
            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if !retryable(&e) => return Err(e),
                Err(e) if attempt >= self.attempts => {
                    log::error!("{} failed after {} attempt(s): {}", what, attempt, e);
                    return Err(e);
                }
                Err(e) => {
                    log::warn!(
                        "{} failed (attempt #{} of {}): {}. Retrying in {}s...",
                        what,
                        attempt,
                        self.attempts,
                        e,
                        self.delay.as_secs_f32()
                    );
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
