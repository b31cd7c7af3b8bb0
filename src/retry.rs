use std::future::Future;
use std::time::Duration;

/// Run `op`, retrying up to `max_retries` more times on error with an
/// exponential delay of `base_delay * 2^attempt`. Returns the last error.
///
/// Only for idempotent reads: mutating calls are never retried.
pub async fn retry_with_backoff<T, E, F, Fut>(
    max_retries: u32,
    base_delay: Duration,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_retries => {
                let delay = base_delay.saturating_mul(2u32.saturating_pow(attempt));
                tracing::warn!(
                    "Operation failed ({}), retrying in {}ms (attempt {}/{})",
                    e,
                    delay.as_millis(),
                    attempt + 1,
                    max_retries
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
