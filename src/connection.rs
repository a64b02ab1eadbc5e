//! Connection establishment with bounded retry

use std::future::Future;

use tokio::net::TcpStream;

use crate::config::RunnerConfig;
use crate::error::{Result, RunnerError};
use crate::retry::RetryConfig;

/// Run `connect` until it succeeds or the retry budget is spent.
///
/// `connect` receives the 0-indexed attempt number. Between failed attempts
/// the task sleeps for [`RetryConfig::delay_for_attempt`].
pub async fn establish_with<S, F, Fut>(retry: &RetryConfig, mut connect: F) -> Result<S>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = std::io::Result<S>>,
{
    let attempts = retry.attempts();
    let mut last_error = None;

    for attempt in 0..attempts {
        match connect(attempt).await {
            Ok(stream) => {
                if attempt > 0 {
                    tracing::info!(attempts = attempt + 1, "Connected after retrying");
                }
                return Ok(stream);
            }
            Err(e) => {
                if attempt + 1 < attempts {
                    let delay = retry.delay_for_attempt(attempt);
                    tracing::debug!(
                        attempt = attempt + 1,
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        "Connection attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                last_error = Some(e);
            }
        }
    }

    let reason = last_error.map(|e| e.to_string()).unwrap_or_default();
    Err(RunnerError::Connection(format!(
        "gave up after {attempts} attempts: {reason}"
    )))
}

/// Connect to the host named by `config`
pub async fn connect(config: &RunnerConfig) -> Result<TcpStream> {
    let address = config.address();
    tracing::info!(address = %address, "Connecting to host");
    let stream = establish_with(&config.retry, |_| TcpStream::connect(address.as_str())).await?;
    stream.set_nodelay(true)?;
    Ok(stream)
}
