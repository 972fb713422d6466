use crate::core::config::RetryPolicy;
use anyhow::Result;
use std::time::Duration;
use tracing::debug;

/// A delivered response and the number of sends it took.
#[derive(Debug)]
pub struct Delivered {
    pub response: reqwest::Response,
    pub attempts: u32,
}

/// Sends the request built by `build` until it is delivered or `policy`
/// runs out of retries.
///
/// Only transport failures are retried; any HTTP response, including an
/// error status, is handed back as is. The builder is called once per
/// attempt since a sent request cannot be reused.
pub async fn send_with_retry<F>(policy: RetryPolicy, mut build: F) -> Result<Delivered>
where
    F: FnMut() -> reqwest::RequestBuilder,
{
    let delay = Duration::from_millis(policy.delay_ms);
    let mut attempts = 0;
    loop {
        attempts += 1;
        match build().send().await {
            Ok(response) => return Ok(Delivered { response, attempts }),
            Err(err) if attempts > policy.retries => {
                return Err(anyhow::Error::from(err)
                    .context(format!("Gave up after {attempts} attempts")));
            }
            Err(err) => {
                debug!(attempts, retries = policy.retries, error = %err, "Send failed, retrying");
                tokio::time::sleep(delay).await;
            }
        }
    }
}
