use std::fmt::Display;

use argent_dns_domain::BindRetryConfig;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Runs `bind` under the configured retry policy. Disabled retry means a
/// single attempt whose result is returned unchanged. Enabled retry sleeps a
/// constant interval between attempts, up to `count` retries after the first
/// attempt, and returns the last error on exhaustion.
///
/// This exists for hosts where the network stack is not yet up when the
/// service starts. Cancelling `cancel` during a wait aborts the loop and
/// returns the most recent bind error.
pub async fn bind_with_retry<T, E, F>(
    mut bind: F,
    config: &BindRetryConfig,
    cancel: &CancellationToken,
) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
    E: Display,
{
    if !config.enabled {
        return bind();
    }

    let mut last = match bind() {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    for attempt in 1..=config.count {
        warn!(attempt, interval_ms = config.interval_ms, error = %last, "Bind failed, retrying");

        tokio::select! {
            _ = cancel.cancelled() => {
                warn!("Bind retry cancelled");
                return Err(last);
            }
            _ = tokio::time::sleep(config.interval()) => {}
        }

        match bind() {
            Ok(value) => {
                info!(attempt, "Bind succeeded after retry");
                return Ok(value);
            }
            Err(e) => last = e,
        }
    }

    Err(last)
}
