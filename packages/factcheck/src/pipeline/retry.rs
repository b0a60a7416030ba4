//! Bounded retry with exponential backoff for external operator calls.

use std::future::Future;
use tokio::time::{sleep, timeout};
use tracing::{error, warn};

use crate::error::{FactCheckError, Location, Result, Stage};
use crate::types::config::RetryPolicy;

/// Run `op` until it succeeds or the policy's attempt budget is spent.
///
/// Each attempt is bounded by `call_timeout`; an elapsed deadline counts as a
/// retryable failure. Non-retryable errors stop immediately. The final error
/// is wrapped in [`FactCheckError::StageFailed`] with the stage and location.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    stage: Stage,
    location: Location,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempts = 0;

    loop {
        attempts += 1;

        let outcome = match policy.call_timeout {
            Some(deadline) => match timeout(deadline, op()).await {
                Ok(result) => result,
                Err(_) => Err(FactCheckError::Timeout(deadline)),
            },
            None => op().await,
        };

        match outcome {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempts < max_attempts => {
                let delay = policy.backoff(attempts);
                warn!(
                    error = %e,
                    stage = %stage,
                    %location,
                    retry = attempts,
                    max_attempts,
                    "Operator call failed, retrying..."
                );
                sleep(delay).await;
            }
            Err(e) => {
                error!(error = %e, stage = %stage, %location, attempts, "Operator call failed");
                return Err(FactCheckError::stage_failed(stage, location, attempts, e));
            }
        }
    }
}
