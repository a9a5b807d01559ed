//! Integration setup with retry while the integration reports not-ready.

use std::time::Duration;

use solarhub_domain::error::SolarHubError;

use crate::ports::{Integration, IntegrationContext};

/// How the host retries an integration whose setup returned
/// [`SolarHubError::NotReady`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Wait before the second attempt.
    pub initial_delay: Duration,
    /// Upper bound for the doubling delay.
    pub max_delay: Duration,
    /// Give up after this many attempts; `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(30),
            max_delay: Duration::from_secs(180),
            max_attempts: None,
        }
    }
}

/// Run [`Integration::setup`] until it succeeds, fails with something other
/// than not-ready, or the attempt budget is exhausted.
///
/// # Errors
///
/// Returns the first non-[`NotReady`](SolarHubError::NotReady) error, or the
/// last `NotReady` once `max_attempts` is reached.
pub async fn setup_with_retry<I, C>(
    integration: &mut I,
    ctx: &C,
    policy: RetryPolicy,
) -> Result<(), SolarHubError>
where
    I: Integration,
    C: IntegrationContext,
{
    let mut delay = policy.initial_delay;
    let mut attempt: u32 = 1;

    loop {
        match integration.setup(ctx).await {
            Err(SolarHubError::NotReady(err)) => {
                if policy.max_attempts.is_some_and(|max| attempt >= max) {
                    tracing::error!(
                        integration = integration.name(),
                        attempts = attempt,
                        "integration still not ready, giving up"
                    );
                    return Err(err.into());
                }
                tracing::warn!(
                    integration = integration.name(),
                    %err,
                    attempt,
                    retry_in_secs = delay.as_secs(),
                    "integration not ready, retrying setup"
                );
                tokio::time::sleep(delay).await;
                delay = delay.saturating_mul(2).min(policy.max_delay);
                attempt += 1;
            }
            other => return other,
        }
    }
}
