use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::api::ApiError;
use crate::timeouts::{OpContext, Phase};

/// Poll cadence for instance power-state transitions.
pub const INSTANCE_STATE_INTERVAL: Duration = Duration::from_secs(1);

/// Poll cadence for short transitions.
pub const SHORT_TRANSITION_INTERVAL: Duration = Duration::from_millis(100);

// ─── Wait Outcomes ──────────────────────────────────────────────────────────

/// How a wait finished, other than by error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The target state was observed.
    Reached,
    /// The resource vanished mid-wait. The caller decides what that means:
    /// a delete may accept it, a stop-before-mutate must not.
    NotFound,
}

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum WaitError {
    #[error(
        "timed out during {phase} waiting for state \"{target}\"; last observed state \"{last}\""
    )]
    Timeout {
        phase: Phase,
        target: String,
        last: String,
    },

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Poll `fetch` until it reports `target`, bounded by the phase deadline.
///
/// The deadline is observed before every fetch and the final sleep never
/// overshoots it, so no poll outlives the handler's phase.
pub async fn wait_for_state<F, Fut>(
    ctx: &OpContext,
    target: &str,
    interval: Duration,
    mut fetch: F,
) -> Result<WaitOutcome, WaitError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = crate::api::Result<String>>,
{
    let mut last = String::from("unknown");

    loop {
        if ctx.check().is_err() {
            return Err(WaitError::Timeout {
                phase: ctx.phase(),
                target: target.to_string(),
                last,
            });
        }

        match fetch().await {
            Ok(state) => {
                if state == target {
                    debug!(target, "target state reached");
                    return Ok(WaitOutcome::Reached);
                }
                debug!(observed = %state, target, "still waiting");
                last = state;
            }
            Err(e) if e.is_not_found() => return Ok(WaitOutcome::NotFound),
            Err(e) => return Err(WaitError::Api(e)),
        }

        let remaining = ctx.remaining();
        if remaining.is_zero() {
            return Err(WaitError::Timeout {
                phase: ctx.phase(),
                target: target.to_string(),
                last,
            });
        }
        tokio::time::sleep(interval.min(remaining)).await;
    }
}
