use std::future::Future;
use std::time::Duration;

use crate::error::HarvestError;

/// Configuration for the retry envelope (C2): a uniform exponential backoff
/// schedule with a success-threshold reset of the retry counter.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_factor: f64,
    pub success_threshold: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(30_000),
            backoff_factor: 2.0,
            success_threshold: 5,
        }
    }
}

/// Mutable counters carried across calls to [`with_retry`] so a long healthy run
/// can earn back its retry budget (P5).
#[derive(Debug, Clone, Default)]
pub struct RetryState {
    pub attempt: u32,
    pub consecutive_successes: u32,
    pub lifetime_retries: u32,
    pub last_error: Option<String>,
}

/// The sleep duration before attempt `attempt` (1-indexed), per P6:
/// `min(initial * factor^(attempt-1), max_delay)`.
pub fn backoff_delay(cfg: &RetryConfig, attempt: u32) -> Duration {
    let exp = attempt.saturating_sub(1);
    let factor = cfg.backoff_factor.powi(exp as i32);
    let millis = (cfg.initial_delay.as_millis() as f64) * factor;
    let capped = millis.min(cfg.max_delay.as_millis() as f64);
    Duration::from_millis(capped.max(0.0) as u64)
}

/// Runs `action` up to `cfg.max_attempts` times with exponential backoff between
/// failures, resetting the retry counter after `cfg.success_threshold` consecutive
/// successes.
///
/// `action` must be re-entrant: on retry it is invoked again from the top, so any
/// side effects it performs (state updates, row writes) must themselves be
/// idempotent against already-completed work.
pub async fn with_retry<F, Fut, T>(
    cfg: &RetryConfig,
    state: &mut RetryState,
    mut on_retry: impl FnMut(&RetryState),
    mut action: F,
) -> Result<T, HarvestError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, HarvestError>>,
{
    let mut attempt = 1;
    loop {
        match action().await {
            Ok(value) => {
                state.consecutive_successes += 1;
                if state.consecutive_successes >= cfg.success_threshold {
                    state.consecutive_successes = 0;
                    state.lifetime_retries = 0;
                }
                return Ok(value);
            }
            Err(err) => {
                state.consecutive_successes = 0;
                state.lifetime_retries += 1;
                state.last_error = Some(err.to_string());

                if attempt >= cfg.max_attempts {
                    return Err(HarvestError::RetryExhausted {
                        attempts: attempt,
                        last_error: err.to_string(),
                    });
                }

                state.attempt = attempt;
                on_retry(state);

                let delay = backoff_delay(cfg, attempt);
                tracing::warn!(
                    attempt,
                    max_attempts = cfg.max_attempts,
                    sleep_ms = delay.as_millis() as u64,
                    error = %err,
                    "action failed; retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[tokio::test]
    async fn succeeds_on_first_try() {
        let cfg = RetryConfig::default();
        let mut state = RetryState::default();
        let result: Result<u32, HarvestError> =
            with_retry(&cfg, &mut state, |_| {}, || async { Ok(42) }).await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(state.lifetime_retries, 0);
        assert_eq!(state.consecutive_successes, 1);
    }

    #[tokio::test]
    async fn retries_then_succeeds() {
        let cfg = RetryConfig {
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            ..RetryConfig::default()
        };
        let mut state = RetryState::default();
        let calls = RefCell::new(0);
        let result: Result<u32, HarvestError> = with_retry(
            &cfg,
            &mut state,
            |_| {},
            || {
                let mut c = calls.borrow_mut();
                *c += 1;
                let attempt = *c;
                async move {
                    if attempt < 3 {
                        Err(HarvestError::Transport("flaky".into()))
                    } else {
                        Ok(7)
                    }
                }
            },
        )
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(*calls.borrow(), 3);
        assert_eq!(state.lifetime_retries, 2);
    }

    #[tokio::test]
    async fn exhausts_after_max_attempts() {
        let cfg = RetryConfig {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            ..RetryConfig::default()
        };
        let mut state = RetryState::default();
        let result: Result<u32, HarvestError> = with_retry(
            &cfg,
            &mut state,
            |_| {},
            || async { Err(HarvestError::Transport("down".into())) },
        )
        .await;
        match result {
            Err(HarvestError::RetryExhausted { attempts, .. }) => assert_eq!(attempts, 3),
            other => panic!("expected RetryExhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn success_threshold_resets_counters() {
        let cfg = RetryConfig {
            success_threshold: 2,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            max_attempts: 10,
            ..RetryConfig::default()
        };
        let mut state = RetryState::default();

        // One failure then a success: lifetime_retries stays at 1 (threshold not
        // reached), consecutive_successes is 1.
        let calls = RefCell::new(0);
        let _: Result<u32, HarvestError> = with_retry(
            &cfg,
            &mut state,
            |_| {},
            || {
                let mut c = calls.borrow_mut();
                *c += 1;
                let attempt = *c;
                async move {
                    if attempt == 1 {
                        Err(HarvestError::Transport("blip".into()))
                    } else {
                        Ok(1)
                    }
                }
            },
        )
        .await;
        assert_eq!(state.lifetime_retries, 1);
        assert_eq!(state.consecutive_successes, 1);

        // A second consecutive success reaches success_threshold=2 and resets both.
        let _: Result<u32, HarvestError> =
            with_retry(&cfg, &mut state, |_| {}, || async { Ok(2) }).await;
        assert_eq!(state.lifetime_retries, 0);
        assert_eq!(state.consecutive_successes, 0);
    }

    #[test]
    fn backoff_is_bounded_and_geometric() {
        let cfg = RetryConfig {
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(30_000),
            backoff_factor: 2.0,
            ..RetryConfig::default()
        };
        assert_eq!(backoff_delay(&cfg, 1), Duration::from_millis(1000));
        assert_eq!(backoff_delay(&cfg, 2), Duration::from_millis(2000));
        assert_eq!(backoff_delay(&cfg, 3), Duration::from_millis(4000));
        assert_eq!(backoff_delay(&cfg, 10), Duration::from_millis(30_000));
    }
}
