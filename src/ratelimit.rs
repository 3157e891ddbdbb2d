//! Rate-limit governor (C3): turns a raw [`RateLimitProbe`](crate::client::RateLimitProbe)
//! into a directive the engine can act on. A probe with either quota at zero
//! pauses; an `Error`-classified probe only escalates to fatal once it has
//! paused more than `max_consecutive_pauses` times in a row.

use std::time::Duration;

use crate::client::{RateLimitClass, RateLimitProbe};

#[derive(Debug, Clone, Copy)]
pub struct GovernorConfig {
    /// How long to sleep when pausing.
    pub pause_duration: Duration,
    /// Consecutive pauses allowed before an `Error`-classified probe escalates
    /// to fatal.
    pub max_consecutive_pauses: u32,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            pause_duration: Duration::from_secs(60),
            max_consecutive_pauses: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GovernorDirective {
    Continue,
    Pause { retry_after: Duration },
    Fatal(String),
}

#[derive(Debug, Default)]
pub struct RateLimitGovernor {
    consecutive_pauses: u32,
}

impl RateLimitGovernor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluates a probe result against `cfg` and returns the directive the
    /// engine should follow before issuing its next remote request.
    pub fn evaluate(&mut self, cfg: &GovernorConfig, probe: &RateLimitProbe) -> GovernorDirective {
        let low = probe.graphql_remaining == 0 || probe.rest_remaining == 0;
        if !low {
            self.consecutive_pauses = 0;
            tracing::debug!(
                graphql_remaining = probe.graphql_remaining,
                rest_remaining = probe.rest_remaining,
                "rate limit quota healthy"
            );
            return GovernorDirective::Continue;
        }

        self.consecutive_pauses += 1;

        if probe.classification == RateLimitClass::Error
            && self.consecutive_pauses > cfg.max_consecutive_pauses
        {
            return GovernorDirective::Fatal(format!(
                "rate limit probe errored for {} consecutive pauses: {}",
                self.consecutive_pauses, probe.message
            ));
        }

        tracing::warn!(
            graphql_remaining = probe.graphql_remaining,
            rest_remaining = probe.rest_remaining,
            consecutive_pauses = self.consecutive_pauses,
            "rate limit exhausted; pausing"
        );

        GovernorDirective::Pause {
            retry_after: cfg.pause_duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe(graphql: i64, rest: i64) -> RateLimitProbe {
        RateLimitProbe {
            graphql_remaining: graphql,
            rest_remaining: rest,
            message: "ok".to_string(),
            classification: RateLimitClass::Info,
        }
    }

    fn error_probe() -> RateLimitProbe {
        RateLimitProbe {
            graphql_remaining: 0,
            rest_remaining: 0,
            message: "probe failed".to_string(),
            classification: RateLimitClass::Error,
        }
    }

    #[test]
    fn continues_when_quota_healthy() {
        let mut gov = RateLimitGovernor::new();
        let cfg = GovernorConfig::default();
        assert_eq!(gov.evaluate(&cfg, &probe(5000, 4000)), GovernorDirective::Continue);
    }

    #[test]
    fn pauses_when_either_quota_hits_zero() {
        let mut gov = RateLimitGovernor::new();
        let cfg = GovernorConfig::default();
        assert!(matches!(gov.evaluate(&cfg, &probe(0, 4000)), GovernorDirective::Pause { .. }));
        assert!(matches!(gov.evaluate(&cfg, &probe(4000, 0)), GovernorDirective::Pause { .. }));
    }

    #[test]
    fn nonzero_remaining_below_an_arbitrary_threshold_still_continues() {
        // Only an exact-zero remaining counts as exhausted; there is no
        // configurable floor above zero.
        let mut gov = RateLimitGovernor::new();
        let cfg = GovernorConfig::default();
        assert_eq!(gov.evaluate(&cfg, &probe(1, 1)), GovernorDirective::Continue);
    }

    #[test]
    fn non_error_classification_never_escalates_to_fatal() {
        let mut gov = RateLimitGovernor::new();
        let cfg = GovernorConfig {
            max_consecutive_pauses: 2,
            ..GovernorConfig::default()
        };
        let low = probe(0, 0);
        for _ in 0..10 {
            assert!(matches!(gov.evaluate(&cfg, &low), GovernorDirective::Pause { .. }));
        }
    }

    #[test]
    fn error_classification_goes_fatal_only_after_the_cap_is_exceeded() {
        let mut gov = RateLimitGovernor::new();
        let cfg = GovernorConfig {
            max_consecutive_pauses: 2,
            ..GovernorConfig::default()
        };
        let err = error_probe();
        assert!(matches!(gov.evaluate(&cfg, &err), GovernorDirective::Pause { .. }));
        assert!(matches!(gov.evaluate(&cfg, &err), GovernorDirective::Pause { .. }));
        assert!(matches!(gov.evaluate(&cfg, &err), GovernorDirective::Fatal(_)));
    }

    #[test]
    fn recovers_after_a_healthy_probe() {
        let mut gov = RateLimitGovernor::new();
        let cfg = GovernorConfig::default();
        let low = probe(0, 0);
        let healthy = probe(5000, 5000);
        assert!(matches!(gov.evaluate(&cfg, &low), GovernorDirective::Pause { .. }));
        assert_eq!(gov.evaluate(&cfg, &healthy), GovernorDirective::Continue);
        assert!(matches!(gov.evaluate(&cfg, &low), GovernorDirective::Pause { .. }));
    }
}
