// src/alerts/registry.rs
//
// Owns the set of currently-visible sign alerts and their expiry deadlines.
// One active alert per display label; re-detection extends the deadline
// instead of creating a duplicate.

use crate::catalog::SignDefinition;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// Outcome of submitting a detected sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// No alert existed for this label; caller should render and speak.
    New,
    /// Alert already visible; its deadline was extended, nothing else changes.
    Refreshed,
}

/// A currently-displayed sign alert, keyed by display label.
#[derive(Debug, Clone)]
pub struct ActiveAlert {
    pub sign: &'static SignDefinition,
    pub created_at: Instant,
    pub expires_at: Instant,
}

pub struct AlertRegistry {
    active: HashMap<&'static str, ActiveAlert>,
    default_hold: Duration,
}

impl AlertRegistry {
    pub fn new(default_hold: Duration) -> Self {
        Self {
            active: HashMap::new(),
            default_hold,
        }
    }

    fn hold_for(&self, sign: &SignDefinition) -> Duration {
        sign.hold_override.unwrap_or(self.default_hold)
    }

    /// Register a detection of `sign` at `now`.
    ///
    /// The deadline is overwritten in place on refresh, so a refresh always
    /// wins over an expiry observed later in the same reaction cycle. The
    /// caller owns the registry exclusively; no expiry can fire between the
    /// lookup and the write.
    pub fn submit(&mut self, sign: &'static SignDefinition, now: Instant) -> SubmitOutcome {
        let expires_at = now + self.hold_for(sign);

        match self.active.get_mut(sign.label) {
            Some(alert) => {
                alert.expires_at = expires_at;
                debug!("Alert refreshed: {}", sign.label);
                SubmitOutcome::Refreshed
            }
            None => {
                self.active.insert(
                    sign.label,
                    ActiveAlert {
                        sign,
                        created_at: now,
                        expires_at,
                    },
                );
                debug!("Alert created: {}", sign.label);
                SubmitOutcome::New
            }
        }
    }

    /// Remove and return every alert whose deadline has elapsed.
    pub fn purge_expired(&mut self, now: Instant) -> Vec<ActiveAlert> {
        let expired: Vec<&'static str> = self
            .active
            .iter()
            .filter(|(_, alert)| alert.expires_at <= now)
            .map(|(label, _)| *label)
            .collect();

        expired
            .into_iter()
            .filter_map(|label| self.active.remove(label))
            .collect()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.active.contains_key(label)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SignCatalog;

    fn sign(catalog: &SignCatalog, class: &str) -> &'static crate::catalog::SignDefinition {
        catalog.lookup(class).unwrap()
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_first_submit_is_new_second_is_refresh() {
        let catalog = SignCatalog::new();
        let mut registry = AlertRegistry::new(ms(10_000));
        let t0 = Instant::now();

        let s = sign(&catalog, "speed50km");
        assert_eq!(registry.submit(s, t0), SubmitOutcome::New);
        assert_eq!(registry.submit(s, t0), SubmitOutcome::Refreshed);
        assert_eq!(registry.active_count(), 1);
    }

    #[test]
    fn test_one_alert_per_label_across_many_submits() {
        let catalog = SignCatalog::new();
        let mut registry = AlertRegistry::new(ms(10_000));
        let t0 = Instant::now();

        let s = sign(&catalog, "roadworks");
        let mut new_count = 0;
        for i in 0..20 {
            if registry.submit(s, t0 + ms(i * 100)) == SubmitOutcome::New {
                new_count += 1;
            }
        }
        assert_eq!(new_count, 1);
        assert_eq!(registry.active_count(), 1);
    }

    #[test]
    fn test_distinct_labels_coexist() {
        let catalog = SignCatalog::new();
        let mut registry = AlertRegistry::new(ms(10_000));
        let t0 = Instant::now();

        assert_eq!(registry.submit(sign(&catalog, "speed50km"), t0), SubmitOutcome::New);
        assert_eq!(registry.submit(sign(&catalog, "dangerous"), t0), SubmitOutcome::New);
        assert_eq!(registry.active_count(), 2);
        assert!(registry.contains("前方限速50公里"));
        assert!(registry.contains("危險"));
    }

    #[test]
    fn test_alert_expires_after_hold_duration() {
        let catalog = SignCatalog::new();
        let mut registry = AlertRegistry::new(ms(10_000));
        let t0 = Instant::now();

        registry.submit(sign(&catalog, "speed50km"), t0);

        assert!(registry.purge_expired(t0 + ms(9_999)).is_empty());
        let removed = registry.purge_expired(t0 + ms(10_000));
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].sign.label, "前方限速50公里");
        assert_eq!(registry.active_count(), 0);
    }

    #[test]
    fn test_refresh_extends_deadline_from_last_refresh() {
        let catalog = SignCatalog::new();
        let mut registry = AlertRegistry::new(ms(10_000));
        let t0 = Instant::now();
        let s = sign(&catalog, "speed50km");

        registry.submit(s, t0);
        registry.submit(s, t0 + ms(9_000));

        // Original deadline (t0+10s) must not fire.
        assert!(registry.purge_expired(t0 + ms(10_500)).is_empty());
        assert!(registry.contains("前方限速50公里"));

        // Expires 10s after the last refresh.
        let removed = registry.purge_expired(t0 + ms(19_100));
        assert_eq!(removed.len(), 1);
        assert!(!registry.contains("前方限速50公里"));
    }

    #[test]
    fn test_resubmit_after_expiry_is_new_again() {
        let catalog = SignCatalog::new();
        let mut registry = AlertRegistry::new(ms(10_000));
        let t0 = Instant::now();
        let s = sign(&catalog, "roadworks");

        registry.submit(s, t0);
        registry.purge_expired(t0 + ms(10_000));
        assert_eq!(registry.submit(s, t0 + ms(11_000)), SubmitOutcome::New);
    }

    #[test]
    fn test_purge_only_removes_elapsed_alerts() {
        let catalog = SignCatalog::new();
        let mut registry = AlertRegistry::new(ms(10_000));
        let t0 = Instant::now();

        registry.submit(sign(&catalog, "speed50km"), t0);
        registry.submit(sign(&catalog, "dangerous"), t0 + ms(5_000));

        let removed = registry.purge_expired(t0 + ms(10_000));
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].sign.label, "前方限速50公里");
        assert!(registry.contains("危險"));
    }
}
