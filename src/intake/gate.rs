//! Usage gate — trial quota and subscription check.

use std::sync::Arc;

use crate::error::DatabaseError;
use crate::store::ProfileStore;

use super::model::SubjectProfile;

/// Outcome of a gate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Subscribers are always permitted; nothing is charged.
    Subscribed,
    /// A trial slot was charged.
    TrialConsumed { used: u32, remaining: u32 },
    /// Trial quota already used up; nothing was charged.
    QuotaExhausted { used: u32 },
}

impl GateDecision {
    pub fn permitted(&self) -> bool {
        !matches!(self, Self::QuotaExhausted { .. })
    }
}

/// Decides whether a generation may run and charges the trial counter.
///
/// The charge is written before generation runs and is not refunded if
/// generation then fails.
pub struct UsageGate {
    store: Arc<dyn ProfileStore>,
    trial_limit: u32,
}

impl UsageGate {
    pub fn new(store: Arc<dyn ProfileStore>, trial_limit: u32) -> Self {
        Self { store, trial_limit }
    }

    pub fn trial_limit(&self) -> u32 {
        self.trial_limit
    }

    /// Check `profile` and, for permitted trials, persist one charge.
    pub async fn check_and_consume(
        &self,
        profile: &SubjectProfile,
    ) -> Result<GateDecision, DatabaseError> {
        if profile.is_subscribed() {
            return Ok(GateDecision::Subscribed);
        }

        if profile.trial_usage_count >= self.trial_limit {
            tracing::info!(
                identity = %profile.identity,
                used = profile.trial_usage_count,
                "Trial quota exhausted"
            );
            return Ok(GateDecision::QuotaExhausted {
                used: profile.trial_usage_count,
            });
        }

        match self
            .store
            .increment_trial(&profile.identity, self.trial_limit)
            .await?
        {
            Some(used) => {
                tracing::debug!(identity = %profile.identity, used, "Trial generation charged");
                Ok(GateDecision::TrialConsumed {
                    used,
                    remaining: self.trial_limit.saturating_sub(used),
                })
            }
            None => {
                // The stored record moved on since `profile` was read.
                let current = self.store.find(&profile.identity).await?;
                match current {
                    Some(p) if p.is_subscribed() => Ok(GateDecision::Subscribed),
                    Some(p) => Ok(GateDecision::QuotaExhausted {
                        used: p.trial_usage_count,
                    }),
                    None => Err(DatabaseError::NotFound {
                        entity: "subject_profile".into(),
                        id: profile.identity.clone(),
                    }),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LibSqlBackend;

    async fn setup(limit: u32) -> (Arc<LibSqlBackend>, UsageGate) {
        let store = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        let gate = UsageGate::new(store.clone(), limit);
        (store, gate)
    }

    #[tokio::test]
    async fn trial_is_charged_until_limit() {
        let (store, gate) = setup(3).await;
        store.get_or_create("1").await.unwrap();

        for expected in 1..=3u32 {
            let profile = store.find("1").await.unwrap().unwrap();
            let decision = gate.check_and_consume(&profile).await.unwrap();
            assert_eq!(
                decision,
                GateDecision::TrialConsumed {
                    used: expected,
                    remaining: 3 - expected
                }
            );
            assert!(decision.permitted());
        }

        let profile = store.find("1").await.unwrap().unwrap();
        let decision = gate.check_and_consume(&profile).await.unwrap();
        assert_eq!(decision, GateDecision::QuotaExhausted { used: 3 });
        assert!(!decision.permitted());
        assert_eq!(store.find("1").await.unwrap().unwrap().trial_usage_count, 3);
    }

    #[tokio::test]
    async fn subscribers_are_never_charged() {
        let (store, gate) = setup(3).await;
        store.get_or_create("1").await.unwrap();
        for _ in 0..3 {
            store.increment_trial("1", 3).await.unwrap();
        }
        store.activate_subscription("1", "a@b.com").await.unwrap();

        for _ in 0..5 {
            let profile = store.find("1").await.unwrap().unwrap();
            let decision = gate.check_and_consume(&profile).await.unwrap();
            assert_eq!(decision, GateDecision::Subscribed);
        }
        assert_eq!(store.find("1").await.unwrap().unwrap().trial_usage_count, 3);
    }

    #[tokio::test]
    async fn stale_snapshot_does_not_overcharge() {
        let (store, gate) = setup(1).await;
        let (stale, _) = store.get_or_create("1").await.unwrap();

        assert!(gate.check_and_consume(&stale).await.unwrap().permitted());
        // Same stale snapshot replayed (duplicate inbound event).
        let decision = gate.check_and_consume(&stale).await.unwrap();
        assert_eq!(decision, GateDecision::QuotaExhausted { used: 1 });
        assert_eq!(store.find("1").await.unwrap().unwrap().trial_usage_count, 1);
    }

    #[tokio::test]
    async fn stale_snapshot_sees_activation() {
        let (store, gate) = setup(1).await;
        let (stale, _) = store.get_or_create("1").await.unwrap();
        store.increment_trial("1", 1).await.unwrap();
        store.activate_subscription("1", "a@b.com").await.unwrap();

        let decision = gate.check_and_consume(&stale).await.unwrap();
        assert_eq!(decision, GateDecision::Subscribed);
    }
}
