//! Subject profile and related data models.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::state::IntakePhase;

/// Youngest supported child age, in years.
pub const MIN_CHILD_AGE: u8 = 2;
/// Oldest supported child age, in years.
pub const MAX_CHILD_AGE: u8 = 5;

/// Usage tier of a subject.
///
/// `Trial → Subscribed` is one-way; no downgrade is modeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    #[default]
    Trial,
    Subscribed,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trial => "trial",
            Self::Subscribed => "subscribed",
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trial" => Ok(Self::Trial),
            // "pro" is what older deployments wrote on activation.
            "subscribed" | "pro" => Ok(Self::Subscribed),
            other => Err(format!("unknown subscription status: {other}")),
        }
    }
}

/// Name and age of the monitored child, as collected in one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildIdentity {
    pub name: String,
    pub age: u8,
}

impl ChildIdentity {
    /// Whether `age` falls inside the supported range.
    pub fn age_supported(age: u32) -> bool {
        (u32::from(MIN_CHILD_AGE)..=u32::from(MAX_CHILD_AGE)).contains(&age)
    }
}

/// One persisted record per end user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectProfile {
    pub id: Uuid,
    /// Stable external user identifier (Telegram user id, "local-user" on CLI).
    pub identity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_age: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted_foods: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_foods: Option<String>,
    pub phase: IntakePhase,
    pub status: SubscriptionStatus,
    pub trial_usage_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscribed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activation_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubjectProfile {
    /// A fresh record with defaults, as created on first contact.
    pub fn new(identity: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            identity: identity.into(),
            child_name: None,
            child_age: None,
            accepted_foods: None,
            rejected_foods: None,
            phase: IntakePhase::default(),
            status: SubscriptionStatus::default(),
            trial_usage_count: 0,
            subscribed_at: None,
            activation_email: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.status == SubscriptionStatus::Subscribed
    }

    /// Trial generations left under `limit`. Zero for exhausted trials.
    pub fn trial_remaining(&self, limit: u32) -> u32 {
        limit.saturating_sub(self.trial_usage_count)
    }

    /// The child name, or a neutral placeholder when not yet collected.
    pub fn child_label(&self) -> &str {
        self.child_name.as_deref().unwrap_or("seu pequeno(a)")
    }
}
