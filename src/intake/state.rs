//! Intake phase — which attribute the conversation is currently collecting.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The phases of the intake conversation.
///
/// Progresses linearly: AwaitingIdentity → AwaitingAcceptedFoods →
/// AwaitingRejectedFoods → Ready. A new food collection cycle moves
/// Ready back to AwaitingAcceptedFoods; identity is never collected twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntakePhase {
    #[default]
    AwaitingIdentity,
    AwaitingAcceptedFoods,
    AwaitingRejectedFoods,
    Ready,
}

impl IntakePhase {
    /// The forward phase reached after this phase's attribute is collected.
    pub fn next(&self) -> Option<IntakePhase> {
        use IntakePhase::*;
        match self {
            AwaitingIdentity => Some(AwaitingAcceptedFoods),
            AwaitingAcceptedFoods => Some(AwaitingRejectedFoods),
            AwaitingRejectedFoods => Some(Ready),
            Ready => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingIdentity => "awaiting_identity",
            Self::AwaitingAcceptedFoods => "awaiting_accepted_foods",
            Self::AwaitingRejectedFoods => "awaiting_rejected_foods",
            Self::Ready => "ready",
        }
    }
}

impl std::fmt::Display for IntakePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntakePhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "awaiting_identity" => Ok(Self::AwaitingIdentity),
            "awaiting_accepted_foods" => Ok(Self::AwaitingAcceptedFoods),
            "awaiting_rejected_foods" => Ok(Self::AwaitingRejectedFoods),
            "ready" => Ok(Self::Ready),
            other => Err(format!("unknown intake phase: {other}")),
        }
    }
}
