//! Intake conversation: profile model, phases, parsing, gating and routing.

pub mod engine;
pub mod gate;
pub mod messages;
pub mod model;
pub mod parse;
pub mod router;
pub mod routes;
pub mod state;

pub use engine::IntakeEngine;
pub use gate::{GateDecision, UsageGate};
pub use model::{ChildIdentity, SubjectProfile, SubscriptionStatus};
pub use router::{Intent, IntentParser};
pub use routes::{StatusRouteState, status_routes};
pub use state::IntakePhase;
