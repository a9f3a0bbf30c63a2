//! Intake engine — one inbound line in, ordered replies out.
//!
//! The conversation phase is read from the stored profile and each phase
//! has its own handler. Field writes go through the store's typed setters,
//! which also advance the phase.

use std::sync::Arc;

use crate::channels::{IncomingMessage, OutgoingResponse};
use crate::config::SubscriptionOffer;
use crate::error::DatabaseError;
use crate::llm::TextGenerator;
use crate::recipes::RecipeGenerator;
use crate::store::ProfileStore;

use super::gate::{GateDecision, UsageGate};
use super::messages;
use super::model::SubjectProfile;
use super::parse::{IdentityParse, looks_like_email, parse_identity};
use super::router::{Intent, IntentParser, is_generation_keyword};
use super::state::IntakePhase;

/// Which turn a generation belongs to. Only affects reply wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GenerationTurn {
    /// The turn that completed the food lists.
    FoodListsComplete,
    /// A "mais" request from the ready phase.
    More,
}

/// Drives the intake conversation for every subject.
pub struct IntakeEngine {
    store: Arc<dyn ProfileStore>,
    gate: UsageGate,
    recipes: RecipeGenerator,
    offer: SubscriptionOffer,
}

impl IntakeEngine {
    pub fn new(
        store: Arc<dyn ProfileStore>,
        llm: Arc<dyn TextGenerator>,
        offer: SubscriptionOffer,
        trial_limit: u32,
    ) -> Self {
        Self {
            gate: UsageGate::new(Arc::clone(&store), trial_limit),
            store,
            recipes: RecipeGenerator::new(llm),
            offer,
        }
    }

    /// Handle one inbound line.
    ///
    /// Input problems become replies. Only persistence failures are errors.
    pub async fn handle(
        &self,
        msg: &IncomingMessage,
    ) -> Result<Vec<OutgoingResponse>, DatabaseError> {
        let intent = IntentParser::parse(&msg.content);
        let (profile, created) = self.store.get_or_create(&msg.user_id).await?;
        if created {
            tracing::info!(identity = %profile.identity, channel = %msg.channel, "New subject profile");
        }

        tracing::debug!(
            identity = %profile.identity,
            phase = %profile.phase,
            ?intent,
            "Routing inbound line"
        );

        let limit = self.gate.trial_limit();
        let replies = match intent {
            Intent::Start => {
                let user_name = msg.user_name.as_deref().unwrap_or("família");
                vec![messages::welcome(user_name, &self.offer, limit)]
            }
            Intent::Status => vec![messages::status(&profile, limit)],
            Intent::Subscribe => vec![messages::subscribe_pitch(&self.offer)],
            Intent::Activate { email } => match email.filter(|e| looks_like_email(e)) {
                Some(email) => {
                    self.activate(&profile, &email).await?;
                    vec![messages::activated()]
                }
                None => vec![messages::activation_usage()],
            },
            Intent::Help => vec![messages::help(&self.offer)],
            Intent::GenerateMenu => match profile.child_name {
                None => vec![messages::ask_identity()],
                Some(_) => vec![messages::generate_menu(&profile)],
            },
            Intent::NewCycle => {
                if self.store.restart_food_cycle(&profile.identity).await? {
                    tracing::info!(identity = %profile.identity, "Food collection cycle restarted");
                    vec![messages::new_cycle(profile.child_label())]
                } else {
                    vec![messages::ask_identity()]
                }
            }
            Intent::UnknownCommand(_) => vec![messages::unrecognized()],
            Intent::Text(text) => match profile.phase {
                IntakePhase::AwaitingIdentity => self.on_awaiting_identity(&profile, &text).await?,
                IntakePhase::AwaitingAcceptedFoods => {
                    self.on_awaiting_accepted(&profile, &text).await?
                }
                IntakePhase::AwaitingRejectedFoods => {
                    self.on_awaiting_rejected(profile, &text).await?
                }
                IntakePhase::Ready => self.on_ready(&profile, &text).await?,
            },
        };

        Ok(replies)
    }

    // ── Phase handlers ──────────────────────────────────────────────

    async fn on_awaiting_identity(
        &self,
        profile: &SubjectProfile,
        text: &str,
    ) -> Result<Vec<OutgoingResponse>, DatabaseError> {
        if is_generation_keyword(text) {
            return Ok(vec![messages::setup_first()]);
        }
        match parse_identity(text) {
            IdentityParse::Parsed(child) => {
                if self
                    .store
                    .set_child_identity(&profile.identity, &child)
                    .await?
                {
                    tracing::info!(identity = %profile.identity, age = child.age, "Child identity collected");
                    Ok(vec![messages::ask_accepted_foods(&child.name)])
                } else {
                    self.reprompt(&profile.identity).await
                }
            }
            IdentityParse::AgeOutOfRange { age } => {
                tracing::debug!(identity = %profile.identity, age, "Unsupported child age");
                Ok(vec![messages::age_out_of_range()])
            }
            // An identity line wins over any email-shaped token inside it.
            IdentityParse::Malformed if looks_like_email(text) => {
                let updated = self.activate(profile, text).await?;
                Ok(vec![messages::activated_inline(&updated)])
            }
            IdentityParse::Malformed => Ok(vec![messages::identity_format_error()]),
        }
    }

    async fn on_awaiting_accepted(
        &self,
        profile: &SubjectProfile,
        text: &str,
    ) -> Result<Vec<OutgoingResponse>, DatabaseError> {
        if text.is_empty() {
            return Ok(vec![messages::food_list_required(profile.child_label(), true)]);
        }

        if self.store.set_accepted_foods(&profile.identity, text).await? {
            Ok(vec![messages::ask_rejected_foods(profile.child_label())])
        } else {
            self.reprompt(&profile.identity).await
        }
    }

    async fn on_awaiting_rejected(
        &self,
        mut profile: SubjectProfile,
        text: &str,
    ) -> Result<Vec<OutgoingResponse>, DatabaseError> {
        if text.is_empty() {
            return Ok(vec![messages::food_list_required(profile.child_label(), false)]);
        }

        if !self.store.set_rejected_foods(&profile.identity, text).await? {
            return self.reprompt(&profile.identity).await;
        }

        profile.rejected_foods = Some(text.to_string());
        profile.phase = IntakePhase::Ready;
        self.run_generation(&profile, GenerationTurn::FoodListsComplete)
            .await
    }

    async fn on_ready(
        &self,
        profile: &SubjectProfile,
        text: &str,
    ) -> Result<Vec<OutgoingResponse>, DatabaseError> {
        if is_generation_keyword(text) {
            return self.run_generation(profile, GenerationTurn::More).await;
        }
        if looks_like_email(text) {
            let updated = self.activate(profile, text).await?;
            return Ok(vec![messages::activated_inline(&updated)]);
        }
        Ok(vec![messages::unrecognized()])
    }

    // ── Shared steps ────────────────────────────────────────────────

    /// Gate, then generate. The trial charge is not refunded on failure.
    async fn run_generation(
        &self,
        profile: &SubjectProfile,
        turn: GenerationTurn,
    ) -> Result<Vec<OutgoingResponse>, DatabaseError> {
        let limit = self.gate.trial_limit();
        let decision = self.gate.check_and_consume(profile).await?;

        if !decision.permitted() {
            return Ok(vec![match turn {
                GenerationTurn::FoodListsComplete => messages::quota_exhausted(&self.offer, limit),
                GenerationTurn::More => messages::quota_exhausted_short(&self.offer),
            }]);
        }

        let notice = match turn {
            GenerationTurn::FoodListsComplete => messages::preparing_recipes(profile.child_label()),
            GenerationTurn::More => messages::generating_more(),
        };
        let text = self.recipes.generate(profile).await;

        let follow_up = match decision {
            GateDecision::TrialConsumed { remaining, .. } if remaining > 0 => {
                messages::trial_remaining(remaining, limit)
            }
            GateDecision::TrialConsumed { .. } => messages::last_free_recipe(),
            _ => messages::subscriber_more_hint(),
        };

        Ok(vec![notice, messages::recipes(text), follow_up])
    }

    /// Mark the subject as subscribed. No payment check is made.
    async fn activate(
        &self,
        profile: &SubjectProfile,
        email: &str,
    ) -> Result<SubjectProfile, DatabaseError> {
        let email = email.trim();
        let updated = self
            .store
            .activate_subscription(&profile.identity, email)
            .await?;
        tracing::warn!(
            identity = %profile.identity,
            email = %email,
            "Subscription activated on unverified email"
        );
        Ok(updated)
    }

    /// Re-read the profile and prompt for whatever its phase now needs.
    ///
    /// Used when a guarded setter refused a write, which means another
    /// event for the same identity got there first.
    async fn reprompt(&self, identity: &str) -> Result<Vec<OutgoingResponse>, DatabaseError> {
        let profile = self
            .store
            .find(identity)
            .await?
            .ok_or_else(|| DatabaseError::NotFound {
                entity: "subject_profile".into(),
                id: identity.to_string(),
            })?;

        tracing::debug!(identity, phase = %profile.phase, "Setter refused, re-prompting");

        let reply = match profile.phase {
            IntakePhase::AwaitingIdentity => messages::ask_identity(),
            IntakePhase::AwaitingAcceptedFoods => {
                messages::food_list_required(profile.child_label(), true)
            }
            IntakePhase::AwaitingRejectedFoods => {
                messages::food_list_required(profile.child_label(), false)
            }
            IntakePhase::Ready => messages::generate_menu(&profile),
        };
        Ok(vec![reply])
    }
}
