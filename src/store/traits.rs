//! `ProfileStore` trait — the single async persistence interface.
//!
//! Every mutation is a closed, typed operation. There is no free-form
//! "set column X" entry point; callers cannot target arbitrary fields.

use async_trait::async_trait;

use crate::error::DatabaseError;
use crate::intake::model::{ChildIdentity, SubjectProfile};

/// Backend-agnostic store for subject profiles.
///
/// Each call is an independent durable write. There is no transaction
/// spanning calls and no versioning: concurrent writers for one identity
/// are last-write-wins, except where a setter's guard refuses to
/// overwrite an already-collected field.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch the profile for `identity`, creating it with defaults if absent.
    ///
    /// Returns `(profile, created)`. Calling this twice for a new identity
    /// creates exactly one record; the second call returns the stored one
    /// with `created == false`.
    async fn get_or_create(
        &self,
        identity: &str,
    ) -> Result<(SubjectProfile, bool), DatabaseError>;

    /// Fetch without creating.
    async fn find(&self, identity: &str) -> Result<Option<SubjectProfile>, DatabaseError>;

    /// Store name and age and advance to awaiting accepted foods.
    ///
    /// No-op (returns `false`) if an age is already stored.
    async fn set_child_identity(
        &self,
        identity: &str,
        child: &ChildIdentity,
    ) -> Result<bool, DatabaseError>;

    /// Store the accepted foods list and advance to awaiting rejected foods.
    ///
    /// No-op (returns `false`) if the list is already set for this cycle.
    async fn set_accepted_foods(&self, identity: &str, foods: &str)
    -> Result<bool, DatabaseError>;

    /// Store the rejected foods list and advance to ready.
    ///
    /// No-op (returns `false`) if the list is already set for this cycle.
    async fn set_rejected_foods(&self, identity: &str, foods: &str)
    -> Result<bool, DatabaseError>;

    /// Clear both food lists and return to awaiting accepted foods.
    ///
    /// Only valid once identity is collected; returns `false` otherwise.
    async fn restart_food_cycle(&self, identity: &str) -> Result<bool, DatabaseError>;

    /// Charge one trial generation if the subject is on trial and below `limit`.
    ///
    /// Returns the new count, or `None` if nothing was charged.
    async fn increment_trial(&self, identity: &str, limit: u32)
    -> Result<Option<u32>, DatabaseError>;

    /// Mark the subject as subscribed.
    ///
    /// `subscribed_at` is written only on the first activation.
    async fn activate_subscription(
        &self,
        identity: &str,
        email: &str,
    ) -> Result<SubjectProfile, DatabaseError>;
}
