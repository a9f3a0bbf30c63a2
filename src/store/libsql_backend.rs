//! libSQL backend — async `ProfileStore` implementation.
//!
//! Supports local file and in-memory databases.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::intake::model::{ChildIdentity, SubjectProfile, SubscriptionStatus};
use crate::intake::state::IntakePhase;
use crate::store::migrations;
use crate::store::traits::ProfileStore;

/// Column order read by `row_to_profile`.
const PROFILE_COLUMNS: &str = "id, identity, child_name, child_age, accepted_foods, \
     rejected_foods, phase, status, trial_usage_count, subscribed_at, activation_email, \
     created_at, updated_at";

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let backend = Self::from_database(db)?;
        migrations::run_migrations(backend.conn()).await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let backend = Self::from_database(db)?;
        migrations::run_migrations(backend.conn()).await?;
        Ok(backend)
    }

    fn from_database(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

/// Phase strings `(from, to)` for the forward step out of `from`.
fn forward_step(from: IntakePhase) -> (&'static str, &'static str) {
    let to = from.next().unwrap_or(from);
    (from.as_str(), to.as_str())
}

/// Map a libsql Row (in `PROFILE_COLUMNS` order) to a SubjectProfile.
fn row_to_profile(row: &libsql::Row) -> Result<SubjectProfile, DatabaseError> {
    let read = |e: libsql::Error| DatabaseError::Query(format!("row_to_profile: {e}"));

    let id_str: String = row.get(0).map_err(read)?;
    let identity: String = row.get(1).map_err(read)?;
    let child_name: Option<String> = row.get(2).ok();
    let child_age: Option<i64> = row.get(3).ok();
    let accepted_foods: Option<String> = row.get(4).ok();
    let rejected_foods: Option<String> = row.get(5).ok();
    let phase_str: String = row.get(6).map_err(read)?;
    let status_str: String = row.get(7).map_err(read)?;
    let trial_usage_count: i64 = row.get(8).map_err(read)?;
    let subscribed_at: Option<String> = row.get(9).ok();
    let activation_email: Option<String> = row.get(10).ok();
    let created_str: String = row.get(11).map_err(read)?;
    let updated_str: String = row.get(12).map_err(read)?;

    let id = Uuid::parse_str(&id_str)
        .map_err(|e| DatabaseError::Serialization(format!("profile id {id_str}: {e}")))?;
    let phase: IntakePhase = phase_str.parse().map_err(DatabaseError::Serialization)?;
    let status: SubscriptionStatus = status_str.parse().map_err(DatabaseError::Serialization)?;

    Ok(SubjectProfile {
        id,
        identity,
        child_name,
        child_age: child_age.and_then(|a| u8::try_from(a).ok()),
        accepted_foods,
        rejected_foods,
        phase,
        status,
        trial_usage_count: u32::try_from(trial_usage_count).unwrap_or(0),
        subscribed_at: subscribed_at.as_deref().map(parse_datetime),
        activation_email,
        created_at: parse_datetime(&created_str),
        updated_at: parse_datetime(&updated_str),
    })
}

#[async_trait]
impl ProfileStore for LibSqlBackend {
    async fn get_or_create(
        &self,
        identity: &str,
    ) -> Result<(SubjectProfile, bool), DatabaseError> {
        let fresh = SubjectProfile::new(identity);
        let now = fresh.created_at.to_rfc3339();

        let inserted = self
            .conn()
            .execute(
                "INSERT INTO subject_profiles (id, identity, phase, status, trial_usage_count, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, 0, ?5, ?5)
                 ON CONFLICT (identity) DO NOTHING",
                params![
                    fresh.id.to_string(),
                    identity,
                    fresh.phase.as_str(),
                    fresh.status.as_str(),
                    now
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_or_create: {e}")))?;

        let created = inserted > 0;
        if created {
            debug!(identity = %identity, "Created subject profile");
        }

        let profile = self
            .find(identity)
            .await?
            .ok_or_else(|| DatabaseError::NotFound {
                entity: "subject_profile".into(),
                id: identity.to_string(),
            })?;
        Ok((profile, created))
    }

    async fn find(&self, identity: &str) -> Result<Option<SubjectProfile>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {PROFILE_COLUMNS} FROM subject_profiles WHERE identity = ?1"),
                params![identity],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("find: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_profile(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("find: {e}"))),
        }
    }

    async fn set_child_identity(
        &self,
        identity: &str,
        child: &ChildIdentity,
    ) -> Result<bool, DatabaseError> {
        let (from, to) = forward_step(IntakePhase::AwaitingIdentity);
        let count = self
            .conn()
            .execute(
                "UPDATE subject_profiles
                 SET child_name = ?2, child_age = ?3, phase = ?4, updated_at = ?5
                 WHERE identity = ?1 AND child_age IS NULL AND phase = ?6",
                params![
                    identity,
                    child.name.as_str(),
                    i64::from(child.age),
                    to,
                    Utc::now().to_rfc3339(),
                    from
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("set_child_identity: {e}")))?;
        Ok(count > 0)
    }

    async fn set_accepted_foods(
        &self,
        identity: &str,
        foods: &str,
    ) -> Result<bool, DatabaseError> {
        let (from, to) = forward_step(IntakePhase::AwaitingAcceptedFoods);
        let count = self
            .conn()
            .execute(
                "UPDATE subject_profiles
                 SET accepted_foods = ?2, phase = ?3, updated_at = ?4
                 WHERE identity = ?1 AND accepted_foods IS NULL AND phase = ?5",
                params![
                    identity,
                    foods,
                    to,
                    Utc::now().to_rfc3339(),
                    from
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("set_accepted_foods: {e}")))?;
        Ok(count > 0)
    }

    async fn set_rejected_foods(
        &self,
        identity: &str,
        foods: &str,
    ) -> Result<bool, DatabaseError> {
        let (from, to) = forward_step(IntakePhase::AwaitingRejectedFoods);
        let count = self
            .conn()
            .execute(
                "UPDATE subject_profiles
                 SET rejected_foods = ?2, phase = ?3, updated_at = ?4
                 WHERE identity = ?1 AND rejected_foods IS NULL AND phase = ?5",
                params![
                    identity,
                    foods,
                    to,
                    Utc::now().to_rfc3339(),
                    from
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("set_rejected_foods: {e}")))?;
        Ok(count > 0)
    }

    async fn restart_food_cycle(&self, identity: &str) -> Result<bool, DatabaseError> {
        let count = self
            .conn()
            .execute(
                "UPDATE subject_profiles
                 SET accepted_foods = NULL, rejected_foods = NULL, phase = ?2, updated_at = ?3
                 WHERE identity = ?1 AND child_age IS NOT NULL",
                params![
                    identity,
                    IntakePhase::AwaitingAcceptedFoods.as_str(),
                    Utc::now().to_rfc3339()
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("restart_food_cycle: {e}")))?;
        Ok(count > 0)
    }

    async fn increment_trial(
        &self,
        identity: &str,
        limit: u32,
    ) -> Result<Option<u32>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "UPDATE subject_profiles
                 SET trial_usage_count = trial_usage_count + 1, updated_at = ?3
                 WHERE identity = ?1 AND status = ?4 AND trial_usage_count < ?2
                 RETURNING trial_usage_count",
                params![
                    identity,
                    i64::from(limit),
                    Utc::now().to_rfc3339(),
                    SubscriptionStatus::Trial.as_str()
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("increment_trial: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let count: i64 = row
                    .get(0)
                    .map_err(|e| DatabaseError::Query(format!("increment_trial: {e}")))?;
                Ok(u32::try_from(count).ok())
            }
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("increment_trial: {e}"))),
        }
    }

    async fn activate_subscription(
        &self,
        identity: &str,
        email: &str,
    ) -> Result<SubjectProfile, DatabaseError> {
        let now = Utc::now().to_rfc3339();
        let count = self
            .conn()
            .execute(
                "UPDATE subject_profiles
                 SET status = ?2, subscribed_at = COALESCE(subscribed_at, ?3),
                     activation_email = ?4, updated_at = ?3
                 WHERE identity = ?1",
                params![identity, SubscriptionStatus::Subscribed.as_str(), now, email],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("activate_subscription: {e}")))?;

        if count == 0 {
            return Err(DatabaseError::NotFound {
                entity: "subject_profile".into(),
                id: identity.to_string(),
            });
        }

        self.find(identity)
            .await?
            .ok_or_else(|| DatabaseError::NotFound {
                entity: "subject_profile".into(),
                id: identity.to_string(),
            })
    }
}
