//! Error types for NutriKids.

/// Top-level error type for the bot.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
}

/// Configuration-related errors, reported by `BotConfig` at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Channel-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },

    #[error("Failed to send response on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("No channel registered under name {0}")]
    UnknownChannel(String),
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

/// Result type alias for the bot.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn open_store() -> Result<()> {
        Err::<(), _>(DatabaseError::Pool("database is locked".into()))?;
        Ok(())
    }

    fn build_provider() -> Result<()> {
        Err::<(), _>(LlmError::RequestFailed {
            provider: "gemini".into(),
            reason: "bad key".into(),
        })?;
        Ok(())
    }

    #[test]
    fn startup_failures_convert_into_error() {
        let err = open_store().unwrap_err();
        assert!(matches!(err, Error::Database(DatabaseError::Pool(_))));
        assert_eq!(
            err.to_string(),
            "Database error: Connection pool error: database is locked"
        );

        let err = build_provider().unwrap_err();
        assert!(matches!(err, Error::Llm(LlmError::RequestFailed { .. })));
        assert!(err.to_string().contains("bad key"));
    }
}
