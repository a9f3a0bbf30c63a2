//! Configuration types.
//!
//! Everything is read once at startup into `BotConfig` and handed to the
//! components that need it. Core logic never reads the environment.

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use secrecy::SecretString;

use crate::channels::telegram::TelegramConfig;
use crate::error::ConfigError;
use crate::llm::{LlmBackend, LlmConfig};

/// Checkout link shown when `KIWIFY_CHECKOUT` is not set.
pub const DEFAULT_CHECKOUT_URL: &str = "https://pay.kiwify.com.br/nutrikids";

/// Trial generations granted to new subjects.
pub const DEFAULT_TRIAL_LIMIT: u32 = 3;

/// Subscription terms injected into user-facing text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionOffer {
    /// External checkout URL. Payment is never verified against it.
    pub checkout_url: String,
    pub monthly_price: Decimal,
    pub support_email: String,
}

impl SubscriptionOffer {
    /// Price in Brazilian notation, e.g. `R$ 29,90`.
    pub fn price_label(&self) -> String {
        format!("R$ {:.2}", self.monthly_price.round_dp(2)).replace('.', ",")
    }
}

impl Default for SubscriptionOffer {
    fn default() -> Self {
        Self {
            checkout_url: DEFAULT_CHECKOUT_URL.to_string(),
            monthly_price: dec!(29.90),
            support_email: "suporte@nutrikids.com".to_string(),
        }
    }
}

/// Status HTTP server settings.
///
/// The profile endpoint has no auth, so the server listens on loopback
/// unless `NUTRIKIDS_HTTP_BIND` says otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpConfig {
    pub bind: IpAddr,
    pub port: u16,
}

/// Process-wide configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// `None` runs the CLI channel only.
    pub telegram: Option<TelegramConfig>,
    pub llm: LlmConfig,
    pub db_path: PathBuf,
    pub offer: SubscriptionOffer,
    pub trial_limit: u32,
    /// `None` disables the status HTTP server.
    pub http: Option<HttpConfig>,
    /// Directory for the daily rolling log file.
    pub log_dir: Option<PathBuf>,
}

impl BotConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let telegram = get("TELEGRAM_BOT_TOKEN").map(|bot_token| TelegramConfig {
            bot_token,
            allowed_users: get("TELEGRAM_ALLOWED_USERS")
                .unwrap_or_else(|| "*".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        });

        let backend = match get("NUTRIKIDS_LLM_BACKEND") {
            Some(raw) => LlmBackend::from_str(&raw).map_err(|message| ConfigError::InvalidValue {
                key: "NUTRIKIDS_LLM_BACKEND".into(),
                message,
            })?,
            None => LlmBackend::default(),
        };
        let api_key = get(backend.api_key_var())
            .ok_or_else(|| ConfigError::MissingEnvVar(backend.api_key_var().to_string()))?;
        let llm = LlmConfig {
            backend,
            api_key: SecretString::from(api_key),
            model: get("NUTRIKIDS_MODEL").unwrap_or_else(|| backend.default_model().to_string()),
        };

        let defaults = SubscriptionOffer::default();
        let monthly_price = match get("NUTRIKIDS_PRICE") {
            Some(raw) => parse_value::<Decimal>("NUTRIKIDS_PRICE", &raw.replace(',', "."))?,
            None => defaults.monthly_price,
        };
        if monthly_price.is_sign_negative() {
            return Err(ConfigError::InvalidValue {
                key: "NUTRIKIDS_PRICE".into(),
                message: "price must not be negative".into(),
            });
        }
        let offer = SubscriptionOffer {
            checkout_url: get("KIWIFY_CHECKOUT").unwrap_or(defaults.checkout_url),
            monthly_price,
            support_email: get("NUTRIKIDS_SUPPORT_EMAIL").unwrap_or(defaults.support_email),
        };

        let trial_limit = match get("NUTRIKIDS_TRIAL_LIMIT") {
            Some(raw) => parse_value::<u32>("NUTRIKIDS_TRIAL_LIMIT", &raw)?,
            None => DEFAULT_TRIAL_LIMIT,
        };

        let http = match get("NUTRIKIDS_HTTP_PORT") {
            Some(raw) => Some(HttpConfig {
                bind: match get("NUTRIKIDS_HTTP_BIND") {
                    Some(addr) => parse_value::<IpAddr>("NUTRIKIDS_HTTP_BIND", &addr)?,
                    None => IpAddr::V4(Ipv4Addr::LOCALHOST),
                },
                port: parse_value::<u16>("NUTRIKIDS_HTTP_PORT", &raw)?,
            }),
            None => None,
        };

        Ok(Self {
            telegram,
            llm,
            db_path: get("NUTRIKIDS_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./data/nutrikids.db")),
            offer,
            trial_limit,
            http,
            log_dir: get("NUTRIKIDS_LOG_DIR").map(PathBuf::from),
        })
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("'{raw}': {e}"),
    })
}
