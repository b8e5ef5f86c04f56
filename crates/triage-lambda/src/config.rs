use std::env;
use std::path::PathBuf;
use std::time::Duration;

use eyre::{WrapErr, bail};
use jiff::tz::TimeZone;

use triage_auth::cognito::SignIn;
use triage_core::store_keys::DEFAULT_NOTES_PREFIX;
use triage_dialogue::policy::SufficiencyPolicy;

pub const DEFAULT_BUCKET: &str = "triage-notes";
pub const DEFAULT_MODEL_ID: &str = "us.anthropic.claude-sonnet-4-20250514-v1:0";
pub const DEFAULT_LOCAL_STORE: &str = "/tmp/triage/notes.jsonl";
pub const DEFAULT_REGION: &str = "us-east-1";

const DEFAULT_MAX_TURNS: u32 = 3;
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_POLL_SECS: u64 = 5;
const DEFAULT_SESSION_IDLE_SECS: u64 = 30 * 60;

/// Cognito wiring. Present only when `COGNITO_CLIENT_ID` is set.
#[derive(Debug, Clone)]
pub struct CognitoConfig {
    pub client_id: String,
    pub user_pool_id: Option<String>,
    pub region: String,
    pub sign_in: SignIn,
    /// RSA public key of the pool, for verifying bearer tokens locally.
    pub public_key_pem: Option<String>,
}

/// Deployment configuration, read once at cold start.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bucket: String,
    pub notes_prefix: String,
    pub model_id: String,
    pub policy: SufficiencyPolicy,
    pub generation_timeout: Duration,
    pub local_store: PathBuf,
    pub notes_poll_interval: Duration,
    /// Sessions untouched for this long are dropped.
    pub session_idle: Duration,
    pub display_tz: TimeZone,
    pub cognito: Option<CognitoConfig>,
}

impl AppConfig {
    pub fn from_env() -> eyre::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source. Empty
    /// values count as unset.
    pub fn from_lookup<F>(lookup: F) -> eyre::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let policy = match var("TRIAGE_SUFFICIENCY").as_deref() {
            None | Some("dynamic") => SufficiencyPolicy::Dynamic {
                hard_cap: parse_opt::<u32>("TRIAGE_HARD_CAP", var("TRIAGE_HARD_CAP"))?,
            },
            Some("fixed") => SufficiencyPolicy::Fixed {
                max_turns: parse_opt("TRIAGE_MAX_TURNS", var("TRIAGE_MAX_TURNS"))?
                    .unwrap_or(DEFAULT_MAX_TURNS),
            },
            Some(other) => bail!("TRIAGE_SUFFICIENCY must be `dynamic` or `fixed`, got `{other}`"),
        };
        if policy.max_turns() == Some(0) {
            bail!("the turn limit must be at least 1");
        }

        let timeout_secs = parse_opt("TRIAGE_GENERATION_TIMEOUT_SECS", var("TRIAGE_GENERATION_TIMEOUT_SECS"))?
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            bail!("TRIAGE_GENERATION_TIMEOUT_SECS must be at least 1");
        }
        let poll_secs = parse_opt("TRIAGE_NOTES_POLL_SECS", var("TRIAGE_NOTES_POLL_SECS"))?
            .unwrap_or(DEFAULT_POLL_SECS);
        let idle_secs = parse_opt("TRIAGE_SESSION_IDLE_SECS", var("TRIAGE_SESSION_IDLE_SECS"))?
            .unwrap_or(DEFAULT_SESSION_IDLE_SECS);
        if idle_secs == 0 {
            bail!("TRIAGE_SESSION_IDLE_SECS must be at least 1");
        }

        let display_tz = match var("TRIAGE_DISPLAY_TZ") {
            Some(name) => TimeZone::get(&name)
                .wrap_err_with(|| format!("unknown TRIAGE_DISPLAY_TZ `{name}`"))?,
            None => TimeZone::UTC,
        };

        let region = var("AWS_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string());
        let cognito = var("COGNITO_CLIENT_ID").map(|client_id| CognitoConfig {
            client_id,
            user_pool_id: var("COGNITO_USER_POOL_ID"),
            region,
            sign_in: SignIn {
                refresh_token: var("TRIAGE_REFRESH_TOKEN"),
                username: var("TRIAGE_USERNAME"),
                password: var("TRIAGE_PASSWORD"),
            },
            public_key_pem: var("COGNITO_PUBLIC_KEY_PEM"),
        });

        Ok(Self {
            bucket: var("TRIAGE_BUCKET").unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
            notes_prefix: var("TRIAGE_NOTES_PREFIX")
                .unwrap_or_else(|| DEFAULT_NOTES_PREFIX.to_string()),
            model_id: var("TRIAGE_MODEL_ID").unwrap_or_else(|| DEFAULT_MODEL_ID.to_string()),
            policy,
            generation_timeout: Duration::from_secs(timeout_secs),
            local_store: var("TRIAGE_LOCAL_STORE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOCAL_STORE)),
            notes_poll_interval: Duration::from_secs(poll_secs.max(1)),
            session_idle: Duration::from_secs(idle_secs),
            display_tz,
            cognito,
        })
    }
}

fn parse_opt<T>(key: &str, value: Option<String>) -> eyre::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .map(|v| v.parse::<T>().wrap_err_with(|| format!("invalid {key} `{v}`")))
        .transpose()
}
