use std::env;

use crate::error::ConfigError;

/// Seven days, matching the "remember me" lifetime of the browser session.
const DEFAULT_SESSION_TTL_SECS: u64 = 7 * 24 * 60 * 60;
/// Upper bound on `SESSION_TTL_SECS`: one year.
const MAX_SESSION_TTL_SECS: u64 = 365 * 24 * 60 * 60;
const LOCAL_SESSION_SECRET: &str = "edu-portal-local-session-secret";

/// AppConfig
///
/// Holds the portal's entire configuration state. It is loaded once at startup,
/// never mutated afterwards, and pulled into handlers and extractors via `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls the dev session bypass and log format.
    pub env: Env,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // HMAC secret used to sign and verify the session cookie.
    pub session_secret: String,
    // Lifetime of a stored session and of its cookie.
    pub session_ttl_secs: u64,
    // Adds the `Secure` attribute to the session cookie.
    pub cookie_secure: bool,
    // Base URL of the remote platform API. `None` selects the in-memory local API.
    pub platform_api_url: Option<String>,
    // Postgres connection string for the session store. `None` keeps sessions in memory.
    pub database_url: Option<String>,
    // S3-compatible storage for material files (MinIO locally).
    pub s3_endpoint: String,
    pub s3_region: String,
    pub s3_key: String,
    pub s3_secret: String,
    pub s3_bucket: String,
    // Whether OnboardingGuard lets an incomplete super_admin through, like PublicRoute does.
    pub onboarding_guard_exempts_super_admin: bool,
}

/// Env
///
/// Defines the runtime context, used to switch between development conveniences
/// (in-memory API, raw session header) and hardened production settings.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Safe, non-panicking configuration for tests and local scaffolding.
    fn default() -> Self {
        Self {
            env: Env::Local,
            bind_addr: "0.0.0.0:3000".to_string(),
            session_secret: LOCAL_SESSION_SECRET.to_string(),
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            cookie_secure: false,
            platform_api_url: None,
            database_url: None,
            s3_endpoint: "http://localhost:9000".to_string(),
            s3_region: "us-east-1".to_string(),
            s3_key: "admin".to_string(),
            s3_secret: "password".to_string(),
            s3_bucket: "edu-materials".to_string(),
            onboarding_guard_exempts_super_admin: false,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads all parameters from environment variables. Production refuses to
    /// start without its secrets and without a real platform API.
    pub fn load() -> Result<Self, ConfigError> {
        let env = match env::var("APP_ENV").unwrap_or_default().as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };
        let defaults = Self::default();

        let session_secret = match (env, env::var("SESSION_SECRET")) {
            (_, Ok(secret)) if !secret.is_empty() => secret,
            (Env::Production, _) => return Err(ConfigError::Missing("SESSION_SECRET")),
            (Env::Local, _) => defaults.session_secret.clone(),
        };

        let platform_api_url = optional("PLATFORM_API_URL");
        if env == Env::Production && platform_api_url.is_none() {
            return Err(ConfigError::Missing("PLATFORM_API_URL"));
        }

        let session_ttl_secs = parse_or("SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)?;
        if !(1..=MAX_SESSION_TTL_SECS).contains(&session_ttl_secs) {
            return Err(ConfigError::Invalid {
                name: "SESSION_TTL_SECS",
                value: session_ttl_secs.to_string(),
            });
        }
        let cookie_secure = parse_or("COOKIE_SECURE", env == Env::Production)?;
        let onboarding_guard_exempts_super_admin =
            parse_or("ONBOARDING_GUARD_EXEMPT_SUPER_ADMIN", false)?;

        let (s3_key, s3_secret) = match env {
            Env::Production => (
                optional("S3_ACCESS_KEY").ok_or(ConfigError::Missing("S3_ACCESS_KEY"))?,
                optional("S3_SECRET_KEY").ok_or(ConfigError::Missing("S3_SECRET_KEY"))?,
            ),
            Env::Local => (
                optional("S3_ACCESS_KEY").unwrap_or(defaults.s3_key),
                optional("S3_SECRET_KEY").unwrap_or(defaults.s3_secret),
            ),
        };

        Ok(Self {
            env,
            bind_addr: optional("BIND_ADDR").unwrap_or(defaults.bind_addr),
            session_secret,
            session_ttl_secs,
            cookie_secure,
            platform_api_url,
            database_url: optional("DATABASE_URL"),
            s3_endpoint: optional("S3_ENDPOINT").unwrap_or(defaults.s3_endpoint),
            s3_region: optional("S3_REGION").unwrap_or(defaults.s3_region),
            s3_key,
            s3_secret,
            s3_bucket: optional("S3_BUCKET_NAME").unwrap_or(defaults.s3_bucket),
            onboarding_guard_exempts_super_admin,
        })
    }
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parse_or<T: std::str::FromStr>(name: &'static str, fallback: T) -> Result<T, ConfigError> {
    match optional(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(fallback),
    }
}
