use chrono::TimeDelta;

use bazaar_client::stripe::DEFAULT_BASE_URL;
use bazaar_core::AppError;
use bazaar_core::token::DEFAULT_TOKEN_TTL;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_CURRENCY: &str = "usd";

/// HTTP server settings, read from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub token_secret: String,
    pub token_ttl: TimeDelta,
    pub stripe_secret_key: Option<String>,
    pub stripe_base_url: String,
    pub currency: String,
    /// Empty means any origin is allowed.
    pub allowed_origins: Vec<String>,
}

impl ServerConfig {
    /// - `ACCESS_TOKEN_SECRET` (required)
    /// - `PORT` (default 5000)
    /// - `TOKEN_TTL_SECS` (default one day)
    /// - `STRIPE_SECRET_KEY` (optional; payment endpoints answer 503 without it)
    /// - `STRIPE_API_BASE` (default Stripe's public API)
    /// - `PAYMENT_CURRENCY` (default `usd`)
    /// - `CORS_ALLOWED_ORIGINS` (comma-separated)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let token_secret = lookup("ACCESS_TOKEN_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::ConfigError("ACCESS_TOKEN_SECRET must be set".into()))?;

        let port = match lookup("PORT") {
            None => DEFAULT_PORT,
            Some(raw) => raw
                .parse()
                .map_err(|_| AppError::ConfigError(format!("Invalid PORT '{raw}'")))?,
        };

        let token_ttl = match lookup("TOKEN_TTL_SECS") {
            None => DEFAULT_TOKEN_TTL,
            Some(raw) => {
                let secs: i64 = raw.parse().map_err(|_| {
                    AppError::ConfigError(format!("Invalid TOKEN_TTL_SECS '{raw}'"))
                })?;
                if secs <= 0 {
                    return Err(AppError::ConfigError(
                        "TOKEN_TTL_SECS must be positive".into(),
                    ));
                }
                TimeDelta::seconds(secs)
            }
        };

        let allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            port,
            token_secret,
            token_ttl,
            stripe_secret_key: lookup("STRIPE_SECRET_KEY").filter(|s| !s.is_empty()),
            stripe_base_url: lookup("STRIPE_API_BASE")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            currency: lookup("PAYMENT_CURRENCY")
                .map(|c| c.to_lowercase())
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            allowed_origins,
        })
    }
}
