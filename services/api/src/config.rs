//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub cors_origin: String,

    // Payment provider
    pub stripe_secret_key: String,
    pub stripe_webhook_secret: String,
    pub stripe_api_base: String,
    pub checkout_success_url: String,
    pub checkout_cancel_url: String,

    // Transactional email
    pub email_api_url: String,
    pub email_api_key: String,
    pub email_from: String,
    pub contact_inbox: String,

    // Headless content store
    pub cms_api_base: String,
    pub cms_dataset: String,
    pub cms_token: String,

    // Meeting links handed out with confirmed bookings
    pub meeting_base_url: String,
}

fn required(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingVar(name.to_string()))
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Database Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = required("DATABASE_URL")?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin = std::env::var("CORS_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        // --- Load Payment Provider Settings ---
        let stripe_secret_key = required("STRIPE_SECRET_KEY")?;
        let stripe_webhook_secret = required("STRIPE_WEBHOOK_SECRET")?;
        let stripe_api_base = std::env::var("STRIPE_API_BASE")
            .unwrap_or_else(|_| "https://api.stripe.com".to_string());
        let checkout_success_url = required("CHECKOUT_SUCCESS_URL")?;
        let checkout_cancel_url = required("CHECKOUT_CANCEL_URL")?;

        // --- Load Email Settings ---
        let email_api_url = required("EMAIL_API_URL")?;
        let email_api_key = required("EMAIL_API_KEY")?;
        let email_from = required("EMAIL_FROM")?;
        let contact_inbox = required("CONTACT_INBOX")?;

        // --- Load Content Store Settings ---
        let cms_api_base = required("CMS_API_BASE")?;
        let cms_dataset = std::env::var("CMS_DATASET").unwrap_or_else(|_| "production".to_string());
        let cms_token = required("CMS_TOKEN")?;

        let meeting_base_url = std::env::var("MEETING_BASE_URL")
            .unwrap_or_else(|_| "https://meet.jit.si/tutoring".to_string());

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            cors_origin,
            stripe_secret_key,
            stripe_webhook_secret,
            stripe_api_base,
            checkout_success_url,
            checkout_cancel_url,
            email_api_url,
            email_api_key,
            email_from,
            contact_inbox,
            cms_api_base,
            cms_dataset,
            cms_token,
            meeting_base_url,
        })
    }

    /// The meeting link handed to a student once their booking is confirmed.
    pub fn meeting_url_for(&self, booking_id: uuid::Uuid) -> String {
        format!("{}/{}", self.meeting_base_url.trim_end_matches('/'), booking_id)
    }
}
