// Configuration structs

use serde::Deserialize;

/// Messaging provider account and sender addresses.
///
/// All four values are required; the service refuses to start without them.
#[derive(Debug, Clone, Deserialize)]
pub struct TwilioConfig {
    /// Twilio account SID
    pub account_sid: String,

    /// Twilio auth token
    pub auth_token: String,

    /// Sender number for the SMS channel (E.164)
    pub sms_from: String,

    /// Sender address for the WhatsApp channel (e.g. "whatsapp:+14155238886")
    pub whatsapp_from: String,
}

/// HTTP server settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g. "127.0.0.1:3001")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Origin allow-list: exact origins or single-wildcard-subdomain
    /// patterns such as "https://*.netlify.app"
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1:3001".to_string()
}

fn default_allowed_origins() -> Vec<String> {
    [
        "http://localhost:8080",
        "http://localhost:5173",
        "http://localhost:3000",
        "https://zenith-frontend-1.netlify.app",
        "https://*.netlify.app",
        "https://zenith-main.vercel.app",
        "https://www.zenith-landing.tech",
        "https://zenith-ai.tech",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Immutable startup configuration.
///
/// Constructed once by `load_config` and passed by reference into the
/// dispatcher and server; pipeline code never reads ambient global state.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub twilio: TwilioConfig,

    /// Emergency contacts (E.164 phone numbers), notified on every alert
    pub recipients: Vec<String>,

    #[serde(default)]
    pub server: ServerConfig,
}
