// Configuration loader
// Loads settings from ~/.zenith-crisis/config.toml or environment variables

use anyhow::{bail, Context, Result};
use std::fs;

use super::settings::{Config, ServerConfig, TwilioConfig};

/// Load configuration from the config file or environment.
///
/// Configuration errors are fatal at startup: a service that cannot reach
/// its messaging provider or has nobody to notify must refuse to start
/// rather than fail per-request.
pub fn load_config() -> Result<Config> {
    // Try loading from ~/.zenith-crisis/config.toml first
    if let Some(config) = try_load_from_config_file()? {
        validate(&config)?;
        return Ok(config);
    }

    // Fall back to environment variables
    if let Some(config) = try_load_from_env()? {
        validate(&config)?;
        return Ok(config);
    }

    bail!(
        "No configuration found.\n\n\
        Create ~/.zenith-crisis/config.toml:\n\n\
        \x1b[36mrecipients = [\"+15557654321\"]\n\n\
        [twilio]\n\
        account_sid = \"AC...\"\n\
        auth_token = \"...\"\n\
        sms_from = \"+15551234567\"\n\
        whatsapp_from = \"whatsapp:+15551234567\"\x1b[0m\n\n\
        Or set environment variables:\n\
        TWILIO_ACCOUNT_SID, TWILIO_AUTH_TOKEN, TWILIO_PHONE_NUMBER,\n\
        TWILIO_WHATSAPP_NUMBER, EMERGENCY_RECIPIENTS"
    );
}

fn try_load_from_config_file() -> Result<Option<Config>> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    let config_path = home.join(".zenith-crisis/config.toml");

    if !config_path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read {}", config_path.display()))?;

    let config: Config = toml::from_str(&contents).context("Failed to parse config.toml")?;

    Ok(Some(config))
}

fn try_load_from_env() -> Result<Option<Config>> {
    // Only engage env-based loading once the account SID is present;
    // otherwise fall through to the setup guidance.
    if std::env::var("TWILIO_ACCOUNT_SID").is_err() {
        return Ok(None);
    }

    let twilio = TwilioConfig {
        account_sid: required_env("TWILIO_ACCOUNT_SID")?,
        auth_token: required_env("TWILIO_AUTH_TOKEN")?,
        sms_from: required_env("TWILIO_PHONE_NUMBER")?,
        whatsapp_from: required_env("TWILIO_WHATSAPP_NUMBER")?,
    };

    let recipients = parse_recipients(&required_env("EMERGENCY_RECIPIENTS")?);

    let mut server = ServerConfig::default();
    if let Ok(origins) = std::env::var("ALLOWED_ORIGINS") {
        server.allowed_origins = origins
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();
    }
    if let Ok(bind) = std::env::var("BIND_ADDRESS") {
        server.bind_address = bind;
    } else if let Ok(port) = std::env::var("PORT") {
        server.bind_address = format!("0.0.0.0:{}", port);
    }

    Ok(Some(Config {
        twilio,
        recipients,
        server,
    }))
}

fn required_env(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => bail!("Missing required environment variable: {}", name),
    }
}

/// Split a comma-separated recipient list, dropping empty entries
pub(crate) fn parse_recipients(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .collect()
}

fn validate(config: &Config) -> Result<()> {
    if config.recipients.is_empty() {
        bail!("No emergency recipients configured");
    }

    let twilio = &config.twilio;
    for (name, value) in [
        ("twilio.account_sid", &twilio.account_sid),
        ("twilio.auth_token", &twilio.auth_token),
        ("twilio.sms_from", &twilio.sms_from),
        ("twilio.whatsapp_from", &twilio.whatsapp_from),
    ] {
        if value.trim().is_empty() {
            bail!("Configuration value {} is empty", name);
        }
    }

    Ok(())
}
