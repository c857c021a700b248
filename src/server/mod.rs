// HTTP boundary
// Serves the crisis-alert endpoint behind an origin allow-list

mod handlers;
mod middleware;

pub use handlers::{create_router, CrisisAlertRequest, CrisisAlertResponse};
pub use middleware::OriginMatcher;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::dispatch::{AlertDispatcher, MessageSender, TwilioClient};

/// Alert server state shared across requests.
///
/// Everything here is immutable after startup; concurrent requests share it
/// without locking.
pub struct AlertServer {
    dispatcher: AlertDispatcher,
    recipients: Vec<String>,
    origin_matcher: Arc<OriginMatcher>,
    bind_address: String,
}

impl AlertServer {
    /// Build from startup configuration with the real provider client
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = TwilioClient::new(
            config.twilio.account_sid.clone(),
            config.twilio.auth_token.clone(),
        )?;
        Self::with_sender(config, Arc::new(client))
    }

    /// Build with an injected message sender (tests)
    pub fn with_sender(config: &Config, sender: Arc<dyn MessageSender>) -> Result<Self> {
        let dispatcher = AlertDispatcher::new(
            sender,
            config.twilio.sms_from.clone(),
            config.twilio.whatsapp_from.clone(),
        );
        let origin_matcher = Arc::new(OriginMatcher::new(&config.server.allowed_origins)?);

        Ok(Self {
            dispatcher,
            recipients: config.recipients.clone(),
            origin_matcher,
            bind_address: config.server.bind_address.clone(),
        })
    }

    /// Start the HTTP server; runs until SIGINT/SIGTERM
    pub async fn serve(self) -> Result<()> {
        let addr: SocketAddr = self
            .bind_address
            .parse()
            .with_context(|| format!("Invalid bind address: {}", self.bind_address))?;

        let app = create_router(Arc::new(self)).layer(TraceLayer::new_for_http());

        tracing::info!("Starting crisis alert server on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server closed");

        Ok(())
    }

    pub fn dispatcher(&self) -> &AlertDispatcher {
        &self.dispatcher
    }

    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    pub fn origin_matcher(&self) -> &Arc<OriginMatcher> {
        &self.origin_matcher
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("SIGINT received: closing HTTP server"),
        _ = terminate => tracing::info!("SIGTERM received: closing HTTP server"),
    }
}
