// HTTP client for the Twilio Messages API

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::{MessageId, MessageSender, OutboundMessage};

const TWILIO_API_BASE: &str = "https://api.twilio.com";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Twilio REST client. One `Messages.json` create call per send; the same
/// endpoint carries both the SMS and WhatsApp channels.
pub struct TwilioClient {
    client: Client,
    base_url: String,
    account_sid: String,
    auth_token: String,
}

/// Subset of the Messages API response we consume
#[derive(Debug, Deserialize)]
struct CreateMessageResponse {
    sid: String,
}

impl TwilioClient {
    pub fn new(account_sid: String, auth_token: String) -> Result<Self> {
        Self::with_base_url(TWILIO_API_BASE.to_string(), account_sid, auth_token)
    }

    /// Point the client at a different API base (tests)
    pub fn with_base_url(
        base_url: String,
        account_sid: String,
        auth_token: String,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url,
            account_sid,
            auth_token,
        })
    }
}

#[async_trait]
impl MessageSender for TwilioClient {
    async fn send(&self, message: &OutboundMessage) -> Result<MessageId> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        );

        let params = [
            ("To", message.to.as_str()),
            ("From", message.from.as_str()),
            ("Body", message.body.as_str()),
        ];

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&params)
            .send()
            .await
            .context("Failed to send request to Twilio")?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "Twilio message create failed\n\nStatus: {}\nBody: {}",
                status,
                error_body
            );
        }

        let created: CreateMessageResponse = response
            .json()
            .await
            .context("Failed to parse Twilio response")?;

        tracing::debug!(sid = %created.sid, to = %message.to, "Message accepted by provider");

        Ok(created.sid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn message() -> OutboundMessage {
        OutboundMessage {
            body: "test body".to_string(),
            from: "+15551230000".to_string(),
            to: "+15550000001".to_string(),
        }
    }

    #[test]
    fn test_client_creation() {
        let client = TwilioClient::new("AC123".to_string(), "token".to_string());
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_send_returns_provider_sid() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/2010-04-01/Accounts/AC123/Messages.json")
            .match_header("authorization", Matcher::Regex("Basic .+".to_string()))
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("To".into(), "+15550000001".into()),
                Matcher::UrlEncoded("From".into(), "+15551230000".into()),
                Matcher::UrlEncoded("Body".into(), "test body".into()),
            ]))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"sid": "SM1234567890", "status": "queued"}"#)
            .create_async()
            .await;

        let client = TwilioClient::with_base_url(
            server.url(),
            "AC123".to_string(),
            "token".to_string(),
        )
        .unwrap();

        let sid = client.send(&message()).await.unwrap();
        assert_eq!(sid, "SM1234567890");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_surfaces_api_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/2010-04-01/Accounts/AC123/Messages.json")
            .with_status(401)
            .with_body(r#"{"code": 20003, "message": "Authenticate"}"#)
            .create_async()
            .await;

        let client = TwilioClient::with_base_url(
            server.url(),
            "AC123".to_string(),
            "token".to_string(),
        )
        .unwrap();

        let err = client.send(&message()).await.unwrap_err();
        assert!(err.to_string().contains("401"));
    }
}
