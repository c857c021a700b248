// Alert dispatch
// Two-channel notification fan-out to the configured emergency recipients

mod twilio;

pub use twilio::TwilioClient;

use anyhow::Result;
use async_trait::async_trait;
use futures::future::{join, join_all};
use std::sync::Arc;
use thiserror::Error;

use crate::location::Coordinates;

/// One triggered alert; immutable after construction
#[derive(Debug, Clone)]
pub struct AlertRequest {
    pub requester: String,
    pub coordinates: Coordinates,
}

/// A single outbound message as handed to the provider
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub body: String,
    pub from: String,
    pub to: String,
}

/// Provider-assigned message identifier
pub type MessageId = String;

/// Trait for message delivery providers.
///
/// One call delivers one message on one channel; the channel is implied by
/// the sender and recipient addresses (WhatsApp addresses carry the
/// "whatsapp:" prefix).
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Deliver one message and return the provider-assigned id
    async fn send(&self, message: &OutboundMessage) -> Result<MessageId>;
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("No emergency recipients configured")]
    NoRecipients,

    /// First send failure, after every send has settled
    #[error("message send failed: {0}")]
    SendFailed(String),
}

/// Provider ids for a fully delivered alert, partitioned by channel in
/// recipient order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReceipt {
    pub sms_message_ids: Vec<MessageId>,
    pub whatsapp_message_ids: Vec<MessageId>,
}

/// Fixed alert text with a maps deeplink; coordinates inserted verbatim
pub fn compose_alert_message(coordinates: &Coordinates) -> String {
    format!(
        "Your Friend needs help reach out to them asap. Location: https://maps.google.com/?q={},{}",
        coordinates.latitude(),
        coordinates.longitude()
    )
}

/// Fans an alert out to every recipient over both channels.
///
/// Delivery is a real-world side effect and is not idempotent: re-invoking
/// re-sends to everyone. Callers must not retry blindly.
pub struct AlertDispatcher {
    sender: Arc<dyn MessageSender>,
    sms_from: String,
    whatsapp_from: String,
}

impl AlertDispatcher {
    pub fn new(sender: Arc<dyn MessageSender>, sms_from: String, whatsapp_from: String) -> Self {
        Self {
            sender,
            sms_from,
            whatsapp_from,
        }
    }

    /// Send one SMS and one WhatsApp message per recipient, all concurrently.
    ///
    /// The join waits for every send to settle, then reports either the full
    /// receipt or the first failure. Partial delivery (some recipients
    /// notified before another send failed) is an accepted risk; there is no
    /// rollback and no per-recipient retry.
    pub async fn dispatch(
        &self,
        request: &AlertRequest,
        recipients: &[String],
    ) -> Result<DispatchReceipt, DispatchError> {
        if recipients.is_empty() {
            return Err(DispatchError::NoRecipients);
        }

        let body = compose_alert_message(&request.coordinates);
        tracing::info!(
            requester = %request.requester,
            recipients = recipients.len(),
            "Dispatching crisis alert"
        );

        let sms_sends = recipients.iter().map(|to| {
            let message = OutboundMessage {
                body: body.clone(),
                from: self.sms_from.clone(),
                to: to.clone(),
            };
            async move { self.sender.send(&message).await }
        });

        let whatsapp_sends = recipients.iter().map(|to| {
            let message = OutboundMessage {
                body: body.clone(),
                from: self.whatsapp_from.clone(),
                to: format!("whatsapp:{}", to),
            };
            async move { self.sender.send(&message).await }
        });

        let (sms_results, whatsapp_results) =
            join(join_all(sms_sends), join_all(whatsapp_sends)).await;

        // Collect both channels before reporting so every failure is logged;
        // an SMS-channel failure takes precedence in the returned error
        let sms_collected = collect_channel("sms", sms_results);
        let whatsapp_collected = collect_channel("whatsapp", whatsapp_results);
        let sms_message_ids = sms_collected?;
        let whatsapp_message_ids = whatsapp_collected?;

        tracing::info!(
            sms = sms_message_ids.len(),
            whatsapp = whatsapp_message_ids.len(),
            "Crisis alerts sent"
        );

        Ok(DispatchReceipt {
            sms_message_ids,
            whatsapp_message_ids,
        })
    }
}

/// Collect one channel's settled results. Every failure is logged with full
/// detail; the first one becomes the dispatch error.
fn collect_channel(
    channel: &str,
    results: Vec<Result<MessageId>>,
) -> Result<Vec<MessageId>, DispatchError> {
    let mut ids = Vec::with_capacity(results.len());
    let mut first_error = None;

    for result in results {
        match result {
            Ok(id) => ids.push(id),
            Err(e) => {
                tracing::error!(channel, error = %e, "Send failed");
                if first_error.is_none() {
                    first_error = Some(e.to_string());
                }
            }
        }
    }

    match first_error {
        Some(description) => Err(DispatchError::SendFailed(description)),
        None => Ok(ids),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct RecordingSender {
        sent: Mutex<Vec<OutboundMessage>>,
        attempts: AtomicUsize,
        fail_to: Option<String>,
    }

    impl RecordingSender {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                attempts: AtomicUsize::new(0),
                fail_to: None,
            }
        }

        fn failing_for(to: &str) -> Self {
            Self {
                fail_to: Some(to.to_string()),
                ..Self::new()
            }
        }
    }

    #[async_trait]
    impl MessageSender for RecordingSender {
        async fn send(&self, message: &OutboundMessage) -> Result<MessageId> {
            let n = self.attempts.fetch_add(1, Ordering::SeqCst);
            if self.fail_to.as_deref() == Some(message.to.as_str()) {
                anyhow::bail!("provider rejected {}", message.to);
            }
            self.sent.lock().unwrap().push(message.clone());
            Ok(format!("SM{}", n))
        }
    }

    fn coords() -> Coordinates {
        Coordinates::new(21.082225, 80.006333).unwrap()
    }

    fn request() -> AlertRequest {
        AlertRequest {
            requester: "dana".to_string(),
            coordinates: coords(),
        }
    }

    fn recipients() -> Vec<String> {
        vec![
            "+15550000001".to_string(),
            "+15550000002".to_string(),
            "+15550000003".to_string(),
        ]
    }

    #[test]
    fn test_compose_alert_message() {
        let body = compose_alert_message(&coords());
        assert_eq!(
            body,
            "Your Friend needs help reach out to them asap. \
             Location: https://maps.google.com/?q=21.082225,80.006333"
        );
    }

    #[tokio::test]
    async fn test_dispatch_sends_both_channels_per_recipient() {
        let sender = Arc::new(RecordingSender::new());
        let dispatcher = AlertDispatcher::new(
            sender.clone(),
            "+15551230000".to_string(),
            "whatsapp:+15551230000".to_string(),
        );

        let receipt = dispatcher.dispatch(&request(), &recipients()).await.unwrap();

        // One SMS + one WhatsApp per recipient
        assert_eq!(sender.attempts.load(Ordering::SeqCst), 6);
        assert_eq!(receipt.sms_message_ids.len(), 3);
        assert_eq!(receipt.whatsapp_message_ids.len(), 3);

        let sent = sender.sent.lock().unwrap();
        let whatsapp: Vec<_> = sent
            .iter()
            .filter(|m| m.to.starts_with("whatsapp:"))
            .collect();
        assert_eq!(whatsapp.len(), 3);
        assert!(whatsapp.iter().all(|m| m.from == "whatsapp:+15551230000"));
        assert!(whatsapp.iter().any(|m| m.to == "whatsapp:+15550000002"));

        // Same body on both channels
        assert!(sent.iter().all(|m| m.body.contains("maps.google.com")));
    }

    #[tokio::test]
    async fn test_dispatch_settles_all_sends_before_reporting_failure() {
        let sender = Arc::new(RecordingSender::failing_for("+15550000002"));
        let dispatcher = AlertDispatcher::new(
            sender.clone(),
            "+15551230000".to_string(),
            "whatsapp:+15551230000".to_string(),
        );

        let err = dispatcher
            .dispatch(&request(), &recipients())
            .await
            .unwrap_err();

        // All six sends were attempted even though one rejected
        assert_eq!(sender.attempts.load(Ordering::SeqCst), 6);
        match err {
            DispatchError::SendFailed(description) => {
                assert!(description.contains("+15550000002"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dispatch_rejects_empty_recipient_list() {
        let sender = Arc::new(RecordingSender::new());
        let dispatcher = AlertDispatcher::new(
            sender.clone(),
            "+15551230000".to_string(),
            "whatsapp:+15551230000".to_string(),
        );

        let err = dispatcher.dispatch(&request(), &[]).await.unwrap_err();
        assert!(matches!(err, DispatchError::NoRecipients));
        assert_eq!(sender.attempts.load(Ordering::SeqCst), 0);
    }
}
