// Crisis orchestration
// Sequences classifier -> location -> dispatch into a total AlertOutcome

use serde::Serialize;

use super::CrisisDetector;
use crate::dispatch::{compose_alert_message, AlertDispatcher, AlertRequest};
use crate::location::{Coordinates, GeolocationError, LocationResolver};

/// Substituted when live location acquisition fails
pub const FALLBACK_LATITUDE: f64 = 21.082225;
pub const FALLBACK_LONGITUDE: f64 = 80.006333;

/// Safe text shown when dispatch fails: no coordinates, no provider detail
const SAFE_FALLBACK_TEXT: &str = "Your Friend needs help reach out to them asap";

/// The only externally visible result of the pipeline; always well-formed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertOutcome {
    pub success: bool,
    pub message: String,
}

/// Pipeline stage. Exposed so tests can drive one transition at a time.
#[derive(Debug)]
pub enum AlertStage {
    Locating,
    FallbackLocating { reason: GeolocationError },
    Dispatching { coordinates: Coordinates, used_fallback: bool },
    Done(AlertOutcome),
}

/// Runs the crisis pipeline end to end.
///
/// Location failures are recovered here via the fallback coordinate;
/// dispatch failures degrade to the fixed safe message. No path returns an
/// error or panics.
pub struct CrisisOrchestrator {
    detector: CrisisDetector,
    resolver: LocationResolver,
    dispatcher: AlertDispatcher,
    recipients: Vec<String>,
}

impl CrisisOrchestrator {
    pub fn new(
        detector: CrisisDetector,
        resolver: LocationResolver,
        dispatcher: AlertDispatcher,
        recipients: Vec<String>,
    ) -> Self {
        Self {
            detector,
            resolver,
            dispatcher,
            recipients,
        }
    }

    /// Classifier gate: `None` when the text is not a crisis message,
    /// otherwise the full pipeline result.
    pub async fn evaluate_message(&self, requester_id: &str, text: &str) -> Option<AlertOutcome> {
        if !self.detector.is_crisis(text) {
            return None;
        }
        Some(self.handle_crisis_situation(requester_id).await)
    }

    /// Run the pipeline to completion for an already-confirmed crisis.
    pub async fn handle_crisis_situation(&self, requester_id: &str) -> AlertOutcome {
        let alert_id = uuid::Uuid::new_v4();
        tracing::warn!(%alert_id, requester = requester_id, "Crisis alert triggered");

        let mut stage = AlertStage::Locating;
        let outcome = loop {
            match self.advance(stage, requester_id).await {
                AlertStage::Done(outcome) => break outcome,
                next => stage = next,
            }
        };

        tracing::info!(%alert_id, success = outcome.success, "Crisis pipeline finished");
        outcome
    }

    /// Perform one stage transition.
    pub async fn advance(&self, stage: AlertStage, requester_id: &str) -> AlertStage {
        match stage {
            AlertStage::Locating => match self.resolver.resolve().await {
                Ok(coordinates) => AlertStage::Dispatching {
                    coordinates,
                    used_fallback: false,
                },
                Err(reason) => AlertStage::FallbackLocating { reason },
            },

            // Never fails the operation; the alert goes out regardless
            AlertStage::FallbackLocating { reason } => {
                tracing::warn!(
                    error = %reason,
                    "Location acquisition failed, substituting fallback coordinates"
                );
                AlertStage::Dispatching {
                    coordinates: fallback_coordinates(),
                    used_fallback: true,
                }
            }

            AlertStage::Dispatching { coordinates, used_fallback } => {
                let request = AlertRequest {
                    requester: requester_id.to_string(),
                    coordinates,
                };

                match self.dispatcher.dispatch(&request, &self.recipients).await {
                    Ok(receipt) => {
                        tracing::info!(
                            sms = receipt.sms_message_ids.len(),
                            whatsapp = receipt.whatsapp_message_ids.len(),
                            used_fallback,
                            "Crisis alerts delivered"
                        );
                        AlertStage::Done(AlertOutcome {
                            success: true,
                            message: compose_alert_message(&coordinates),
                        })
                    }
                    Err(e) => {
                        // Full detail stays server-side; the user sees the
                        // fixed safe text only
                        tracing::error!(error = %e, "Crisis dispatch failed");
                        AlertStage::Done(AlertOutcome {
                            success: false,
                            message: SAFE_FALLBACK_TEXT.to_string(),
                        })
                    }
                }
            }

            done @ AlertStage::Done(_) => done,
        }
    }
}

fn fallback_coordinates() -> Coordinates {
    Coordinates::new(FALLBACK_LATITUDE, FALLBACK_LONGITUDE)
        .expect("fallback coordinate is in range")
}
