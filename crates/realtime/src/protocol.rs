//! Wire protocol: every frame is a JSON envelope `{ "type": ..., "payload": ... }`.

use riskdash_domain::enums::SimulationStatus;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Event names dispatched to listeners.
pub mod events {
    /// Emitted locally when the socket opens.
    pub const CONNECTED: &str = "connected";
    /// Emitted locally when the socket closes, with `{ "code": u16 }`.
    pub const DISCONNECTED: &str = "disconnected";
    /// Emitted locally on a transport failure.
    pub const ERROR: &str = "error";
    /// Emitted locally once the reconnect budget is exhausted.
    pub const RECONNECT_FAILED: &str = "reconnect_failed";

    pub const SIMULATION_STATUS: &str = "simulation_status";
    pub const SIMULATION_PROGRESS: &str = "simulation_progress";
    pub const SIMULATION_RESULTS: &str = "simulation_results";
    pub const NOTIFICATION: &str = "notification";
}

/// A framed message in either direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
}

impl Envelope {
    /// Creates a new envelope.
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }
}

/// Messages the client sends to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    SubscribeSimulation { simulation_id: String },
    UnsubscribeSimulation { simulation_id: String },
    SubscribeNotifications,
    UnsubscribeNotifications,
}

impl ClientMessage {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SubscribeSimulation { .. } => "subscribe_simulation",
            Self::UnsubscribeSimulation { .. } => "unsubscribe_simulation",
            Self::SubscribeNotifications => "subscribe_notifications",
            Self::UnsubscribeNotifications => "unsubscribe_notifications",
        }
    }

    #[must_use]
    pub fn payload(&self) -> Value {
        match self {
            Self::SubscribeSimulation { simulation_id }
            | Self::UnsubscribeSimulation { simulation_id } => {
                json!({ "simulation_id": simulation_id })
            }
            Self::SubscribeNotifications | Self::UnsubscribeNotifications => json!({}),
        }
    }

    #[must_use]
    pub fn into_envelope(self) -> Envelope {
        Envelope::new(self.kind(), self.payload())
    }
}

/// Payload of `simulation_progress`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationProgress {
    pub simulation_id: String,
    /// `0..=100`.
    pub percentage: f64,
    #[serde(default)]
    pub message: Option<String>,
}

/// Payload of `simulation_status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationStatusUpdate {
    pub simulation_id: String,
    pub status: SimulationStatus,
    #[serde(default)]
    pub message: Option<String>,
}

/// Payload of `notification`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default)]
    pub title: Option<String>,
    pub message: String,
    #[serde(default)]
    pub level: Option<String>,
}

/// Typed view of the server events this client understands.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    SimulationStatus(SimulationStatusUpdate),
    SimulationProgress(SimulationProgress),
    /// Results are forwarded untouched; fetch them over REST for the typed form.
    SimulationResults(Value),
    Notification(Notification),
}

impl ServerEvent {
    /// Parses a known event. Unknown types and malformed payloads yield `None`.
    #[must_use]
    pub fn parse(kind: &str, payload: &Value) -> Option<Self> {
        let event = match kind {
            events::SIMULATION_STATUS => {
                Self::SimulationStatus(serde_json::from_value(payload.clone()).ok()?)
            }
            events::SIMULATION_PROGRESS => {
                Self::SimulationProgress(serde_json::from_value(payload.clone()).ok()?)
            }
            events::SIMULATION_RESULTS => Self::SimulationResults(payload.clone()),
            events::NOTIFICATION => {
                Self::Notification(serde_json::from_value(payload.clone()).ok()?)
            }
            _ => return None,
        };
        Some(event)
    }

    /// Simulation the event refers to, if any.
    #[must_use]
    pub fn simulation_id(&self) -> Option<&str> {
        match self {
            Self::SimulationStatus(update) => Some(&update.simulation_id),
            Self::SimulationProgress(progress) => Some(&progress.simulation_id),
            Self::SimulationResults(payload) => {
                payload.get("simulation_id").and_then(Value::as_str)
            }
            Self::Notification(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_envelope() {
        let envelope = ClientMessage::SubscribeSimulation {
            simulation_id: "42".into(),
        }
        .into_envelope();
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({ "type": "subscribe_simulation", "payload": { "simulation_id": "42" } })
        );

        let envelope = ClientMessage::SubscribeNotifications.into_envelope();
        assert_eq!(envelope.payload, json!({}));
    }

    #[test]
    fn test_envelope_without_payload() {
        let envelope: Envelope = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert_eq!(envelope.kind, "ping");
        assert!(envelope.payload.is_null());
    }

    #[test]
    fn test_parse_server_events() {
        let progress = ServerEvent::parse(
            events::SIMULATION_PROGRESS,
            &json!({ "simulation_id": "42", "percentage": 37.5 }),
        );
        assert_eq!(
            progress,
            Some(ServerEvent::SimulationProgress(SimulationProgress {
                simulation_id: "42".into(),
                percentage: 37.5,
                message: None,
            }))
        );

        let status = ServerEvent::parse(
            events::SIMULATION_STATUS,
            &json!({ "simulation_id": "42", "status": "completed" }),
        )
        .unwrap();
        assert_eq!(status.simulation_id(), Some("42"));

        assert!(ServerEvent::parse("something_else", &json!({})).is_none());
        assert!(ServerEvent::parse(events::SIMULATION_PROGRESS, &json!({})).is_none());
    }
}
