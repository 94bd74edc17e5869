use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::command::{self, Command, ParseResult};
use crate::queue::{Location, QueueEntry};
use crate::AppState;

/// Query parameters of the Meta webhook verification handshake.
#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    #[serde(default, rename = "hub.mode")]
    pub mode: String,
    #[serde(default, rename = "hub.verify_token")]
    pub verify_token: String,
    #[serde(default, rename = "hub.challenge")]
    pub challenge: String,
}

// --- Meta webhook payload types ---
//
// Every level is defaulted: notifications that carry no message (status
// updates, etc.) deserialize to an empty shape and are ignored.

#[derive(Debug, Deserialize)]
pub struct WebhookNotification {
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub changes: Vec<WebhookChange>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookChange {
    #[serde(default)]
    pub value: Option<WebhookValue>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookValue {
    #[serde(default)]
    pub messages: Vec<WebhookMessage>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookMessage {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub text: Option<WebhookTextContent>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookTextContent {
    #[serde(default)]
    pub body: String,
}

#[derive(Serialize)]
pub struct WebhookResponse {
    pub message: String,
}

/// Decide the verification response: the literal challenge on a token
/// match, 403 otherwise.
fn verification_reply(query: &VerifyQuery, expected_token: &str) -> Result<String, StatusCode> {
    if query.mode == "subscribe" && query.verify_token == expected_token {
        Ok(query.challenge.clone())
    } else {
        Err(StatusCode::FORBIDDEN)
    }
}

/// `GET /webhook`: Meta's verification handshake.
pub async fn verify_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VerifyQuery>,
) -> Response {
    match verification_reply(&query, &state.verify_token) {
        Ok(challenge) => {
            info!("Webhook verification succeeded");
            (StatusCode::OK, challenge).into_response()
        }
        Err(status) => {
            warn!("Webhook verification failed: mode={}", query.mode);
            (status, "Verification failed").into_response()
        }
    }
}

/// `POST /webhook`: inbound message events.
///
/// The upstream delivery contract wants an immediate 200; processing runs
/// in a spawned task and its failures are only ever logged.
pub async fn event_handler(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let ack = Json(WebhookResponse {
        message: "EVENT_RECEIVED".to_string(),
    });

    let payload = match serde_json::from_slice::<WebhookNotification>(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Ignoring undecodable webhook payload: {}", e);
            return ack.into_response();
        }
    };

    tokio::spawn(async move {
        if let Err(e) = process_event(state, payload).await {
            error!("Failed to process webhook event: {:#}", e);
        }
    });

    ack.into_response()
}

/// The first message of a notification, if it carries one.
fn first_message(payload: &WebhookNotification) -> Option<&WebhookMessage> {
    payload
        .entry
        .first()?
        .changes
        .first()?
        .value
        .as_ref()?
        .messages
        .first()
}

async fn process_event(state: Arc<AppState>, payload: WebhookNotification) -> anyhow::Result<()> {
    let Some(message) = first_message(&payload) else {
        return Ok(());
    };

    let from = message.from.clone();
    let text = message
        .text
        .as_ref()
        .map(|t| t.body.trim().to_string())
        .unwrap_or_default();

    info!("Inbound message from {}", from);

    // Cross-midnight commands must see a fresh queue.
    for location in Location::ALL {
        state.queue_store.ensure_daily_reset(location).await?;
    }

    match command::parse_message(&text) {
        ParseResult::Command(Command::Register { location, plate }) => {
            let Some(plate) = plate else {
                let usage = format!(
                    "❌ Format: {} B1234XYZ",
                    command::register_keyword(location)
                );
                state.whatsapp_client.notify(&from, &usage).await;
                return Ok(());
            };

            let registration = state
                .queue_store
                .register(location, Some(from.clone()), plate)
                .await?;

            let reply = format!(
                "✅ {} terdaftar sebagai {}",
                registration.plate, registration.status
            );
            state.whatsapp_client.notify(&from, &reply).await;

            let broadcast = format!(
                "🆕 Antrian baru: {} ({})",
                registration.plate, registration.status
            );
            state.whatsapp_client.notify_group(location, &broadcast).await;
        }
        ParseResult::Command(Command::List { location }) => {
            let entries = state.queue_store.list(location).await?;
            let reply = if entries.is_empty() {
                "📋 Belum ada antrian.".to_string()
            } else {
                format!("📋 Antrian:\n{}", format_queue_list(&entries))
            };
            state.whatsapp_client.notify(&from, &reply).await;
        }
        ParseResult::Unrecognized => {
            state
                .whatsapp_client
                .notify(&from, "⚠️ Format tidak dikenal.")
                .await;
        }
    }

    Ok(())
}

/// Render entries (already in arrival order) as a 1-indexed list.
fn format_queue_list(entries: &[QueueEntry]) -> String {
    entries
        .iter()
        .enumerate()
        .map(|(i, e)| format!("{}. {} ({})", i + 1, e.plate, e.status))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::{EntryStatus, Plate};

    fn verify_query(mode: &str, token: &str, challenge: &str) -> VerifyQuery {
        VerifyQuery {
            mode: mode.to_string(),
            verify_token: token.to_string(),
            challenge: challenge.to_string(),
        }
    }

    #[test]
    fn test_verification_echoes_challenge_on_match() {
        let query = verify_query("subscribe", "s3cret", "challenge-42");
        assert_eq!(
            verification_reply(&query, "s3cret"),
            Ok("challenge-42".to_string())
        );
    }

    #[test]
    fn test_verification_rejects_wrong_token() {
        let query = verify_query("subscribe", "wrong", "challenge-42");
        assert_eq!(
            verification_reply(&query, "s3cret"),
            Err(StatusCode::FORBIDDEN)
        );
    }

    #[test]
    fn test_verification_rejects_wrong_mode() {
        let query = verify_query("unsubscribe", "s3cret", "challenge-42");
        assert_eq!(
            verification_reply(&query, "s3cret"),
            Err(StatusCode::FORBIDDEN)
        );
    }

    #[test]
    fn test_verify_query_deserialization() {
        let query: VerifyQuery = serde_json::from_str(
            r#"{"hub.mode":"subscribe","hub.verify_token":"t","hub.challenge":"c"}"#,
        )
        .unwrap();
        assert_eq!(query.mode, "subscribe");
        assert_eq!(query.verify_token, "t");
        assert_eq!(query.challenge, "c");
    }

    #[test]
    fn test_first_message_extraction() {
        let payload: WebhookNotification = serde_json::from_str(
            r##"{
                "entry": [{
                    "changes": [{
                        "value": {
                            "messages": [{
                                "from": "628111222333",
                                "text": { "body": "#daftarantrian B1" }
                            }]
                        }
                    }]
                }]
            }"##,
        )
        .unwrap();

        let message = first_message(&payload).expect("expected a message");
        assert_eq!(message.from, "628111222333");
        assert_eq!(message.text.as_ref().unwrap().body, "#daftarantrian B1");
    }

    #[test]
    fn test_notification_without_message_is_empty() {
        // Status-update notifications have no messages array.
        let payload: WebhookNotification =
            serde_json::from_str(r#"{"entry": [{"changes": [{"value": {}}]}]}"#).unwrap();
        assert!(first_message(&payload).is_none());

        let empty: WebhookNotification = serde_json::from_str("{}").unwrap();
        assert!(first_message(&empty).is_none());
    }

    #[test]
    fn test_format_queue_list_numbering() {
        let entries = vec![
            QueueEntry {
                plate: Plate::normalize("B1"),
                origin: None,
                status: EntryStatus::Active,
                created_at: "2024-06-01T01:00:00Z".to_string(),
            },
            QueueEntry {
                plate: Plate::normalize("B4"),
                origin: None,
                status: EntryStatus::Buffered,
                created_at: "2024-06-01T02:00:00Z".to_string(),
            },
        ];
        assert_eq!(format_queue_list(&entries), "1. B1 (active)\n2. B4 (buffered)");
    }
}
