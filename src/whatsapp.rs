//! WhatsApp Cloud API client.
//!
//! Sends text messages to a single number or a per-location group via the
//! Graph API `/{phone_number_id}/messages` endpoint. Send failures are the
//! caller's to log; nothing here retries.

use std::collections::HashMap;

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::queue::Location;

const GRAPH_API_BASE: &str = "https://graph.facebook.com/v19.0";

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    messaging_product: &'static str,
    to: &'a str,
    text: TextBody<'a>,
}

#[derive(Debug, Serialize)]
struct TextBody<'a> {
    body: &'a str,
}

pub struct WhatsAppClient {
    client: Client,
    phone_number_id: String,
    access_token: String,
    /// Broadcast group per location. Locations without a configured group
    /// simply skip broadcasts.
    group_ids: HashMap<Location, String>,
}

impl WhatsAppClient {
    pub fn new(
        phone_number_id: String,
        access_token: String,
        group_ids: HashMap<Location, String>,
    ) -> Self {
        Self {
            client: Client::new(),
            phone_number_id,
            access_token,
            group_ids,
        }
    }

    /// Send a text message to a WhatsApp identifier.
    pub async fn send_text(&self, to: &str, body: &str) -> Result<()> {
        let url = format!("{}/{}/messages", GRAPH_API_BASE, self.phone_number_id);
        let request_body = SendMessageRequest {
            messaging_product: "whatsapp",
            to,
            text: TextBody { body },
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.access_token))
            .json(&request_body)
            .send()
            .await
            .context("Failed to send WhatsApp message request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .context("Failed to read error response body")?;
            error!("WhatsApp API error: {} - {}", status, error_text);
            return Err(anyhow!("WhatsApp API error: {} - {}", status, error_text));
        }

        info!("Sent WhatsApp message to {}", to);
        Ok(())
    }

    /// Broadcast a text message to the location's group, if one is
    /// configured. An unconfigured group is a successful no-op.
    pub async fn send_to_group(&self, location: Location, body: &str) -> Result<()> {
        let Some(group_id) = self.group_ids.get(&location) else {
            debug!("No group configured for {}, skipping broadcast", location);
            return Ok(());
        };
        self.send_text(group_id, body).await
    }

    /// Best-effort send to a number: failures are logged and swallowed.
    /// Store mutations are never rolled back over a failed notification.
    pub async fn notify(&self, to: &str, body: &str) {
        if let Err(e) = self.send_text(to, body).await {
            error!("Failed to notify {}: {:#}", to, e);
        }
    }

    /// Best-effort group broadcast: failures are logged and swallowed.
    pub async fn notify_group(&self, location: Location, body: &str) {
        if let Err(e) = self.send_to_group(location, body).await {
            error!("Failed to broadcast to {} group: {:#}", location, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_message_request_wire_format() {
        let request = SendMessageRequest {
            messaging_product: "whatsapp",
            to: "628111222333",
            text: TextBody { body: "halo" },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "messaging_product": "whatsapp",
                "to": "628111222333",
                "text": { "body": "halo" },
            })
        );
    }

    #[tokio::test]
    async fn test_send_to_group_without_config_is_noop() {
        let client = WhatsAppClient::new(
            "12345".to_string(),
            "token".to_string(),
            HashMap::new(),
        );
        // No group id configured: returns Ok without touching the network.
        client
            .send_to_group(Location::MallNusantara, "test")
            .await
            .unwrap();
    }
}
