pub mod admin;
pub mod authorizer;
pub mod command;
pub mod config;
pub mod queue;
pub mod webhook;
pub mod whatsapp;

use std::sync::Arc;

pub use authorizer::{Authorizer, StaticKeyAuthorizer};
pub use whatsapp::WhatsAppClient;

use queue::QueueStore;

pub struct AppState {
    pub whatsapp_client: Arc<WhatsAppClient>,
    pub queue_store: Arc<QueueStore>,
    pub verify_token: String,
    pub authorizer: Arc<dyn Authorizer>,
}
