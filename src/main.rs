use anyhow::Result;
use axum::{
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};

use pangkalan_bot::config::Config;
use pangkalan_bot::queue::{FirebaseRepository, QueueStore};
use pangkalan_bot::{admin, webhook, AppState, StaticKeyAuthorizer, WhatsAppClient};

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": "pangkalan-bot"
    }))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    info!("Starting pangkalan queue bot");

    let config = Config::from_env()?;

    let repository = Arc::new(FirebaseRepository::new(
        config.database_url.clone(),
        config.database_auth.clone(),
    ));

    let app_state = Arc::new(AppState {
        whatsapp_client: Arc::new(WhatsAppClient::new(
            config.phone_number_id.clone(),
            config.access_token.clone(),
            config.group_ids(),
        )),
        queue_store: Arc::new(QueueStore::new(repository)),
        verify_token: config.verify_token.clone(),
        authorizer: Arc::new(StaticKeyAuthorizer::new(config.admin_key.clone())),
    });

    let app = Router::new()
        .route("/health", get(health_check))
        .route(
            "/webhook",
            get(webhook::verify_handler).post(webhook::event_handler),
        )
        .route("/admin", post(admin::admin_action_handler))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(app_state);

    let listener = TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    info!("Server listening on port {}", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
