//! Admin action surface: call, complete, remove.
//!
//! One endpoint dispatched by the `action` query parameter, gated by the
//! configured [`crate::Authorizer`] before anything else runs. Store
//! mutations happen synchronously; the WhatsApp notifications they trigger
//! run as best-effort spawned tasks.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};

use crate::queue::{Location, Plate, QueueError};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AdminQuery {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub lokasi: Option<String>,
    #[serde(default, rename = "noPol")]
    pub no_pol: Option<String>,
    #[serde(default)]
    pub admin_key: Option<String>,
}

/// `POST /admin?action=…&lokasi=…&noPol=…&admin_key=…`
pub async fn admin_action_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AdminQuery>,
) -> Response {
    if !state.authorizer.authorize(query.admin_key.as_deref()) {
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    }

    let Some(action) = query.action.as_deref() else {
        return (StatusCode::BAD_REQUEST, "Missing action").into_response();
    };
    let Some(location) = query.lokasi.as_deref().and_then(Location::from_param) else {
        return (StatusCode::BAD_REQUEST, "Missing or unknown lokasi").into_response();
    };
    let Some(no_pol) = query.no_pol.as_deref() else {
        return (StatusCode::BAD_REQUEST, "Missing noPol").into_response();
    };
    let plate = Plate::normalize(no_pol);

    info!("Admin action {} for {} at {}", action, plate, location);

    match action {
        "panggil" => handle_call(state, location, plate).await,
        "selesai" => handle_complete(state, location, plate).await,
        "hapus" => handle_remove(state, location, plate).await,
        _ => (StatusCode::BAD_REQUEST, "Unknown action").into_response(),
    }
}

async fn handle_call(state: Arc<AppState>, location: Location, plate: Plate) -> Response {
    match state.queue_store.call(location, &plate).await {
        Ok(target) => {
            let client = state.whatsapp_client.clone();
            tokio::spawn(async move {
                client
                    .notify(
                        &target.origin,
                        &format!("📣 {} silakan menuju lobby", target.plate),
                    )
                    .await;
                client
                    .notify_group(location, &format!("📣 Memanggil: {}", target.plate))
                    .await;
            });
            (StatusCode::OK, "ok").into_response()
        }
        Err(e) => queue_error_response("panggil", e),
    }
}

async fn handle_complete(state: Arc<AppState>, location: Location, plate: Plate) -> Response {
    match state.queue_store.complete(location, &plate).await {
        Ok(completion) => {
            let client = state.whatsapp_client.clone();
            tokio::spawn(async move {
                client
                    .notify_group(location, &format!("✅ Selesai: {}", completion.plate))
                    .await;
            });
            (StatusCode::OK, "ok").into_response()
        }
        Err(e) => queue_error_response("selesai", e),
    }
}

async fn handle_remove(state: Arc<AppState>, location: Location, plate: Plate) -> Response {
    match state.queue_store.remove(location, &plate).await {
        Ok(removed) => {
            let client = state.whatsapp_client.clone();
            tokio::spawn(async move {
                client
                    .notify_group(location, &format!("🗑️ Dihapus: {}", removed.plate))
                    .await;
            });
            (StatusCode::OK, "ok").into_response()
        }
        Err(e) => queue_error_response("hapus", e),
    }
}

/// Map queue errors onto the admin response contract.
fn queue_error_response(operation: &str, error: QueueError) -> Response {
    match error {
        QueueError::NotFound { .. } => (StatusCode::NOT_FOUND, "Not found").into_response(),
        QueueError::NoContact { .. } => (StatusCode::BAD_REQUEST, "No phone stored").into_response(),
        QueueError::Repository(e) => {
            error!("Admin action {} failed: {}", operation, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::RepositoryError;
    use axum::http::Uri;

    #[test]
    fn test_admin_query_deserialization() {
        let uri: Uri = "http://localhost/admin?action=panggil&lokasi=mall_nusantara&noPol=b1234xyz&admin_key=k"
            .parse()
            .unwrap();
        let Query(query) = Query::<AdminQuery>::try_from_uri(&uri).unwrap();

        assert_eq!(query.action.as_deref(), Some("panggil"));
        assert_eq!(query.lokasi.as_deref(), Some("mall_nusantara"));
        assert_eq!(query.no_pol.as_deref(), Some("b1234xyz"));
        assert_eq!(query.admin_key.as_deref(), Some("k"));
    }

    #[test]
    fn test_admin_query_missing_fields_default_to_none() {
        let uri: Uri = "http://localhost/admin?action=hapus".parse().unwrap();
        let Query(query) = Query::<AdminQuery>::try_from_uri(&uri).unwrap();

        assert_eq!(query.action.as_deref(), Some("hapus"));
        assert!(query.lokasi.is_none());
        assert!(query.no_pol.is_none());
        assert!(query.admin_key.is_none());
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let response = queue_error_response(
            "panggil",
            QueueError::NotFound {
                plate: Plate::normalize("B1"),
            },
        );
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_no_contact_maps_to_400() {
        let response = queue_error_response(
            "panggil",
            QueueError::NoContact {
                plate: Plate::normalize("B1"),
            },
        );
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_repository_error_maps_to_500() {
        let response = queue_error_response(
            "selesai",
            QueueError::Repository(RepositoryError::storage("get entry", "connection refused")),
        );
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
