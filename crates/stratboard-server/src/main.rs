//! StratBoard Document Server
//!
//! Stores boards and project lists for clients running in cloud mode.
//!
//! ## API
//!
//! ```text
//! GET    /health                                 -> "ok"
//! GET    /v1/users/{user}/documents              -> ["key", ...]
//! GET    /v1/users/{user}/documents/{key}        -> { "key", "data", "updatedAt" } | 404
//! PUT    /v1/users/{user}/documents/{key}        <- { "data": "<json text>" } -> 204 | 400
//! DELETE /v1/users/{user}/documents/{key}        -> 204
//! ```
//!
//! When `STRATBOARD_TOKEN` is set, `/v1` requests need
//! `Authorization: Bearer <token>`.

mod store;

use axum::{
    Json, Router,
    extract::{Path, Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use std::{net::SocketAddr, sync::Arc};
use store::{DocumentRecord, DocumentStore, StoreError};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

const DEFAULT_ADDR: &str = "0.0.0.0:3030";

/// Shared application state
struct AppState {
    store: DocumentStore,
    /// Bearer token required on `/v1` routes, if any
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PutDocument {
    data: String,
}

/// Handler errors, mapped to status codes.
#[derive(Debug)]
enum ApiError {
    NotFound,
    BadRequest(String),
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::InvalidJson(e) => ApiError::BadRequest(format!("data is not valid JSON: {}", e)),
            StoreError::Io(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, "not found").into_response(),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            ApiError::Internal(message) => {
                error!("Request failed: {}", message);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
            }
        }
    }
}

fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/users/{user}/documents", get(list_documents))
        .route(
            "/users/{user}/documents/{key}",
            get(get_document).put(put_document).delete(delete_document),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token));

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .nest("/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stratboard_server=info,tower_http=info".into()),
        )
        .init();

    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let addr: SocketAddr = std::env::var("STRATBOARD_ADDR")
        .unwrap_or_else(|_| DEFAULT_ADDR.to_string())
        .parse()?;

    let store = match std::env::var_os("STRATBOARD_DATA") {
        Some(dir) => DocumentStore::open(dir).await?,
        None => {
            info!("STRATBOARD_DATA not set, documents are kept in memory only");
            DocumentStore::new()
        }
    };
    let token = std::env::var("STRATBOARD_TOKEN").ok().filter(|t| !t.is_empty());
    if token.is_none() {
        warn!("STRATBOARD_TOKEN not set, the API is open to anyone");
    }

    let app = router(Arc::new(AppState { store, token }));

    info!("StratBoard document server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Index page
async fn index() -> &'static str {
    "StratBoard Document Server - API under /v1"
}

/// Health check
async fn health() -> &'static str {
    "ok"
}

async fn require_token(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    if let Some(expected) = &state.token {
        let presented = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        if presented != Some(expected.as_str()) {
            warn!("Rejected unauthenticated request to {}", request.uri().path());
            return (StatusCode::UNAUTHORIZED, "unauthorized").into_response();
        }
    }
    next.run(request).await
}

async fn list_documents(
    State(state): State<Arc<AppState>>,
    Path(user): Path<String>,
) -> Json<Vec<String>> {
    Json(state.store.list(&user))
}

async fn get_document(
    State(state): State<Arc<AppState>>,
    Path((user, key)): Path<(String, String)>,
) -> Result<Json<DocumentRecord>, ApiError> {
    state.store.get(&user, &key).map(Json).ok_or(ApiError::NotFound)
}

async fn put_document(
    State(state): State<Arc<AppState>>,
    Path((user, key)): Path<(String, String)>,
    Json(body): Json<PutDocument>,
) -> Result<StatusCode, ApiError> {
    state.store.put(&user, &key, body.data).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_document(
    State(state): State<Arc<AppState>>,
    Path((user, key)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state.store.delete(&user, &key).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> Arc<AppState> {
        Arc::new(AppState {
            store: DocumentStore::new(),
            token: None,
        })
    }

    fn path(user: &str, key: &str) -> Path<(String, String)> {
        Path((user.to_string(), key.to_string()))
    }

    #[tokio::test]
    async fn test_document_lifecycle() {
        let state = state();
        let status = put_document(
            State(state.clone()),
            path("alice", "stratboard-projects"),
            Json(PutDocument { data: "[]".into() }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let Json(keys) = list_documents(State(state.clone()), Path("alice".into())).await;
        assert_eq!(keys, vec!["stratboard-projects"]);

        let Json(record) = get_document(State(state.clone()), path("alice", "stratboard-projects"))
            .await
            .unwrap();
        assert_eq!(record.data, "[]");

        let status = delete_document(State(state.clone()), path("alice", "stratboard-projects"))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
        let missing = get_document(State(state.clone()), path("alice", "stratboard-projects")).await;
        assert!(matches!(missing, Err(ApiError::NotFound)));

        // Deleting again is not an error
        assert!(delete_document(State(state), path("alice", "stratboard-projects")).await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_json_is_bad_request() {
        let result = put_document(
            State(state()),
            path("alice", "k"),
            Json(PutDocument { data: "{oops".into() }),
        )
        .await;
        let response = result.unwrap_err().into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_record_wire_format() {
        let record = DocumentRecord {
            key: "k".into(),
            data: "{}".into(),
            updated_at: chrono::Utc::now(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("updatedAt").is_some());
        assert_eq!(json["data"], "{}");
    }
}
