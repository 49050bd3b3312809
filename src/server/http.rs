//! Signaling HTTP server
//!
//! Exposes the four signaling operations as synchronous request/response
//! endpoints. Each handler validates fields, delegates to the negotiation
//! coordinator, and maps every outcome to the in-band `{errNo, errMsg,
//! data}` body with HTTP 200. Errors never surface as transport-level
//! status codes.

use std::future::IntoFuture;
use std::sync::Arc;

use axum::async_trait;
use axum::extract::{FromRequest, Request, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use tokio::net::TcpListener;

use crate::bridge::MediaBridge;
use crate::error::SignalingError;
use crate::negotiate::NegotiationCoordinator;
use crate::registry::{Role, SessionRegistry};

use super::api::{AnswerParams, ApiResponse, CreateParams, StopParams};
use super::config::ServerConfig;

/// Request body accepted as form-encoded or JSON
///
/// The legacy web clients post form bodies; newer callers send JSON. Both
/// decode into the same parameter structs. A malformed body is rejected
/// with the wire's validation error rather than a bare 4xx.
pub struct AnyForm<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for AnyForm<T>
where
    S: Send + Sync,
    T: serde::de::DeserializeOwned + 'static,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if content_type.starts_with("application/json") {
            match Json::<T>::from_request(req, state).await {
                Ok(Json(value)) => Ok(AnyForm(value)),
                Err(e) => Err(validation_rejection(e.to_string())),
            }
        } else {
            match Form::<T>::from_request(req, state).await {
                Ok(Form(value)) => Ok(AnyForm(value)),
                Err(e) => Err(validation_rejection(e.to_string())),
            }
        }
    }
}

fn validation_rejection(msg: String) -> Response {
    let err = SignalingError::Validation(msg);
    Json(ApiResponse::from_error(&err)).into_response()
}

/// Shared state handed to every handler
#[derive(Clone)]
struct AppState {
    coordinator: Arc<NegotiationCoordinator>,
}

/// Signaling server over HTTP
pub struct SignalingServer {
    config: ServerConfig,
    coordinator: Arc<NegotiationCoordinator>,
    registry: Arc<SessionRegistry>,
}

impl SignalingServer {
    /// Create a new server with the given configuration and media bridge
    pub fn new(config: ServerConfig, bridge: Arc<dyn MediaBridge>) -> Self {
        let registry = Arc::new(SessionRegistry::with_config(config.registry_config()));
        let coordinator = Arc::new(NegotiationCoordinator::new(Arc::clone(&registry), bridge));

        Self {
            config,
            coordinator,
            registry,
        }
    }

    /// Get a reference to the session registry
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Get a reference to the negotiation coordinator
    pub fn coordinator(&self) -> &Arc<NegotiationCoordinator> {
        &self.coordinator
    }

    /// Build the router with all endpoints
    pub fn router(&self) -> Router {
        let state = AppState {
            coordinator: Arc::clone(&self.coordinator),
        };

        Router::new()
            .route("/health", get(health_handler))
            .route("/signaling/push", post(push_handler))
            .route("/signaling/pull", post(pull_handler))
            .route("/signaling/sendanswer", post(sendanswer_handler))
            .route("/signaling/stoppush", post(stoppush_handler))
            .route("/signaling/stoppull", post(stoppull_handler))
            .with_state(state)
            .layer(
                tower::ServiceBuilder::new()
                    .layer(tower_http::trace::TraceLayer::new_for_http())
                    .layer(tower_http::cors::CorsLayer::permissive()),
            )
    }

    /// Run the server
    ///
    /// This method blocks until the server is shut down.
    pub async fn run(&self) -> std::io::Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "Signaling server listening");

        // Evict sessions abandoned mid-negotiation
        let _cleanup_handle = self.registry.spawn_cleanup_task();

        axum::serve(listener, self.router()).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> std::io::Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "Signaling server listening");

        let cleanup_handle = self.registry.spawn_cleanup_task();

        let result = tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
            result = axum::serve(listener, self.router()).into_future() => result,
        };

        cleanup_handle.abort();
        result
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> std::net::SocketAddr {
        self.config.bind_addr
    }
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn push_handler(
    State(state): State<AppState>,
    AnyForm(params): AnyForm<CreateParams>,
) -> Json<ApiResponse> {
    Json(create_session(&state, Role::Publisher, params).await)
}

async fn pull_handler(
    State(state): State<AppState>,
    AnyForm(params): AnyForm<CreateParams>,
) -> Json<ApiResponse> {
    Json(create_session(&state, Role::Subscriber, params).await)
}

async fn create_session(state: &AppState, role: Role, params: CreateParams) -> ApiResponse {
    let key = match params.key(role) {
        Ok(key) => key,
        Err(e) => return ApiResponse::from_error(&e),
    };

    match state
        .coordinator
        .create_session(key, params.audio, params.video, params.client_offer())
        .await
    {
        Ok(payload) => ApiResponse::with_sdp(&payload),
        Err(e) => {
            tracing::warn!(error = %e, "Create request failed");
            ApiResponse::from_error(&e)
        }
    }
}

async fn sendanswer_handler(
    State(state): State<AppState>,
    AnyForm(params): AnyForm<AnswerParams>,
) -> Json<ApiResponse> {
    let key = match params.key() {
        Ok(key) => key,
        Err(e) => return Json(ApiResponse::from_error(&e)),
    };

    match state.coordinator.handle_answer(&key, params.answer).await {
        Ok(()) => Json(ApiResponse::ok()),
        Err(e) => {
            tracing::warn!(session = %key, error = %e, "Answer rejected");
            Json(ApiResponse::from_error(&e))
        }
    }
}

async fn stoppush_handler(
    State(state): State<AppState>,
    AnyForm(params): AnyForm<StopParams>,
) -> Json<ApiResponse> {
    Json(stop_session(&state, Role::Publisher, params).await)
}

async fn stoppull_handler(
    State(state): State<AppState>,
    AnyForm(params): AnyForm<StopParams>,
) -> Json<ApiResponse> {
    Json(stop_session(&state, Role::Subscriber, params).await)
}

async fn stop_session(state: &AppState, role: Role, params: StopParams) -> ApiResponse {
    let key = match params.key(role) {
        Ok(key) => key,
        Err(e) => return ApiResponse::from_error(&e),
    };

    match state.coordinator.stop(&key).await {
        Ok(()) => ApiResponse::ok(),
        Err(e) => ApiResponse::from_error(&e),
    }
}
