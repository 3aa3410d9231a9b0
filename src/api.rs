//! HTTP façade.
//!
//! - `GET /` — health check
//! - `POST /chat` — `{"query": "...", "session": "optional-id"}` → `FinalAnswer`
//! - `DELETE /sessions/:id` — forget one session's memory
//!
//! Requests without a session share the default agent. Each named session
//! gets its own agent (same client, tools and whitelist; separate memory).
//! At most `max_sessions` named sessions are kept; creating one more drops
//! the oldest.
//! Agent failures are not translated per kind: they all come back as a 500
//! with an `{"error": ...}` body.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{delete, get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::agent::{Agent, FinalAnswer};
use crate::config::{Config, LoopMode};
use crate::error::Error;
use crate::Result;

/// Named session agents in creation order, bounded like short-term memory.
struct Sessions {
    agents: HashMap<String, Arc<Agent>>,
    order: VecDeque<String>,
    max_sessions: usize,
}

impl Sessions {
    fn new(max_sessions: usize) -> Self {
        Self {
            agents: HashMap::new(),
            order: VecDeque::new(),
            max_sessions,
        }
    }

    fn get(&self, id: &str) -> Option<Arc<Agent>> {
        self.agents.get(id).cloned()
    }

    fn get_or_insert_with<F>(&mut self, id: &str, make: F) -> Arc<Agent>
    where
        F: FnOnce() -> Agent,
    {
        if let Some(agent) = self.get(id) {
            return agent;
        }

        let agent = Arc::new(make());
        self.agents.insert(id.to_string(), Arc::clone(&agent));
        self.order.push_back(id.to_string());

        while self.order.len() > self.max_sessions {
            if let Some(oldest) = self.order.pop_front() {
                self.agents.remove(&oldest);
                debug!("Dropped session {}", oldest);
            }
        }
        agent
    }

    fn remove(&mut self, id: &str) -> Option<Arc<Agent>> {
        let agent = self.agents.remove(id)?;
        self.order.retain(|s| s != id);
        Some(agent)
    }
}

/// Shared application state for the façade.
pub struct AppState {
    agent: Arc<Agent>,
    mode: LoopMode,
    sessions: RwLock<Sessions>,
}

impl AppState {
    pub fn new(agent: Agent, mode: LoopMode, max_sessions: usize) -> Self {
        Self {
            agent: Arc::new(agent),
            mode,
            sessions: RwLock::new(Sessions::new(max_sessions)),
        }
    }

    async fn agent_for(&self, session: Option<&str>) -> Arc<Agent> {
        let Some(id) = session else {
            return Arc::clone(&self.agent);
        };

        if let Some(agent) = self.sessions.read().await.get(id) {
            return agent;
        }

        self.sessions
            .write()
            .await
            .get_or_insert_with(id, || self.agent.fork())
    }
}

type SharedState = Arc<AppState>;

/// Build the Axum router with all façade routes.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(health_handler))
        .route("/chat", post(chat_handler))
        .route("/sessions/:id", delete(forget_session_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind to the configured address and serve until Ctrl+C.
pub async fn serve(config: Config) -> Result<()> {
    let agent = Agent::from_config(&config)?;
    let state = Arc::new(AppState::new(agent, config.mode, config.max_sessions));

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!("Listening on http://{} (mode={:?})", listener.local_addr()?, config.mode);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub query: String,

    #[serde(default)]
    pub session: Option<String>,
}

async fn chat_handler(
    State(state): State<SharedState>,
    Json(req): Json<ChatRequest>,
) -> std::result::Result<Json<FinalAnswer>, ApiError> {
    let agent = state.agent_for(req.session.as_deref()).await;
    let answer = agent.respond(&req.query, state.mode).await?;
    Ok(Json(answer))
}

async fn forget_session_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> StatusCode {
    match state.sessions.write().await.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}

/// Any agent error, rendered as a generic server error.
struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!("Chat request failed: {}", self.0);
        let body = serde_json::json!({ "error": self.0.to_string() });
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
