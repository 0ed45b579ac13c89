use std::net::SocketAddr;

use axum::extract::{Path, Query, Request, State};
use axum::http::header::{HeaderName, HeaderValue};
use axum::http::Method;
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use contracts::{
    ActionResult, ActionsPayload, ApiError, EntityId, EntitySnapshot, ErrorCode, Position,
    QueryResponse, SummarizedActionOutcome, SummarizedActionPayload, WorldEvent, WorldStatus,
    SCHEMA_VERSION_V1,
};
use kernel_core::{NodeView, ScenarioError, ScenarioSpec, ShapeError, WorldError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::{EngineApi, ScenarioReport};

const DEFAULT_PAGE_SIZE: usize = 500;
const MAX_PAGE_SIZE: usize = 5000;

include!("error.rs");
include!("state.rs");
include!("routes/world.rs");
include!("routes/actions.rs");
include!("routes/query.rs");
include!("routes/spatial.rs");
include!("util.rs");

/// Serves the HTTP API over `engine` until the listener fails.
pub async fn serve(addr: SocketAddr, engine: EngineApi) -> Result<(), ServerError> {
    let state = AppState::new(engine);
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "http api listening");
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/world", post(replace_world).get(get_status))
        .route("/api/v1/actions", post(submit_actions))
        .route("/api/v1/actions/summarized", post(submit_summarized))
        .route("/api/v1/entities", get(list_entities))
        .route("/api/v1/entities/{id}", get(get_entity))
        .route("/api/v1/nodes/{x}/{y}", get(get_node))
        .route("/api/v1/events", get(get_events))
        .route("/api/v1/spatial/path", get(spatial_path))
        .route("/api/v1/spatial/path_distance", get(spatial_path_distance))
        .route("/api/v1/spatial/radius", get(spatial_radius))
        .route("/api/v1/spatial/shadow", get(spatial_shadow))
        .route("/api/v1/spatial/raycast", get(spatial_raycast))
        .route("/api/v1/spatial/rectangle", get(spatial_rectangle))
        .layer(middleware::from_fn(cors_middleware))
        .with_state(state)
}

async fn cors_middleware(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        let mut response = Response::new(axum::body::Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return response;
    }

    let mut response = next.run(request).await;
    apply_cors_headers(response.headers_mut());
    response
}

#[cfg(test)]
mod tests;
