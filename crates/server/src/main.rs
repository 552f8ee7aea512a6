use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    middleware,
    routing::{get, put},
    Json, Router,
};
use server_api::{
    create_event, delete_event, health, list_events, update_event, ApiContext, EventPolicy,
};
use shared::{
    domain::{EventId, EventRecord},
    error::ApiError,
    protocol::{DeleteConfirmation, EventDraft},
};
use storage::Storage;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info, warn};

mod app_state;
mod config;
mod cors;

use app_state::AppState;
use config::{load_settings, prepare_database_url};
use cors::{reject_disallowed_origin, OriginAllowList};

const MAX_BODY_BYTES: usize = 64 * 1024;
const BANNER: &str = "Calendar event service is running.";

type HttpError = (StatusCode, Json<ApiError>);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = load_settings();
    tracing_subscriber::fmt()
        .with_env_filter(settings.log_filter.as_str())
        .init();

    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;
    let api = ApiContext::new(
        storage,
        EventPolicy {
            require_end_after_start: settings.require_end_after_start,
        },
    );
    let origins = OriginAllowList::new(&settings.allowed_origins);
    let app = build_router(Arc::new(AppState { api, origins }));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, allowed_origins = ?settings.allowed_origins, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        error!(%error, "failed to listen for shutdown signal");
    }
    info!("shutting down");
}

fn build_router(state: Arc<AppState>) -> Router {
    let cors = state.origins.layer();
    Router::new()
        .route("/", get(banner))
        .route("/healthz", get(healthz))
        .route("/events", get(http_list_events).post(http_create_event))
        .route("/events/:id", put(http_update_event).delete(http_delete_event))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            reject_disallowed_origin,
        ))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(cors)
        .with_state(state)
}

async fn banner() -> &'static str {
    BANNER
}

async fn healthz(State(state): State<Arc<AppState>>) -> Result<&'static str, HttpError> {
    health(&state.api).await.map_err(http_error)?;
    Ok("ok")
}

async fn http_create_event(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<EventDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<EventRecord>), HttpError> {
    let Json(draft) = payload.map_err(body_rejection)?;
    let event = create_event(&state.api, &draft)
        .await
        .map_err(http_error)?;
    Ok((StatusCode::CREATED, Json(event)))
}

async fn http_list_events(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<EventRecord>>, HttpError> {
    let events = list_events(&state.api).await.map_err(http_error)?;
    Ok(Json(events))
}

async fn http_update_event(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
    payload: Result<Json<EventDraft>, JsonRejection>,
) -> Result<Json<EventRecord>, HttpError> {
    let Json(draft) = payload.map_err(body_rejection)?;
    let event = update_event(&state.api, &EventId(event_id), &draft)
        .await
        .map_err(http_error)?;
    Ok(Json(event))
}

async fn http_delete_event(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
) -> Result<Json<DeleteConfirmation>, HttpError> {
    let confirmation = delete_event(&state.api, &EventId(event_id))
        .await
        .map_err(http_error)?;
    Ok(Json(confirmation))
}

fn http_error(err: ApiError) -> HttpError {
    let status =
        StatusCode::from_u16(err.code.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(err))
}

fn body_rejection(rejection: JsonRejection) -> HttpError {
    warn!(error = %rejection.body_text(), "rejected event body");
    let status = if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        StatusCode::PAYLOAD_TOO_LARGE
    } else {
        StatusCode::BAD_REQUEST
    };
    (status, Json(ApiError::validation(rejection.body_text())))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
