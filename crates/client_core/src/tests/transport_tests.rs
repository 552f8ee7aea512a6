use super::*;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use chrono::{TimeZone, Utc};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct StubState {
    events: Arc<Mutex<Vec<EventRecord>>>,
}

fn record(id: &str, draft: &EventDraft) -> EventRecord {
    EventRecord {
        id: EventId::from(id),
        title: draft.title.clone().unwrap_or_default(),
        category: draft.category.clone().unwrap_or_default(),
        start: Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
        end: Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap(),
        color: draft.color.clone(),
        created_at: None,
        updated_at: None,
    }
}

async fn stub_list(State(state): State<StubState>) -> Json<Vec<EventRecord>> {
    Json(state.events.lock().await.clone())
}

async fn stub_create(
    State(state): State<StubState>,
    Json(draft): Json<EventDraft>,
) -> (StatusCode, Json<EventRecord>) {
    let mut events = state.events.lock().await;
    let created = record(&format!("evt-{}", events.len() + 1), &draft);
    events.push(created.clone());
    (StatusCode::CREATED, Json(created))
}

async fn stub_update(
    State(state): State<StubState>,
    Path(id): Path<String>,
    Json(draft): Json<EventDraft>,
) -> Result<Json<EventRecord>, (StatusCode, Json<ApiError>)> {
    let mut events = state.events.lock().await;
    let Some(existing) = events.iter_mut().find(|event| event.id.as_str() == id) else {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ApiError::not_found("event not found")),
        ));
    };
    *existing = record(&id, &draft);
    Ok(Json(existing.clone()))
}

async fn stub_delete(
    State(state): State<StubState>,
    Path(id): Path<String>,
) -> Json<DeleteConfirmation> {
    let event_id = EventId(id);
    state.events.lock().await.retain(|event| event.id != event_id);
    Json(DeleteConfirmation::for_event(event_id))
}

async fn spawn_stub_server(prefix: &str) -> anyhow::Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let routes = Router::new()
        .route("/events", get(stub_list).post(stub_create))
        .route("/events/:id", put(stub_update).delete(stub_delete))
        .route(
            "/broken",
            get(|| async { (StatusCode::BAD_GATEWAY, "upstream unavailable") }),
        )
        .with_state(StubState::default());
    let app = if prefix.is_empty() {
        routes
    } else {
        Router::new().nest(prefix, routes)
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}{prefix}"))
}

#[tokio::test]
async fn create_list_update_delete_round_trip() -> anyhow::Result<()> {
    let server_url = spawn_stub_server("").await?;
    let backend = HttpEventBackend::new(&server_url)?;

    let created = backend
        .create_event(&EventDraft::new(
            "Standup",
            "Work",
            "2024-01-01 09:00:00",
            "2024-01-01 09:30:00",
        ))
        .await?;
    assert_eq!(created.id.as_str(), "evt-1");

    let listed = backend.list_events().await?;
    assert_eq!(listed, vec![created.clone()]);

    let updated = backend
        .update_event(
            &created.id,
            &EventDraft::new("Retro", "Work", "2024-01-01 09:00:00", "2024-01-01 09:30:00")
                .with_color("#00ff00"),
        )
        .await?;
    assert_eq!(updated.title, "Retro");
    assert_eq!(updated.color.as_deref(), Some("#00ff00"));

    let confirmation = backend.delete_event(&created.id).await?;
    assert_eq!(confirmation.id, created.id);
    assert!(backend.list_events().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn unknown_event_update_surfaces_not_found() -> anyhow::Result<()> {
    let server_url = spawn_stub_server("").await?;
    let backend = HttpEventBackend::new(&server_url)?;

    let err = backend
        .update_event(
            &EventId::from("missing"),
            &EventDraft::new("A", "B", "2024-01-01 09:00:00", "2024-01-01 10:00:00"),
        )
        .await
        .expect_err("missing event");
    match err {
        ClientError::Api { status, error } => {
            assert_eq!(status, 404);
            assert_eq!(error.code, ErrorCode::NotFound);
            assert_eq!(error.message, "event not found");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn non_json_error_body_is_wrapped() -> anyhow::Result<()> {
    let server_url = spawn_stub_server("").await?;
    let backend = HttpEventBackend::new(&server_url)?;
    let response = backend
        .http
        .get(backend.endpoint("broken")?)
        .send()
        .await?;

    let err = decode::<Vec<EventRecord>>(response)
        .await
        .expect_err("bad gateway");
    assert_eq!(err.status(), Some(502));
    match err {
        ClientError::Api { error, .. } => {
            assert_eq!(error.code, ErrorCode::Internal);
            assert_eq!(error.message, "upstream unavailable");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn base_url_keeps_path_prefix() -> anyhow::Result<()> {
    let server_url = spawn_stub_server("/api").await?;
    let backend = HttpEventBackend::new(&server_url)?;
    assert!(backend.base_url().path().ends_with("/api/"));
    assert_eq!(
        backend.event_url(&EventId::from("abc"))?.path(),
        "/api/events/abc"
    );
    assert!(backend.list_events().await?.is_empty());
    Ok(())
}

#[test]
fn invalid_server_url_is_rejected() {
    assert!(matches!(
        HttpEventBackend::new("not a url"),
        Err(ClientError::InvalidUrl { .. })
    ));
}
