use super::*;
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::TimeZone;
use storage::Storage;

async fn setup(policy: EventPolicy) -> ApiContext {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    ApiContext::new(storage, policy)
}

fn standup() -> EventDraft {
    EventDraft::new(
        "Standup",
        "Work",
        "2024-01-01T09:00:00Z",
        "2024-01-01T09:30:00Z",
    )
}

struct FailingStore;

#[async_trait]
impl EventStore for FailingStore {
    async fn health_check(&self) -> anyhow::Result<()> {
        Err(anyhow!("database is locked"))
    }

    async fn insert_event(&self, _event: &NewEvent) -> anyhow::Result<StoredEvent> {
        Err(anyhow!("database is locked"))
    }

    async fn list_events(&self) -> anyhow::Result<Vec<StoredEvent>> {
        Err(anyhow!("database is locked"))
    }

    async fn replace_event(
        &self,
        _event_id: &EventId,
        _event: &NewEvent,
    ) -> anyhow::Result<Option<StoredEvent>> {
        Err(anyhow!("database is locked"))
    }

    async fn delete_event(&self, _event_id: &EventId) -> anyhow::Result<bool> {
        Err(anyhow!("database is locked"))
    }
}

#[tokio::test]
async fn create_assigns_id_and_echoes_fields() {
    let ctx = setup(EventPolicy::default()).await;
    let created = create_event(&ctx, &standup()).await.expect("create");

    assert!(!created.id.as_str().is_empty());
    assert_eq!(created.title, "Standup");
    assert_eq!(created.category, "Work");
    assert_eq!(created.start, Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap());
    assert_eq!(created.end, Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap());

    let listed = list_events(&ctx).await.expect("list");
    assert_eq!(listed, vec![created]);
}

#[tokio::test]
async fn create_rejects_each_missing_required_field_without_persisting() {
    let ctx = setup(EventPolicy::default()).await;
    for field in ["title", "category", "start", "end"] {
        let mut draft = standup();
        match field {
            "title" => draft.title = Some(String::new()),
            "category" => draft.category = None,
            "start" => draft.start = Some("   ".into()),
            _ => draft.end = None,
        }
        let err = create_event(&ctx, &draft).await.expect_err("should fail");
        assert_eq!(err.code, ErrorCode::Validation);
        assert!(err.message.contains(field), "{}", err.message);
    }
    assert!(list_events(&ctx).await.expect("list").is_empty());
}

#[tokio::test]
async fn create_rejects_unparseable_timestamp() {
    let ctx = setup(EventPolicy::default()).await;
    let mut draft = standup();
    draft.end = Some("tomorrow-ish".into());
    let err = create_event(&ctx, &draft).await.expect_err("should fail");
    assert_eq!(err.code, ErrorCode::Validation);
    assert!(err.message.contains("end"));
}

#[tokio::test]
async fn end_before_start_is_accepted_unless_policy_requires_order() {
    let mut draft = standup();
    draft.start = Some("2024-01-01 10:00:00".into());
    draft.end = Some("2024-01-01 09:00:00".into());

    let permissive = setup(EventPolicy::default()).await;
    create_event(&permissive, &draft).await.expect("permissive create");

    let strict = setup(EventPolicy {
        require_end_after_start: true,
    })
    .await;
    let err = create_event(&strict, &draft).await.expect_err("strict");
    assert_eq!(err.code, ErrorCode::Validation);
    assert!(list_events(&strict).await.expect("list").is_empty());
}

#[tokio::test]
async fn update_replaces_all_fields() {
    let ctx = setup(EventPolicy::default()).await;
    let created = create_event(&ctx, &standup()).await.expect("create");

    let replacement = EventDraft::new(
        "Planning",
        "Team",
        "2024-01-02 13:00:00",
        "2024-01-02 14:00:00",
    )
    .with_color("#e67e22");
    let updated = update_event(&ctx, &created.id, &replacement)
        .await
        .expect("update");
    assert_eq!(updated.id, created.id);

    let listed = list_events(&ctx).await.expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].title, "Planning");
    assert_eq!(listed[0].category, "Team");
    assert_eq!(listed[0].color.as_deref(), Some("#e67e22"));
    assert_eq!(
        listed[0].start,
        Utc.with_ymd_and_hms(2024, 1, 2, 13, 0, 0).unwrap()
    );
}

#[tokio::test]
async fn update_unknown_id_is_not_found_and_leaves_collection_unchanged() {
    let ctx = setup(EventPolicy::default()).await;
    let created = create_event(&ctx, &standup()).await.expect("create");

    let err = update_event(&ctx, &EventId::from("nope"), &standup())
        .await
        .expect_err("should fail");
    assert_eq!(err.code, ErrorCode::NotFound);
    assert_eq!(list_events(&ctx).await.expect("list"), vec![created]);
}

#[tokio::test]
async fn update_validates_before_looking_up_id() {
    let ctx = setup(EventPolicy::default()).await;
    let mut draft = standup();
    draft.title = None;
    let err = update_event(&ctx, &EventId::from("nope"), &draft)
        .await
        .expect_err("should fail");
    assert_eq!(err.code, ErrorCode::Validation);
}

#[tokio::test]
async fn delete_removes_record_and_rejects_unknown_id() {
    let ctx = setup(EventPolicy::default()).await;
    let created = create_event(&ctx, &standup()).await.expect("create");

    let confirmation = delete_event(&ctx, &created.id).await.expect("delete");
    assert_eq!(confirmation.id, created.id);
    assert!(list_events(&ctx).await.expect("list").is_empty());

    let err = delete_event(&ctx, &created.id)
        .await
        .expect_err("second delete");
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn store_failures_surface_as_internal_errors() {
    let ctx = ApiContext::new(FailingStore, EventPolicy::default());

    let err = create_event(&ctx, &standup()).await.expect_err("create");
    assert_eq!(err.code, ErrorCode::Internal);
    assert!(err.message.contains("database is locked"));

    let err = list_events(&ctx).await.expect_err("list");
    assert_eq!(err.code, ErrorCode::Internal);

    let err = delete_event(&ctx, &EventId::from("x"))
        .await
        .expect_err("delete");
    assert_eq!(err.code, ErrorCode::Internal);

    let err = health(&ctx).await.expect_err("health");
    assert_eq!(err.code, ErrorCode::Internal);
}

#[tokio::test]
async fn store_failure_message_keeps_the_underlying_cause() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.pool().close().await;
    let ctx = ApiContext::new(storage, EventPolicy::default());

    let err = create_event(&ctx, &standup()).await.expect_err("create");
    assert_eq!(err.code, ErrorCode::Internal);
    assert!(err.message.starts_with("failed to insert event: "), "{}", err.message);
    assert!(err.message.len() > "failed to insert event: ".len());

    let err = list_events(&ctx).await.expect_err("list");
    assert!(err.message.starts_with("failed to list events: "), "{}", err.message);
}
