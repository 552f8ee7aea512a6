//! HTTP access to the event service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{EventId, EventRecord},
    error::{ApiError, ErrorCode},
    protocol::{DeleteConfirmation, EventDraft},
};
use tracing::debug;
use url::Url;

use crate::error::ClientError;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The four store operations the calendar drives.
#[async_trait]
pub trait EventBackend: Send + Sync {
    async fn list_events(&self) -> Result<Vec<EventRecord>, ClientError>;
    async fn create_event(&self, draft: &EventDraft) -> Result<EventRecord, ClientError>;
    async fn update_event(
        &self,
        event_id: &EventId,
        draft: &EventDraft,
    ) -> Result<EventRecord, ClientError>;
    async fn delete_event(&self, event_id: &EventId) -> Result<DeleteConfirmation, ClientError>;
}

pub struct HttpEventBackend {
    http: Client,
    base_url: Url,
}

impl HttpEventBackend {
    pub fn new(server_url: &str) -> Result<Self, ClientError> {
        Self::with_timeout(server_url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(server_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let mut base_url = Url::parse(server_url).map_err(|source| ClientError::InvalidUrl {
            url: server_url.to_string(),
            source,
        })?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|source| ClientError::InvalidUrl {
                url: format!("{}{path}", self.base_url),
                source,
            })
    }

    fn events_url(&self) -> Result<Url, ClientError> {
        self.endpoint("events")
    }

    fn event_url(&self, event_id: &EventId) -> Result<Url, ClientError> {
        self.endpoint(&format!("events/{event_id}"))
    }
}

#[async_trait]
impl EventBackend for HttpEventBackend {
    async fn list_events(&self) -> Result<Vec<EventRecord>, ClientError> {
        let response = self.http.get(self.events_url()?).send().await?;
        decode(response).await
    }

    async fn create_event(&self, draft: &EventDraft) -> Result<EventRecord, ClientError> {
        let response = self
            .http
            .post(self.events_url()?)
            .json(draft)
            .send()
            .await?;
        decode(response).await
    }

    async fn update_event(
        &self,
        event_id: &EventId,
        draft: &EventDraft,
    ) -> Result<EventRecord, ClientError> {
        let response = self
            .http
            .put(self.event_url(event_id)?)
            .json(draft)
            .send()
            .await?;
        decode(response).await
    }

    async fn delete_event(&self, event_id: &EventId) -> Result<DeleteConfirmation, ClientError> {
        let response = self.http.delete(self.event_url(event_id)?).send().await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    let url = response.url().clone();
    let body = response.bytes().await?;
    debug!(%url, status = status.as_u16(), bytes = body.len(), "event service response");

    if status.is_success() {
        return Ok(serde_json::from_slice(&body)?);
    }

    let error = serde_json::from_slice::<ApiError>(&body).unwrap_or_else(|_| {
        let code = match status.as_u16() {
            400 => ErrorCode::Validation,
            403 => ErrorCode::Forbidden,
            404 => ErrorCode::NotFound,
            _ => ErrorCode::Internal,
        };
        ApiError::new(code, String::from_utf8_lossy(&body).into_owned())
    });
    Err(ClientError::Api {
        status: status.as_u16(),
        error,
    })
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
