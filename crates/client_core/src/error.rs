use shared::{domain::EventId, error::ApiError, protocol::missing_fields_message};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid server url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server rejected request ({status}): {}", .error.message)]
    Api { status: u16, error: ApiError },
    #[error("could not decode server response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{}", missing_fields_message(.missing))]
    Incomplete { missing: Vec<&'static str> },
    #[error("event {0} is not loaded")]
    UnknownEvent(EventId),
    #[error("drop point is outside the calendar grid")]
    OutsideGrid,
    #[error("no edit form is open")]
    NoOpenForm,
    #[error("no event is selected")]
    NothingSelected,
    #[error("cancelled by user")]
    Cancelled,
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Transport(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }
}
