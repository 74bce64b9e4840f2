use shared::{
    domain::Category,
    error::{ApiError, ErrorCode},
    validation::SignupError,
    worksheet::ContentError,
};
use thiserror::Error;

/// Misuse of an editor. Never caused by the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    #[error("select at least one item before continuing")]
    EmptySelection,
    #[error("'{0}' is not in the list")]
    UnknownItem(String),
    #[error("the list has not been prioritized yet")]
    NotPrioritized,
    #[error("name must not be blank")]
    BlankName,
    #[error("'{0}' already exists")]
    Duplicate(String),
    #[error("nothing to save yet")]
    NothingToSave,
}

/// Every failure a screen may show to the user. Messages are displayed verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Auth(String),
    #[error("{0}")]
    Persist(String),
    #[error("no {0} worksheet saved")]
    NotFound(Category),
    #[error("a save is already in progress")]
    SaveInFlight,
}

impl From<EditorError> for ClientError {
    fn from(err: EditorError) -> Self {
        ClientError::Validation(err.to_string())
    }
}

impl From<SignupError> for ClientError {
    fn from(err: SignupError) -> Self {
        ClientError::Validation(err.to_string())
    }
}

impl From<ContentError> for ClientError {
    fn from(err: ContentError) -> Self {
        ClientError::Validation(err.to_string())
    }
}

impl From<ApiError> for ClientError {
    fn from(err: ApiError) -> Self {
        match err.code {
            ErrorCode::Unauthorized | ErrorCode::Conflict => {
                ClientError::Auth(err.message)
            }
            ErrorCode::Validation => ClientError::Validation(err.message),
            ErrorCode::NotFound | ErrorCode::Internal => ClientError::Persist(err.message),
        }
    }
}
