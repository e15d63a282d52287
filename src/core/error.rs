use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrmError {
    #[error("Access denied: no authenticated principal")]
    AccessDenied,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Row '{id}' not found in table '{table}'")]
    NotFound { table: String, id: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Relay error: {0}")]
    Relay(String),

    #[error("Bulk operation partially failed: {sent} sent, {failed} failed")]
    PartialBulkFailure { sent: usize, failed: usize },
}

pub type Result<T> = std::result::Result<T, CrmError>;

impl From<serde_json::Error> for CrmError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
