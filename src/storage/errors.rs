use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("Storage unavailable: {resource}")]
    Unavailable {
        resource: String
    },
    #[error("Storage conflict: {detail}")]
    Conflict {
        detail: String
    }
}

impl StorageError {
    pub fn unavailable(resource: impl Into<String>) -> Self {
        Self::Unavailable { resource: resource.into() }
    }

    pub fn conflict(detail: impl Into<String>) -> Self {
        Self::Conflict { detail: detail.into() }
    }
}
