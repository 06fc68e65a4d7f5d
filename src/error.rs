//! # Errors
//!
//! Error taxonomy shared by content resolution, document generation,
//! artifact persistence and status updates.

use thiserror::Error;

/// Boxed source error for failures reported by an object store backend
pub type StoreError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Content could not be decoded from its declared encoding
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unknown encoding {0:?}")]
    UnknownEncoding(String),
    #[error("malformed {encoding} data: {source}")]
    Malformed {
        encoding: String,
        #[source]
        source: base64::DecodeError,
    },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("could not decode file content: {0}")]
    Decode(#[from] DecodeError),

    #[error("invalid file content: {0}")]
    InvalidContent(String),

    #[error("secret {namespace}/{name} not found")]
    SecretNotFound { namespace: String, name: String },

    #[error("secret {namespace}/{name} has no data key {key:?}")]
    SecretKeyNotFound {
        namespace: String,
        name: String,
        key: String,
    },

    #[error("file {path}: {source}")]
    FileContent {
        path: String,
        #[source]
        source: Box<Error>,
    },

    #[error("permissions {permissions:#o} of {path} are out of range")]
    InvalidPermissions { path: String, permissions: u32 },

    #[error("invalid unit name {name:?}: {reason}")]
    InvalidUnitName { name: String, reason: &'static str },

    #[error("could not render cloud config: {0}")]
    Render(#[from] serde_yaml::Error),

    #[error("resource is missing {0}")]
    MissingMetadata(&'static str),

    #[error("{kind} {name} is already controlled by {owner}")]
    AlreadyOwned {
        kind: String,
        name: String,
        owner: String,
    },

    #[error("conflict writing {0}")]
    Conflict(String),

    #[error("object store error: {0}")]
    Persistence(#[source] StoreError),

    #[error("provisioning engine could not compute status: {0}")]
    ComputeStatus(#[source] anyhow::Error),
}

impl Error {
    /// True for malformed or unknown content encodings
    #[must_use]
    pub fn is_decode(&self) -> bool {
        match self {
            Error::Decode(_) => true,
            Error::FileContent { source, .. } => source.is_decode(),
            _ => false,
        }
    }

    /// True when referenced external content (secret or key) is absent
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::SecretNotFound { .. } | Error::SecretKeyNotFound { .. } => true,
            Error::FileContent { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
