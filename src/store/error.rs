//! Store error types.
//!
//! Every user-facing failure renders as a fixed message, so callers can
//! match on either the variant, its [`ErrorKind`], or the text itself.

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of store failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed value or TTL.
    InvalidArgument,
    /// Key shape or duplication.
    KeyConstraintViolation,
    /// A read discovered that the entry's TTL had passed.
    ExpiredKey,
    /// Backing engine failure outside the business rules.
    Unexpected,
}

/// Store errors with stable messages.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// TTL was zero, negative, or not a finite number.
    #[error("TTL can't be less than 1!")]
    TtlNotPositive,

    /// Key is longer than [`MAX_KEY_LEN`](crate::constants::MAX_KEY_LEN).
    #[error("length of the key has to be less than 32 characters!")]
    KeyTooLong { len: usize },

    /// Key is the empty string.
    #[error("key can't be empty!")]
    EmptyKey,

    /// Value is not a JSON object.
    #[error("value has to be a dictionary!")]
    NotAMapping,

    /// Encoded value is larger than [`MAX_PAYLOAD_BYTES`](crate::constants::MAX_PAYLOAD_BYTES).
    #[error("JSON payload exceeds maximum memory limit (16KB)!")]
    PayloadTooLarge { size: usize },

    /// Stored value could not be decoded into the requested type.
    #[error("stored value does not match the requested type!")]
    TypeMismatch {
        #[source]
        source: serde_json::Error,
    },

    /// An entry with this key is already stored, live or not yet reaped.
    #[error("Key already exists!")]
    DuplicateKey { key: String },

    /// The entry's TTL has passed; it was removed by this read.
    #[error("Key has been expired!")]
    Expired { key: String },

    /// Backing engine failure.
    #[error("unexpected storage failure")]
    Backend {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

impl Error {
    /// Returns the classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TtlNotPositive
            | Self::NotAMapping
            | Self::PayloadTooLarge { .. }
            | Self::TypeMismatch { .. } => ErrorKind::InvalidArgument,
            Self::KeyTooLong { .. } | Self::EmptyKey | Self::DuplicateKey { .. } => {
                ErrorKind::KeyConstraintViolation
            },
            Self::Expired { .. } => ErrorKind::ExpiredKey,
            Self::Backend { .. } => ErrorKind::Unexpected,
        }
    }

    pub(crate) fn duplicate_key(key: impl Into<String>) -> Self {
        Self::DuplicateKey { key: key.into() }
    }

    pub(crate) fn expired(key: impl Into<String>) -> Self {
        Self::Expired { key: key.into() }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Backend { source: err.into() }
    }
}
