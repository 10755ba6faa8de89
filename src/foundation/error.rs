/// Result alias used across the crate.
pub type RefraktResult<T> = Result<T, RefraktError>;

/// Error type for fatal failures.
///
/// Optical misses (parallel rays, no hit, total internal reflection) are not errors; they are
/// reported as `None` by the tracing functions.
#[derive(thiserror::Error, Debug)]
pub enum RefraktError {
    /// Input failed structural validation (shape description, settings, ranges).
    #[error("validation error: {0}")]
    Validation(String),

    /// A geometric precondition did not hold.
    #[error("geometry error: {0}")]
    Geometry(String),

    /// Shape buffers could not be encoded into the GPU contract.
    #[error("encode error: {0}")]
    Encode(String),

    /// Preview rendering or GPU upload failed.
    #[error("render error: {0}")]
    Render(String),

    /// JSON (de)serialization failed.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Anything else, with its source preserved.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RefraktError {
    /// Build a [`RefraktError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`RefraktError::Geometry`].
    pub fn geometry(msg: impl Into<String>) -> Self {
        Self::Geometry(msg.into())
    }

    /// Build a [`RefraktError::Encode`].
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`RefraktError::Render`].
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`RefraktError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for RefraktError {
    fn from(err: serde_json::Error) -> Self {
        Self::serde(err.to_string())
    }
}
