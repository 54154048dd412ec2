/// Convenience result type used across texview.
pub type TexviewResult<T> = Result<T, TexviewError>;

/// Top-level error taxonomy used by the view layer.
///
/// Every variant is a programmer/configuration error: the view layer has no
/// transient I/O failures (those belong to the loading collaborator) and no
/// retries.
#[derive(thiserror::Error, Debug)]
pub enum TexviewError {
    /// A frame rectangle does not fit inside its base resource's extent.
    #[error("bounds error: {0}")]
    Bounds(String),

    /// Invalid construction or mutation input, such as an odd rotation tag
    /// or a malformed pixel buffer.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Strict-mode cache miss on a textual locator.
    #[error("lookup error: {0}")]
    Lookup(String),

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TexviewError {
    /// Build a [`TexviewError::Bounds`] value.
    pub fn bounds(msg: impl Into<String>) -> Self {
        Self::Bounds(msg.into())
    }

    /// Build a [`TexviewError::Configuration`] value.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Build a [`TexviewError::Lookup`] value.
    pub fn lookup(msg: impl Into<String>) -> Self {
        Self::Lookup(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
