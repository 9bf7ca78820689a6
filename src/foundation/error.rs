use crate::foundation::ids::{ImageId, ShaderId};

/// Convenience result type used across the crate.
pub type RestorableResult<T> = Result<T, RestorableError>;

/// Top-level error taxonomy used by image, resolve and restore APIs.
#[derive(thiserror::Error, Debug)]
pub enum RestorableError {
    /// The backend could not provide a surface of the requested size.
    #[error("allocation error: cannot allocate {width}x{height} surface: {source}")]
    Allocation {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
        /// Backend failure.
        #[source]
        source: anyhow::Error,
    },

    /// Caller-supplied geometry or region is out of range.
    #[error("bounds error: {0}")]
    Bounds(String),

    /// A draw referenced a shader that has been disposed.
    #[error("invalid shader: {0} has been disposed")]
    InvalidShader(ShaderId),

    /// A draw referenced a disposed or otherwise unusable source image.
    #[error("invalid source: {0}")]
    InvalidSource(String),

    /// An operation targeted an image that has been disposed.
    #[error("use after dispose: {0}")]
    UseAfterDispose(ImageId),

    /// The graphics driver failed while executing a call.
    #[error("driver error during {op}: {source}")]
    Driver {
        /// Driver operation that failed.
        op: &'static str,
        /// Backend failure.
        #[source]
        source: anyhow::Error,
    },

    /// Restore could not rebuild an image because part of its history is gone.
    #[error("unrecoverable state for {image}: {reason}")]
    Unrecoverable {
        /// Image that could not be rebuilt.
        image: ImageId,
        /// Why replay was impossible.
        reason: String,
    },

    /// Errors when serializing or deserializing configuration.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RestorableError {
    /// Build a [`RestorableError::Bounds`] value.
    pub fn bounds(msg: impl Into<String>) -> Self {
        Self::Bounds(msg.into())
    }

    /// Build a [`RestorableError::InvalidSource`] value.
    pub fn invalid_source(msg: impl Into<String>) -> Self {
        Self::InvalidSource(msg.into())
    }

    /// Build a [`RestorableError::Driver`] value.
    pub fn driver(op: &'static str, source: anyhow::Error) -> Self {
        Self::Driver { op, source }
    }

    /// Build a [`RestorableError::Unrecoverable`] value.
    pub fn unrecoverable(image: ImageId, reason: impl Into<String>) -> Self {
        Self::Unrecoverable {
            image,
            reason: reason.into(),
        }
    }

    /// Build a [`RestorableError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
