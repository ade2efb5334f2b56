//! Error types for the wrapper layer
//!
//! Three families, one per concern:
//!
//! - [`LoadError`]: a native resource could not be created from its source.
//!   Missing or corrupt media is an expected runtime condition, so these are
//!   returned by value and the wrapper simply stays not ready.
//! - [`ResourceError`]: an operation was attempted whose precondition does not
//!   hold (wrapper not ready, display closed, region out of bounds, ...).
//!   Every mutator reports these and leaves the resource untouched.
//! - [`ContextError`]: opening or querying the window / audio device failed.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to acquire a native resource from an external source
#[derive(Error, Debug)]
pub enum LoadError {
    /// No file at the given path (after search-path resolution)
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The file exists but its contents could not be decoded
    #[error("Failed to decode {}: {reason}", .path.display())]
    Decode {
        /// Requested path
        path: PathBuf,
        /// Decoder message
        reason: String,
    },

    /// The file is in a format the native surface cannot read
    #[error("Unsupported format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// Reading the file failed
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        /// Requested path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Generation parameters describe no valid resource (e.g. zero size)
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
}

impl LoadError {
    /// Path of the source that failed, when the failure came from a file
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::NotFound(path) | Self::UnsupportedFormat(path) => Some(path),
            Self::Decode { path, .. } | Self::Io { path, .. } => Some(path),
            Self::InvalidParameters(_) => None,
        }
    }
}

/// Precondition violations and failures of operations on owned resources
#[derive(Error, Debug)]
pub enum ResourceError {
    /// The wrapper owns no native resource
    #[error("{0} is not ready")]
    NotReady(&'static str),

    /// The native surface no longer knows the id the wrapper holds
    #[error("{0} handle is stale")]
    StaleHandle(&'static str),

    /// Display-dependent call while the window is closed
    #[error("Display is not open")]
    DisplayClosed,

    /// Audio-dependent call while the audio device is closed
    #[error("Audio device is not open")]
    AudioDeviceClosed,

    /// Drawing call outside a frame, or a frame begun twice
    #[error("Frame state error: {0}")]
    FrameState(&'static str),

    /// Two resources living on different native surfaces were combined
    #[error("Resource belongs to a different native surface")]
    ForeignSurface,

    /// Region or range lies outside the resource
    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    /// Requested dimensions cannot be represented
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },

    /// Two resources that must match in size do not
    #[error("Size mismatch: expected {expected:?}, got {actual:?}")]
    SizeMismatch {
        /// Size of the destination
        expected: (u32, u32),
        /// Size of the source
        actual: (u32, u32),
    },

    /// Parameter outside the supported set (sample size, channel count, ...)
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// The audio output rejected a playback request
    #[error("Playback failed: {0}")]
    Playback(String),

    /// Writing the resource to disk failed
    #[error("Failed to export to {}: {reason}", .path.display())]
    Export {
        /// Destination path
        path: PathBuf,
        /// Encoder or IO message
        reason: String,
    },

    /// Loading a transient source resource failed
    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Window and audio device lifecycle errors
#[derive(Error, Debug)]
pub enum ContextError {
    /// A context of this kind is already open on the surface
    #[error("{0} is already open")]
    AlreadyOpen(&'static str),

    /// The context is closed
    #[error("{0} is not open")]
    NotOpen(&'static str),

    /// Width or height was zero
    #[error("Invalid window size: {width}x{height}")]
    InvalidSize {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },

    /// The platform could not create the context
    #[error("Creation failed: {0}")]
    CreationFailed(String),
}

/// Result type for operations on owned resources
pub type ResourceResult<T> = Result<T, ResourceError>;

/// Result type for context lifecycle operations
pub type ContextResult<T> = Result<T, ContextError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_error_reports_path() {
        let err = LoadError::NotFound(PathBuf::from("notfound.png"));
        assert_eq!(err.path(), Some(std::path::Path::new("notfound.png")));
        assert_eq!(err.to_string(), "File not found: notfound.png");

        let err = LoadError::InvalidParameters("zero width".to_string());
        assert!(err.path().is_none());
    }

    #[test]
    fn test_load_error_converts_into_resource_error() {
        let err: ResourceError = LoadError::NotFound(PathBuf::from("a.png")).into();
        assert!(matches!(err, ResourceError::Load(LoadError::NotFound(_))));
        assert_eq!(err.to_string(), "File not found: a.png");
    }
}
