//! # Error kinds
//!
//! All fallible functions in this crate return [`anyhow::Result`]. Failures that callers may want
//! to tell apart are raised as [`Error`], which can be recovered with
//! `err.downcast_ref::<Error>()`.

/// Typed failure kinds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Buffer length disagrees with the configured geometry.
    #[error("shape mismatch: expected {expected} elements, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// Geometry parameters can not describe a valid layout.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// `compute` was called before any input frame was set.
    #[error("no input image set")]
    NoImageSet,

    /// `visualize` was called before a descriptor was computed.
    #[error("no descriptor computed")]
    NoDescriptorComputed,

    /// Two frames that must match in size do not.
    #[error("frame size mismatch: {0:?} vs {1:?}")]
    FrameSizeMismatch((u32, u32), (u32, u32)),

    /// Playback was started without an input path.
    #[error("no input path set")]
    NoInputPath,

    /// The capture source could not be opened.
    #[error("could not open capture source at {0}")]
    OpenFailed(String),
}
