//! Error types for `SLBwx`

use thiserror::Error;

/// The error type for `SLBwx` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ==================== Container Errors ====================
    /// The buffer is not a BWX container (missing BWXF magic).
    #[error("invalid BWX magic: expected BWXF, found {0:?}")]
    InvalidMagic([u8; 4]),

    /// A read needed more bytes than the buffer has left.
    #[error("truncated data at offset {offset:#x}: needed {needed} bytes, {remaining} remaining")]
    TruncatedData {
        /// Offset of the read that failed.
        offset: usize,
        /// Number of bytes the read required.
        needed: usize,
        /// Number of bytes left in the buffer.
        remaining: usize,
    },

    /// A seek target lies beyond the end of the buffer.
    #[error("offset {offset:#x} is out of range (buffer is {len} bytes)")]
    OutOfRange {
        /// The requested offset.
        offset: usize,
        /// Total buffer length.
        len: usize,
    },

    /// A record does not match its expected shape, or a count fails the size bound.
    #[error("malformed structure at offset {offset:#x}: {message}")]
    MalformedStructure {
        /// Offset at which the problem was detected.
        offset: usize,
        /// Description of the problem.
        message: String,
    },

    /// The HEAD version word matches neither SLv1 nor SLv2.
    #[error("unknown BWX dialect at offset {offset:#x}: version {version:#06x}")]
    UnknownDialect {
        /// Offset of the version word.
        offset: usize,
        /// The version word as stored.
        version: u16,
    },

    // ==================== Scene Errors ====================
    /// A record points at an entry that does not exist.
    #[error("dangling {kind} reference: index {index} but only {len} entries")]
    DanglingReference {
        /// What kind of entry was referenced ("material", "object", ...).
        kind: &'static str,
        /// The referenced index.
        index: i64,
        /// Number of entries available.
        len: usize,
    },

    /// A shape-key frame does not carry one position per base vertex.
    #[error("shape key mismatch on '{object}' frame {frame}: expected {expected} vertices, found {found}")]
    ShapeKeyMismatch {
        /// Owning object name.
        object: String,
        /// Frame index within the track.
        frame: usize,
        /// Vertex count of the base mesh.
        expected: usize,
        /// Vertex count of the frame.
        found: usize,
    },

    /// Keyframe timelines are not strictly increasing, or the parts of one
    /// mesh disagree on them.
    #[error("keyframes of '{track}' are out of order at timeline {timeline}")]
    UnorderedKeyframes {
        /// Track name.
        track: String,
        /// The first offending timeline.
        timeline: u32,
    },

    /// The object parent graph contains a cycle.
    #[error("object hierarchy contains a cycle through '{object}'")]
    CyclicHierarchy {
        /// Name of an object on the cycle.
        object: String,
    },
}

impl Error {
    /// Shorthand for [`Error::MalformedStructure`].
    pub(crate) fn malformed(offset: usize, message: impl Into<String>) -> Self {
        Self::MalformedStructure {
            offset,
            message: message.into(),
        }
    }

    /// Byte offset carried by decode-phase errors.
    #[must_use]
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::TruncatedData { offset, .. }
            | Self::OutOfRange { offset, .. }
            | Self::MalformedStructure { offset, .. }
            | Self::UnknownDialect { offset, .. } => Some(*offset),
            _ => None,
        }
    }
}

/// Result type alias for `SLBwx` operations.
pub type Result<T> = std::result::Result<T, Error>;
