// src/error.rs
//
// Unified error handling for camstage.
// Uses thiserror for simple, type-safe error handling.
//
// Error Taxonomy:
// - Usage: caller broke the staging/conversion contract
// - Data: bytes on the wire or on disk are inconsistent
// - Resource: I/O or allocation-adjacent failure
// - MissingFile: absent file on load, the one policy-configurable case

use crate::ops::ImageKind;
use std::borrow::Cow;
use thiserror::Error;

/// Error taxonomy.
///
/// - Usage: missing source declaration, unsupported conversion pair,
///   out-of-bounds access and friends. Always fatal to the operation.
/// - Data: signature mismatch, malformed sidecar, geometry not found.
/// - Resource: file read/write failures. Fatal and rare, never retried.
/// - MissingFile: absent image file on load; callers pick between this
///   error and a silent reset per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Usage,
    Data,
    Resource,
    MissingFile,
}

/// camstage error types.
#[derive(Debug, Error)]
pub enum CamstageError {
    // Staging contract
    #[error("{object}: missing from_*() source declaration")]
    MissingSource { object: Cow<'static, str> },

    #[error("{object}: missing to_file() sink declaration")]
    MissingSink { object: Cow<'static, str> },

    #[error("{object}: image has no content")]
    NoContent { object: Cow<'static, str> },

    #[error("source buffer is empty")]
    EmptyBuffer,

    #[error("camera frame has no captured data")]
    EmptyFrame,

    #[error("unsupported camera pixel format {format}")]
    UnsupportedPixelFormat { format: Cow<'static, str> },

    #[error("frame length {len} matches no raw layout for {width}x{height}")]
    FrameGeometryMismatch { len: usize, width: u32, height: u32 },

    #[error("buffer length {len} does not match {width}x{height} {kind}")]
    LengthMismatch {
        len: usize,
        width: u32,
        height: u32,
        kind: ImageKind,
    },

    #[error("cannot stage content of type None")]
    NoneKindStaged,

    #[error("cannot infer image type of '{path}'")]
    UnknownExtension { path: Cow<'static, str> },

    #[error("cannot load {kind} from a file")]
    FileKindUnsupported { kind: ImageKind },

    #[error("file source '{path}' must be loaded before converting")]
    FileSourceNotLoaded { path: Cow<'static, str> },

    // Conversion contract
    #[error("source and target types are the same ({kind})")]
    SameTypeConversion { kind: ImageKind },

    #[error("cannot convert {from} to {to}")]
    UnsupportedConversion { from: ImageKind, to: ImageKind },

    #[error("cannot scale when converting to {target}")]
    ScalingUnsupported { target: ImageKind },

    // Pixel access
    #[error("pixel ({x}, {y}) out of bounds for {width}x{height}")]
    OutOfBounds { x: u32, y: u32, width: u32, height: u32 },

    #[error("pixel access is not supported for {kind} images")]
    PixelAccessUnsupported { kind: ImageKind },

    // Comparison contract
    #[error("images must be the same size ({width}x{height} vs {other_width}x{other_height})")]
    SizeMismatch {
        width: u32,
        height: u32,
        other_width: u32,
        other_height: u32,
    },

    #[error("images must both be RGB565 ({kind} vs {other_kind})")]
    CompareKindMismatch { kind: ImageKind, other_kind: ImageKind },

    #[error("stride must be 1 or more (got {stride})")]
    InvalidStride { stride: u32 },

    #[error("no pixels sampled (stride or mask excludes everything)")]
    NothingSampled,

    // Wire/data errors
    #[error("'{path}' does not start with a {kind} signature")]
    SignatureMismatch { path: Cow<'static, str>, kind: ImageKind },

    #[error("no SOF0 segment found in JPEG stream")]
    GeometryNotFound,

    #[error("{object}: loaded image has a zero dimension")]
    ZeroDimension { object: Cow<'static, str> },

    #[error("decoded geometry {width}x{height} does not match reported {reported_width}x{reported_height}")]
    GeometryMismatch {
        width: u32,
        height: u32,
        reported_width: u32,
        reported_height: u32,
    },

    #[error("malformed metadata sidecar '{path}': {reason}")]
    MalformedSidecar {
        path: Cow<'static, str>,
        reason: Cow<'static, str>,
    },

    #[error("BMP pixel data is {bits_per_pixel} bpp, expected 24")]
    UnsupportedBmpDepth { bits_per_pixel: u16 },

    #[error("truncated {kind} data ({len} bytes)")]
    TruncatedData { kind: ImageKind, len: usize },

    #[error("failed to decode JPEG: {message}")]
    DecodeFailed { message: Cow<'static, str> },

    #[error("failed to encode JPEG: {message}")]
    EncodeFailed { message: Cow<'static, str> },

    // Filesystem
    #[error("missing file '{path}'")]
    MissingFile { path: Cow<'static, str> },

    #[error("file '{path}' already exists")]
    FileExists { path: Cow<'static, str> },

    #[error("failed to read '{path}': {source}")]
    FileReadFailed {
        path: Cow<'static, str>,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write '{path}': {source}")]
    FileWriteFailed {
        path: Cow<'static, str>,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to remove '{path}': {source}")]
    FileRemoveFailed {
        path: Cow<'static, str>,
        #[source]
        source: std::io::Error,
    },
}

// Constructor helpers
impl CamstageError {
    pub fn missing_source(object: impl Into<Cow<'static, str>>) -> Self {
        Self::MissingSource { object: object.into() }
    }

    pub fn missing_sink(object: impl Into<Cow<'static, str>>) -> Self {
        Self::MissingSink { object: object.into() }
    }

    pub fn no_content(object: impl Into<Cow<'static, str>>) -> Self {
        Self::NoContent { object: object.into() }
    }

    pub fn unsupported_pixel_format(format: impl Into<Cow<'static, str>>) -> Self {
        Self::UnsupportedPixelFormat { format: format.into() }
    }

    pub fn unknown_extension(path: impl Into<Cow<'static, str>>) -> Self {
        Self::UnknownExtension { path: path.into() }
    }

    pub fn out_of_bounds(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self::OutOfBounds { x, y, width, height }
    }

    pub fn signature_mismatch(path: impl Into<Cow<'static, str>>, kind: ImageKind) -> Self {
        Self::SignatureMismatch { path: path.into(), kind }
    }

    pub fn malformed_sidecar(
        path: impl Into<Cow<'static, str>>,
        reason: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::MalformedSidecar {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn decode_failed(message: impl Into<Cow<'static, str>>) -> Self {
        Self::DecodeFailed { message: message.into() }
    }

    pub fn encode_failed(message: impl Into<Cow<'static, str>>) -> Self {
        Self::EncodeFailed { message: message.into() }
    }

    pub fn missing_file(path: impl Into<Cow<'static, str>>) -> Self {
        Self::MissingFile { path: path.into() }
    }

    pub fn file_read_failed(path: impl Into<Cow<'static, str>>, source: std::io::Error) -> Self {
        Self::FileReadFailed { path: path.into(), source }
    }

    pub fn file_write_failed(path: impl Into<Cow<'static, str>>, source: std::io::Error) -> Self {
        Self::FileWriteFailed { path: path.into(), source }
    }

    pub fn file_remove_failed(path: impl Into<Cow<'static, str>>, source: std::io::Error) -> Self {
        Self::FileRemoveFailed { path: path.into(), source }
    }

    /// Get the error category for this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingSource { .. }
            | Self::MissingSink { .. }
            | Self::NoContent { .. }
            | Self::EmptyBuffer
            | Self::EmptyFrame
            | Self::UnsupportedPixelFormat { .. }
            | Self::NoneKindStaged
            | Self::UnknownExtension { .. }
            | Self::FileKindUnsupported { .. }
            | Self::FileSourceNotLoaded { .. }
            | Self::SameTypeConversion { .. }
            | Self::UnsupportedConversion { .. }
            | Self::ScalingUnsupported { .. }
            | Self::OutOfBounds { .. }
            | Self::PixelAccessUnsupported { .. }
            | Self::SizeMismatch { .. }
            | Self::CompareKindMismatch { .. }
            | Self::InvalidStride { .. }
            | Self::NothingSampled
            | Self::FileExists { .. } => ErrorCategory::Usage,

            Self::FrameGeometryMismatch { .. }
            | Self::LengthMismatch { .. }
            | Self::SignatureMismatch { .. }
            | Self::GeometryNotFound
            | Self::ZeroDimension { .. }
            | Self::GeometryMismatch { .. }
            | Self::MalformedSidecar { .. }
            | Self::UnsupportedBmpDepth { .. }
            | Self::TruncatedData { .. }
            | Self::DecodeFailed { .. }
            | Self::EncodeFailed { .. } => ErrorCategory::Data,

            Self::FileReadFailed { .. }
            | Self::FileWriteFailed { .. }
            | Self::FileRemoveFailed { .. } => ErrorCategory::Resource,

            Self::MissingFile { .. } => ErrorCategory::MissingFile,
        }
    }
}

// Result type alias
pub type Result<T> = std::result::Result<T, CamstageError>;
