// src/engine/staging.rs
//
// The Image entity and its staged-source state machine.
//
// States: Empty -> Sourced -> {Converted | Loaded} -> (Sinked) -> Saved,
// with clear() returning to Empty from anywhere. Exactly one from_*() call
// stages a source; load()/convert_to() consume it and commit the result.
// Every pixel-bearing source owns its bytes from the moment of staging, so
// committing is a move and the previous buffer is released exactly once.

use crate::bmp;
use crate::camera::{CameraFrame, PixFormat};
use crate::error::{CamstageError, Result};
use crate::jpeg;
use crate::metadata::Metadata;
use crate::ops::{ImageKind, MissingFile, Timestamp};
use crate::pixel::Pixel;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

fn default_object_name() -> String {
    format!("image-{}", NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
}

/// A pending source or target buffer with its geometry, before it is
/// committed as the image's live content.
#[derive(Debug)]
pub(crate) struct StagedPixels {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub kind: ImageKind,
    pub timestamp: Timestamp,
}

/// Where the staged content came from. Pixel-bearing variants own a copy of
/// the bytes; File defers reading until load().
#[derive(Debug)]
pub(crate) enum StagedSource {
    Buffer(StagedPixels),
    Camera(StagedPixels),
    Image {
        pixels: StagedPixels,
        metadata: Metadata,
    },
    File {
        path: PathBuf,
        kind: ImageKind,
    },
}

/// An image being staged, converted, inspected or persisted.
///
/// Created empty; populated through a staging cycle
/// (`from_*` then `load`/`convert_to`); its buffer is replaced on every
/// successful commit and released on `clear()` or drop.
///
/// Not safe for concurrent use: one owner mutates one instance.
#[derive(Debug)]
pub struct Image {
    pub(crate) kind: ImageKind,
    pub(crate) buffer: Vec<u8>,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) timestamp: Timestamp,
    pub(crate) metadata: Metadata,
    object_name: String,
    pub(crate) staged: Option<StagedSource>,
    pub(crate) sink: Option<PathBuf>,
}

impl Image {
    pub fn new() -> Self {
        Self::named(default_object_name())
    }

    /// Create with a diagnostic label used in error messages and logs.
    pub fn named(object_name: impl Into<String>) -> Self {
        Self {
            kind: ImageKind::None,
            buffer: Vec::new(),
            width: 0,
            height: 0,
            timestamp: Timestamp::default(),
            metadata: Metadata::new(),
            object_name: object_name.into(),
            staged: None,
            sink: None,
        }
    }

    pub fn kind(&self) -> ImageKind {
        self.kind
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Byte length of the live buffer.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    pub fn object_name(&self) -> &str {
        &self.object_name
    }

    pub fn set_object_name(&mut self, name: impl Into<String>) {
        self.object_name = name.into();
    }

    pub fn has_content(&self) -> bool {
        self.kind != ImageKind::None && !self.buffer.is_empty()
    }

    /// Release the buffer and return to the empty state from anywhere.
    pub fn clear(&mut self) {
        self.kind = ImageKind::None;
        self.buffer = Vec::new();
        self.width = 0;
        self.height = 0;
        self.timestamp = Timestamp::default();
        self.metadata.clear();
        self.staged = None;
        self.sink = None;
    }

    // ------------------------------------------------------------------
    // Source declarations
    // ------------------------------------------------------------------

    /// Stage an in-memory buffer of the given geometry and kind.
    pub fn from_buffer(
        &mut self,
        bytes: &[u8],
        width: u32,
        height: u32,
        kind: ImageKind,
        timestamp: Timestamp,
    ) -> Result<&mut Self> {
        if bytes.is_empty() {
            return Err(CamstageError::EmptyBuffer);
        }
        if kind == ImageKind::None {
            return Err(CamstageError::NoneKindStaged);
        }
        if let Some(bpp) = kind.bytes_per_pixel() {
            if bytes.len() != width as usize * height as usize * bpp {
                return Err(CamstageError::LengthMismatch {
                    len: bytes.len(),
                    width,
                    height,
                    kind,
                });
            }
        }
        self.staged = Some(StagedSource::Buffer(StagedPixels {
            data: bytes.to_vec(),
            width,
            height,
            kind,
            timestamp,
        }));
        Ok(self)
    }

    /// Stage a captured camera frame.
    ///
    /// JPEG frames get their geometry re-extracted from the stream right
    /// here; driver-reported dimensions are wrong for custom capture sizes.
    /// Raw frames infer their kind from the byte length.
    pub fn from_camera(&mut self, frame: &CameraFrame<'_>) -> Result<&mut Self> {
        if frame.data.is_empty() {
            return Err(CamstageError::EmptyFrame);
        }
        let (kind, width, height) = match frame.format {
            PixFormat::Jpeg => {
                let (w, h) = jpeg::extract_jpeg_size(frame.data)?;
                (ImageKind::Jpeg, w, h)
            }
            PixFormat::Rgb565 | PixFormat::Rgb888 | PixFormat::Grayscale => {
                let pixels = frame.width as usize * frame.height as usize;
                let kind = match frame.data.len() {
                    n if n == pixels * 2 => ImageKind::Rgb565,
                    n if n == pixels * 3 => ImageKind::Rgb888,
                    n if n == pixels => ImageKind::Gray8,
                    n => {
                        return Err(CamstageError::FrameGeometryMismatch {
                            len: n,
                            width: frame.width,
                            height: frame.height,
                        })
                    }
                };
                (kind, frame.width, frame.height)
            }
            other => {
                return Err(CamstageError::unsupported_pixel_format(other.name()));
            }
        };
        self.staged = Some(StagedSource::Camera(StagedPixels {
            data: frame.data.to_vec(),
            width,
            height,
            kind,
            timestamp: frame.timestamp,
        }));
        Ok(self)
    }

    /// Stage a copy of another image's content and metadata.
    pub fn from_image(&mut self, source: &Image) -> Result<&mut Self> {
        if !source.has_content() {
            return Err(CamstageError::no_content(source.object_name.clone()));
        }
        self.staged = Some(StagedSource::Image {
            pixels: StagedPixels {
                data: source.buffer.clone(),
                width: source.width,
                height: source.height,
                kind: source.kind,
                timestamp: source.timestamp,
            },
            metadata: source.metadata.clone(),
        });
        Ok(self)
    }

    /// Stage a file reference, inferring the kind from the extension
    /// (`.jpg`/`.jpeg` or `.bmp`, case-insensitive).
    pub fn from_file(&mut self, path: impl Into<PathBuf>) -> Result<&mut Self> {
        let path = path.into();
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase());
        let kind = match ext.as_deref() {
            Some("jpg") | Some("jpeg") => ImageKind::Jpeg,
            Some("bmp") => ImageKind::Bmp,
            _ => {
                return Err(CamstageError::unknown_extension(
                    path.display().to_string(),
                ))
            }
        };
        self.from_file_as(path, kind)
    }

    /// Stage a file reference with an explicit kind.
    pub fn from_file_as(&mut self, path: impl Into<PathBuf>, kind: ImageKind) -> Result<&mut Self> {
        if kind == ImageKind::None {
            return Err(CamstageError::NoneKindStaged);
        }
        self.staged = Some(StagedSource::File {
            path: path.into(),
            kind,
        });
        Ok(self)
    }

    // ------------------------------------------------------------------
    // Load
    // ------------------------------------------------------------------

    /// Materialize the staged source as the image's content, with no
    /// pixel-format change. File sources are read, signature-checked and
    /// measured here; `policy` decides what a missing file means.
    pub fn load(&mut self, policy: MissingFile) -> Result<()> {
        let staged = self
            .staged
            .take()
            .ok_or_else(|| CamstageError::missing_source(self.object_name.clone()))?;

        let (pixels, metadata) = match staged {
            StagedSource::Buffer(pixels) | StagedSource::Camera(pixels) => (pixels, None),
            StagedSource::Image { pixels, metadata } => (pixels, Some(metadata)),
            StagedSource::File { path, kind } => {
                match super::io::materialize_file(&path, kind, policy)? {
                    Some((pixels, metadata)) => (pixels, Some(metadata)),
                    None => {
                        // Missing file under the Reset policy
                        debug!(object = %self.object_name, path = %path.display(),
                               "missing file, resetting to empty");
                        self.clear();
                        return Ok(());
                    }
                }
            }
        };

        if pixels.width == 0 || pixels.height == 0 {
            return Err(CamstageError::ZeroDimension {
                object: self.object_name.clone().into(),
            });
        }
        self.commit(pixels, metadata);
        Ok(())
    }

    /// The single commit point: move the target descriptor into the live
    /// fields, dropping the previous buffer.
    pub(crate) fn commit(&mut self, pixels: StagedPixels, metadata: Option<Metadata>) {
        debug!(
            object = %self.object_name,
            kind = %pixels.kind,
            width = pixels.width,
            height = pixels.height,
            len = pixels.data.len(),
            "commit"
        );
        self.buffer = pixels.data;
        self.width = pixels.width;
        self.height = pixels.height;
        self.kind = pixels.kind;
        self.timestamp = pixels.timestamp;
        if let Some(metadata) = metadata {
            self.metadata = metadata;
        }
    }

    // ------------------------------------------------------------------
    // Pixel access
    // ------------------------------------------------------------------

    fn check_bounds(&self, x: u32, y: u32) -> Result<()> {
        if x >= self.width || y >= self.height {
            return Err(CamstageError::out_of_bounds(x, y, self.width, self.height));
        }
        Ok(())
    }

    fn byte_at(&self, offset: usize, count: usize) -> Result<&[u8]> {
        self.buffer
            .get(offset..offset + count)
            .ok_or(CamstageError::TruncatedData {
                kind: self.kind,
                len: self.buffer.len(),
            })
    }

    /// Decode the pixel at (x, y). Supported for RGB565, RGB888 and BMP.
    pub fn pixel_at(&self, x: u32, y: u32) -> Result<Pixel> {
        self.check_bounds(x, y)?;
        let idx = y as usize * self.width as usize + x as usize;
        match self.kind {
            ImageKind::Rgb565 => {
                let bytes = self.byte_at(idx * 2, 2)?;
                Ok(Pixel::from_rgb565_bytes([bytes[0], bytes[1]]))
            }
            ImageKind::Rgb888 => {
                let bytes = self.byte_at(idx * 3, 3)?;
                Ok(Pixel::from_bgr([bytes[0], bytes[1], bytes[2]]))
            }
            ImageKind::Bmp => {
                let offset = bmp::pixel_array_offset(&self.buffer)?;
                match bmp::parse_bits_per_pixel(&self.buffer)? {
                    24 => {
                        let bytes = self.byte_at(offset + idx * 3, 3)?;
                        Ok(Pixel::from_bgr([bytes[0], bytes[1], bytes[2]]))
                    }
                    8 => {
                        // Ramp palette: the index is the grey value
                        let v = self.byte_at(offset + idx, 1)?[0];
                        Ok(Pixel::new(v, v, v))
                    }
                    bits_per_pixel => Err(CamstageError::UnsupportedBmpDepth { bits_per_pixel }),
                }
            }
            kind => Err(CamstageError::PixelAccessUnsupported { kind }),
        }
    }

    /// Luma at (x, y).
    pub fn grey_at(&self, x: u32, y: u32) -> Result<u8> {
        Ok(self.pixel_at(x, y)?.grey())
    }

    /// Overwrite the pixel at (x, y). RGB565 images only; channel values are
    /// truncated to 5/6/5 precision.
    pub fn set_pixel(&mut self, x: u32, y: u32, r: u8, g: u8, b: u8) -> Result<()> {
        if self.kind != ImageKind::Rgb565 {
            return Err(CamstageError::PixelAccessUnsupported { kind: self.kind });
        }
        self.check_bounds(x, y)?;
        let idx = (y as usize * self.width as usize + x as usize) * 2;
        self.byte_at(idx, 2)?;
        let bytes = Pixel::new(r, g, b).to_rgb565_bytes();
        self.buffer[idx] = bytes[0];
        self.buffer[idx + 1] = bytes[1];
        Ok(())
    }
}

impl Default for Image {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {}x{} {} ({} bytes)",
            self.object_name,
            self.width,
            self.height,
            self.kind,
            self.buffer.len()
        )
    }
}
