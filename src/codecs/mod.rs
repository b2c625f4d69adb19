// src/codecs/mod.rs
//
// The narrow bridge to the external JPEG codec. The staging engine only
// talks to the `JpegCodec` trait; `MozjpegCodec` is the production
// implementation on top of mozjpeg (libjpeg-turbo).

mod mozjpeg_codec;

pub use mozjpeg_codec::MozjpegCodec;

use crate::error::Result;
use crate::ops::Scaling;

/// Fixed quality factor for every JPEG re-encode.
pub const JPEG_QUALITY: u8 = 80;

/// Receiver for decoded scanlines.
///
/// `begin` is called once before any pixel data with the decoded geometry
/// (post-scaling), mirroring the start-of-frame callback of row-based JPEG
/// decoders; output buffers are usually allocated there. Returning `false`
/// from either method aborts the decode early without error — a sink whose
/// `begin` returns `false` turns `decode` into a pure geometry probe.
pub trait ScanlineSink {
    fn begin(&mut self, width: u32, height: u32) -> bool;

    /// One decoded row of RGB888 pixels (3 bytes per pixel, R,G,B order).
    fn scanline(&mut self, y: u32, rgb: &[u8]) -> bool;
}

/// Raw layouts the encoder accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncodeSource {
    /// Canonical big-endian RGB565, {high, low} per pixel
    Rgb565,
    /// B,G,R triplets (RGB888 storage and BMP pixel arrays)
    Bgr888,
    /// 8-bit grayscale
    Gray8,
}

impl EncodeSource {
    pub const fn bytes_per_pixel(&self) -> usize {
        match self {
            EncodeSource::Rgb565 => 2,
            EncodeSource::Bgr888 => 3,
            EncodeSource::Gray8 => 1,
        }
    }
}

/// External JPEG decode/encode routines, consumed through a narrow
/// interface so tests can substitute their own codec.
pub trait JpegCodec {
    /// Decode `input`, downscaling by `scaling`, feeding rows to `sink`.
    /// Returns the decoded (width, height) after scaling.
    fn decode(
        &self,
        input: &[u8],
        scaling: Scaling,
        sink: &mut dyn ScanlineSink,
    ) -> Result<(u32, u32)>;

    /// Encode raw pixel data to a JPEG byte stream.
    fn encode(
        &self,
        raw: &[u8],
        width: u32,
        height: u32,
        format: EncodeSource,
        quality: u8,
    ) -> Result<Vec<u8>>;
}
