// src/engine/convert.rs
//
// The conversion matrix. Each path reads a resolved source view (the staged
// source, or the image's own content when nothing is staged) and produces a
// fresh target descriptor for the commit point in staging.rs.
//
// Supported pairs:
//   JPEG -> RGB565                (bridge decode, optional power-of-two scale)
//   {JPEG, RGB565, Gray8} -> BMP  (header + BGR/indexed pixel re-pack)
//   {RGB888, BMP, RGB565, Gray8} -> JPEG (bridge encode)
// Everything else fails naming both kinds.

use super::staging::{Image, StagedPixels, StagedSource};
use crate::bmp;
use crate::codecs::{EncodeSource, JpegCodec, MozjpegCodec, ScanlineSink, JPEG_QUALITY};
use crate::error::{CamstageError, Result};
use crate::ops::{ImageKind, Scaling, Timestamp};
use crate::pixel::Pixel;
use tracing::debug;

/// Borrowed view of the conversion input.
struct SourceView<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    kind: ImageKind,
    timestamp: Timestamp,
}

impl<'a> SourceView<'a> {
    fn from_pixels(pixels: &'a StagedPixels) -> Self {
        Self {
            data: &pixels.data,
            width: pixels.width,
            height: pixels.height,
            kind: pixels.kind,
            timestamp: pixels.timestamp,
        }
    }
}

impl Image {
    /// Convert the staged source (or the image's own content when nothing is
    /// staged) to `target`, committing the result. Uses the default mozjpeg
    /// codec; see [`Image::convert_with`] for supplying another bridge.
    pub fn convert_to(&mut self, target: ImageKind, scaling: Scaling) -> Result<()> {
        self.convert_with(&MozjpegCodec::new(), target, scaling)
    }

    /// Convert through a caller-supplied JPEG codec bridge.
    pub fn convert_with(
        &mut self,
        codec: &dyn JpegCodec,
        target: ImageKind,
        scaling: Scaling,
    ) -> Result<()> {
        let staged = self.staged.take();
        let (pixels, metadata) = {
            let (src, metadata) = match &staged {
                Some(StagedSource::Buffer(p)) | Some(StagedSource::Camera(p)) => {
                    (SourceView::from_pixels(p), None)
                }
                Some(StagedSource::Image { pixels, metadata }) => {
                    (SourceView::from_pixels(pixels), Some(metadata))
                }
                Some(StagedSource::File { path, .. }) => {
                    return Err(CamstageError::FileSourceNotLoaded {
                        path: path.display().to_string().into(),
                    });
                }
                // Implicit source: the image's current content
                None => (
                    SourceView {
                        data: &self.buffer,
                        width: self.width,
                        height: self.height,
                        kind: self.kind,
                        timestamp: self.timestamp,
                    },
                    None,
                ),
            };
            if src.kind == target {
                return Err(CamstageError::SameTypeConversion { kind: target });
            }
            debug!(object = %self.object_name(), from = %src.kind, to = %target,
                   scale = scaling.factor(), "convert");
            let pixels = run_conversion(codec, &src, target, scaling)?;
            (pixels, metadata.cloned())
        };

        if pixels.width == 0 || pixels.height == 0 {
            return Err(CamstageError::ZeroDimension {
                object: self.object_name().to_string().into(),
            });
        }
        self.commit(pixels, metadata);
        Ok(())
    }
}

fn run_conversion(
    codec: &dyn JpegCodec,
    src: &SourceView<'_>,
    target: ImageKind,
    scaling: Scaling,
) -> Result<StagedPixels> {
    match target {
        ImageKind::Rgb565 if src.kind == ImageKind::Jpeg => jpeg_to_rgb565(codec, src, scaling),
        ImageKind::Bmp => {
            if scaling != Scaling::None {
                return Err(CamstageError::ScalingUnsupported { target });
            }
            match src.kind {
                ImageKind::Jpeg => jpeg_to_bmp(codec, src),
                ImageKind::Rgb565 => Ok(rgb565_to_bmp(src)),
                ImageKind::Gray8 => Ok(gray_to_bmp(src)),
                from => Err(CamstageError::UnsupportedConversion { from, to: target }),
            }
        }
        ImageKind::Jpeg => {
            if scaling != Scaling::None {
                return Err(CamstageError::ScalingUnsupported { target });
            }
            let data = match src.kind {
                ImageKind::Rgb888 => {
                    codec.encode(src.data, src.width, src.height, EncodeSource::Bgr888, JPEG_QUALITY)?
                }
                ImageKind::Bmp => {
                    let body = bmp_pixel_array(src)?;
                    codec.encode(body, src.width, src.height, EncodeSource::Bgr888, JPEG_QUALITY)?
                }
                ImageKind::Rgb565 => {
                    codec.encode(src.data, src.width, src.height, EncodeSource::Rgb565, JPEG_QUALITY)?
                }
                ImageKind::Gray8 => {
                    codec.encode(src.data, src.width, src.height, EncodeSource::Gray8, JPEG_QUALITY)?
                }
                from => return Err(CamstageError::UnsupportedConversion { from, to: target }),
            };
            Ok(StagedPixels {
                data,
                width: src.width,
                height: src.height,
                kind: ImageKind::Jpeg,
                timestamp: src.timestamp,
            })
        }
        to => Err(CamstageError::UnsupportedConversion { from: src.kind, to }),
    }
}

/// Sink that packs decoded RGB rows into a canonical big-endian RGB565
/// buffer sized from the reported geometry.
struct Rgb565Sink {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl ScanlineSink for Rgb565Sink {
    fn begin(&mut self, width: u32, height: u32) -> bool {
        self.width = width;
        self.height = height;
        self.data = vec![0u8; width as usize * height as usize * 2];
        true
    }

    fn scanline(&mut self, y: u32, rgb: &[u8]) -> bool {
        let w = self.width as usize;
        if y >= self.height || rgb.len() < w * 3 {
            return false;
        }
        let row = &mut self.data[y as usize * w * 2..(y as usize + 1) * w * 2];
        for (x, px) in rgb.chunks_exact(3).take(w).enumerate() {
            let bytes = Pixel::new(px[0], px[1], px[2]).to_rgb565_bytes();
            row[x * 2] = bytes[0];
            row[x * 2 + 1] = bytes[1];
        }
        true
    }
}

fn jpeg_to_rgb565(
    codec: &dyn JpegCodec,
    src: &SourceView<'_>,
    scaling: Scaling,
) -> Result<StagedPixels> {
    let mut sink = Rgb565Sink {
        data: Vec::new(),
        width: 0,
        height: 0,
    };
    let (width, height) = codec.decode(src.data, scaling, &mut sink)?;
    if (width, height) != (sink.width, sink.height) {
        return Err(CamstageError::GeometryMismatch {
            width: sink.width,
            height: sink.height,
            reported_width: width,
            reported_height: height,
        });
    }
    Ok(StagedPixels {
        data: sink.data,
        width,
        height,
        kind: ImageKind::Rgb565,
        timestamp: src.timestamp,
    })
}

/// Sink that writes decoded RGB rows straight into a 24 bpp BMP pixel array,
/// header included.
struct BmpSink {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl ScanlineSink for BmpSink {
    fn begin(&mut self, width: u32, height: u32) -> bool {
        self.width = width;
        self.height = height;
        self.data = bmp::build_header(width, height, false);
        self.data
            .resize(bmp::image_size(width, height, false), 0);
        true
    }

    fn scanline(&mut self, y: u32, rgb: &[u8]) -> bool {
        let w = self.width as usize;
        if y >= self.height || rgb.len() < w * 3 {
            return false;
        }
        let start = bmp::HEADER_LEN + y as usize * w * 3;
        let row = &mut self.data[start..start + w * 3];
        for (x, px) in rgb.chunks_exact(3).take(w).enumerate() {
            row[x * 3] = px[2];
            row[x * 3 + 1] = px[1];
            row[x * 3 + 2] = px[0];
        }
        true
    }
}

fn jpeg_to_bmp(codec: &dyn JpegCodec, src: &SourceView<'_>) -> Result<StagedPixels> {
    let mut sink = BmpSink {
        data: Vec::new(),
        width: 0,
        height: 0,
    };
    let (width, height) = codec.decode(src.data, Scaling::None, &mut sink)?;
    if (width, height) != (sink.width, sink.height) {
        return Err(CamstageError::GeometryMismatch {
            width: sink.width,
            height: sink.height,
            reported_width: width,
            reported_height: height,
        });
    }
    Ok(StagedPixels {
        data: sink.data,
        width,
        height,
        kind: ImageKind::Bmp,
        timestamp: src.timestamp,
    })
}

fn rgb565_to_bmp(src: &SourceView<'_>) -> StagedPixels {
    let mut data = bmp::build_header(src.width, src.height, false);
    data.reserve(src.data.len() / 2 * 3);
    for pair in src.data.chunks_exact(2) {
        let px = Pixel::from_rgb565_bytes([pair[0], pair[1]]);
        data.extend_from_slice(&px.to_bgr());
    }
    StagedPixels {
        data,
        width: src.width,
        height: src.height,
        kind: ImageKind::Bmp,
        timestamp: src.timestamp,
    }
}

fn gray_to_bmp(src: &SourceView<'_>) -> StagedPixels {
    let mut data = bmp::build_header(src.width, src.height, true);
    data.extend_from_slice(src.data);
    StagedPixels {
        data,
        width: src.width,
        height: src.height,
        kind: ImageKind::Bmp,
        timestamp: src.timestamp,
    }
}

/// The 24 bpp pixel array of a BMP source, header and palette skipped.
fn bmp_pixel_array<'a>(src: &SourceView<'a>) -> Result<&'a [u8]> {
    let bits_per_pixel = bmp::parse_bits_per_pixel(src.data)?;
    if bits_per_pixel != 24 {
        return Err(CamstageError::UnsupportedBmpDepth { bits_per_pixel });
    }
    let offset = bmp::pixel_array_offset(src.data)?;
    let len = src.width as usize * src.height as usize * 3;
    src.data
        .get(offset..offset + len)
        .ok_or(CamstageError::TruncatedData {
            kind: ImageKind::Bmp,
            len: src.data.len(),
        })
}
