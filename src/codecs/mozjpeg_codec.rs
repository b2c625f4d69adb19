// src/codecs/mozjpeg_codec.rs
//
// JpegCodec implementation backed by mozjpeg (libjpeg-turbo). Decode always
// produces RGB888 rows; the power-of-two downscale is applied by scanline
// and column decimation before rows reach the sink. Encode accepts the raw
// layouts the staging engine stores and converts rows to what libjpeg
// expects.

use super::{EncodeSource, JpegCodec, ScanlineSink};
use crate::error::{CamstageError, Result};
use crate::ops::Scaling;
use crate::pixel::Pixel;
use mozjpeg::{ColorSpace, Compress, Decompress};

#[derive(Clone, Copy, Debug, Default)]
pub struct MozjpegCodec;

impl MozjpegCodec {
    pub const fn new() -> Self {
        Self
    }

    fn encode_scanlines(
        &self,
        rows: impl Iterator<Item = Vec<u8>>,
        width: usize,
        height: usize,
        colorspace: ColorSpace,
        quality: u8,
    ) -> Result<Vec<u8>> {
        let mut comp = Compress::new(colorspace);
        comp.set_size(width, height);
        if colorspace == ColorSpace::JCS_RGB {
            comp.set_color_space(ColorSpace::JCS_YCbCr);
            comp.set_chroma_sampling_pixel_sizes((2, 2), (2, 2));
        }
        comp.set_quality(quality.min(100) as f32);

        let mut output = Vec::new();
        let mut writer = comp.start_compress(&mut output).map_err(|e| {
            CamstageError::encode_failed(format!("mozjpeg: failed to start compress: {e:?}"))
        })?;
        for row in rows {
            writer.write_scanlines(&row).map_err(|e| {
                CamstageError::encode_failed(format!("mozjpeg: failed to write scanlines: {e:?}"))
            })?;
        }
        writer.finish().map_err(|e| {
            CamstageError::encode_failed(format!("mozjpeg: failed to finish: {e:?}"))
        })?;
        Ok(output)
    }
}

impl JpegCodec for MozjpegCodec {
    fn decode(
        &self,
        input: &[u8],
        scaling: Scaling,
        sink: &mut dyn ScanlineSink,
    ) -> Result<(u32, u32)> {
        // Reject streams without an end-of-image marker up front; mozjpeg
        // would otherwise chew on truncated data.
        if !input.windows(2).any(|pair| pair == [0xFF, 0xD9]) {
            return Err(CamstageError::decode_failed("missing JPEG EOI marker"));
        }

        let decompress = Decompress::new_mem(input).map_err(|e| {
            CamstageError::decode_failed(format!("mozjpeg: decompress init failed: {e:?}"))
        })?;
        let mut decompress = decompress.rgb().map_err(|e| {
            CamstageError::decode_failed(format!("mozjpeg: rgb conversion failed: {e:?}"))
        })?;

        let width = decompress.width();
        let height = decompress.height();
        let shift = scaling.shift();
        let factor = scaling.factor() as usize;
        let out_w = width >> shift;
        let out_h = height >> shift;
        if out_w == 0 || out_h == 0 {
            return Err(CamstageError::decode_failed(format!(
                "scaling 1/{} collapses a {width}x{height} image",
                scaling.factor()
            )));
        }

        if !sink.begin(out_w as u32, out_h as u32) {
            // Geometry probe: the caller only wanted the dimensions.
            return Ok((out_w as u32, out_h as u32));
        }

        let pixels: Vec<[u8; 3]> = decompress.read_scanlines().map_err(|e| {
            CamstageError::decode_failed(format!("mozjpeg: failed to read scanlines: {e:?}"))
        })?;
        if pixels.len() < width * height {
            return Err(CamstageError::decode_failed("mozjpeg: short scanline read"));
        }

        let mut row = vec![0u8; out_w * 3];
        for y in 0..out_h {
            let src_row = y * factor * width;
            for x in 0..out_w {
                let [r, g, b] = pixels[src_row + x * factor];
                row[x * 3] = r;
                row[x * 3 + 1] = g;
                row[x * 3 + 2] = b;
            }
            if !sink.scanline(y as u32, &row) {
                break;
            }
        }
        Ok((out_w as u32, out_h as u32))
    }

    fn encode(
        &self,
        raw: &[u8],
        width: u32,
        height: u32,
        format: EncodeSource,
        quality: u8,
    ) -> Result<Vec<u8>> {
        let (w, h) = (width as usize, height as usize);
        if w == 0 || h == 0 {
            return Err(CamstageError::encode_failed("zero image dimension"));
        }
        let expected = w * h * format.bytes_per_pixel();
        if raw.len() != expected {
            return Err(CamstageError::encode_failed(format!(
                "raw length {} does not match {width}x{height} {format:?}",
                raw.len()
            )));
        }

        match format {
            EncodeSource::Gray8 => self.encode_scanlines(
                raw.chunks_exact(w).map(|r| r.to_vec()),
                w,
                h,
                ColorSpace::JCS_GRAYSCALE,
                quality,
            ),
            EncodeSource::Bgr888 => self.encode_scanlines(
                raw.chunks_exact(w * 3).map(|src| {
                    let mut row = Vec::with_capacity(w * 3);
                    for bgr in src.chunks_exact(3) {
                        row.extend_from_slice(&[bgr[2], bgr[1], bgr[0]]);
                    }
                    row
                }),
                w,
                h,
                ColorSpace::JCS_RGB,
                quality,
            ),
            EncodeSource::Rgb565 => self.encode_scanlines(
                raw.chunks_exact(w * 2).map(|src| {
                    let mut row = Vec::with_capacity(w * 3);
                    for pair in src.chunks_exact(2) {
                        let p = Pixel::from_rgb565_bytes([pair[0], pair[1]]);
                        row.extend_from_slice(&[p.r, p.g, p.b]);
                    }
                    row
                }),
                w,
                h,
                ColorSpace::JCS_RGB,
                quality,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codecs::JPEG_QUALITY;
    use crate::jpeg;

    struct CollectSink {
        width: u32,
        height: u32,
        rows: Vec<Vec<u8>>,
    }

    impl CollectSink {
        fn new() -> Self {
            Self { width: 0, height: 0, rows: Vec::new() }
        }
    }

    impl ScanlineSink for CollectSink {
        fn begin(&mut self, width: u32, height: u32) -> bool {
            self.width = width;
            self.height = height;
            true
        }

        fn scanline(&mut self, _y: u32, rgb: &[u8]) -> bool {
            self.rows.push(rgb.to_vec());
            true
        }
    }

    struct ProbeSink {
        geometry: Option<(u32, u32)>,
    }

    impl ScanlineSink for ProbeSink {
        fn begin(&mut self, width: u32, height: u32) -> bool {
            self.geometry = Some((width, height));
            false
        }

        fn scanline(&mut self, _y: u32, _rgb: &[u8]) -> bool {
            unreachable!("probe sink never receives rows")
        }
    }

    fn encode_gray_gradient(w: u32, h: u32) -> Vec<u8> {
        let raw: Vec<u8> = (0..w * h).map(|i| (i % 251) as u8).collect();
        MozjpegCodec::new()
            .encode(&raw, w, h, EncodeSource::Gray8, JPEG_QUALITY)
            .unwrap()
    }

    #[test]
    fn test_encode_produces_valid_jpeg_stream() {
        let data = encode_gray_gradient(32, 16);
        assert!(jpeg::has_signature(&data));
        assert_eq!(jpeg::extract_jpeg_size(&data).unwrap(), (32, 16));
    }

    #[test]
    fn test_decode_reports_geometry_and_rows() {
        let data = encode_gray_gradient(32, 16);
        let mut sink = CollectSink::new();
        let (w, h) = MozjpegCodec::new()
            .decode(&data, Scaling::None, &mut sink)
            .unwrap();
        assert_eq!((w, h), (32, 16));
        assert_eq!((sink.width, sink.height), (32, 16));
        assert_eq!(sink.rows.len(), 16);
        assert!(sink.rows.iter().all(|r| r.len() == 32 * 3));
    }

    #[test]
    fn test_decode_scaling_decimates() {
        let data = encode_gray_gradient(64, 32);
        let mut sink = CollectSink::new();
        let (w, h) = MozjpegCodec::new()
            .decode(&data, Scaling::Quarter, &mut sink)
            .unwrap();
        assert_eq!((w, h), (16, 8));
        assert_eq!(sink.rows.len(), 8);
        assert_eq!(sink.rows[0].len(), 16 * 3);
    }

    #[test]
    fn test_geometry_probe_skips_pixel_work() {
        let data = encode_gray_gradient(48, 24);
        let mut sink = ProbeSink { geometry: None };
        let (w, h) = MozjpegCodec::new()
            .decode(&data, Scaling::None, &mut sink)
            .unwrap();
        assert_eq!((w, h), (48, 24));
        assert_eq!(sink.geometry, Some((48, 24)));
    }

    #[test]
    fn test_decode_rejects_missing_eoi() {
        let mut data = encode_gray_gradient(16, 16);
        // Chop off the EOI marker
        while data.last() == Some(&0xD9) || data.last() == Some(&0xFF) {
            data.pop();
        }
        let mut sink = CollectSink::new();
        let err = MozjpegCodec::new()
            .decode(&data, Scaling::None, &mut sink)
            .unwrap_err();
        assert!(matches!(err, CamstageError::DecodeFailed { .. }));
    }

    #[test]
    fn test_encode_rejects_length_mismatch() {
        let err = MozjpegCodec::new()
            .encode(&[0u8; 10], 4, 4, EncodeSource::Rgb565, JPEG_QUALITY)
            .unwrap_err();
        assert!(matches!(err, CamstageError::EncodeFailed { .. }));
    }

    #[test]
    fn test_gray_roundtrip_within_quantization_error() {
        let raw = vec![128u8; 32 * 32];
        let codec = MozjpegCodec::new();
        let data = codec
            .encode(&raw, 32, 32, EncodeSource::Gray8, JPEG_QUALITY)
            .unwrap();
        let mut sink = CollectSink::new();
        let (w, h) = codec.decode(&data, Scaling::None, &mut sink).unwrap();
        assert_eq!((w, h), (32, 32));
        for row in &sink.rows {
            for px in row.chunks_exact(3) {
                let grey = Pixel::new(px[0], px[1], px[2]).grey();
                assert!((grey as i32 - 128).abs() <= 8, "grey {grey} drifted too far");
            }
        }
    }
}
