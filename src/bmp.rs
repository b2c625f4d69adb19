// src/bmp.rs
//
// BMP container logic: building the fixed 54-byte header (plus the grayscale
// ramp palette for 8 bpp) and reading geometry back out of an existing
// buffer. Everything is little-endian on the wire. The height field is
// written negated to force top-down row order.

use crate::error::{CamstageError, Result};
use crate::ops::ImageKind;

/// Fixed header length: 2-byte signature + 52-byte BITMAPINFOHEADER block.
pub const HEADER_LEN: usize = 54;

/// 256 palette entries x {B, G, R, reserved}.
pub const PALETTE_LEN: usize = 1024;

pub const SIGNATURE: [u8; 2] = [0x42, 0x4D]; // "BM"

// Header field offsets (Windows BMP format)
const PIXEL_ARRAY_OFFSET_ADDR: usize = 0x0A;
const WIDTH_ADDR: usize = 0x12;
const HEIGHT_ADDR: usize = 0x16;
const BPP_ADDR: usize = 0x1C;

// 2835 pixels per meter, 72 DPI
const PIXELS_PER_METER: u32 = 0x0B13;

pub fn has_signature(buf: &[u8]) -> bool {
    buf.len() >= 2 && buf[..2] == SIGNATURE
}

/// Total output size for a BMP holding `width * height` pixels.
pub const fn image_size(width: u32, height: u32, grayscale: bool) -> usize {
    let pix_count = width as usize * height as usize;
    let (bpp, palette) = if grayscale { (1, PALETTE_LEN) } else { (3, 0) };
    pix_count * bpp + HEADER_LEN + palette
}

/// Build the header (and the grayscale ramp palette when `grayscale`) for a
/// top-down BMP. The returned buffer ends where the pixel array begins.
pub fn build_header(width: u32, height: u32, grayscale: bool) -> Vec<u8> {
    let pix_count = width as usize * height as usize;
    let (bpp, palette_len) = if grayscale { (1usize, PALETTE_LEN) } else { (3, 0) };
    let file_size = image_size(width, height, grayscale);

    let mut out = Vec::with_capacity(HEADER_LEN + palette_len);
    out.extend_from_slice(&SIGNATURE);
    out.extend_from_slice(&(file_size as u32).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes()); // reserved
    out.extend_from_slice(&((HEADER_LEN + palette_len) as u32).to_le_bytes());
    out.extend_from_slice(&40u32.to_le_bytes()); // DIB header size
    out.extend_from_slice(&(width as i32).to_le_bytes());
    out.extend_from_slice(&(-(height as i32)).to_le_bytes()); // negative = top-down
    out.extend_from_slice(&1u16.to_le_bytes()); // planes
    out.extend_from_slice(&((bpp * 8) as u16).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes()); // compression
    out.extend_from_slice(&((pix_count * bpp) as u32).to_le_bytes());
    out.extend_from_slice(&PIXELS_PER_METER.to_le_bytes());
    out.extend_from_slice(&PIXELS_PER_METER.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes()); // palette color count
    out.extend_from_slice(&0u32.to_le_bytes()); // important color count
    debug_assert_eq!(out.len(), HEADER_LEN);

    if grayscale {
        // Identity ramp: index i maps to (i, i, i)
        for i in 0..=255u8 {
            out.extend_from_slice(&[i, i, i, 0]);
        }
    }
    out
}

fn read_i32(buf: &[u8], addr: usize) -> Result<i32> {
    let bytes: [u8; 4] = buf
        .get(addr..addr + 4)
        .and_then(|s| s.try_into().ok())
        .ok_or(CamstageError::TruncatedData {
            kind: ImageKind::Bmp,
            len: buf.len(),
        })?;
    Ok(i32::from_le_bytes(bytes))
}

/// Read width/height back out of a BMP buffer. The height field may be
/// negated (top-down rows); the magnitude is returned either way.
pub fn parse_dimensions(buf: &[u8]) -> Result<(u32, u32)> {
    if !has_signature(buf) {
        return Err(CamstageError::signature_mismatch("<buffer>", ImageKind::Bmp));
    }
    let width = read_i32(buf, WIDTH_ADDR)?.unsigned_abs();
    let height = read_i32(buf, HEIGHT_ADDR)?.unsigned_abs();
    Ok((width, height))
}

pub fn parse_bits_per_pixel(buf: &[u8]) -> Result<u16> {
    let bytes: [u8; 2] = buf
        .get(BPP_ADDR..BPP_ADDR + 2)
        .and_then(|s| s.try_into().ok())
        .ok_or(CamstageError::TruncatedData {
            kind: ImageKind::Bmp,
            len: buf.len(),
        })?;
    Ok(u16::from_le_bytes(bytes))
}

/// Offset of the pixel array from the start of the file (skips header and
/// any palette).
pub fn pixel_array_offset(buf: &[u8]) -> Result<usize> {
    Ok(read_i32(buf, PIXEL_ARRAY_OFFSET_ADDR)? as u32 as usize)
}
