// src/jpeg.rs
//
// JPEG marker-segment walking: locate the SOF0 frame-geometry segment in a
// raw byte stream and pull width/height out of it, without touching the
// entropy decoder. O(segments), bounded by the supplied buffer.

use crate::error::{CamstageError, Result};

pub const SIGNATURE: [u8; 2] = [0xFF, 0xD8];

// Marker second bytes. Every valid marker byte is >= 0xC0.
const MARKER: u8 = 0xFF;
const SOI: u8 = 0xD8;
const EOI: u8 = 0xD9;
const SOF0: u8 = 0xC0;
const MARKER_FLOOR: u8 = 0xC0;

pub fn has_signature(buf: &[u8]) -> bool {
    buf.len() >= 2 && buf[..2] == SIGNATURE
}

fn read_be16(buf: &[u8], at: usize) -> Option<u16> {
    let bytes: [u8; 2] = buf.get(at..at + 2)?.try_into().ok()?;
    Some(u16::from_be_bytes(bytes))
}

/// Walk the marker segments of `buf` and return (width, height) from the
/// first SOF0 segment. SOI carries no length and is skipped; EOI ends the
/// scan; every other segment is jumped over via its 2-byte big-endian length
/// (which includes the length bytes themselves). A malformed marker, an
/// out-of-range jump or a missing SOF0 all report GeometryNotFound.
pub fn extract_jpeg_size(buf: &[u8]) -> Result<(u32, u32)> {
    let mut pos = 0usize;
    loop {
        let (Some(&m0), Some(&m1)) = (buf.get(pos), buf.get(pos + 1)) else {
            return Err(CamstageError::GeometryNotFound);
        };
        if m0 != MARKER || m1 < MARKER_FLOOR {
            return Err(CamstageError::GeometryNotFound);
        }
        match m1 {
            SOI => {
                pos += 2;
            }
            EOI => return Err(CamstageError::GeometryNotFound),
            SOF0 => {
                // Body after the 2-byte length: precision u8, height u16 BE,
                // width u16 BE.
                let height = read_be16(buf, pos + 5).ok_or(CamstageError::GeometryNotFound)?;
                let width = read_be16(buf, pos + 7).ok_or(CamstageError::GeometryNotFound)?;
                return Ok((width as u32, height as u32));
            }
            _ => {
                let len = read_be16(buf, pos + 2).ok_or(CamstageError::GeometryNotFound)? as usize;
                if len < 2 {
                    return Err(CamstageError::GeometryNotFound);
                }
                let next = pos + 2 + len;
                if next > buf.len() {
                    return Err(CamstageError::GeometryNotFound);
                }
                pos = next;
            }
        }
    }
}
