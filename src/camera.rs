// src/camera.rs
//
// Frame-buffer types handed over by the camera driver. The driver itself is
// an external collaborator; this is only the shape of what it produces.

use crate::ops::Timestamp;
use std::fmt;

/// Pixel formats the camera driver can report. Only Jpeg and the raw
/// single-plane formats are accepted by the staging engine; the rest exist so
/// a frame can name what it actually carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixFormat {
    Rgb565,
    Yuv422,
    Yuv420,
    Grayscale,
    Jpeg,
    Rgb888,
    Raw,
    Rgb444,
    Rgb555,
}

impl PixFormat {
    pub const fn name(&self) -> &'static str {
        match self {
            PixFormat::Rgb565 => "RGB565",
            PixFormat::Yuv422 => "YUV422",
            PixFormat::Yuv420 => "YUV420",
            PixFormat::Grayscale => "GRAYSCALE",
            PixFormat::Jpeg => "JPEG",
            PixFormat::Rgb888 => "RGB888",
            PixFormat::Raw => "RAW",
            PixFormat::Rgb444 => "RGB444",
            PixFormat::Rgb555 => "RGB555",
        }
    }
}

impl fmt::Display for PixFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One captured frame, borrowed from the driver's frame buffer. The staging
/// engine copies out of it immediately, so the borrow only has to outlive the
/// `from_camera` call.
///
/// Driver-reported width/height are not trusted for JPEG frames with custom
/// capture sizes; the engine re-derives geometry from the JPEG stream.
#[derive(Debug)]
pub struct CameraFrame<'a> {
    pub data: &'a [u8],
    pub width: u32,
    pub height: u32,
    pub format: PixFormat,
    pub timestamp: Timestamp,
}

impl<'a> CameraFrame<'a> {
    pub fn new(
        data: &'a [u8],
        width: u32,
        height: u32,
        format: PixFormat,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            data,
            width,
            height,
            format,
            timestamp,
        }
    }
}
