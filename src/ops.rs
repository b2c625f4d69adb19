// src/ops.rs
//
// Shared vocabulary: image kinds, scaling factors, load/save policies,
// timestamps. These are cheap Copy enums - the expensive work happens in the
// staging engine.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Storage format of an image buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ImageKind {
    /// No content
    #[default]
    None,
    /// JPEG compressed container
    Jpeg,
    /// 16-bit RGB, stored big-endian {high, low} per pixel
    Rgb565,
    /// 24-bit RGB, stored as B,G,R triplets
    Rgb888,
    /// 8-bit grayscale
    Gray8,
    /// BMP container (54-byte header, optional palette, B,G,R rows)
    Bmp,
}

impl ImageKind {
    /// Process-wide read-only name table.
    pub const fn name(&self) -> &'static str {
        match self {
            ImageKind::None => "None",
            ImageKind::Jpeg => "JPEG",
            ImageKind::Rgb565 => "RGB565",
            ImageKind::Rgb888 => "RGB888",
            ImageKind::Gray8 => "Grayscale8",
            ImageKind::Bmp => "BMP",
        }
    }

    /// Bytes per pixel for the raw formats; None for containers.
    pub const fn bytes_per_pixel(&self) -> Option<usize> {
        match self {
            ImageKind::Rgb565 => Some(2),
            ImageKind::Rgb888 => Some(3),
            ImageKind::Gray8 => Some(1),
            _ => None,
        }
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Power-of-two downscale applied during JPEG decode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Scaling {
    #[default]
    None,
    Half,
    Quarter,
    Eighth,
    Sixteenth,
    ThirtySecond,
}

impl Scaling {
    /// Right-shift applied to each dimension.
    pub const fn shift(&self) -> u32 {
        match self {
            Scaling::None => 0,
            Scaling::Half => 1,
            Scaling::Quarter => 2,
            Scaling::Eighth => 3,
            Scaling::Sixteenth => 4,
            Scaling::ThirtySecond => 5,
        }
    }

    /// Decimation factor (1, 2, 4, ...).
    pub const fn factor(&self) -> u32 {
        1 << self.shift()
    }
}

/// What to do when the staged file is absent on load.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MissingFile {
    /// Silently reset the image to empty and return Ok
    #[default]
    Reset,
    /// Report a MissingFile error
    Error,
}

/// What to do when the sink file already exists on save.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExistingFile {
    /// Replace the existing file
    #[default]
    Overwrite,
    /// Report a FileExists error
    Error,
}

/// Capture/modification time, seconds + microseconds since the epoch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Timestamp {
    pub secs: u64,
    pub micros: u32,
}

impl Timestamp {
    pub const fn new(secs: u64, micros: u32) -> Self {
        Self { secs, micros }
    }

    pub fn now() -> Self {
        SystemTime::now().into()
    }

    pub const fn is_zero(&self) -> bool {
        self.secs == 0 && self.micros == 0
    }
}

impl From<SystemTime> for Timestamp {
    fn from(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(d) => Self {
                secs: d.as_secs(),
                micros: d.subsec_micros(),
            },
            Err(_) => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(ImageKind::Rgb565.name(), "RGB565");
        assert_eq!(ImageKind::Gray8.name(), "Grayscale8");
        assert_eq!(ImageKind::None.to_string(), "None");
    }

    #[test]
    fn test_bytes_per_pixel() {
        assert_eq!(ImageKind::Rgb565.bytes_per_pixel(), Some(2));
        assert_eq!(ImageKind::Rgb888.bytes_per_pixel(), Some(3));
        assert_eq!(ImageKind::Gray8.bytes_per_pixel(), Some(1));
        assert_eq!(ImageKind::Jpeg.bytes_per_pixel(), None);
        assert_eq!(ImageKind::Bmp.bytes_per_pixel(), None);
    }

    #[test]
    fn test_scaling_shift_and_factor() {
        assert_eq!(Scaling::None.factor(), 1);
        assert_eq!(Scaling::Half.factor(), 2);
        assert_eq!(Scaling::ThirtySecond.shift(), 5);
        assert_eq!(640u32 >> Scaling::Quarter.shift(), 160);
    }

    #[test]
    fn test_timestamp_from_system_time() {
        let ts = Timestamp::now();
        assert!(ts.secs > 0);
        assert!(ts.micros < 1_000_000);
    }
}
