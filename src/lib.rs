// lib.rs
//
// camstage: a staging and conversion engine for camera images.
//
// Design goals:
// - Declare a source, then act: from_*() -> load()/convert_to() -> save()
// - One commit point per staging cycle; failures never leave half an image
// - Byte-exact BMP and JPEG container handling without a full decode
// - The JPEG entropy codec stays behind a narrow bridge trait
//
// A typical cycle:
//
//   let mut img = Image::new();
//   img.from_camera(&frame)?;
//   img.convert_to(ImageKind::Rgb565, Scaling::Quarter)?;
//   img.to_file("/sd/frame0.bmp");
//   img.convert_to(ImageKind::Bmp, Scaling::None)?;
//   img.save(ExistingFile::Overwrite)?;

pub mod bmp;
pub mod camera;
pub mod codecs;
pub mod compare;
pub mod engine;
pub mod error;
pub mod jpeg;
pub mod metadata;
pub mod ops;
pub mod pixel;

pub use camera::{CameraFrame, PixFormat};
pub use codecs::{EncodeSource, JpegCodec, MozjpegCodec, ScanlineSink, JPEG_QUALITY};
pub use compare::{inside_central_circle, inside_circle, no_mask, outside_circle};
pub use engine::Image;
pub use error::{CamstageError, ErrorCategory, Result};
pub use metadata::Metadata;
pub use ops::{ExistingFile, ImageKind, MissingFile, Scaling, Timestamp};
pub use pixel::Pixel;
