//! # stim-io
//!
//! Image I/O for stimulus preparation.
//!
//! Reads and writes the raster formats experiment stimuli ship in:
//!
//! - **JPEG** - photographic stimuli, written at quality 95 by default
//! - **PNG** - lossless, used when exact 8-bit values must survive a round trip
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use stim_io::{read, write};
//!
//! let image = read("media/face_1.jpg")?;
//! let rgb = image.to_rgb_f32()?; // H x W x 3, values in [0, 1]
//! write("media/face_1.png", &image)?;
//! ```
//!
//! # Feature Flags
//!
//! - `png` - PNG support (default)
//! - `jpeg` - JPEG support (default)

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod detect;
mod error;
mod store;

#[cfg(feature = "png")]
pub mod png;

#[cfg(feature = "jpeg")]
pub mod jpeg;

pub use detect::Format;
pub use error::{IoError, IoResult};
pub use store::{FsStore, ImageStore};

use std::path::Path;
use tracing::trace;

/// JPEG quality used when none is specified.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Reads an image from a file, auto-detecting the format.
///
/// # Errors
///
/// Returns [`IoError::Io`] if the file cannot be opened, and a decode-class
/// error (see [`IoError::is_unreadable`]) if it is not a supported image.
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<ImageData> {
    let path = path.as_ref();
    let format = Format::detect(path)?;
    trace!(path = %path.display(), ?format, "read");

    let mut image = match format {
        #[cfg(feature = "png")]
        Format::Png => png::read(path)?,

        #[cfg(feature = "jpeg")]
        Format::Jpeg => jpeg::read(path)?,

        #[allow(unreachable_patterns)]
        _ => return Err(unsupported(path)),
    };
    image.metadata.source = Some(path.display().to_string());
    Ok(image)
}

/// Writes an image to a file, detecting format from extension.
pub fn write<P: AsRef<Path>>(path: P, image: &ImageData) -> IoResult<()> {
    write_with_quality(path, image, DEFAULT_JPEG_QUALITY)
}

/// Writes an image, using `jpeg_quality` if the extension selects JPEG.
pub fn write_with_quality<P: AsRef<Path>>(path: P, image: &ImageData, jpeg_quality: u8) -> IoResult<()> {
    let path = path.as_ref();
    let format = Format::from_extension(path);
    trace!(path = %path.display(), ?format, jpeg_quality, "write");

    match format {
        #[cfg(feature = "png")]
        Format::Png => png::write(path, image),

        #[cfg(feature = "jpeg")]
        Format::Jpeg => jpeg::JpegWriter::with_options(jpeg::JpegWriterOptions {
            quality: jpeg_quality,
        })
        .write(path, image),

        #[allow(unreachable_patterns)]
        _ => Err(unsupported(path)),
    }
}

/// Decodes the file fully and discards the pixels.
///
/// Used to weed out truncated or mislabeled files before a batch starts.
pub fn verify<P: AsRef<Path>>(path: P) -> IoResult<()> {
    read(path).map(|_| ())
}

fn unsupported(path: &Path) -> IoError {
    IoError::UnsupportedFormat(
        path.extension()
            .and_then(|e| e.to_str())
            .unwrap_or("unknown")
            .to_string(),
    )
}

/// Image data container for I/O operations.
///
/// Pixel samples are stored interleaved, row-major.
#[derive(Debug, Clone)]
pub struct ImageData {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Number of channels (1 grey, 2 grey+alpha, 3 RGB, 4 RGBA).
    pub channels: u32,
    /// Pixel data format.
    pub format: PixelFormat,
    /// Raw pixel data.
    pub data: PixelData,
    /// Optional metadata.
    pub metadata: Metadata,
}

/// Pixel data format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 8-bit unsigned integer per channel.
    U8,
    /// 16-bit unsigned integer per channel.
    U16,
    /// 32-bit float per channel.
    F32,
}

/// Raw pixel data storage.
#[derive(Debug, Clone)]
pub enum PixelData {
    /// 8-bit unsigned data.
    U8(Vec<u8>),
    /// 16-bit unsigned data.
    U16(Vec<u16>),
    /// 32-bit float data.
    F32(Vec<f32>),
}

/// Image metadata.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    /// Color space name.
    pub colorspace: Option<String>,
    /// Path the image was read from, if any.
    pub source: Option<String>,
}

impl ImageData {
    /// Creates ImageData from f32 pixel data.
    pub fn from_f32(width: u32, height: u32, channels: u32, data: Vec<f32>) -> Self {
        Self {
            width,
            height,
            channels,
            format: PixelFormat::F32,
            data: PixelData::F32(data),
            metadata: Metadata::default(),
        }
    }

    /// Creates ImageData from u8 pixel data.
    pub fn from_u8(width: u32, height: u32, channels: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            channels,
            format: PixelFormat::U8,
            data: PixelData::U8(data),
            metadata: Metadata::default(),
        }
    }

    /// Returns the total number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Returns the total number of samples (pixels * channels).
    pub fn sample_count(&self) -> usize {
        self.pixel_count() * self.channels as usize
    }

    /// Converts pixel data to f32 in [0, 1] (for processing).
    pub fn to_f32(&self) -> Vec<f32> {
        match &self.data {
            PixelData::U8(data) => data.iter().map(|&v| v as f32 / 255.0).collect(),
            PixelData::U16(data) => data.iter().map(|&v| v as f32 / 65535.0).collect(),
            PixelData::F32(data) => data.clone(),
        }
    }

    /// Converts pixel data to u8 (for saving).
    ///
    /// Floats are clamped to [0, 1] and rounded to the nearest level, so a
    /// value that came from an 8-bit sample maps back to the same byte.
    pub fn to_u8(&self) -> Vec<u8> {
        match &self.data {
            PixelData::U8(data) => data.clone(),
            PixelData::U16(data) => data.iter().map(|&v| (v >> 8) as u8).collect(),
            PixelData::F32(data) => data
                .iter()
                .map(|&v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
                .collect(),
        }
    }

    /// Returns interleaved RGB samples in [0, 1].
    ///
    /// Grey is replicated into all three channels and alpha is dropped.
    pub fn to_rgb_f32(&self) -> IoResult<Vec<f32>> {
        let samples = self.to_f32();
        if samples.len() != self.sample_count() {
            return Err(IoError::DimensionMismatch {
                expected: format!("{} samples", self.sample_count()),
                actual: format!("{} samples", samples.len()),
            });
        }

        let c = self.channels as usize;
        let rgb = match c {
            3 => samples,
            4 => samples.chunks(4).flat_map(|px| [px[0], px[1], px[2]]).collect(),
            1 => samples.iter().flat_map(|&g| [g, g, g]).collect(),
            2 => samples.chunks(2).flat_map(|px| [px[0], px[0], px[0]]).collect(),
            n => {
                return Err(IoError::UnsupportedFormat(format!("{} channels", n)));
            }
        };
        Ok(rgb)
    }
}
