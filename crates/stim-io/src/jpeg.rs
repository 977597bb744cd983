//! JPEG format support.
//!
//! Stimulus photographs are almost always JPEG. Decoding goes through
//! `jpeg-decoder`, encoding through `jpeg-encoder`.
//!
//! # Example
//!
//! ```rust,ignore
//! use stim_io::jpeg::{JpegWriter, JpegWriterOptions};
//!
//! let image = stim_io::jpeg::read("face_1.jpg")?;
//! let writer = JpegWriter::with_options(JpegWriterOptions { quality: 95 });
//! writer.write("scrambled_face_1.jpg", &image)?;
//! ```

use crate::{ImageData, IoError, IoResult, Metadata, PixelData, PixelFormat};
use std::io::{BufReader, Cursor};
use std::path::Path;

/// Options for writing JPEG files.
#[derive(Debug, Clone)]
pub struct JpegWriterOptions {
    /// Quality level 1-100. Higher = better quality, larger files.
    pub quality: u8,
}

impl Default for JpegWriterOptions {
    fn default() -> Self {
        Self {
            quality: crate::DEFAULT_JPEG_QUALITY,
        }
    }
}

/// JPEG file reader.
///
/// Grayscale, CMYK and 16-bit grayscale inputs are converted to 8-bit RGB.
#[derive(Debug, Clone, Default)]
pub struct JpegReader;

impl JpegReader {
    /// Creates a new reader.
    pub fn new() -> Self {
        Self
    }

    /// Reads a JPEG file from disk.
    pub fn read<P: AsRef<Path>>(&self, path: P) -> IoResult<ImageData> {
        let data = std::fs::read(path.as_ref())?;
        self.read_from_memory(&data)
    }

    /// Reads a JPEG from a byte slice.
    pub fn read_from_memory(&self, data: &[u8]) -> IoResult<ImageData> {
        let mut decoder = jpeg_decoder::Decoder::new(BufReader::new(Cursor::new(data)));
        let pixels = decoder
            .decode()
            .map_err(|e| IoError::DecodeError(e.to_string()))?;

        let info = decoder
            .info()
            .ok_or_else(|| IoError::DecodeError("missing JPEG info".into()))?;

        let expected = info.width as usize * info.height as usize;
        let rgb: Vec<u8> = match info.pixel_format {
            jpeg_decoder::PixelFormat::RGB24 => pixels,
            jpeg_decoder::PixelFormat::L8 => pixels.iter().flat_map(|&g| [g, g, g]).collect(),
            jpeg_decoder::PixelFormat::CMYK32 => pixels
                .chunks(4)
                .flat_map(|cmyk| {
                    let k = 1.0 - cmyk[3] as f32 / 255.0;
                    let conv = |v: u8| ((1.0 - v as f32 / 255.0) * k * 255.0).round() as u8;
                    [conv(cmyk[0]), conv(cmyk[1]), conv(cmyk[2])]
                })
                .collect(),
            // 16-bit grayscale: keep the high byte
            jpeg_decoder::PixelFormat::L16 => pixels
                .chunks(2)
                .flat_map(|l16| [l16[0], l16[0], l16[0]])
                .collect(),
        };

        if rgb.len() != expected * 3 {
            return Err(IoError::DimensionMismatch {
                expected: format!("{} samples", expected * 3),
                actual: format!("{} samples", rgb.len()),
            });
        }

        let metadata = Metadata {
            colorspace: Some("sRGB".to_string()),
            ..Default::default()
        };

        Ok(ImageData {
            width: info.width as u32,
            height: info.height as u32,
            channels: 3,
            format: PixelFormat::U8,
            data: PixelData::U8(rgb),
            metadata,
        })
    }
}

/// JPEG file writer.
#[derive(Debug, Clone, Default)]
pub struct JpegWriter {
    options: JpegWriterOptions,
}

impl JpegWriter {
    /// Creates a new writer with default options (quality 95).
    pub fn new() -> Self {
        Self::with_options(JpegWriterOptions::default())
    }

    /// Creates writer with custom options.
    pub fn with_options(options: JpegWriterOptions) -> Self {
        Self { options }
    }

    /// Writes a JPEG file to disk.
    pub fn write<P: AsRef<Path>>(&self, path: P, image: &ImageData) -> IoResult<()> {
        let data = self.write_to_memory(image)?;
        std::fs::write(path.as_ref(), data)?;
        Ok(())
    }

    /// Encodes a JPEG into a byte vector.
    pub fn write_to_memory(&self, image: &ImageData) -> IoResult<Vec<u8>> {
        use jpeg_encoder::{ColorType, Encoder};

        let u8_data = image.to_u8();
        let rgb: Vec<u8> = match image.channels {
            3 => u8_data,
            4 => u8_data
                .chunks(4)
                .flat_map(|rgba| [rgba[0], rgba[1], rgba[2]])
                .collect(),
            1 => u8_data.iter().flat_map(|&g| [g, g, g]).collect(),
            n => {
                return Err(IoError::EncodeError(format!(
                    "unsupported channel count: {}",
                    n
                )));
            }
        };

        let (width, height) = match (u16::try_from(image.width), u16::try_from(image.height)) {
            (Ok(w), Ok(h)) => (w, h),
            _ => {
                return Err(IoError::EncodeError(format!(
                    "{}x{} exceeds the JPEG size limit",
                    image.width, image.height
                )));
            }
        };

        let mut buffer = Vec::new();
        let encoder = Encoder::new(&mut buffer, self.options.quality);
        encoder
            .encode(&rgb, width, height, ColorType::Rgb)
            .map_err(|e: jpeg_encoder::EncodingError| IoError::EncodeError(e.to_string()))?;

        Ok(buffer)
    }
}

/// Reads a JPEG file.
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<ImageData> {
    JpegReader::new().read(path)
}

/// Writes a JPEG file with the default quality.
pub fn write<P: AsRef<Path>>(path: P, image: &ImageData) -> IoResult<()> {
    JpegWriter::new().write(path, image)
}
