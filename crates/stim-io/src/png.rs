//! PNG format support.
//!
//! Lossless output is what the verification tooling relies on: a PNG of a
//! scrambled stimulus keeps the exact 8-bit values, so histogram checks can
//! run on files instead of in-memory buffers.

use crate::{ImageData, IoError, IoResult, Metadata, PixelData, PixelFormat};
use std::io::{BufRead, BufReader, Cursor, Seek, Write};
use std::path::Path;

/// Reads a PNG file from the given path.
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<ImageData> {
    let data = std::fs::read(path.as_ref())?;
    read_from_memory(&data)
}

/// Reads a PNG from a byte slice.
pub fn read_from_memory(data: &[u8]) -> IoResult<ImageData> {
    decode(BufReader::new(Cursor::new(data)))
}

fn decode<R: BufRead + Seek>(input: R) -> IoResult<ImageData> {
    let decoder = png::Decoder::new(input);
    let mut reader = decoder
        .read_info()
        .map_err(|e: png::DecodingError| IoError::DecodeError(e.to_string()))?;

    let buf_size = reader
        .output_buffer_size()
        .ok_or_else(|| IoError::DecodeError("cannot determine output buffer size".into()))?;
    let mut buf = vec![0u8; buf_size];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e: png::DecodingError| IoError::DecodeError(e.to_string()))?;
    let bytes = &buf[..info.buffer_size()];

    let (channels, format, data) = match (info.color_type, info.bit_depth) {
        (png::ColorType::Rgb, png::BitDepth::Eight) => (3, PixelFormat::U8, PixelData::U8(bytes.to_vec())),
        (png::ColorType::Rgba, png::BitDepth::Eight) => (4, PixelFormat::U8, PixelData::U8(bytes.to_vec())),
        (png::ColorType::Grayscale, png::BitDepth::Eight) => {
            (1, PixelFormat::U8, PixelData::U8(bytes.to_vec()))
        }
        (png::ColorType::GrayscaleAlpha, png::BitDepth::Eight) => {
            (2, PixelFormat::U8, PixelData::U8(bytes.to_vec()))
        }
        (png::ColorType::Rgb, png::BitDepth::Sixteen) => {
            (3, PixelFormat::U16, PixelData::U16(bytes_to_u16(bytes)))
        }
        (png::ColorType::Rgba, png::BitDepth::Sixteen) => {
            (4, PixelFormat::U16, PixelData::U16(bytes_to_u16(bytes)))
        }
        (color_type, bit_depth) => {
            return Err(IoError::UnsupportedBitDepth(format!(
                "{:?} {:?}",
                color_type, bit_depth
            )));
        }
    };

    let metadata = Metadata {
        colorspace: Some("sRGB".to_string()),
        ..Default::default()
    };

    Ok(ImageData {
        width: info.width,
        height: info.height,
        channels,
        format,
        data,
        metadata,
    })
}

/// Writes an image to a PNG file as 8-bit samples.
pub fn write<P: AsRef<Path>>(path: P, image: &ImageData) -> IoResult<()> {
    let bytes = write_to_memory(image)?;
    std::fs::write(path.as_ref(), bytes)?;
    Ok(())
}

/// Encodes an image into PNG bytes.
pub fn write_to_memory(image: &ImageData) -> IoResult<Vec<u8>> {
    let mut out = Vec::new();
    encode(&mut out, image)?;
    Ok(out)
}

fn encode<W: Write>(writer: W, image: &ImageData) -> IoResult<()> {
    let color_type = match image.channels {
        1 => png::ColorType::Grayscale,
        2 => png::ColorType::GrayscaleAlpha,
        3 => png::ColorType::Rgb,
        4 => png::ColorType::Rgba,
        n => return Err(IoError::EncodeError(format!("unsupported channel count: {}", n))),
    };

    let mut encoder = png::Encoder::new(writer, image.width, image.height);
    encoder.set_color(color_type);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(png::Compression::default());
    encoder.set_source_srgb(png::SrgbRenderingIntent::Perceptual);

    let mut png_writer = encoder
        .write_header()
        .map_err(|e| IoError::EncodeError(e.to_string()))?;

    png_writer
        .write_image_data(&image.to_u8())
        .map_err(|e| IoError::EncodeError(e.to_string()))?;
    png_writer
        .finish()
        .map_err(|e| IoError::EncodeError(e.to_string()))?;

    Ok(())
}

/// Converts big-endian byte slice to u16 vector.
fn bytes_to_u16(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks(2)
        .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
        .collect()
}
