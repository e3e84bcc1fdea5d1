//! Pixel buffer codec.
//!
//! Canvases are stored as zlib-compressed RGBA bytes, four bytes per pixel,
//! row-major. A trailing partial pixel is ignored on decode.

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

#[derive(Debug, Error)]
pub enum PixelCodecError {
    #[error("compress failed: {0}")]
    Compress(std::io::Error),
    #[error("decompress failed: {0}")]
    Decompress(std::io::Error),
}

pub trait PixelCodec: Send + Sync {
    fn compress(&self, pixels: &[Pixel]) -> Result<Vec<u8>, PixelCodecError>;
    fn decompress(&self, raw: &[u8]) -> Result<Vec<Pixel>, PixelCodecError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ZlibPixelCodec;

impl ZlibPixelCodec {
    pub fn new() -> Self {
        Self
    }

    /// Compressed, fully transparent canvas of the given size.
    pub fn blank(&self, width: u16, height: u16) -> Result<Vec<u8>, PixelCodecError> {
        let pixels = vec![Pixel::default(); usize::from(width) * usize::from(height)];
        self.compress(&pixels)
    }
}

impl PixelCodec for ZlibPixelCodec {
    fn compress(&self, pixels: &[Pixel]) -> Result<Vec<u8>, PixelCodecError> {
        let mut raw = Vec::with_capacity(pixels.len() * 4);
        for p in pixels {
            raw.extend_from_slice(&[p.r, p.g, p.b, p.a]);
        }

        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(&raw).map_err(PixelCodecError::Compress)?;
        enc.finish().map_err(PixelCodecError::Compress)
    }

    fn decompress(&self, raw: &[u8]) -> Result<Vec<Pixel>, PixelCodecError> {
        let mut bytes = Vec::new();
        ZlibDecoder::new(raw)
            .read_to_end(&mut bytes)
            .map_err(PixelCodecError::Decompress)?;

        Ok(bytes
            .chunks_exact(4)
            .map(|c| Pixel { r: c[0], g: c[1], b: c[2], a: c[3] })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_canvas_decodes_to_transparent_pixels() {
        let codec = ZlibPixelCodec::new();
        let raw = codec.blank(3, 2).unwrap();
        let pixels = codec.decompress(&raw).unwrap();
        assert_eq!(pixels.len(), 6);
        assert!(pixels.iter().all(|p| *p == Pixel::default()));
    }

    #[test]
    fn keeps_channel_order() {
        let codec = ZlibPixelCodec::new();
        let red = Pixel { r: 255, g: 1, b: 2, a: 128 };
        let raw = codec.compress(&[red, Pixel::default()]).unwrap();
        assert_eq!(codec.decompress(&raw).unwrap(), vec![red, Pixel::default()]);
    }

    #[test]
    fn garbage_is_an_error() {
        let codec = ZlibPixelCodec::new();
        assert!(codec.decompress(b"definitely not zlib").is_err());
    }
}
