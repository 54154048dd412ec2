use super::PixelSource;
use crate::foundation::error::{TexviewError, TexviewResult};

/// Raw RGBA8 pixel buffer source; resolved from the moment it is built.
#[derive(Debug, Clone)]
pub struct BufferSource {
    width: u32,
    height: u32,
    bytes: Vec<u8>,
}

impl BufferSource {
    /// Wrap a tightly packed RGBA8 buffer of `width * height` pixels.
    pub fn new(bytes: Vec<u8>, width: u32, height: u32) -> TexviewResult<Self> {
        let expected = width as usize * height as usize * 4;
        if bytes.len() != expected {
            return Err(TexviewError::configuration(format!(
                "buffer length {} does not match {width}x{height} rgba8 ({expected} bytes)",
                bytes.len()
            )));
        }
        Ok(Self {
            width,
            height,
            bytes,
        })
    }

    /// Build a solid-color buffer.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let px = width as usize * height as usize;
        let mut bytes = Vec::with_capacity(px * 4);
        for _ in 0..px {
            bytes.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            bytes,
        }
    }

    /// Borrow the underlying bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl PixelSource for BufferSource {
    fn dimensions(&self) -> Option<(u32, u32)> {
        Some((self.width, self.height))
    }
}
