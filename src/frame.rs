use std::sync::Arc;

/// One RGB8 still captured from a stream. The pixel buffer is shared and
/// never mutated after capture.
#[derive(Debug, Clone)]
pub struct Frame {
    id: u64,
    width: u32,
    height: u32,
    pixels: Arc<[u8]>,
}

impl Frame {
    pub const CHANNELS: usize = 3;

    pub fn new(
        id: u64,
        width: u32,
        height: u32,
        pixels: impl Into<Arc<[u8]>>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let pixels = pixels.into();
        let expected = width as usize * height as usize * Self::CHANNELS;
        if width == 0 || height == 0 {
            return Err(format!("frame has empty dimensions {}x{}", width, height).into());
        }
        if pixels.len() != expected {
            return Err(format!(
                "frame {}x{} needs {} bytes, got {}",
                width,
                height,
                expected,
                pixels.len()
            )
            .into());
        }
        Ok(Self {
            id,
            width,
            height,
            pixels,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Shared handle to the pixel buffer, for callers that need to observe
    /// when the last frame referencing it is gone.
    pub fn pixel_buffer(&self) -> &Arc<[u8]> {
        &self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_validates_buffer_length() {
        assert!(Frame::new(0, 2, 2, vec![0u8; 12]).is_ok());
        assert!(Frame::new(0, 2, 2, vec![0u8; 11]).is_err());
        assert!(Frame::new(0, 0, 2, Vec::<u8>::new()).is_err());
    }

    #[test]
    fn test_accessors() {
        let frame = Frame::new(7, 1, 2, vec![1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(frame.id(), 7);
        assert_eq!(frame.width(), 1);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.pixels(), &[1, 2, 3, 4, 5, 6]);
    }
}
