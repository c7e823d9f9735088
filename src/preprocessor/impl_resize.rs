use crate::frame::Frame;
use crate::preprocessor::interface::Preprocessor;
use crate::preprocessor::tensor::Tensor;
use image::{imageops, DynamicImage, RgbImage};

/// Bilinear resize to the model input, then map `[0, 255]` onto `[-1, 1]`.
pub struct PreprocessorResize {
    width: u32,
    height: u32,
}

impl PreprocessorResize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

pub fn resize_frame(frame: &Frame, width: u32, height: u32) -> Result<RgbImage, String> {
    let rgb = RgbImage::from_raw(frame.width(), frame.height(), frame.pixels().to_vec())
        .ok_or_else(|| format!("frame {} has a malformed pixel buffer", frame.id()))?;

    if rgb.width() == width && rgb.height() == height {
        return Ok(rgb);
    }

    Ok(DynamicImage::ImageRgb8(rgb)
        .resize_exact(width, height, imageops::FilterType::Triangle)
        .to_rgb8())
}

pub fn normalize(value: u8) -> f32 {
    value as f32 / 127.5 - 1.0
}

impl Preprocessor for PreprocessorResize {
    fn preprocess(
        &self,
        frame: &Frame,
    ) -> Result<Tensor, Box<dyn std::error::Error + Send + Sync>> {
        let resized = resize_frame(frame, self.width, self.height)?;

        // RgbImage is already row-major HWC, which is exactly NHWC for batch 1.
        let data: Vec<f32> = resized.as_raw().iter().copied().map(normalize).collect();

        Tensor::from_nhwc(self.height as usize, self.width as usize, data)
    }
}
