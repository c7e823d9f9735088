use std::sync::Arc;

/// Dense `f32` tensor in NHWC layout with a batch of one.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: [usize; 4],
    data: Arc<[f32]>,
}

impl Tensor {
    pub const CHANNELS: usize = 3;

    pub fn zeros(height: usize, width: usize) -> Self {
        Self {
            shape: [1, height, width, Self::CHANNELS],
            data: vec![0.0; height * width * Self::CHANNELS].into(),
        }
    }

    pub fn from_nhwc(
        height: usize,
        width: usize,
        data: Vec<f32>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let expected = height * width * Self::CHANNELS;
        if data.len() != expected {
            return Err(format!(
                "tensor (1, {}, {}, 3) needs {} values, got {}",
                height,
                width,
                expected,
                data.len()
            )
            .into());
        }
        Ok(Self {
            shape: [1, height, width, Self::CHANNELS],
            data: data.into(),
        })
    }

    pub fn shape(&self) -> [usize; 4] {
        self.shape
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[allow(dead_code)]
    pub fn buffer(&self) -> &Arc<[f32]> {
        &self.data
    }
}
