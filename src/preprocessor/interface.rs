use crate::frame::Frame;
use crate::preprocessor::tensor::Tensor;

pub trait Preprocessor: Send + Sync {
    fn preprocess(&self, frame: &Frame)
        -> Result<Tensor, Box<dyn std::error::Error + Send + Sync>>;
}
