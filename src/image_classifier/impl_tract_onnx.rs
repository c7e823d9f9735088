use crate::image_classifier::interface::{softmax, ImageClassifier, ScoreVector};
use crate::library::logger::interface::Logger;
use crate::preprocessor::tensor::Tensor;
use std::sync::Arc;
use tract_onnx::prelude::*;

#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub onnx_model_path: String,
    /// `(height, width)`
    pub input_shape: (u32, u32),
    /// Set for models that emit logits rather than probabilities.
    pub apply_softmax: bool,
}

/// ONNX classifier taking NHWC input, e.g. MobileNet exported from TF.
pub struct ImageClassifierTractOnnx {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>, TypedModel>,
    config: ModelConfig,
    logger: Arc<dyn Logger + Send + Sync>,
}

impl ImageClassifierTractOnnx {
    pub fn new(
        config: ModelConfig,
        logger: Arc<dyn Logger + Send + Sync>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let logger = logger
            .with_namespace("image_classifier")
            .with_namespace("tract_onnx");
        logger.info(&format!("Loading model {}", config.onnx_model_path))?;

        let (height, width) = config.input_shape;
        let model = tract_onnx::onnx()
            .model_for_path(&config.onnx_model_path)?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, height as usize, width as usize, 3),
                ),
            )?
            .into_optimized()?
            .into_runnable()?;

        logger.info("Model loaded")?;

        Ok(Self {
            model,
            config,
            logger,
        })
    }
}

impl ImageClassifier for ImageClassifierTractOnnx {
    fn classify(
        &self,
        tensor: &Tensor,
    ) -> Result<ScoreVector, Box<dyn std::error::Error + Send + Sync>> {
        let [n, h, w, c] = tensor.shape();
        let input =
            tract_ndarray::Array4::from_shape_vec((n, h, w, c), tensor.as_slice().to_vec())?
                .into_tensor();

        let outputs = self.model.run(tvec!(input.into_tvalue()))?;
        let output = outputs
            .first()
            .ok_or("model produced no outputs")?
            .to_array_view::<f32>()?;

        // [1, N] or [N]; anything else is flattened.
        let scores: ScoreVector = output.iter().copied().collect();
        if scores.is_empty() {
            return Err("model produced an empty score vector".into());
        }

        if self.config.apply_softmax {
            Ok(softmax(&scores))
        } else {
            Ok(scores)
        }
    }

    fn input_size(&self) -> (u32, u32) {
        self.config.input_shape
    }

    fn warmup(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let (height, width) = self.config.input_shape;
        self.classify(&Tensor::zeros(height as usize, width as usize))?;
        self.logger.info("Warmup done")?;
        Ok(())
    }
}
