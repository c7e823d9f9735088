use crate::preprocessor::tensor::Tensor;

/// Raw per-class scores, index-aligned with `ClassLabels`.
pub type ScoreVector = Vec<f32>;

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub probability: f32,
}

/// Top-K predictions, highest probability first.
pub type RankedResult = Vec<Prediction>;

pub trait ImageClassifier: Send + Sync {
    fn classify(
        &self,
        tensor: &Tensor,
    ) -> Result<ScoreVector, Box<dyn std::error::Error + Send + Sync>>;

    /// Input shape `(height, width)` the model expects.
    fn input_size(&self) -> (u32, u32);

    /// One throwaway inference so the first real frame does not pay for
    /// lazy initialization.
    fn warmup(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let (height, width) = self.input_size();
        let tensor = Tensor::zeros(height as usize, width as usize);
        self.classify(&tensor)?;
        Ok(())
    }
}

/// Converts logits into a probability distribution.
pub fn softmax(scores: &[f32]) -> ScoreVector {
    let max = scores
        .iter()
        .copied()
        .filter(|s| !s.is_nan())
        .fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f32 = exps.iter().filter(|e| !e.is_nan()).sum();
    if sum == 0.0 || !sum.is_finite() {
        return exps;
    }
    exps.into_iter().map(|e| e / sum).collect()
}
