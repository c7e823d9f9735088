use crate::error::PipelineError;
use crate::image_classifier::interface::{softmax, ImageClassifier, ScoreVector};
use crate::library::logger::interface::Logger;
use crate::preprocessor::tensor::Tensor;
use rand::distr::{Distribution, Uniform};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum FakeOutcome {
    Scores(ScoreVector),
    Transient(String),
    Fatal(String),
}

type CallHook = Box<dyn Fn(usize) + Send + Sync>;

/// Stand-in model. Returns random softmaxed scores unless a call number
/// (1-based) has a scripted outcome.
pub struct ImageClassifierFake {
    logger: Arc<dyn Logger + Send + Sync>,
    num_classes: usize,
    input_size: (u32, u32),
    scripted: HashMap<usize, FakeOutcome>,
    fixed_scores: Option<ScoreVector>,
    on_call: Option<CallHook>,
    calls: AtomicUsize,
}

impl ImageClassifierFake {
    pub fn new(logger: Arc<dyn Logger + Send + Sync>, num_classes: usize) -> Self {
        Self {
            logger: logger.with_namespace("image_classifier").with_namespace("fake"),
            num_classes,
            input_size: (224, 224),
            scripted: HashMap::new(),
            fixed_scores: None,
            on_call: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_input_size(mut self, height: u32, width: u32) -> Self {
        self.input_size = (height, width);
        self
    }

    /// Every unscripted call returns these scores instead of random ones.
    #[allow(dead_code)]
    pub fn with_fixed_scores(mut self, scores: ScoreVector) -> Self {
        self.num_classes = scores.len();
        self.fixed_scores = Some(scores);
        self
    }

    #[allow(dead_code)]
    pub fn with_outcome(mut self, call: usize, outcome: FakeOutcome) -> Self {
        self.scripted.insert(call, outcome);
        self
    }

    /// Runs before each classification, with the 1-based call number.
    #[allow(dead_code)]
    pub fn on_call(mut self, hook: impl Fn(usize) + Send + Sync + 'static) -> Self {
        self.on_call = Some(Box::new(hook));
        self
    }

    #[allow(dead_code)]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn random_scores(&self) -> Result<ScoreVector, Box<dyn std::error::Error + Send + Sync>> {
        let mut rng = rand::rng();
        let logit_dist = Uniform::new(-4.0f32, 4.0f32)?;
        let logits: Vec<f32> = (0..self.num_classes)
            .map(|_| logit_dist.sample(&mut rng))
            .collect();
        Ok(softmax(&logits))
    }
}

impl ImageClassifier for ImageClassifierFake {
    fn classify(
        &self,
        tensor: &Tensor,
    ) -> Result<ScoreVector, Box<dyn std::error::Error + Send + Sync>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(hook) = &self.on_call {
            hook(call);
        }

        let [_, height, width, _] = tensor.shape();
        if (height as u32, width as u32) != self.input_size {
            return Err(format!(
                "expected input {:?}, got {}x{}",
                self.input_size, height, width
            )
            .into());
        }

        match self.scripted.get(&call) {
            Some(FakeOutcome::Scores(scores)) => Ok(scores.clone()),
            Some(FakeOutcome::Transient(message)) => {
                Err(PipelineError::TransientFrame(message.clone()).into())
            }
            Some(FakeOutcome::Fatal(message)) => {
                self.logger.error(&format!("Fatal fault: {}", message))?;
                Err(PipelineError::FatalPipeline(message.clone()).into())
            }
            None => match &self.fixed_scores {
                Some(scores) => Ok(scores.clone()),
                None => self.random_scores(),
            },
        }
    }

    fn input_size(&self) -> (u32, u32) {
        self.input_size
    }
}
