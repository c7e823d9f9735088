use crate::frame::Frame;
use crate::preprocessor::interface::Preprocessor;
use crate::preprocessor::tensor::Tensor;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};

#[derive(Default)]
struct Shared {
    calls: AtomicUsize,
    issued_tensors: Mutex<Vec<Weak<[f32]>>>,
}

/// Emits zero tensors. Calls listed in `fail_on` (1-based) return an error.
/// Clones share call counts and tensor tracking.
#[derive(Clone)]
pub struct PreprocessorFake {
    width: u32,
    height: u32,
    fail_on: HashSet<usize>,
    shared: Arc<Shared>,
}

impl PreprocessorFake {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            fail_on: HashSet::new(),
            shared: Arc::new(Shared::default()),
        }
    }

    pub fn failing_on(mut self, calls: impl IntoIterator<Item = usize>) -> Self {
        self.fail_on.extend(calls);
        self
    }

    pub fn calls(&self) -> usize {
        self.shared.calls.load(Ordering::SeqCst)
    }

    /// Tensors handed out that are still referenced somewhere.
    pub fn live_tensors(&self) -> usize {
        self.shared
            .issued_tensors
            .lock()
            .map(|tensors| tensors.iter().filter(|t| t.strong_count() > 0).count())
            .unwrap_or(0)
    }
}

impl Preprocessor for PreprocessorFake {
    fn preprocess(
        &self,
        frame: &Frame,
    ) -> Result<Tensor, Box<dyn std::error::Error + Send + Sync>> {
        let call = self.shared.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on.contains(&call) {
            return Err(format!("corrupt frame {}", frame.id()).into());
        }
        let tensor = Tensor::zeros(self.height as usize, self.width as usize);
        if let Ok(mut tensors) = self.shared.issued_tensors.lock() {
            tensors.retain(|t| t.strong_count() > 0);
            tensors.push(Arc::downgrade(tensor.buffer()));
        }
        Ok(tensor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_tensors_follow_drops() {
        let preprocessor = PreprocessorFake::new(2, 2);
        let frame = Frame::new(1, 1, 1, vec![0, 0, 0]).unwrap();

        let tensor = preprocessor.preprocess(&frame).unwrap();
        let handle = preprocessor.clone();
        assert_eq!(handle.live_tensors(), 1);
        assert_eq!(handle.calls(), 1);

        drop(tensor);
        assert_eq!(handle.live_tensors(), 0);
    }
}
