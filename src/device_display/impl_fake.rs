use crate::device_display::interface::DeviceDisplay;
use crate::image_classifier::interface::Prediction;
use std::error::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum DisplayCall {
    Status(String),
    Predictions {
        frame_id: u64,
        predictions: Vec<Prediction>,
    },
}

type PredictionsHook = Box<dyn FnMut(u64) + Send + Sync>;

/// Records everything it is asked to show.
#[derive(Default)]
pub struct DeviceDisplayFake {
    calls: Vec<DisplayCall>,
    on_predictions: Option<PredictionsHook>,
}

impl DeviceDisplayFake {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs inside `show_predictions`, with the frame id being shown.
    pub fn on_predictions(mut self, hook: impl FnMut(u64) + Send + Sync + 'static) -> Self {
        self.on_predictions = Some(Box::new(hook));
        self
    }

    pub fn calls(&self) -> &[DisplayCall] {
        &self.calls
    }

    pub fn delivered_frames(&self) -> Vec<u64> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DisplayCall::Predictions { frame_id, .. } => Some(*frame_id),
                DisplayCall::Status(_) => None,
            })
            .collect()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DisplayCall::Status(status) => Some(status.clone()),
                DisplayCall::Predictions { .. } => None,
            })
            .collect()
    }
}

impl DeviceDisplay for DeviceDisplayFake {
    fn show_status(&mut self, status: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.calls.push(DisplayCall::Status(status.to_string()));
        Ok(())
    }

    fn show_predictions(
        &mut self,
        frame_id: u64,
        predictions: &[Prediction],
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        if let Some(hook) = self.on_predictions.as_mut() {
            hook(frame_id);
        }
        self.calls.push(DisplayCall::Predictions {
            frame_id,
            predictions: predictions.to_vec(),
        });
        Ok(())
    }
}
