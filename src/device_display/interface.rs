use crate::image_classifier::interface::Prediction;
use std::error::Error;

/// Where ranked results and status text end up.
pub trait DeviceDisplay: Send + Sync {
    /// Replace the status line ("Loading model...", "Predicting...", timings, errors).
    fn show_status(&mut self, status: &str) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Replace the prediction list with the ranked result for `frame_id`.
    fn show_predictions(
        &mut self,
        frame_id: u64,
        predictions: &[Prediction],
    ) -> Result<(), Box<dyn Error + Send + Sync>>;
}
