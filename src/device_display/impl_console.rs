use crate::device_display::interface::DeviceDisplay;
use crate::image_classifier::interface::Prediction;
use std::error::Error;
use std::time::{Duration, Instant};

const WIDTH: usize = 44;
const LABEL_WIDTH: usize = 20;
const BAR_WIDTH: usize = 14;

/// Prints a box to stdout. Redraws are throttled to `min_interval` so a
/// 60 Hz loop does not flood the terminal. Error and stop statuses are
/// always drawn, since nothing follows them.
pub struct DeviceDisplayConsole {
    status: String,
    frame_id: Option<u64>,
    lines: Vec<String>,
    min_interval: Duration,
    last_render: Option<Instant>,
    drawn_status: Option<String>,
}

impl DeviceDisplayConsole {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            status: String::new(),
            frame_id: None,
            lines: Vec::new(),
            min_interval,
            last_render: None,
            drawn_status: None,
        }
    }

    fn render_display(&mut self, force: bool) {
        let now = Instant::now();
        if let Some(last) = self.last_render {
            if !force && now.duration_since(last) < self.min_interval {
                return;
            }
        }
        self.last_render = Some(now);
        self.drawn_status = Some(self.status.clone());

        println!("┌{}┐", "─".repeat(WIDTH));
        println!("│{}│", fit(&self.status, WIDTH));
        if let Some(frame_id) = self.frame_id {
            println!("│{}│", fit(&format!("frame #{}", frame_id), WIDTH));
        }
        for line in &self.lines {
            println!("│{}│", fit(line, WIDTH));
        }
        println!("└{}┘", "─".repeat(WIDTH));
    }
}

/// `label        ######-------  87.3%`
pub fn format_prediction(prediction: &Prediction) -> String {
    let probability = prediction.probability.clamp(0.0, 1.0);
    let filled = (probability * BAR_WIDTH as f32).round() as usize;
    format!(
        "{} {}{} {:>5.1}%",
        fit(&prediction.label, LABEL_WIDTH),
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        probability * 100.0
    )
}

fn is_final_status(status: &str) -> bool {
    status.starts_with("Error:") || status == "Stopped"
}

/// Pads or truncates to exactly `width` characters.
fn fit(text: &str, width: usize) -> String {
    let truncated: String = text.chars().take(width).collect();
    format!("{:<width$}", truncated, width = width)
}

impl DeviceDisplay for DeviceDisplayConsole {
    fn show_status(&mut self, status: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.status = status.to_string();
        self.render_display(is_final_status(status));
        Ok(())
    }

    fn show_predictions(
        &mut self,
        frame_id: u64,
        predictions: &[Prediction],
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.frame_id = Some(frame_id);
        self.lines = predictions.iter().map(format_prediction).collect();
        self.render_display(false);
        Ok(())
    }
}
