use crate::device_camera::constraints::FacingMode;
use chrono::Offset;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum CameraKind {
    /// Synthetic gradient frames at the given native resolution.
    Fake {
        native_width: u32,
        native_height: u32,
    },
    /// Needs the `v4l2` feature.
    #[allow(dead_code)]
    V4l2 { device_path: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClassifierKind {
    Fake {
        labels: Vec<String>,
    },
    /// Needs the `tract` feature.
    #[allow(dead_code)]
    TractOnnx {
        model_path: String,
        labels_path: String,
        apply_softmax: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayKind {
    Console,
    #[allow(dead_code)]
    Gui,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub top_k: usize,
    /// Kept on every fallback attempt; only the size is relaxed.
    pub facing: FacingMode,
    pub preferred_width: u32,
    pub preferred_height: u32,
    /// `(height, width)` the classifier is fed.
    pub model_input_size: (u32, u32),
    pub refresh_hz: u32,
    /// Consecutive skipped frames before the loop gives up.
    pub max_consecutive_failures: u32,
    pub console_render_interval: Duration,
    pub logger_timezone: chrono::FixedOffset,
    pub camera: CameraKind,
    pub classifier: ClassifierKind,
    pub display: DisplayKind,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            top_k: 3,
            facing: FacingMode::User,
            preferred_width: 640,
            preferred_height: 480,
            model_input_size: (224, 224),
            refresh_hz: 60,
            max_consecutive_failures: 10,
            console_render_interval: Duration::from_millis(500),
            logger_timezone: mountain_standard_time(),
            camera: CameraKind::Fake {
                native_width: 640,
                native_height: 480,
            },
            classifier: ClassifierKind::Fake {
                labels: demo_labels(),
            },
            display: DisplayKind::Console,
        }
    }
}

impl Config {
    pub fn refresh_period(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / self.refresh_hz.max(1) as u64)
    }
}

fn demo_labels() -> Vec<String> {
    [
        "dog", "cat", "person", "car", "chair", "table", "bird", "tree", "bicycle", "book",
        "laptop", "phone", "cup", "bottle", "keyboard", "mouse", "plant", "clock",
    ]
    .iter()
    .map(|label| label.to_string())
    .collect()
}

fn mountain_standard_time() -> chrono::FixedOffset {
    chrono::FixedOffset::west_opt(7 * 3600).unwrap_or_else(|| chrono::Utc.fix())
}
