use crate::device_display::interface::DeviceDisplay;
use crate::image_classifier::interface::Prediction;
use std::error::Error;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Default, Clone)]
struct GuiState {
    status: String,
    frame_id: Option<u64>,
    predictions: Vec<Prediction>,
}

fn lock(state: &Mutex<GuiState>) -> MutexGuard<'_, GuiState> {
    match state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// The egui side. Must be run on the main thread with `run`.
pub struct PredictionWindow {
    state: Arc<Mutex<GuiState>>,
    refresh: Duration,
}

impl eframe::App for PredictionWindow {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let state = lock(&self.state).clone();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Webcam classifier");
            ui.add_space(8.0);
            ui.label(egui::RichText::new(&state.status).monospace());
            if let Some(frame_id) = state.frame_id {
                ui.label(
                    egui::RichText::new(format!("frame #{}", frame_id))
                        .small()
                        .color(egui::Color32::GRAY),
                );
            }
            ui.separator();

            for prediction in &state.predictions {
                let probability = prediction.probability.clamp(0.0, 1.0);
                ui.horizontal(|ui| {
                    ui.add_sized(
                        [180.0, 20.0],
                        egui::Label::new(egui::RichText::new(&prediction.label).strong()),
                    );
                    ui.add(
                        egui::ProgressBar::new(probability)
                            .desired_width(200.0)
                            .text(format!("{:.1}%", probability * 100.0)),
                    );
                });
            }
        });

        ctx.request_repaint_after(self.refresh);
    }
}

impl PredictionWindow {
    /// Blocks until the window is closed.
    pub fn run(self, title: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        let options = eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size([440.0, 280.0])
                .with_resizable(true),
            ..Default::default()
        };

        eframe::run_native(title, options, Box::new(|_cc| Box::new(self)))
            .map_err(|e| format!("GUI failed: {}", e))?;
        Ok(())
    }
}

pub struct DeviceDisplayGui {
    state: Arc<Mutex<GuiState>>,
}

impl DeviceDisplayGui {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(GuiState::default())),
        }
    }

    pub fn window(&self, refresh: Duration) -> PredictionWindow {
        PredictionWindow {
            state: self.state.clone(),
            refresh,
        }
    }
}

impl DeviceDisplay for DeviceDisplayGui {
    fn show_status(&mut self, status: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        lock(&self.state).status = status.to_string();
        Ok(())
    }

    fn show_predictions(
        &mut self,
        frame_id: u64,
        predictions: &[Prediction],
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut state = lock(&self.state);
        state.frame_id = Some(frame_id);
        state.predictions = predictions.to_vec();
        Ok(())
    }
}
