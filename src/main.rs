use capture_loop::core::LoopConfig;
use capture_loop::main::{CaptureLoop, LoopContext};
use config::{CameraKind, ClassifierKind, Config, DisplayKind};
use device_camera::impl_fake::DeviceCameraFake;
use device_camera::interface::DeviceCamera;
use device_camera::open::open_with_fallback;
use device_display::impl_console::DeviceDisplayConsole;
use device_display::impl_gui::{DeviceDisplayGui, PredictionWindow};
use device_display::interface::DeviceDisplay;
use image_classifier::class_labels::ClassLabels;
use image_classifier::impl_fake::ImageClassifierFake;
use image_classifier::interface::ImageClassifier;
use library::cancellation::CancellationToken;
use library::logger::impl_console::LoggerConsole;
use library::logger::interface::Logger;
use library::scheduler::impl_refresh_rate::FrameSchedulerRefreshRate;
use preprocessor::impl_resize::PreprocessorResize;
use std::error::Error;
use std::sync::{Arc, Mutex};

mod capture_loop;
mod config;
mod device_camera;
mod device_display;
mod error;
mod frame;
mod image_classifier;
mod library;
mod preprocessor;
mod score_ranker;

type SharedDisplay = Arc<Mutex<dyn DeviceDisplay + Send + Sync>>;

fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = Config::default();

    let logger: Arc<dyn Logger + Send + Sync> =
        Arc::new(LoggerConsole::new(config.logger_timezone));

    let (device_display, window) = build_display(&config);

    show_status(&device_display, &logger, "Loading model...");
    let (image_classifier, labels) = or_show_error(
        build_classifier(&config, logger.clone()),
        &device_display,
        &logger,
    )?;
    or_show_error(image_classifier.warmup(), &device_display, &logger)?;

    let device_camera = build_camera(&config, logger.clone());
    let opened = or_show_error(
        open_with_fallback(
            device_camera.as_ref(),
            config.facing,
            config.preferred_width,
            config.preferred_height,
            logger.clone(),
        ),
        &device_display,
        &logger,
    )?;
    logger.info(&format!(
        "Camera ready at {}x{} ({})",
        opened.metadata.width, opened.metadata.height, opened.constraints
    ))?;

    let (input_height, input_width) = image_classifier.input_size();
    let context = LoopContext {
        stream: opened.stream,
        preprocessor: Arc::new(PreprocessorResize::new(input_width, input_height)),
        classifier: image_classifier,
        labels,
        top_k: config.top_k,
    };

    let capture_loop = CaptureLoop::new(
        LoopConfig {
            max_consecutive_failures: config.max_consecutive_failures,
        },
        context,
        Arc::new(FrameSchedulerRefreshRate::new(config.refresh_hz)),
        device_display.clone(),
        logger.clone(),
    );

    let token = CancellationToken::new();
    let ctrlc_token = token.clone();
    ctrlc::set_handler(move || ctrlc_token.cancel())?;

    let handle = capture_loop.spawn(token);

    if let Some(window) = window {
        let closed = window.run("Webcam classifier");
        handle.cancel();
        if let Err(e) = closed {
            logger.error(&format!("{}", e))?;
        }
    }

    let summary = handle.join()?;
    logger.info(&format!(
        "Stopped after {} iterations ({} delivered, {} skipped)",
        summary.iterations, summary.delivered, summary.skipped
    ))?;

    Ok(())
}

fn build_display(config: &Config) -> (SharedDisplay, Option<PredictionWindow>) {
    match config.display {
        DisplayKind::Console => (
            Arc::new(Mutex::new(DeviceDisplayConsole::new(
                config.console_render_interval,
            ))),
            None,
        ),
        DisplayKind::Gui => {
            let gui = DeviceDisplayGui::new();
            let window = gui.window(config.refresh_period());
            (Arc::new(Mutex::new(gui)), Some(window))
        }
    }
}

fn build_classifier(
    config: &Config,
    logger: Arc<dyn Logger + Send + Sync>,
) -> Result<(Arc<dyn ImageClassifier + Send + Sync>, ClassLabels), Box<dyn Error + Send + Sync>> {
    match &config.classifier {
        ClassifierKind::Fake { labels } => {
            let (height, width) = config.model_input_size;
            let classifier =
                ImageClassifierFake::new(logger, labels.len()).with_input_size(height, width);
            Ok((Arc::new(classifier), ClassLabels::new(labels.clone())))
        }
        #[cfg(feature = "tract")]
        ClassifierKind::TractOnnx {
            model_path,
            labels_path,
            apply_softmax,
        } => {
            use image_classifier::impl_tract_onnx::{ImageClassifierTractOnnx, ModelConfig};

            let labels = ClassLabels::from_file(labels_path)?;
            let classifier = ImageClassifierTractOnnx::new(
                ModelConfig {
                    onnx_model_path: model_path.clone(),
                    input_shape: config.model_input_size,
                    apply_softmax: *apply_softmax,
                },
                logger,
            )?;
            Ok((Arc::new(classifier), labels))
        }
        #[cfg(not(feature = "tract"))]
        ClassifierKind::TractOnnx { .. } => {
            Err("built without the `tract` feature, cannot load an ONNX model".into())
        }
    }
}

fn build_camera(config: &Config, logger: Arc<dyn Logger + Send + Sync>) -> Box<dyn DeviceCamera> {
    match &config.camera {
        CameraKind::Fake {
            native_width,
            native_height,
        } => Box::new(DeviceCameraFake::new(logger, *native_width, *native_height)),
        #[cfg(feature = "v4l2")]
        CameraKind::V4l2 { device_path } => Box::new(
            device_camera::impl_v4l2::DeviceCameraV4l2::new(device_path, logger),
        ),
        #[cfg(not(feature = "v4l2"))]
        CameraKind::V4l2 { device_path } => {
            let _ = logger.error(&format!(
                "Built without the `v4l2` feature, using a fake camera instead of {}",
                device_path
            ));
            Box::new(DeviceCameraFake::new(
                logger,
                config.preferred_width,
                config.preferred_height,
            ))
        }
    }
}

fn show_status(display: &SharedDisplay, logger: &Arc<dyn Logger + Send + Sync>, status: &str) {
    let _ = logger.info(status);
    let result = match display.lock() {
        Ok(mut display) => display.show_status(status),
        Err(_) => Err("display lock poisoned".into()),
    };
    if let Err(e) = result {
        let _ = logger.error(&format!("Display failed: {}", e));
    }
}

/// Startup failures replace "Loading model..." before `main` bails out.
fn or_show_error<T, E: std::fmt::Display>(
    result: Result<T, E>,
    display: &SharedDisplay,
    logger: &Arc<dyn Logger + Send + Sync>,
) -> Result<T, E> {
    if let Err(e) = &result {
        show_status(display, logger, &format!("Error: {}", e));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device_display::impl_fake::DeviceDisplayFake;
    use crate::image_classifier::impl_fake::FakeOutcome;
    use crate::library::logger::impl_fake::LoggerFake;

    #[test]
    fn test_failed_warmup_replaces_loading_status() {
        let fake_logger = Arc::new(LoggerFake::new());
        let logger: Arc<dyn Logger + Send + Sync> = fake_logger.clone();
        let fake_display = Arc::new(Mutex::new(DeviceDisplayFake::new()));
        let display: SharedDisplay = fake_display.clone();

        let classifier = ImageClassifierFake::new(logger.clone(), 3)
            .with_input_size(4, 4)
            .with_outcome(1, FakeOutcome::Transient("weights missing".to_string()));

        show_status(&display, &logger, "Loading model...");
        let result = or_show_error(classifier.warmup(), &display, &logger);

        assert!(result.is_err());
        let statuses = fake_display.lock().unwrap().statuses();
        assert_eq!(statuses.len(), 2);
        let last = statuses.last().unwrap();
        assert!(last.starts_with("Error: "));
        assert!(last.contains("weights missing"));
        assert!(fake_logger
            .lines()
            .iter()
            .any(|line| line.message == *last));
    }

    #[test]
    fn test_success_leaves_status_alone() {
        let logger: Arc<dyn Logger + Send + Sync> = Arc::new(LoggerFake::new());
        let fake_display = Arc::new(Mutex::new(DeviceDisplayFake::new()));
        let display: SharedDisplay = fake_display.clone();

        let value = or_show_error(Ok::<u32, String>(7), &display, &logger);

        assert_eq!(value, Ok(7));
        assert!(fake_display.lock().unwrap().statuses().is_empty());
    }
}
