use crate::capture_loop::core::{init, transition, CancelReason, Effect, Event, LoopConfig, State};
use crate::device_camera::interface::CameraStream;
use crate::device_display::interface::DeviceDisplay;
use crate::error::PipelineError;
use crate::image_classifier::class_labels::ClassLabels;
use crate::image_classifier::interface::{ImageClassifier, RankedResult};
use crate::library::cancellation::CancellationToken;
use crate::library::logger::interface::Logger;
use crate::library::scheduler::interface::FrameScheduler;
use crate::preprocessor::interface::Preprocessor;
use crate::score_ranker::rank;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Instant;

/// Everything one iteration needs. Owned by the loop for its whole life.
pub struct LoopContext {
    pub stream: Box<dyn CameraStream>,
    pub preprocessor: Arc<dyn Preprocessor + Send + Sync>,
    pub classifier: Arc<dyn ImageClassifier + Send + Sync>,
    pub labels: ClassLabels,
    pub top_k: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopSummary {
    pub iterations: u64,
    pub delivered: u64,
    pub skipped: u64,
}

pub struct CaptureLoop {
    config: LoopConfig,
    context: LoopContext,
    scheduler: Arc<dyn FrameScheduler + Send + Sync>,
    device_display: Arc<Mutex<dyn DeviceDisplay + Send + Sync>>,
    logger: Arc<dyn Logger + Send + Sync>,
    summary: LoopSummary,
}

pub struct CaptureHandle {
    token: CancellationToken,
    thread: JoinHandle<Result<LoopSummary, PipelineError>>,
}

impl CaptureHandle {
    /// Stops the loop before its next iteration. An iteration already
    /// running finishes and delivers its result.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn join(self) -> Result<LoopSummary, PipelineError> {
        self.thread.join().unwrap_or_else(|_| {
            Err(PipelineError::FatalPipeline(
                "capture loop panicked".to_string(),
            ))
        })
    }
}

impl CaptureLoop {
    pub fn new(
        config: LoopConfig,
        context: LoopContext,
        scheduler: Arc<dyn FrameScheduler + Send + Sync>,
        device_display: Arc<Mutex<dyn DeviceDisplay + Send + Sync>>,
        logger: Arc<dyn Logger + Send + Sync>,
    ) -> Self {
        Self {
            config,
            context,
            scheduler,
            device_display,
            logger: logger.with_namespace("capture_loop"),
            summary: LoopSummary::default(),
        }
    }

    pub fn spawn(self, token: CancellationToken) -> CaptureHandle {
        let loop_token = token.clone();
        let thread = std::thread::spawn(move || self.run(&loop_token));
        CaptureHandle { token, thread }
    }

    /// Runs on the calling thread until cancelled or a fatal error.
    pub fn run(mut self, token: &CancellationToken) -> Result<LoopSummary, PipelineError> {
        let (mut state, effects) = init();
        let mut events: VecDeque<Event> = VecDeque::new();
        for effect in effects {
            if let Some(event) = self.run_effect(effect, token) {
                events.push_back(event);
            }
        }
        events.push_back(Event::Start);

        while let Some(event) = events.pop_front() {
            let (new_state, effects) = transition(&self.config, state, event);
            state = new_state;
            for effect in effects {
                if let Some(event) = self.run_effect(effect, token) {
                    events.push_back(event);
                }
            }
        }

        let _ = self.logger.info(&format!(
            "Finished: {} iterations, {} delivered, {} skipped",
            self.summary.iterations, self.summary.delivered, self.summary.skipped
        ));

        match state {
            State::Cancelled {
                reason: CancelReason::Fatal(error),
            } => Err(error),
            _ => Ok(self.summary),
        }
    }

    fn run_effect(&mut self, effect: Effect, token: &CancellationToken) -> Option<Event> {
        match effect {
            Effect::RequestTick => {
                if token.is_cancelled() {
                    return Some(Event::CancelRequested);
                }
                self.scheduler.wait_for_tick();
                if token.is_cancelled() {
                    Some(Event::CancelRequested)
                } else {
                    Some(Event::Tick)
                }
            }
            Effect::RunIteration { iteration } => {
                self.summary.iterations = iteration;
                let started = Instant::now();
                match self.run_iteration() {
                    Ok((frame_id, predictions)) => {
                        self.summary.delivered += 1;
                        Some(Event::IterationDone {
                            frame_id,
                            predictions,
                            elapsed: started.elapsed(),
                        })
                    }
                    Err(error) => {
                        if matches!(error, PipelineError::TransientFrame(_)) {
                            self.summary.skipped += 1;
                        }
                        Some(Event::IterationFailed(error))
                    }
                }
            }
            Effect::ShowStatus(status) => {
                self.with_display(|display| display.show_status(&status));
                None
            }
            Effect::ShowPredictions {
                frame_id,
                predictions,
            } => {
                self.with_display(|display| display.show_predictions(frame_id, &predictions));
                None
            }
            Effect::LogError(message) => {
                let _ = self.logger.error(&message);
                None
            }
            Effect::StopStream => {
                if let Err(e) = self.context.stream.stop() {
                    let _ = self.logger.error(&format!("Failed to stop stream: {}", e));
                }
                None
            }
        }
    }

    /// Capture, preprocess, classify, rank. The frame is dropped right after
    /// preprocessing and the tensor right after classification, on every path.
    fn run_iteration(&mut self) -> Result<(u64, RankedResult), PipelineError> {
        let (frame_id, scores) = {
            let (frame_id, tensor) = {
                let frame = self
                    .context
                    .stream
                    .capture_frame()
                    .map_err(|e| PipelineError::TransientFrame(format!("capture: {}", e)))?;
                let tensor = self.context.preprocessor.preprocess(&frame).map_err(|e| {
                    let message = format!("preprocess frame {}: {}", frame.id(), e);
                    PipelineError::TransientFrame(message)
                })?;
                (frame.id(), tensor)
            };
            let scores = self
                .context
                .classifier
                .classify(&tensor)
                .map_err(|e| classify_error(frame_id, e))?;
            (frame_id, scores)
        };

        let predictions = rank(&scores, self.context.top_k, &self.context.labels)?;
        Ok((frame_id, predictions))
    }

    fn with_display(
        &self,
        f: impl FnOnce(
            &mut (dyn DeviceDisplay + Send + Sync + 'static),
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>,
    ) {
        let result = match self.device_display.lock() {
            Ok(mut display) => f(&mut *display),
            Err(_) => Err("display lock poisoned".into()),
        };
        // Display trouble is the sink's problem, not a skipped frame.
        if let Err(e) = result {
            let _ = self.logger.error(&format!("Display failed: {}", e));
        }
    }
}

fn classify_error(
    frame_id: u64,
    error: Box<dyn std::error::Error + Send + Sync>,
) -> PipelineError {
    match error.downcast_ref::<PipelineError>() {
        Some(PipelineError::FatalPipeline(message)) => {
            PipelineError::FatalPipeline(format!("classifier fault: {}", message))
        }
        _ => PipelineError::TransientFrame(format!("classify frame {}: {}", frame_id, error)),
    }
}
