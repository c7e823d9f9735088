use crate::error::PipelineError;
use crate::image_classifier::interface::RankedResult;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct LoopConfig {
    pub max_consecutive_failures: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CancelReason {
    Requested,
    Fatal(PipelineError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum State {
    Idle,
    Running {
        iteration: u64,
        consecutive_failures: u32,
    },
    Cancelled {
        reason: CancelReason,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Start,
    Tick,
    CancelRequested,
    IterationDone {
        frame_id: u64,
        predictions: RankedResult,
        elapsed: Duration,
    },
    IterationFailed(PipelineError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Wait for the next refresh tick, then report `Tick` or `CancelRequested`.
    RequestTick,
    RunIteration {
        iteration: u64,
    },
    ShowStatus(String),
    ShowPredictions {
        frame_id: u64,
        predictions: RankedResult,
    },
    LogError(String),
    StopStream,
}

pub fn init() -> (State, Vec<Effect>) {
    (State::Idle, vec![])
}

pub fn transition(config: &LoopConfig, state: State, event: Event) -> (State, Vec<Effect>) {
    match (state, event) {
        (State::Idle, Event::Start) => (
            State::Running {
                iteration: 0,
                consecutive_failures: 0,
            },
            vec![Effect::RequestTick],
        ),

        (
            State::Running {
                iteration,
                consecutive_failures,
            },
            Event::Tick,
        ) => (
            State::Running {
                iteration: iteration + 1,
                consecutive_failures,
            },
            vec![
                Effect::ShowStatus("Predicting...".to_string()),
                Effect::RunIteration {
                    iteration: iteration + 1,
                },
            ],
        ),

        (
            State::Running { iteration, .. },
            Event::IterationDone {
                frame_id,
                predictions,
                elapsed,
            },
        ) => (
            State::Running {
                iteration,
                consecutive_failures: 0,
            },
            vec![
                Effect::ShowPredictions {
                    frame_id,
                    predictions,
                },
                Effect::ShowStatus(format!("Done in {} ms", elapsed.as_millis())),
                Effect::RequestTick,
            ],
        ),

        (
            State::Running {
                iteration,
                consecutive_failures,
            },
            Event::IterationFailed(PipelineError::TransientFrame(message)),
        ) => {
            let consecutive_failures = consecutive_failures + 1;
            if consecutive_failures >= config.max_consecutive_failures {
                let error = PipelineError::FatalPipeline(format!(
                    "{} consecutive frames failed, last: {}",
                    consecutive_failures, message
                ));
                stop(CancelReason::Fatal(error))
            } else {
                (
                    State::Running {
                        iteration,
                        consecutive_failures,
                    },
                    vec![
                        Effect::LogError(format!(
                            "Skipped iteration {}: {}",
                            iteration, message
                        )),
                        Effect::ShowStatus(format!("Error: {}", message)),
                        Effect::RequestTick,
                    ],
                )
            }
        }

        (State::Running { .. }, Event::IterationFailed(error)) => {
            stop(CancelReason::Fatal(error))
        }

        (State::Idle | State::Running { .. }, Event::CancelRequested) => {
            stop(CancelReason::Requested)
        }

        // Cancelled is terminal; stray events from Idle are ignored.
        (state, _) => (state, vec![]),
    }
}

fn stop(reason: CancelReason) -> (State, Vec<Effect>) {
    let mut effects = Vec::new();
    match &reason {
        CancelReason::Requested => {
            effects.push(Effect::ShowStatus("Stopped".to_string()));
        }
        CancelReason::Fatal(error) => {
            effects.push(Effect::LogError(error.to_string()));
            effects.push(Effect::ShowStatus(format!("Error: {}", error)));
        }
    }
    effects.push(Effect::StopStream);
    (State::Cancelled { reason }, effects)
}
