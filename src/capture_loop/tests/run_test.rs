use crate::capture_loop::main::LoopSummary;
use crate::capture_loop::tests::fixture::Fixture;
use crate::device_display::impl_fake::{DeviceDisplayFake, DisplayCall};
use crate::error::PipelineError;
use crate::image_classifier::impl_fake::FakeOutcome;
use crate::image_classifier::interface::Prediction;
use crate::library::cancellation::CancellationToken;
use crate::preprocessor::impl_fake::PreprocessorFake;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

fn cancel_after_frame(token: &CancellationToken, last_frame: u64) -> DeviceDisplayFake {
    let token = token.clone();
    DeviceDisplayFake::new().on_predictions(move |frame_id| {
        if frame_id >= last_frame {
            token.cancel();
        }
    })
}

#[test]
fn test_preprocess_failure_skips_only_that_iteration() {
    let token = CancellationToken::new();
    let mut fixture = Fixture::new();
    fixture.preprocessor = PreprocessorFake::new(4, 4).failing_on([3]);

    // Frames and tensors still alive at the moment each result reaches the display.
    let live_at_delivery = Arc::new(Mutex::new(Vec::new()));
    let camera = fixture.camera.clone();
    let preprocessor = fixture.preprocessor.clone();
    let observed = live_at_delivery.clone();
    let cancel = token.clone();
    fixture.display = DeviceDisplayFake::new().on_predictions(move |frame_id| {
        if let Ok(mut observed) = observed.lock() {
            observed.push((camera.live_frames(), preprocessor.live_tensors()));
        }
        if frame_id >= 5 {
            cancel.cancel();
        }
    });

    let built = fixture.build();
    let summary = built.capture_loop.run(&token).unwrap();

    let display = built.display.lock().unwrap();
    assert_eq!(display.delivered_frames(), vec![1, 2, 4, 5]);
    assert_eq!(
        summary,
        LoopSummary {
            iterations: 5,
            delivered: 4,
            skipped: 1,
        }
    );
    assert!(display
        .statuses()
        .iter()
        .any(|s| s.starts_with("Error: preprocess frame 3")));

    let errors = built.logger.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("Skipped iteration 3"));
    assert_eq!(errors[0].namespace, "capture_loop");

    assert_eq!(*live_at_delivery.lock().unwrap(), vec![(0, 0); 4]);
    assert_eq!(built.camera.live_frames(), 0);
    assert_eq!(built.preprocessor.live_tensors(), 0);
    assert_eq!(built.camera.stopped_streams(), 1);
    assert_eq!(built.preprocessor.calls(), 5);
    // Frame 3 never reached the classifier.
    assert_eq!(built.classifier.calls(), 4);
}

#[test]
fn test_results_carry_ranked_labels() {
    let token = CancellationToken::new();
    let mut fixture = Fixture::new();
    fixture.display = cancel_after_frame(&token, 1);

    let built = fixture.build();
    built.capture_loop.run(&token).unwrap();

    let display = built.display.lock().unwrap();
    let delivered: Vec<_> = display
        .calls()
        .iter()
        .filter_map(|call| match call {
            DisplayCall::Predictions { predictions, .. } => Some(predictions.clone()),
            DisplayCall::Status(_) => None,
        })
        .collect();
    assert_eq!(
        delivered,
        vec![vec![
            Prediction {
                label: "dog".to_string(),
                probability: 0.7
            },
            Prediction {
                label: "bird".to_string(),
                probability: 0.2
            },
        ]]
    );

    let statuses = display.statuses();
    assert_eq!(statuses.first().map(String::as_str), Some("Predicting..."));
    assert!(statuses[1].starts_with("Done in "));
    assert_eq!(statuses.last().map(String::as_str), Some("Stopped"));
}

#[test]
fn test_cancel_during_iteration_lets_it_finish() {
    let token = CancellationToken::new();
    let mut fixture = Fixture::new();
    let cancel = token.clone();
    fixture.classifier = fixture.classifier.on_call(move |call| {
        if call == 2 {
            cancel.cancel();
        }
    });

    let built = fixture.build();
    let summary = built.capture_loop.run(&token).unwrap();

    assert_eq!(built.display.lock().unwrap().delivered_frames(), vec![1, 2]);
    assert_eq!(built.classifier.calls(), 2);
    assert_eq!(built.scheduler.ticks(), 2);
    assert_eq!(summary.iterations, 2);
    assert_eq!(built.camera.stopped_streams(), 1);
}

#[test]
fn test_cancel_before_start_runs_nothing() {
    let token = CancellationToken::new();
    token.cancel();

    let built = Fixture::new().build();
    let summary = built.capture_loop.run(&token).unwrap();

    assert_eq!(summary, LoopSummary::default());
    assert_eq!(built.scheduler.ticks(), 0);
    assert_eq!(built.classifier.calls(), 0);
}

#[test]
fn test_consecutive_failures_end_the_loop() {
    let token = CancellationToken::new();
    let mut fixture = Fixture::new();
    fixture.classifier = fixture
        .classifier
        .with_outcome(1, FakeOutcome::Transient("blurry".to_string()))
        .with_outcome(2, FakeOutcome::Transient("blurry".to_string()))
        .with_outcome(3, FakeOutcome::Transient("blurry".to_string()));

    let built = fixture.build();
    let err = built.capture_loop.run(&token).unwrap_err();

    match err {
        PipelineError::FatalPipeline(message) => assert!(message.contains("3 consecutive")),
        other => panic!("Unexpected error {:?}", other),
    }
    let display = built.display.lock().unwrap();
    assert!(display.delivered_frames().is_empty());
    assert!(display
        .statuses()
        .last()
        .is_some_and(|s| s.starts_with("Error: pipeline stopped")));
    assert_eq!(built.camera.stopped_streams(), 1);
    assert!(!token.is_cancelled());
}

#[test]
fn test_success_resets_the_failure_count() {
    let token = CancellationToken::new();
    let mut fixture = Fixture::new();
    fixture.camera = fixture.camera.clone().failing_captures([1, 2, 4, 5]);
    fixture.display = cancel_after_frame(&token, 6);

    let built = fixture.build();
    let summary = built.capture_loop.run(&token).unwrap();

    assert_eq!(built.display.lock().unwrap().delivered_frames(), vec![3, 6]);
    assert_eq!(summary.skipped, 4);
}

#[test]
fn test_classifier_fault_stops_immediately() {
    let token = CancellationToken::new();
    let mut fixture = Fixture::new();
    fixture.classifier = fixture
        .classifier
        .with_outcome(2, FakeOutcome::Fatal("device lost".to_string()));

    let built = fixture.build();
    let err = built.capture_loop.run(&token).unwrap_err();

    assert_eq!(
        err,
        PipelineError::FatalPipeline("classifier fault: device lost".to_string())
    );
    assert_eq!(built.display.lock().unwrap().delivered_frames(), vec![1]);
    assert_eq!(built.camera.stopped_streams(), 1);
}

#[test]
fn test_ranking_error_propagates_to_caller() {
    let token = CancellationToken::new();
    let mut fixture = Fixture::new();
    fixture.top_k = 5;

    let built = fixture.build();
    let err = built.capture_loop.run(&token).unwrap_err();

    assert!(matches!(err, PipelineError::InvalidArgument(_)));
    assert!(built.display.lock().unwrap().delivered_frames().is_empty());
    assert_eq!(built.classifier.calls(), 1);
}

#[test]
fn test_spawned_loop_delivers_in_capture_order_until_cancelled() {
    let token = CancellationToken::new();
    let built = Fixture::new().build();
    let display = built.display.clone();

    let handle = built.capture_loop.spawn(token);

    let deadline = Instant::now() + Duration::from_secs(5);
    while display.lock().unwrap().delivered_frames().len() < 3 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(1));
    }
    handle.cancel();
    let summary = handle.join().unwrap();

    let delivered = display.lock().unwrap().delivered_frames();
    assert!(delivered.len() >= 3);
    assert_eq!(delivered.len() as u64, summary.delivered);
    let expected: Vec<u64> = (1..=delivered.len() as u64).collect();
    assert_eq!(delivered, expected);
}
