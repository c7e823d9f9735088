use crate::device_camera::constraints::{fallback_chain, FacingMode, StreamConstraints};
use crate::device_camera::interface::{CameraStream, DeviceCamera, StreamMetadata};
use crate::error::PipelineError;
use crate::library::logger::interface::Logger;
use std::sync::Arc;

pub struct OpenedStream {
    pub stream: Box<dyn CameraStream>,
    pub metadata: StreamMetadata,
    pub constraints: StreamConstraints,
}

/// Stops the wrapped stream on drop unless it was handed out with `release`.
struct StreamGuard {
    stream: Option<Box<dyn CameraStream>>,
    logger: Arc<dyn Logger + Send + Sync>,
}

impl StreamGuard {
    fn new(stream: Box<dyn CameraStream>, logger: Arc<dyn Logger + Send + Sync>) -> Self {
        Self {
            stream: Some(stream),
            logger,
        }
    }

    fn wait_for_metadata(
        &mut self,
    ) -> Result<StreamMetadata, Box<dyn std::error::Error + Send + Sync>> {
        match self.stream.as_mut() {
            Some(stream) => stream.wait_for_metadata(),
            None => Err("stream already released".into()),
        }
    }

    fn release(mut self) -> Option<Box<dyn CameraStream>> {
        self.stream.take()
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.stop() {
                let _ = self
                    .logger
                    .error(&format!("Failed to release partially opened stream: {}", e));
            }
        }
    }
}

/// Opens the camera, relaxing the size constraint step by step.
///
/// Each attempt must both open and report metadata. A stream that opens but
/// never becomes ready is stopped before the next attempt.
pub fn open_with_fallback(
    camera: &dyn DeviceCamera,
    facing: FacingMode,
    preferred_width: u32,
    preferred_height: u32,
    logger: Arc<dyn Logger + Send + Sync>,
) -> Result<OpenedStream, PipelineError> {
    let logger = logger.with_namespace("open");
    let chain = fallback_chain(facing, preferred_width, preferred_height);
    let attempts = chain.len();
    let mut last_error = String::from("no constraint sets to try");

    for (attempt, constraints) in chain.into_iter().enumerate() {
        let _ = logger.info(&format!(
            "Attempt {}/{}: {}",
            attempt + 1,
            attempts,
            constraints
        ));

        let stream = match camera.open_stream(&constraints) {
            Ok(stream) => stream,
            Err(e) => {
                let _ = logger.error(&format!("Rejected ({}): {}", constraints, e));
                last_error = e.to_string();
                continue;
            }
        };

        let mut guard = StreamGuard::new(stream, logger.clone());
        match guard.wait_for_metadata() {
            Ok(metadata) => {
                if let Some(stream) = guard.release() {
                    let _ = logger.info(&format!(
                        "Stream ready at {}x{}",
                        metadata.width, metadata.height
                    ));
                    return Ok(OpenedStream {
                        stream,
                        metadata,
                        constraints,
                    });
                }
            }
            Err(e) => {
                let _ = logger.error(&format!("Metadata never loaded ({}): {}", constraints, e));
                last_error = e.to_string();
            }
        }
    }

    Err(PipelineError::DeviceUnavailable {
        attempts,
        last_error,
    })
}
