use crate::device_camera::constraints::{SizeConstraint, StreamConstraints};
use crate::device_camera::interface::{CameraStream, DeviceCamera, StreamMetadata};
use crate::frame::Frame;
use crate::library::logger::interface::Logger;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};

#[derive(Default)]
struct Shared {
    attempts: Mutex<Vec<StreamConstraints>>,
    stopped: AtomicUsize,
    issued_buffers: Mutex<Vec<Weak<[u8]>>>,
}

/// Synthetic camera. Produces a moving gradient at its native resolution
/// (or the requested one, if it is smaller or exact). Attempt numbers are
/// 1-based and count every `open_stream` call on this device.
#[derive(Clone)]
pub struct DeviceCameraFake {
    logger: Arc<dyn Logger + Send + Sync>,
    native_width: u32,
    native_height: u32,
    reject_attempts: HashSet<usize>,
    no_metadata_attempts: HashSet<usize>,
    fail_captures: HashSet<u64>,
    shared: Arc<Shared>,
}

impl DeviceCameraFake {
    pub fn new(
        logger: Arc<dyn Logger + Send + Sync>,
        native_width: u32,
        native_height: u32,
    ) -> Self {
        Self {
            logger: logger.with_namespace("camera").with_namespace("fake"),
            native_width,
            native_height,
            reject_attempts: HashSet::new(),
            no_metadata_attempts: HashSet::new(),
            fail_captures: HashSet::new(),
            shared: Arc::new(Shared::default()),
        }
    }

    #[allow(dead_code)]
    pub fn rejecting_attempts(mut self, attempts: impl IntoIterator<Item = usize>) -> Self {
        self.reject_attempts.extend(attempts);
        self
    }

    #[allow(dead_code)]
    pub fn without_metadata_on_attempts(
        mut self,
        attempts: impl IntoIterator<Item = usize>,
    ) -> Self {
        self.no_metadata_attempts.extend(attempts);
        self
    }

    /// Capture numbers (1-based, per stream) that fail.
    #[allow(dead_code)]
    pub fn failing_captures(mut self, captures: impl IntoIterator<Item = u64>) -> Self {
        self.fail_captures.extend(captures);
        self
    }

    #[allow(dead_code)]
    pub fn attempts(&self) -> Vec<StreamConstraints> {
        self.shared
            .attempts
            .lock()
            .map(|attempts| attempts.clone())
            .unwrap_or_default()
    }

    #[allow(dead_code)]
    pub fn stopped_streams(&self) -> usize {
        self.shared.stopped.load(Ordering::SeqCst)
    }

    /// Frame buffers handed out by any stream that are still referenced.
    #[allow(dead_code)]
    pub fn live_frames(&self) -> usize {
        self.shared
            .issued_buffers
            .lock()
            .map(|buffers| buffers.iter().filter(|b| b.strong_count() > 0).count())
            .unwrap_or(0)
    }

    fn resolve_size(&self, size: SizeConstraint) -> (u32, u32) {
        match size {
            SizeConstraint::Exact { width, height } => (width, height),
            SizeConstraint::AtMost { width, height } => {
                (self.native_width.min(width), self.native_height.min(height))
            }
            SizeConstraint::Any => (self.native_width, self.native_height),
        }
    }
}

impl DeviceCamera for DeviceCameraFake {
    fn open_stream(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn CameraStream>, Box<dyn std::error::Error + Send + Sync>> {
        let attempt = {
            let mut attempts = self
                .shared
                .attempts
                .lock()
                .map_err(|_| "attempt log poisoned".to_string())?;
            attempts.push(*constraints);
            attempts.len()
        };

        if self.reject_attempts.contains(&attempt) {
            return Err(format!("constraints not satisfiable: {}", constraints).into());
        }

        let (width, height) = self.resolve_size(constraints.size);
        self.logger
            .info(&format!("Opened stream {}x{} ({})", width, height, constraints))?;

        Ok(Box::new(CameraStreamFake {
            logger: self.logger.clone(),
            width,
            height,
            metadata_loads: !self.no_metadata_attempts.contains(&attempt),
            fail_captures: self.fail_captures.clone(),
            captured: 0,
            stopped: false,
            shared: self.shared.clone(),
        }))
    }
}

struct CameraStreamFake {
    logger: Arc<dyn Logger + Send + Sync>,
    width: u32,
    height: u32,
    metadata_loads: bool,
    fail_captures: HashSet<u64>,
    captured: u64,
    stopped: bool,
    shared: Arc<Shared>,
}

impl CameraStreamFake {
    fn gradient(&self, frame_id: u64) -> Vec<u8> {
        let shift = (frame_id % 256) as u32;
        let mut pixels = Vec::with_capacity((self.width * self.height * 3) as usize);
        for y in 0..self.height {
            for x in 0..self.width {
                pixels.push(((x + shift) % 256) as u8);
                pixels.push(((y + shift) % 256) as u8);
                pixels.push(((x + y) % 256) as u8);
            }
        }
        pixels
    }
}

impl CameraStream for CameraStreamFake {
    fn wait_for_metadata(
        &mut self,
    ) -> Result<StreamMetadata, Box<dyn std::error::Error + Send + Sync>> {
        if !self.metadata_loads {
            return Err("timed out waiting for stream metadata".into());
        }
        Ok(StreamMetadata {
            width: self.width,
            height: self.height,
        })
    }

    fn capture_frame(&mut self) -> Result<Frame, Box<dyn std::error::Error + Send + Sync>> {
        if self.stopped {
            return Err("stream stopped".into());
        }
        self.captured += 1;
        let frame_id = self.captured;
        if self.fail_captures.contains(&frame_id) {
            return Err(format!("dropped frame {}", frame_id).into());
        }

        let frame = Frame::new(frame_id, self.width, self.height, self.gradient(frame_id))?;
        if let Ok(mut buffers) = self.shared.issued_buffers.lock() {
            buffers.retain(|b| b.strong_count() > 0);
            buffers.push(Arc::downgrade(frame.pixel_buffer()));
        }
        Ok(frame)
    }

    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if !self.stopped {
            self.stopped = true;
            self.shared.stopped.fetch_add(1, Ordering::SeqCst);
            self.logger.info("Stream stopped")?;
        }
        Ok(())
    }
}
