use crate::device_camera::constraints::StreamConstraints;
use crate::frame::Frame;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamMetadata {
    pub width: u32,
    pub height: u32,
}

pub trait DeviceCamera: Send + Sync {
    fn open_stream(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn CameraStream>, Box<dyn std::error::Error + Send + Sync>>;
}

/// A started stream. Frames are pulled one at a time.
pub trait CameraStream: Send {
    /// Blocks until the device has negotiated its format.
    fn wait_for_metadata(
        &mut self,
    ) -> Result<StreamMetadata, Box<dyn std::error::Error + Send + Sync>>;

    fn capture_frame(&mut self) -> Result<Frame, Box<dyn std::error::Error + Send + Sync>>;

    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
