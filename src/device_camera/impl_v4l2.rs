use crate::device_camera::constraints::{SizeConstraint, StreamConstraints};
use crate::device_camera::interface::{CameraStream, DeviceCamera, StreamMetadata};
use crate::frame::Frame;
use crate::library::logger::interface::Logger;
use ouroboros::self_referencing;
use std::sync::Arc;
use v4l::buffer::Type;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::FourCC;

const BUFFER_COUNT: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PixelFormat {
    Rgb3,
    Yuyv,
    Mjpg,
}

impl PixelFormat {
    fn from_fourcc(fourcc: FourCC) -> Option<Self> {
        match &fourcc.repr {
            b"RGB3" => Some(PixelFormat::Rgb3),
            b"YUYV" => Some(PixelFormat::Yuyv),
            b"MJPG" => Some(PixelFormat::Mjpg),
            _ => None,
        }
    }

    /// YUYV packs two pixels per 4-byte macropixel, so the width must be even.
    fn check_width(self, width: u32) -> Result<(), String> {
        if self == PixelFormat::Yuyv && width % 2 != 0 {
            return Err(format!("YUYV needs an even width, driver offered {}", width));
        }
        Ok(())
    }
}

/// V4L2 capture device. V4L2 has no notion of facing mode, so the device
/// path decides which camera is used.
pub struct DeviceCameraV4l2 {
    device_path: String,
    logger: Arc<dyn Logger + Send + Sync>,
}

impl DeviceCameraV4l2 {
    pub fn new(device_path: &str, logger: Arc<dyn Logger + Send + Sync>) -> Self {
        Self {
            device_path: device_path.to_string(),
            logger: logger.with_namespace("camera").with_namespace("v4l2"),
        }
    }
}

#[self_referencing]
struct V4l2Session {
    device: v4l::Device,
    #[borrows(device)]
    #[covariant]
    stream: v4l::prelude::MmapStream<'this>,
}

impl DeviceCamera for DeviceCameraV4l2 {
    fn open_stream(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn CameraStream>, Box<dyn std::error::Error + Send + Sync>> {
        let device = v4l::Device::with_path(&self.device_path)
            .map_err(|e| format!("open {}: {}", self.device_path, e))?;

        let mut format = device.format()?;
        match constraints.size {
            SizeConstraint::Exact { width, height } | SizeConstraint::AtMost { width, height } => {
                format.width = width;
                format.height = height;
            }
            SizeConstraint::Any => {}
        }
        format.fourcc = FourCC::new(b"RGB3");

        // Drivers answer with the closest format they support.
        let format = device.set_format(&format)?;
        if !constraints.size.accepts(format.width, format.height) {
            return Err(format!(
                "{} offered {}x{}, which does not satisfy {}",
                self.device_path, format.width, format.height, constraints
            )
            .into());
        }
        let pixel_format = PixelFormat::from_fourcc(format.fourcc)
            .ok_or_else(|| format!("unsupported pixel format {}", format.fourcc))?;
        pixel_format.check_width(format.width)?;

        let session = V4l2SessionTryBuilder {
            device,
            stream_builder: |device| {
                v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, BUFFER_COUNT)
            },
        }
        .try_build()?;

        self.logger.info(&format!(
            "Opened {} at {}x{} {:?}",
            self.device_path, format.width, format.height, pixel_format
        ))?;

        Ok(Box::new(CameraStreamV4l2 {
            session: Some(session),
            width: format.width,
            height: format.height,
            pixel_format,
            next_id: 0,
            logger: self.logger.clone(),
        }))
    }
}

struct CameraStreamV4l2 {
    session: Option<V4l2Session>,
    width: u32,
    height: u32,
    pixel_format: PixelFormat,
    next_id: u64,
    logger: Arc<dyn Logger + Send + Sync>,
}

impl CameraStreamV4l2 {
    fn dequeue(&mut self) -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>> {
        let session = self.session.as_mut().ok_or("stream stopped")?;
        let bytes = session.with_stream_mut(|stream| {
            CaptureStream::next(stream).map(|(buf, meta)| {
                let used = (meta.bytesused as usize).min(buf.len());
                if used == 0 {
                    buf.to_vec()
                } else {
                    buf[..used].to_vec()
                }
            })
        })?;
        Ok(bytes)
    }
}

impl CameraStream for CameraStreamV4l2 {
    fn wait_for_metadata(
        &mut self,
    ) -> Result<StreamMetadata, Box<dyn std::error::Error + Send + Sync>> {
        // The first dequeued buffer proves the driver is streaming the
        // negotiated format.
        self.dequeue()?;
        Ok(StreamMetadata {
            width: self.width,
            height: self.height,
        })
    }

    fn capture_frame(&mut self) -> Result<Frame, Box<dyn std::error::Error + Send + Sync>> {
        let raw = self.dequeue()?;
        self.next_id += 1;

        let rgb = match self.pixel_format {
            PixelFormat::Rgb3 => raw,
            PixelFormat::Yuyv => yuyv_to_rgb(&raw, self.width, self.height)?,
            PixelFormat::Mjpg => {
                let decoded = image::load_from_memory_with_format(&raw, image::ImageFormat::Jpeg)?
                    .to_rgb8();
                if decoded.width() != self.width || decoded.height() != self.height {
                    return Err(format!(
                        "decoded {}x{} from a {}x{} stream",
                        decoded.width(),
                        decoded.height(),
                        self.width,
                        self.height
                    )
                    .into());
                }
                decoded.into_raw()
            }
        };

        Frame::new(self.next_id, self.width, self.height, rgb)
    }

    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        // Dropping the session unmaps the buffers and closes the device.
        if self.session.take().is_some() {
            self.logger.info("Stream stopped")?;
        }
        Ok(())
    }
}

fn yuyv_to_rgb(
    raw: &[u8],
    width: u32,
    height: u32,
) -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>> {
    let pixels = width as usize * height as usize;
    if raw.len() < pixels * 2 {
        return Err(format!("short YUYV buffer: {} bytes", raw.len()).into());
    }

    let mut rgb = Vec::with_capacity(pixels * 3);
    for chunk in raw[..pixels * 2].chunks_exact(4) {
        let (y0, u, y1, v) = (chunk[0], chunk[1], chunk[2], chunk[3]);
        rgb.extend_from_slice(&yuv_to_rgb(y0, u, v));
        rgb.extend_from_slice(&yuv_to_rgb(y1, u, v));
    }
    Ok(rgb)
}

fn yuv_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
    let c = y as f32 - 16.0;
    let d = u as f32 - 128.0;
    let e = v as f32 - 128.0;
    let clamp = |x: f32| x.round().clamp(0.0, 255.0) as u8;
    [
        clamp(1.164 * c + 1.596 * e),
        clamp(1.164 * c - 0.392 * d - 0.813 * e),
        clamp(1.164 * c + 2.017 * d),
    ]
}
