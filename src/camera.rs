//! Still capture from the default camera.

use crate::config::{CameraConfig, SaveFormat};
use crate::image::write_bitmap;
use image::{DynamicImage, RgbImage};
use nokhwa::Camera;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CameraError {
    #[error("camera permission denied")]
    PermissionDenied,
    #[error("camera unavailable: {0}")]
    Device(String),
    #[error("camera returned an unusable frame")]
    BadFrame,
    #[error("could not write photo: {0}")]
    Write(String),
}

impl From<nokhwa::NokhwaError> for CameraError {
    fn from(err: nokhwa::NokhwaError) -> Self {
        Self::Device(err.to_string())
    }
}

/// Camera access as seen by the picker screen.
pub trait CameraDevice: Send + Sync {
    /// Whether capture is currently allowed.
    fn permission_granted(&self) -> bool;

    /// Ask the platform for access; the answer arrives on `reply`.
    fn request_permission(&self, reply: Sender<bool>);

    /// Take one photo and write it as JPEG to `destination`.
    fn capture_to(&self, destination: &Path) -> Result<(), CameraError>;
}

/// `nokhwa`-backed camera using the platform's native capture API.
#[derive(Debug, Clone)]
pub struct NokhwaCamera {
    index: u32,
    warmup_frames: u32,
    jpeg_quality: u8,
}

impl NokhwaCamera {
    pub const fn new(config: &CameraConfig, jpeg_quality: u8) -> Self {
        Self {
            index: config.index,
            warmup_frames: config.warmup_frames,
            jpeg_quality,
        }
    }

    fn grab_frame(&self) -> Result<RgbImage, CameraError> {
        let format =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution);
        let mut camera = Camera::new(CameraIndex::Index(self.index), format)?;
        camera.open_stream()?;
        for _ in 0..self.warmup_frames {
            if let Err(e) = camera.frame() {
                log::debug!("camera warmup frame dropped: {e}");
            }
        }
        let frame = camera.frame();
        if let Err(e) = camera.stop_stream() {
            log::warn!("camera stop stream failed: {e}");
        }
        let decoded = frame?.decode_image::<RgbFormat>()?;
        let (width, height) = (decoded.width(), decoded.height());
        RgbImage::from_raw(width, height, decoded.into_raw()).ok_or(CameraError::BadFrame)
    }
}

impl CameraDevice for NokhwaCamera {
    fn permission_granted(&self) -> bool {
        nokhwa::nokhwa_check()
    }

    fn request_permission(&self, reply: Sender<bool>) {
        nokhwa::nokhwa_initialize(move |granted| {
            log::info!("camera permission granted: {granted}");
            let _ = reply.send(granted);
        });
    }

    fn capture_to(&self, destination: &Path) -> Result<(), CameraError> {
        let rgb = self.grab_frame()?;
        let rgba = DynamicImage::ImageRgb8(rgb).into_rgba8();
        let file = File::create(destination)
            .map_err(|e| CameraError::Write(format!("{}: {e}", destination.display())))?;
        let mut writer = BufWriter::new(file);
        write_bitmap(&mut writer, &rgba, SaveFormat::Jpeg, self.jpeg_quality)
            .map_err(|e| CameraError::Write(format!("{e:#}")))?;
        writer
            .flush()
            .map_err(|e| CameraError::Write(format!("{}: {e}", destination.display())))?;
        log::info!(
            "captured {}x{} photo to {}",
            rgba.width(),
            rgba.height(),
            destination.display()
        );
        Ok(())
    }
}
