//! Aspect-constrained cropping used by the crop tool.
//!
//! A [`CropRequest`] carries the same inputs a cropping activity receives:
//! source and destination references, a fixed aspect ratio and an upper
//! bound on the output size. [`run_crop`] performs the work and reports
//! either the destination reference or a [`CropError`].

use crate::config::{ImageLimits, SaveFormat};
use crate::image::{decode_image_from_path, write_bitmap};
use crate::image_ref::ImageRef;
use image::imageops::{self, FilterType};
use image::RgbaImage;
use std::fs::File;
use std::io::{BufWriter, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CropError {
    #[error("could not read source image: {0}")]
    Source(String),
    #[error("selection is empty")]
    EmptySelection,
    #[error("selection {width}x{height} does not match aspect {aspect_w}:{aspect_h}")]
    AspectMismatch {
        width: u32,
        height: u32,
        aspect_w: u32,
        aspect_h: u32,
    },
    #[error("could not write cropped image: {0}")]
    Write(String),
}

/// Integer ratio the selection must keep, e.g. 1:1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

impl AspectRatio {
    pub const SQUARE: Self = Self {
        width: 1,
        height: 1,
    };

    fn matches(self, width: u32, height: u32) -> bool {
        u64::from(width) * u64::from(self.height) == u64::from(height) * u64::from(self.width)
    }
}

/// Selection rectangle in source pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    /// Largest centered rectangle with the given aspect inside `width`x`height`.
    pub fn centered(width: u32, height: u32, aspect: AspectRatio) -> Self {
        let aspect_w = aspect.width.max(1);
        let aspect_h = aspect.height.max(1);
        let units = (width / aspect_w).min(height / aspect_h);
        let w = units * aspect_w;
        let h = units * aspect_h;
        Self {
            x: (width - w) / 2,
            y: (height - h) / 2,
            width: w,
            height: h,
        }
    }

    /// Shift and shrink the rectangle so it lies inside the image.
    pub fn clamped(self, width: u32, height: u32) -> Self {
        let w = self.width.min(width);
        let h = self.height.min(height);
        Self {
            x: self.x.min(width - w),
            y: self.y.min(height - h),
            width: w,
            height: h,
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Inputs for one crop, mirroring what a cropping activity is handed.
#[derive(Debug, Clone)]
pub struct CropRequest {
    pub source: ImageRef,
    pub destination: ImageRef,
    pub aspect: AspectRatio,
    pub max_result_size: (u32, u32),
    pub jpeg_quality: u8,
}

impl CropRequest {
    /// Square crop whose output never exceeds the source dimensions.
    pub const fn square(
        source: ImageRef,
        destination: ImageRef,
        source_size: (u32, u32),
        jpeg_quality: u8,
    ) -> Self {
        Self {
            source,
            destination,
            aspect: AspectRatio::SQUARE,
            max_result_size: source_size,
            jpeg_quality,
        }
    }
}

/// Crop `image` to `rect` and downscale when it exceeds `max_size`.
pub fn crop_to_result(
    image: &RgbaImage,
    rect: CropRect,
    aspect: AspectRatio,
    max_size: (u32, u32),
) -> Result<RgbaImage, CropError> {
    let (img_w, img_h) = image.dimensions();
    let rect = rect.clamped(img_w, img_h);
    if rect.is_empty() {
        return Err(CropError::EmptySelection);
    }
    if !aspect.matches(rect.width, rect.height) {
        return Err(CropError::AspectMismatch {
            width: rect.width,
            height: rect.height,
            aspect_w: aspect.width,
            aspect_h: aspect.height,
        });
    }
    let cropped = imageops::crop_imm(image, rect.x, rect.y, rect.width, rect.height).to_image();
    let (max_w, max_h) = (max_size.0.max(1), max_size.1.max(1));
    if cropped.width() <= max_w && cropped.height() <= max_h {
        return Ok(cropped);
    }
    let scale = (f64::from(max_w) / f64::from(cropped.width()))
        .min(f64::from(max_h) / f64::from(cropped.height()));
    let new_w = scaled_dim(cropped.width(), scale);
    let new_h = scaled_dim(cropped.height(), scale);
    Ok(imageops::resize(&cropped, new_w, new_h, FilterType::Triangle))
}

fn scaled_dim(value: u32, scale: f64) -> u32 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        (f64::from(value) * scale).floor().max(1.0) as u32
    }
}

/// Decode the request's source, crop it and write the destination as JPEG.
pub fn run_crop(
    request: &CropRequest,
    rect: CropRect,
    limits: &ImageLimits,
) -> Result<ImageRef, CropError> {
    let source_path = request.source.to_path();
    let source = decode_image_from_path(limits, &source_path)
        .map_err(|err| CropError::Source(format!("{err:#}")))?;
    let result = crop_to_result(&source, rect, request.aspect, request.max_result_size)?;

    let dest_path = request.destination.to_path();
    let file = File::create(&dest_path)
        .map_err(|err| CropError::Write(format!("{}: {err}", dest_path.display())))?;
    let mut writer = BufWriter::new(file);
    write_bitmap(
        &mut writer,
        &result,
        SaveFormat::Jpeg,
        request.jpeg_quality,
    )
    .map_err(|err| CropError::Write(format!("{err:#}")))?;
    writer
        .flush()
        .map_err(|err| CropError::Write(format!("{}: {err}", dest_path.display())))?;
    log::info!(
        "cropped {} to {}x{} at {}",
        request.source.display_name(),
        result.width(),
        result.height(),
        dest_path.display()
    );
    Ok(request.destination.clone())
}
