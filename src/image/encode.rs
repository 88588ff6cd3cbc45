use crate::config::SaveFormat;
use anyhow::Context as _;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ImageEncoder, RgbaImage};
use std::io::Write;

/// Encode a bitmap into `writer`. JPEG output drops the alpha channel.
pub fn write_bitmap<W: Write>(
    writer: W,
    bitmap: &RgbaImage,
    format: SaveFormat,
    jpeg_quality: u8,
) -> anyhow::Result<()> {
    let (width, height) = bitmap.dimensions();
    match format {
        SaveFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgba8(bitmap.clone()).into_rgb8();
            JpegEncoder::new_with_quality(writer, jpeg_quality.clamp(1, 100))
                .write_image(&rgb, width, height, image::ExtendedColorType::Rgb8)
                .context("Failed to encode JPEG")
        }
        SaveFormat::Png => PngEncoder::new(writer)
            .write_image(bitmap, width, height, image::ExtendedColorType::Rgba8)
            .context("Failed to encode PNG"),
    }
}
