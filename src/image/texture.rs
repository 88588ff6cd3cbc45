use egui::{ColorImage, Context, TextureHandle, TextureOptions};
use image::RgbaImage;

/// Convert a straight-alpha bitmap into egui's pixel format.
pub fn to_color_image(bitmap: &RgbaImage) -> ColorImage {
    let (w, h) = bitmap.dimensions();
    ColorImage::from_rgba_unmultiplied([w as usize, h as usize], bitmap.as_raw())
}

/// GPU texture mirroring the bitmap currently on screen.
pub struct LoadedImage {
    pub size: [usize; 2],
    pub texture: TextureHandle,
    revision: u64,
}

impl LoadedImage {
    /// Upload `bitmap` as a new texture tagged with `revision`.
    pub fn from_bitmap(ctx: &Context, name: &str, bitmap: &RgbaImage, revision: u64) -> Self {
        let pixels = to_color_image(bitmap);
        let size = pixels.size;
        let texture = ctx.load_texture(name, pixels, TextureOptions::LINEAR);
        Self {
            size,
            texture,
            revision,
        }
    }

    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Replace the texture contents when the bitmap changed.
    pub fn sync(&mut self, bitmap: &RgbaImage, revision: u64) {
        if self.revision() == revision {
            return;
        }
        let pixels = to_color_image(bitmap);
        self.size = pixels.size;
        self.texture.set(pixels, TextureOptions::LINEAR);
        self.revision = revision;
    }
}
