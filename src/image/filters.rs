use egui::Color32;
use image::RgbaImage;
use rayon::prelude::*;

/// Minimum pixel count before parallelizing per-pixel transforms.
const PARALLEL_PIXEL_THRESHOLD: usize = 262_144; // 512x512

/// 4x5 row-major color matrix: each output channel is a weighted sum of the
/// input RGBA channels plus an offset in 0..=255 units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorMatrix {
    m: [f32; 20],
}

impl Default for ColorMatrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl ColorMatrix {
    pub const fn identity() -> Self {
        Self::scale(1.0, 1.0, 1.0, 1.0)
    }

    /// Diagonal matrix scaling each channel independently, no offsets.
    pub const fn scale(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        let mut m = [0.0; 20];
        m[0] = red;
        m[6] = green;
        m[12] = blue;
        m[18] = alpha;
        Self { m }
    }

    pub fn is_identity(&self) -> bool {
        self.m
            .iter()
            .zip(Self::identity().m.iter())
            .all(|(a, b)| (a - b).abs() <= f32::EPSILON)
    }

    /// Map one straight-alpha RGBA pixel.
    pub fn transform(&self, [r, g, b, a]: [u8; 4]) -> [u8; 4] {
        let input = [f32::from(r), f32::from(g), f32::from(b), f32::from(a)];
        let mut out = [0u8; 4];
        for (row, slot) in out.iter_mut().enumerate() {
            let coeffs = &self.m[row * 5..row * 5 + 5];
            let value = coeffs[3].mul_add(
                input[3],
                coeffs[2].mul_add(input[2], coeffs[1].mul_add(input[1], coeffs[0] * input[0])),
            ) + coeffs[4];
            *slot = channel_to_u8(value);
        }
        out
    }
}

fn channel_to_u8(value: f32) -> u8 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        value.round().clamp(0.0, 255.0) as u8
    }
}

/// The tint presets offered as swatches in the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorFilter {
    #[default]
    Normal,
    Red,
    Green,
    Blue,
}

impl ColorFilter {
    pub const ALL: [Self; 4] = [Self::Normal, Self::Red, Self::Green, Self::Blue];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Red => "Red",
            Self::Green => "Green",
            Self::Blue => "Blue",
        }
    }

    pub const fn matrix(self) -> ColorMatrix {
        match self {
            Self::Normal => ColorMatrix::identity(),
            Self::Red => ColorMatrix::scale(1.0, 0.0, 0.0, 1.0),
            Self::Green => ColorMatrix::scale(0.0, 1.0, 0.0, 1.0),
            Self::Blue => ColorMatrix::scale(0.0, 0.0, 1.0, 1.0),
        }
    }

    pub const fn swatch_color(self) -> Color32 {
        match self {
            Self::Normal => Color32::LIGHT_GRAY,
            Self::Red => Color32::RED,
            Self::Green => Color32::GREEN,
            Self::Blue => Color32::BLUE,
        }
    }
}

/// Apply a color filter to the original bitmap, producing a new bitmap.
pub fn apply_color_filter(base: &RgbaImage, filter: ColorFilter) -> RgbaImage {
    apply_color_matrix(base, &filter.matrix())
}

pub fn apply_color_matrix(base: &RgbaImage, matrix: &ColorMatrix) -> RgbaImage {
    let mut out = base.clone();
    if matrix.is_identity() || out.is_empty() {
        return out;
    }
    let pixel_count = (out.width() as usize) * (out.height() as usize);
    let map = |px: &mut [u8]| {
        let mapped = matrix.transform([px[0], px[1], px[2], px[3]]);
        px.copy_from_slice(&mapped);
    };
    if pixel_count >= PARALLEL_PIXEL_THRESHOLD {
        out.par_chunks_exact_mut(4).for_each(map);
    } else {
        out.chunks_exact_mut(4).for_each(map);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn sample() -> RgbaImage {
        RgbaImage::from_fn(3, 2, |x, y| {
            let v = u8::try_from(x * 40 + y * 90).unwrap_or(u8::MAX);
            Rgba([v, 255 - v, v / 2 + 30, 255])
        })
    }

    #[test]
    fn normal_is_pixel_identical() {
        let base = sample();
        assert_eq!(apply_color_filter(&base, ColorFilter::Normal), base);
    }

    #[test]
    fn single_channel_filters_zero_the_other_channels() {
        let base = sample();
        for (filter, keep) in [
            (ColorFilter::Red, 0usize),
            (ColorFilter::Green, 1),
            (ColorFilter::Blue, 2),
        ] {
            let filtered = apply_color_filter(&base, filter);
            assert_eq!(filtered.dimensions(), base.dimensions());
            for (src, dst) in base.pixels().zip(filtered.pixels()) {
                for channel in 0..3 {
                    let expected = if channel == keep { src[channel] } else { 0 };
                    assert_eq!(dst[channel], expected, "{filter:?} channel {channel}");
                }
                assert_eq!(dst[3], src[3]);
            }
        }
    }

    #[test]
    fn switching_back_to_normal_restores_original() {
        let base = sample();
        for filter in ColorFilter::ALL {
            let _tinted = apply_color_filter(&base, filter);
            assert_eq!(apply_color_filter(&base, ColorFilter::Normal), base);
        }
    }

    #[test]
    fn alpha_is_preserved() {
        let base = RgbaImage::from_pixel(2, 2, Rgba([200, 100, 50, 77]));
        let filtered = apply_color_filter(&base, ColorFilter::Green);
        assert!(filtered.pixels().all(|p| p.0 == [0, 100, 0, 77]));
    }

    #[test]
    fn offsets_and_mixing_are_clamped() {
        let mut m = [0.0; 20];
        // red' = 2*green + 10, alpha' = alpha
        m[1] = 2.0;
        m[4] = 10.0;
        m[18] = 1.0;
        let matrix = ColorMatrix { m };
        assert_eq!(matrix.transform([0, 20, 0, 255]), [50, 0, 0, 255]);
        assert_eq!(matrix.transform([0, 200, 0, 255]), [255, 0, 0, 255]);
    }

    #[test]
    fn large_images_take_the_parallel_path() {
        let base = RgbaImage::from_pixel(600, 500, Rgba([1, 2, 3, 255]));
        let filtered = apply_color_filter(&base, ColorFilter::Blue);
        assert!(filtered.pixels().all(|p| p.0 == [0, 0, 3, 255]));
    }
}
