mod crop;
mod encode;
mod filters;
mod load;
mod texture;

pub use crop::{CropError, CropRect, CropRequest, run_crop};
pub use encode::write_bitmap;
pub use filters::{ColorFilter, apply_color_filter};
pub use load::decode_image_from_path;
pub use texture::LoadedImage;
