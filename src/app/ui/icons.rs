//! Unicode UI icon constants.
//!
//! Uses a BMP-only "safe" subset for broad font coverage (no emoji fonts needed).

pub const ICON_GALLERY: &str = "▦";
pub const ICON_CAMERA: &str = "◎";
pub const ICON_BACK: &str = "←";
pub const ICON_CLOSE: &str = "✖";
pub const ICON_CROP: &str = "▣";
pub const ICON_SAVE: &str = "⇩";
pub const ICON_OVERWRITE: &str = "↻";
pub const ICON_APPLY: &str = "✔";
