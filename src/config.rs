use std::fs;
use std::path::PathBuf;

use directories::{BaseDirs, ProjectDirs, UserDirs};
use serde::Deserialize;

const CONFIG_FILE_NAME: &str = "picchanger.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveFormat {
    Jpeg,
    Png,
}

impl SaveFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }

    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

/// Where and how edited photos are written.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Collection root; defaults to the user's picture directory.
    pub pictures_dir: Option<PathBuf>,
    pub relative_dir: String,
    pub name_prefix: String,
    pub format: SaveFormat,
    pub jpeg_quality: u8,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            pictures_dir: None,
            relative_dir: "MyApp".to_string(),
            name_prefix: "Cropped_".to_string(),
            format: SaveFormat::Jpeg,
            jpeg_quality: 100,
        }
    }
}

impl StorageConfig {
    pub fn resolved_pictures_dir(&self) -> PathBuf {
        if let Some(dir) = self.pictures_dir.as_ref() {
            return dir.clone();
        }
        if let Some(user_dirs) = UserDirs::new() {
            if let Some(pictures) = user_dirs.picture_dir() {
                return pictures.to_path_buf();
            }
            return user_dirs.home_dir().join("Pictures");
        }
        PathBuf::from("Pictures")
    }

    pub fn effective_jpeg_quality(&self) -> u8 {
        self.jpeg_quality.clamp(1, 100)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub index: u32,
    /// Frames dropped after opening the stream so exposure can settle.
    pub warmup_frames: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            warmup_frames: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log_level: String,
    pub image_limits: ImageLimits,
    pub storage: StorageConfig,
    pub camera: CameraConfig,
    /// Scratch directory for crop results; defaults to the platform cache dir.
    pub cache_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            image_limits: ImageLimits::default(),
            storage: StorageConfig::default(),
            camera: CameraConfig::default(),
            cache_dir: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> Self {
        for path in Self::candidate_paths() {
            if let Ok(contents) = fs::read_to_string(&path) {
                match Self::from_toml(&contents) {
                    Ok(cfg) => return cfg,
                    Err(err) => {
                        // Runs before the logger is configured.
                        eprintln!("Failed to parse config {}: {err}", path.display());
                    }
                }
            }
        }
        Self::default()
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<Self>(contents)
    }

    pub fn effective_image_limits(&self) -> ImageLimits {
        self.image_limits.sanitized()
    }

    pub fn resolved_cache_dir(&self) -> PathBuf {
        if let Some(dir) = self.cache_dir.as_ref() {
            return dir.clone();
        }
        ProjectDirs::from("dev", "PicChanger", "PicChanger").map_or_else(
            || std::env::temp_dir().join("picchanger"),
            |dirs| dirs.cache_dir().to_path_buf(),
        )
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(exe_path) = std::env::current_exe()
            && let Some(dir) = exe_path.parent()
        {
            paths.push(dir.join(CONFIG_FILE_NAME));
        }

        if let Some(proj_dirs) = ProjectDirs::from("dev", "PicChanger", "PicChanger") {
            paths.push(proj_dirs.config_dir().join(CONFIG_FILE_NAME));
        }

        if let Some(base_dirs) = BaseDirs::new() {
            paths.push(
                base_dirs
                    .config_dir()
                    .join("picchanger")
                    .join(CONFIG_FILE_NAME),
            );
        }

        paths
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImageLimits {
    pub image_dim: u32,
    pub total_pixels: u64,
    pub alloc_bytes: u64,
}

impl Default for ImageLimits {
    fn default() -> Self {
        Self {
            image_dim: 12_000,
            total_pixels: 80_000_000,       // ~80 MP
            alloc_bytes: 512 * 1024 * 1024, // 512 MiB
        }
    }
}

impl ImageLimits {
    pub fn sanitized(&self) -> Self {
        let dim = self.image_dim.clamp(64, 100_000);
        let pixels = self.total_pixels.clamp(1_000_000, 5_000_000_000); // 1 MP .. 5 GP
        let alloc = self
            .alloc_bytes
            .clamp(8 * 1024 * 1024, 8 * 1024 * 1024 * 1024); // 8 MiB .. 8 GiB
        Self {
            image_dim: dim,
            total_pixels: pixels,
            alloc_bytes: alloc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg = AppConfig::from_toml("").expect("parse");
        assert_eq!(cfg.storage.relative_dir, "MyApp");
        assert_eq!(cfg.storage.name_prefix, "Cropped_");
        assert_eq!(cfg.storage.format, SaveFormat::Jpeg);
        assert_eq!(cfg.storage.jpeg_quality, 100);
        assert_eq!(cfg.camera.index, 0);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = AppConfig::from_toml(
            r#"
            log_level = "debug"
            [storage]
            format = "png"
            pictures_dir = "/tmp/pics"
            "#,
        )
        .expect("parse");
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.storage.format, SaveFormat::Png);
        assert_eq!(cfg.storage.relative_dir, "MyApp");
        assert_eq!(
            cfg.storage.resolved_pictures_dir(),
            PathBuf::from("/tmp/pics")
        );
    }

    #[test]
    fn limits_are_clamped() {
        let limits = ImageLimits {
            image_dim: 1,
            total_pixels: 1,
            alloc_bytes: 1,
        }
        .sanitized();
        assert_eq!(limits.image_dim, 64);
        assert_eq!(limits.total_pixels, 1_000_000);
        assert_eq!(limits.alloc_bytes, 8 * 1024 * 1024);
    }

    #[test]
    fn jpeg_quality_is_clamped() {
        let storage = StorageConfig {
            jpeg_quality: 0,
            ..StorageConfig::default()
        };
        assert_eq!(storage.effective_jpeg_quality(), 1);
    }
}
