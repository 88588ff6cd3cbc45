use super::{EntryId, MediaStore, StorageError};
use crate::config::{SaveFormat, StorageConfig};
use crate::image::write_bitmap;
use crate::image_ref::ImageRef;
use chrono::{Local, Utc};
use image::RgbaImage;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Consent token for overwriting an entry of the picture collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRequest {
    pub id: EntryId,
    pub uri: ImageRef,
}

/// Creates, finalizes and overwrites photos in the picture collection.
#[derive(Debug)]
pub struct StorageRepository {
    media: MediaStore,
    config: StorageConfig,
}

impl StorageRepository {
    pub const fn new(media: MediaStore, config: StorageConfig) -> Self {
        Self { media, config }
    }

    pub const fn media(&self) -> &MediaStore {
        &self.media
    }

    /// Write `bitmap` as a new photo and return its reference.
    pub fn save_new_image(&self, bitmap: &RgbaImage) -> Result<ImageRef, StorageError> {
        let format = self.config.format;
        let display_name = format!(
            "{}{}.{}",
            self.config.name_prefix,
            Utc::now().timestamp_millis(),
            format.extension()
        );
        let mut entry = self
            .media
            .insert(&display_name, &self.config.relative_dir)?;
        let target = entry.target().to_path_buf();
        {
            let mut writer = entry.writer();
            write_bitmap(
                &mut writer,
                bitmap,
                format,
                self.config.effective_jpeg_quality(),
            )
            .map_err(|err| StorageError::Encode(format!("{err:#}")))?;
            writer
                .flush()
                .map_err(|source| StorageError::io(&target, source))?;
        }
        let uri = self.media.publish(entry)?;
        log::info!(
            "saved {}x{} {} to {}",
            bitmap.width(),
            bitmap.height(),
            format.mime_type(),
            target.display()
        );
        Ok(uri)
    }

    /// Ask for permission to overwrite `reference`.
    ///
    /// Only entries of the managed collection can be overwritten; anything
    /// else yields `None`.
    pub fn create_write_request(&self, reference: &ImageRef) -> Option<WriteRequest> {
        let id = self.media.entry_id(reference)?;
        let uri = self.media.entry_uri(&id);
        Some(WriteRequest { id, uri })
    }

    /// Overwrite an existing photo in place.
    pub fn update_image(
        &self,
        reference: &ImageRef,
        bitmap: &RgbaImage,
    ) -> Result<(), StorageError> {
        let path = reference.to_path();
        let metadata = fs::metadata(&path).map_err(|source| StorageError::io(&path, source))?;
        if metadata.permissions().readonly() {
            return Err(StorageError::PermissionDenied(path));
        }
        let format = format_for_path(&path);
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::Builder::new()
            .prefix(".pending-")
            .tempfile_in(dir)
            .map_err(|source| StorageError::io(dir, source))?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            write_bitmap(
                &mut writer,
                bitmap,
                format,
                self.config.effective_jpeg_quality(),
            )
            .map_err(|err| StorageError::Encode(format!("{err:#}")))?;
            writer
                .flush()
                .map_err(|source| StorageError::io(&path, source))?;
        }
        tmp.as_file()
            .set_permissions(metadata.permissions())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|source| StorageError::io(&path, source))?;
        tmp.persist(&path)
            .map_err(|err| StorageError::io(&path, err.error))?;
        log::info!("overwrote {}", path.display());
        Ok(())
    }

    /// Reserve `JPEG_<timestamp>_.jpg` at the collection root for a camera shot.
    pub fn create_capture_destination(&self) -> Result<ImageRef, StorageError> {
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = self.media.reserve(&format!("JPEG_{stamp}_.jpg"), "")?;
        Ok(ImageRef::from_path(&path))
    }
}

fn format_for_path(path: &Path) -> SaveFormat {
    let is_png = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
    if is_png { SaveFormat::Png } else { SaveFormat::Jpeg }
}
