//! Editing screen state: decode, color filter, crop, save and overwrite.

use super::crop::CropSession;
use super::toast::Toasts;
use crate::config::{AppConfig, ImageLimits};
use crate::image::{
    ColorFilter, CropRequest, LoadedImage, apply_color_filter, decode_image_from_path,
};
use crate::image_ref::ImageRef;
use crate::storage::{StorageRepository, WriteRequest};
use anyhow::Context as _;
use image::RgbaImage;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

pub struct EditorScreen {
    storage: Arc<StorageRepository>,
    limits: ImageLimits,
    cache_dir: PathBuf,
    jpeg_quality: u8,
    current: ImageRef,
    /// Crop result in the cache dir that `current` points at, if any.
    crop_output: Option<PathBuf>,
    original: Option<RgbaImage>,
    filtered: Option<RgbaImage>,
    selection: ColorFilter,
    /// Bumped whenever the displayed bitmap changes.
    revision: u64,
    /// Replaced on every image change; a stale worker's send just fails.
    pending_decode: Option<Receiver<anyhow::Result<RgbaImage>>>,
    texture: Option<LoadedImage>,
    pub(crate) crop: Option<CropSession>,
    pub(crate) overwrite_prompt: Option<WriteRequest>,
}

impl EditorScreen {
    pub fn new(storage: Arc<StorageRepository>, config: &AppConfig, image: ImageRef) -> Self {
        let mut editor = Self {
            storage,
            limits: config.effective_image_limits(),
            cache_dir: config.resolved_cache_dir(),
            jpeg_quality: config.storage.effective_jpeg_quality(),
            current: image,
            crop_output: None,
            original: None,
            filtered: None,
            selection: ColorFilter::Normal,
            revision: 0,
            pending_decode: None,
            texture: None,
            crop: None,
            overwrite_prompt: None,
        };
        editor.start_decode();
        editor
    }

    pub const fn current(&self) -> &ImageRef {
        &self.current
    }

    pub const fn selection(&self) -> ColorFilter {
        self.selection
    }

    /// The bitmap on screen, which is also what gets saved.
    pub const fn displayed(&self) -> Option<&RgbaImage> {
        self.filtered.as_ref()
    }

    pub const fn is_loading(&self) -> bool {
        self.pending_decode.is_some()
    }

    /// Switch to another photo; the filter goes back to `Normal`.
    pub fn replace_image(&mut self, image: ImageRef) {
        self.discard_crop();
        self.release_crop_output();
        self.overwrite_prompt = None;
        self.current = image;
        self.selection = ColorFilter::Normal;
        self.original = None;
        self.filtered = None;
        self.revision += 1;
        self.start_decode();
    }

    fn start_decode(&mut self) {
        let path = self.current.to_path();
        let limits = self.limits.clone();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(decode_image_from_path(&limits, &path));
        });
        self.pending_decode = Some(rx);
        log::debug!("decoding {}", self.current);
    }

    pub fn select_filter(&mut self, filter: ColorFilter) {
        if self.selection == filter {
            return;
        }
        self.selection = filter;
        self.refilter();
    }

    fn refilter(&mut self) {
        self.filtered = self
            .original
            .as_ref()
            .map(|original| apply_color_filter(original, self.selection));
        self.revision += 1;
    }

    /// Texture of the displayed bitmap, re-uploaded when it changed.
    pub(crate) fn sync_texture(&mut self, ctx: &egui::Context) -> Option<&LoadedImage> {
        let Some(bitmap) = self.filtered.as_ref() else {
            self.texture = None;
            return None;
        };
        match self.texture.as_mut() {
            Some(texture) => texture.sync(bitmap, self.revision),
            None => {
                self.texture = Some(LoadedImage::from_bitmap(
                    ctx,
                    "editor-preview",
                    bitmap,
                    self.revision,
                ));
            }
        }
        self.texture.as_ref()
    }

    /// Upload the unfiltered source once for the crop tool.
    pub(crate) fn sync_crop_preview(&mut self, ctx: &egui::Context) {
        if let (Some(session), Some(original)) = (self.crop.as_mut(), self.original.as_ref()) {
            session
                .preview
                .get_or_insert_with(|| LoadedImage::from_bitmap(ctx, "crop-source", original, 0));
        }
    }

    /// Collect finished background work.
    pub fn poll(&mut self, toasts: &mut Toasts) {
        self.poll_decode(toasts);
        self.poll_crop(toasts);
    }

    fn poll_decode(&mut self, toasts: &mut Toasts) {
        let Some(rx) = self.pending_decode.take() else {
            return;
        };
        match rx.try_recv() {
            Ok(Ok(bitmap)) => {
                log::info!(
                    "loaded {} ({}x{})",
                    self.current.display_name(),
                    bitmap.width(),
                    bitmap.height()
                );
                self.original = Some(bitmap);
                self.refilter();
            }
            Ok(Err(err)) => {
                log::warn!("failed to load {}: {err:#}", self.current);
                toasts.warning(format!("Could not load image: {err}"));
            }
            Err(TryRecvError::Empty) => {
                self.pending_decode = Some(rx);
            }
            Err(TryRecvError::Disconnected) => {
                log::warn!("decode worker for {} disconnected", self.current);
                toasts.warning("Could not load image");
            }
        }
    }

    /// Write the displayed bitmap as a new photo.
    pub fn save(&self, toasts: &mut Toasts) -> Option<ImageRef> {
        let bitmap = self.displayed()?;
        match self.storage.save_new_image(bitmap) {
            Ok(uri) => {
                toasts.success("Photo saved");
                Some(uri)
            }
            Err(err) => {
                log::warn!("save failed: {err}");
                toasts.warning("Save error");
                None
            }
        }
    }

    /// Ask before replacing the file the current photo came from.
    pub fn request_overwrite(&mut self, toasts: &mut Toasts) {
        if self.displayed().is_none() {
            return;
        }
        match self.storage.create_write_request(&self.current) {
            Some(request) => self.overwrite_prompt = Some(request),
            None => {
                log::warn!("{} is outside the picture library", self.current);
                toasts.warning("Only photos in the picture library can be overwritten");
            }
        }
    }

    pub fn confirm_overwrite(&mut self, toasts: &mut Toasts) {
        let Some(request) = self.overwrite_prompt.take() else {
            return;
        };
        let Some(bitmap) = self.filtered.as_ref() else {
            return;
        };
        match self.storage.update_image(&request.uri, bitmap) {
            Ok(()) => toasts.success("Original photo updated"),
            Err(err) => {
                log::warn!("overwrite failed: {err}");
                toasts.warning(format!("Could not overwrite: {err}"));
            }
        }
    }

    pub fn cancel_overwrite(&mut self) {
        self.overwrite_prompt = None;
    }

    /// Open the crop tool on the current photo.
    pub fn start_crop(&mut self, toasts: &mut Toasts) {
        if self.crop.is_some() {
            return;
        }
        let Some(original) = self.original.as_ref() else {
            return;
        };
        let source_size = original.dimensions();
        match self.create_crop_destination() {
            Ok(destination) => {
                let request = CropRequest::square(
                    self.current.clone(),
                    destination,
                    source_size,
                    self.jpeg_quality,
                );
                self.crop = Some(CropSession::new(request, source_size));
            }
            Err(err) => {
                log::warn!("could not start cropping: {err:#}");
                toasts.warning(format!("Could not start cropping: {err}"));
            }
        }
    }

    fn create_crop_destination(&self) -> anyhow::Result<ImageRef> {
        fs::create_dir_all(&self.cache_dir)
            .with_context(|| format!("creating {}", self.cache_dir.display()))?;
        let file = tempfile::Builder::new()
            .prefix("cropped_")
            .suffix(".jpg")
            .tempfile_in(&self.cache_dir)
            .with_context(|| format!("creating temp file in {}", self.cache_dir.display()))?;
        let (_, path) = file.keep().context("keeping crop destination")?;
        Ok(ImageRef::from_path(&path))
    }

    pub fn apply_crop(&mut self) {
        if let Some(session) = self.crop.as_mut() {
            session.apply(&self.limits);
        }
    }

    pub fn cancel_crop(&mut self) {
        if self.crop.as_ref().is_some_and(CropSession::is_running) {
            return;
        }
        self.discard_crop();
    }

    fn discard_crop(&mut self) {
        if let Some(session) = self.crop.take() {
            session.discard();
        }
    }

    fn release_crop_output(&mut self) {
        if let Some(path) = self.crop_output.take()
            && let Err(err) = fs::remove_file(&path)
        {
            log::debug!("could not remove {}: {err}", path.display());
        }
    }

    fn poll_crop(&mut self, toasts: &mut Toasts) {
        let Some(result) = self.crop.as_mut().and_then(CropSession::poll) else {
            return;
        };
        match result {
            Ok(cropped) => {
                self.crop = None;
                let path = cropped.to_path();
                self.replace_image(cropped);
                self.crop_output = Some(path);
            }
            Err(err) => {
                log::warn!("crop failed: {err}");
                toasts.warning(format!("Crop error: {err}"));
                self.discard_crop();
            }
        }
    }
}

impl Drop for EditorScreen {
    fn drop(&mut self) {
        self.discard_crop();
        self.release_crop_output();
    }
}
