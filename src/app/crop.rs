//! Interactive square crop over the current photo.

use crate::config::ImageLimits;
use crate::image::{CropError, CropRect, CropRequest, LoadedImage, run_crop};
use crate::image_ref::ImageRef;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

/// Smallest selectable side in source pixels.
pub const MIN_CROP_SIDE: u32 = 16;

pub struct CropSession {
    request: CropRequest,
    source_size: (u32, u32),
    rect: CropRect,
    pending: Option<Receiver<Result<ImageRef, CropError>>>,
    /// Set once the session is abandoned; a late worker removes its output.
    cancelled: Arc<AtomicBool>,
    /// Fractional drag left over after snapping to whole pixels.
    drag_residual: (f32, f32),
    pub(crate) preview: Option<LoadedImage>,
}

impl CropSession {
    pub fn new(request: CropRequest, source_size: (u32, u32)) -> Self {
        let rect = CropRect::centered(source_size.0, source_size.1, request.aspect);
        Self {
            request,
            source_size,
            rect,
            pending: None,
            cancelled: Arc::new(AtomicBool::new(false)),
            drag_residual: (0.0, 0.0),
            preview: None,
        }
    }

    pub const fn request(&self) -> &CropRequest {
        &self.request
    }

    pub const fn rect(&self) -> CropRect {
        self.rect
    }

    pub const fn source_size(&self) -> (u32, u32) {
        self.source_size
    }

    pub fn max_side(&self) -> u32 {
        self.source_size.0.min(self.source_size.1)
    }

    pub fn min_side(&self) -> u32 {
        MIN_CROP_SIDE.min(self.max_side())
    }

    pub const fn is_running(&self) -> bool {
        self.pending.is_some()
    }

    /// Resize the square around its center.
    pub fn set_side(&mut self, side: u32) {
        let side = side.clamp(self.min_side(), self.max_side());
        let center_x = self.rect.x + self.rect.width / 2;
        let center_y = self.rect.y + self.rect.height / 2;
        let (w, h) = self.source_size;
        let x = center_x.saturating_sub(side / 2).min(w - side);
        let y = center_y.saturating_sub(side / 2).min(h - side);
        self.rect = CropRect {
            x,
            y,
            width: side,
            height: side,
        };
    }

    /// Move the square by a delta in source pixels, staying inside the image.
    pub fn drag_by(&mut self, dx: f32, dy: f32) {
        let total_x = self.drag_residual.0 + dx;
        let total_y = self.drag_residual.1 + dy;
        let step_x = total_x.trunc();
        let step_y = total_y.trunc();
        self.drag_residual = (total_x - step_x, total_y - step_y);
        let (w, h) = self.source_size;
        self.rect.x = shifted(self.rect.x, step_x, w - self.rect.width);
        self.rect.y = shifted(self.rect.y, step_y, h - self.rect.height);
    }

    /// Start writing the crop on a worker thread.
    pub fn apply(&mut self, limits: &ImageLimits) {
        if self.is_running() {
            return;
        }
        let request = self.request.clone();
        let rect = self.rect;
        let limits = limits.clone();
        let cancelled = Arc::clone(&self.cancelled);
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(crop_unless_cancelled(&request, rect, &limits, &cancelled));
        });
        self.pending = Some(rx);
    }

    /// Result of the apply worker, once available.
    pub fn poll(&mut self) -> Option<Result<ImageRef, CropError>> {
        let rx = self.pending.take()?;
        match rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => {
                self.pending = Some(rx);
                None
            }
            Err(TryRecvError::Disconnected) => Some(Err(CropError::Write(
                "crop worker disconnected".to_string(),
            ))),
        }
    }

    /// Remove the reserved destination file of an abandoned session.
    pub fn discard(self) {
        self.cancelled.store(true, Ordering::SeqCst);
        remove_quietly(&self.request.destination.to_path());
    }
}

fn crop_unless_cancelled(
    request: &CropRequest,
    rect: CropRect,
    limits: &ImageLimits,
    cancelled: &AtomicBool,
) -> Result<ImageRef, CropError> {
    let result = run_crop(request, rect, limits);
    if cancelled.load(Ordering::SeqCst) {
        log::debug!("crop of {} was abandoned", request.source.display_name());
        remove_quietly(&request.destination.to_path());
    }
    result
}

fn shifted(value: u32, step: f32, max: u32) -> u32 {
    #[allow(clippy::cast_possible_truncation)]
    let moved = i64::from(value) + step as i64;
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    {
        moved.clamp(0, i64::from(max)) as u32
    }
}

fn remove_quietly(path: &Path) {
    if let Err(err) = fs::remove_file(path) {
        log::debug!("could not remove {}: {err}", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::testing::poll_until;

    fn session(width: u32, height: u32) -> CropSession {
        let request = CropRequest::square(
            ImageRef::from_path(Path::new("/tmp/src.png")),
            ImageRef::from_path(Path::new("/tmp/cropped_x.jpg")),
            (width, height),
            90,
        );
        CropSession::new(request, (width, height))
    }

    #[test]
    fn starts_with_largest_centered_square() {
        let s = session(200, 100);
        assert_eq!(
            s.rect(),
            CropRect {
                x: 50,
                y: 0,
                width: 100,
                height: 100
            }
        );
        assert_eq!(s.request().max_result_size, (200, 100));
    }

    #[test]
    fn resizing_keeps_square_inside_image() {
        let mut s = session(200, 100);
        s.set_side(40);
        let r = s.rect();
        assert_eq!((r.width, r.height), (40, 40));
        assert_eq!((r.x, r.y), (80, 30));

        s.set_side(500);
        let r = s.rect();
        assert_eq!((r.width, r.height), (100, 100));
        assert!(r.x + r.width <= 200 && r.y + r.height <= 100);

        s.set_side(1);
        assert_eq!(s.rect().width, MIN_CROP_SIDE);
    }

    #[test]
    fn dragging_is_clamped_to_the_image() {
        let mut s = session(200, 100);
        s.set_side(50);
        s.drag_by(-1000.0, -1000.0);
        assert_eq!((s.rect().x, s.rect().y), (0, 0));
        s.drag_by(1000.0, 1000.0);
        assert_eq!((s.rect().x, s.rect().y), (150, 50));
    }

    #[test]
    fn small_drags_accumulate() {
        let mut s = session(200, 100);
        s.set_side(50);
        let start = s.rect().x;
        for _ in 0..4 {
            s.drag_by(0.5, 0.0);
        }
        assert_eq!(s.rect().x, start + 2);
    }

    #[test]
    fn tiny_images_allow_their_full_side() {
        let s = session(8, 12);
        assert_eq!(s.min_side(), 8);
        assert_eq!(s.rect().width, 8);
    }

    #[test]
    fn apply_writes_square_result() {
        let dir = tempfile::tempdir().expect("temp dir");
        let src = dir.path().join("src.png");
        image::RgbaImage::from_pixel(60, 40, image::Rgba([200, 10, 10, 255]))
            .save(&src)
            .expect("seed");
        let dest = dir.path().join("cropped_1.jpg");
        let request = CropRequest::square(
            ImageRef::from_path(&src),
            ImageRef::from_path(&dest),
            (60, 40),
            90,
        );
        let mut s = CropSession::new(request, (60, 40));
        s.set_side(30);
        s.apply(&ImageLimits::default());
        assert!(s.is_running());

        let result = poll_until(|| s.poll()).expect("finished").expect("crop ok");
        assert_eq!(result.to_path(), dest);
        let written = image::open(&dest).expect("decode");
        assert_eq!((written.width(), written.height()), (30, 30));
    }

    #[test]
    fn abandoned_worker_removes_its_output() {
        let dir = tempfile::tempdir().expect("temp dir");
        let src = dir.path().join("src.png");
        image::RgbaImage::from_pixel(20, 20, image::Rgba([10, 200, 10, 255]))
            .save(&src)
            .expect("seed");
        let dest = dir.path().join("cropped_2.jpg");
        let request = CropRequest::square(
            ImageRef::from_path(&src),
            ImageRef::from_path(&dest),
            (20, 20),
            90,
        );
        let rect = CropRect::centered(20, 20, request.aspect);

        let limits = ImageLimits::default();
        let kept = crop_unless_cancelled(&request, rect, &limits, &AtomicBool::new(false));
        assert!(kept.is_ok());
        assert!(dest.exists());

        let dropped = crop_unless_cancelled(&request, rect, &limits, &AtomicBool::new(true));
        assert!(dropped.is_ok());
        assert!(!dest.exists());
    }

    #[test]
    fn discard_marks_the_session_cancelled() {
        let dir = tempfile::tempdir().expect("temp dir");
        let dest = dir.path().join("cropped_3.jpg");
        fs::write(&dest, b"").expect("reserve");
        let request = CropRequest::square(
            ImageRef::from_path(&dir.path().join("src.png")),
            ImageRef::from_path(&dest),
            (20, 20),
            90,
        );
        let s = CropSession::new(request, (20, 20));
        let cancelled = Arc::clone(&s.cancelled);
        s.discard();
        assert!(cancelled.load(Ordering::SeqCst));
        assert!(!dest.exists());
    }
}
