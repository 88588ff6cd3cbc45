//! Fakes and helpers shared by the screen tests.

use crate::camera::{CameraDevice, CameraError};
use crate::config::{SaveFormat, StorageConfig};
use crate::storage::{MediaStore, StorageRepository};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::Sender;
use std::time::Duration;

pub struct FakeCamera {
    granted: AtomicBool,
    answer: bool,
    fail: bool,
    pub requests: AtomicUsize,
    pub captures: AtomicUsize,
}

impl FakeCamera {
    pub const fn granted() -> Self {
        Self::new(true, true, false)
    }

    /// Not yet allowed; a request is answered with `answer`.
    pub const fn asks(answer: bool) -> Self {
        Self::new(false, answer, false)
    }

    pub const fn broken() -> Self {
        Self::new(true, true, true)
    }

    const fn new(granted: bool, answer: bool, fail: bool) -> Self {
        Self {
            granted: AtomicBool::new(granted),
            answer,
            fail,
            requests: AtomicUsize::new(0),
            captures: AtomicUsize::new(0),
        }
    }
}

impl CameraDevice for FakeCamera {
    fn permission_granted(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }

    fn request_permission(&self, reply: Sender<bool>) {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.granted.store(self.answer, Ordering::SeqCst);
        let _ = reply.send(self.answer);
    }

    fn capture_to(&self, destination: &Path) -> Result<(), CameraError> {
        assert!(self.permission_granted(), "capture without permission");
        self.captures.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            fs::write(destination, b"").map_err(|e| CameraError::Write(e.to_string()))?;
            return Err(CameraError::Device("no frames".to_string()));
        }
        fs::write(destination, b"jpeg").map_err(|e| CameraError::Write(e.to_string()))
    }
}

/// Storage rooted at `root` writing lossless PNG so pixels compare exactly.
pub fn test_storage(root: &Path) -> Arc<StorageRepository> {
    Arc::new(StorageRepository::new(
        MediaStore::new(root),
        StorageConfig {
            format: SaveFormat::Png,
            ..StorageConfig::default()
        },
    ))
}

/// Call `step` until it yields a value or a few seconds pass.
pub fn poll_until<T>(mut step: impl FnMut() -> Option<T>) -> Option<T> {
    for _ in 0..1000 {
        if let Some(value) = step() {
            return Some(value);
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    None
}
