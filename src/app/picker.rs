//! Start screen: choose a photo from disk or take one with the camera.

use super::toast::Toasts;
use crate::camera::{CameraDevice, CameraError};
use crate::image_ref::ImageRef;
use crate::storage::StorageRepository;
use std::fs;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

struct PendingCapture {
    rx: Receiver<Result<(), CameraError>>,
    destination: ImageRef,
}

enum CaptureState {
    Idle,
    AwaitingPermission(Receiver<bool>),
    Capturing(PendingCapture),
}

pub struct PickerScreen {
    camera: Arc<dyn CameraDevice>,
    storage: Arc<StorageRepository>,
    state: CaptureState,
}

impl PickerScreen {
    pub fn new(camera: Arc<dyn CameraDevice>, storage: Arc<StorageRepository>) -> Self {
        Self {
            camera,
            storage,
            state: CaptureState::Idle,
        }
    }

    pub const fn is_busy(&self) -> bool {
        !matches!(self.state, CaptureState::Idle)
    }

    pub const fn is_awaiting_permission(&self) -> bool {
        matches!(self.state, CaptureState::AwaitingPermission(_))
    }

    /// Capture right away when allowed, otherwise ask first.
    pub fn take_photo(&mut self, toasts: &mut Toasts) {
        if self.is_busy() {
            return;
        }
        if self.camera.permission_granted() {
            self.start_capture(toasts);
        } else {
            log::info!("requesting camera permission");
            toasts.info("Requesting camera permission");
            let (tx, rx) = mpsc::channel();
            self.state = CaptureState::AwaitingPermission(rx);
            self.camera.request_permission(tx);
        }
    }

    fn start_capture(&mut self, toasts: &mut Toasts) {
        let destination = match self.storage.create_capture_destination() {
            Ok(destination) => destination,
            Err(err) => {
                log::warn!("cannot create capture destination: {err}");
                toasts.warning(format!("Cannot prepare photo file: {err}"));
                self.state = CaptureState::Idle;
                return;
            }
        };
        let camera = Arc::clone(&self.camera);
        let path = destination.to_path();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(camera.capture_to(&path));
        });
        self.state = CaptureState::Capturing(PendingCapture { rx, destination });
    }

    /// Advance permission and capture work; returns the photo to open.
    pub fn poll(&mut self, toasts: &mut Toasts) -> Option<ImageRef> {
        match std::mem::replace(&mut self.state, CaptureState::Idle) {
            CaptureState::Idle => None,
            CaptureState::AwaitingPermission(rx) => {
                match rx.try_recv() {
                    Ok(true) => self.start_capture(toasts),
                    Ok(false) | Err(TryRecvError::Disconnected) => {
                        let err = CameraError::PermissionDenied;
                        log::warn!("{err}");
                        toasts.warning("Camera permission denied");
                    }
                    Err(TryRecvError::Empty) => {
                        self.state = CaptureState::AwaitingPermission(rx);
                    }
                }
                None
            }
            CaptureState::Capturing(task) => match task.rx.try_recv() {
                Ok(Ok(())) => Some(task.destination),
                Ok(Err(err)) => {
                    log::warn!("capture failed: {err}");
                    discard_destination(&task.destination);
                    toasts.warning(format!("Could not take photo: {err}"));
                    None
                }
                Err(TryRecvError::Empty) => {
                    self.state = CaptureState::Capturing(task);
                    None
                }
                Err(TryRecvError::Disconnected) => {
                    log::warn!("capture worker disconnected");
                    discard_destination(&task.destination);
                    toasts.warning("Could not take photo");
                    None
                }
            },
        }
    }
}

fn discard_destination(destination: &ImageRef) {
    let path = destination.to_path();
    if path.exists()
        && let Err(err) = fs::remove_file(&path)
    {
        log::debug!("could not remove {}: {err}", path.display());
    }
}
