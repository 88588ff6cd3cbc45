//! Short-lived notifications drawn over the bottom of the window.

use std::time::{Duration, Instant};

const SHORT_TOAST: Duration = Duration::from_secs(2);
const LONG_TOAST: Duration = Duration::from_secs(5);
const LONG_MESSAGE_CHARS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Warning,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    expires_at: Instant,
}

/// Display time for `message`; longer texts stay up longer.
pub fn toast_lifetime(message: &str) -> Duration {
    if message.chars().count() > LONG_MESSAGE_CHARS {
        LONG_TOAST
    } else {
        SHORT_TOAST
    }
}

#[derive(Debug, Default)]
pub struct Toasts {
    items: Vec<Toast>,
}

impl Toasts {
    pub fn push_at(&mut self, kind: ToastKind, message: impl Into<String>, now: Instant) {
        let message = message.into();
        let expires_at = now + toast_lifetime(&message);
        self.items.push(Toast {
            message,
            kind,
            expires_at,
        });
    }

    pub fn push(&mut self, kind: ToastKind, message: impl Into<String>) {
        self.push_at(kind, message, Instant::now());
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(ToastKind::Info, message);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(ToastKind::Success, message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(ToastKind::Warning, message);
    }

    /// Drop every toast that expired before `now`.
    pub fn prune(&mut self, now: Instant) {
        self.items.retain(|toast| toast.expires_at > now);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Toast> {
        self.items.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn last(&self) -> Option<&Toast> {
        self.items.last()
    }

    pub fn next_expiry(&self) -> Option<Instant> {
        self.items.iter().map(|toast| toast.expires_at).min()
    }
}

impl<'a> IntoIterator for &'a Toasts {
    type Item = &'a Toast;
    type IntoIter = std::slice::Iter<'a, Toast>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
