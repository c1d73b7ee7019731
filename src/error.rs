use std::fmt;

use crate::types::Capabilities;

/// Errors that can occur when wiring up or consuming a fusion session.
#[derive(Debug, thiserror::Error)]
pub enum FusionError {
    #[error("tracking service permission denied")]
    PermissionDenied,

    #[error("tracking service missing capability: {0:?}")]
    MissingCapability(Capabilities),

    #[error("pose stream stopped")]
    StreamStopped,

    #[error("timeout waiting for pose data")]
    Timeout,

    #[error("fusion session failed to start: {0}")]
    SessionStart(String),
}

/// Thread-safe last-error storage for the C FFI layer.
pub(crate) struct LastError {
    message: std::sync::Mutex<String>,
}

impl LastError {
    pub const fn new() -> Self {
        Self {
            message: std::sync::Mutex::new(String::new()),
        }
    }

    pub fn set_message(&self, text: &str) {
        if let Ok(mut msg) = self.message.lock() {
            *msg = fmt::format(format_args!("{}\0", text));
        }
    }

    pub fn as_ptr(&self) -> *const std::ffi::c_char {
        match self.message.lock() {
            Ok(msg) if !msg.is_empty() => msg.as_ptr() as *const std::ffi::c_char,
            _ => std::ptr::null(),
        }
    }
}
