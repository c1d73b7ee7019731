//! Tracking service handshake.
//!
//! The permission/connection handshake itself is owned by the host
//! environment; this module models its outcome, since a denied handshake
//! means the pose stream never starts.

use crate::session::FusionSession;
use crate::stream::{PoseSender, PoseStream};
use crate::types::{Capabilities, TrackingMode};
use crate::{FusionError, Result};

/// Channel capacity between the sensor callback and the fusion pump.
const STREAM_CAPACITY: usize = 256;

/// Outcome of the host environment's permission handshake.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted = 0,
    Denied = 1,
}

/// Identity and capabilities reported by the connected tracking service.
#[derive(Debug, Clone)]
pub struct ServiceInfo {
    pub version: String,
    pub capabilities: Capabilities,
}

impl ServiceInfo {
    pub fn new(version: impl Into<String>, capabilities: Capabilities) -> Self {
        Self {
            version: version.into(),
            capabilities,
        }
    }
}

/// A connected tracking service, ready to hand out fusion sessions.
pub struct TrackingService {
    info: ServiceInfo,
}

impl TrackingService {
    /// Complete the connection handshake. A denied permission outcome fails
    /// here, before any stream exists.
    pub fn handshake(info: ServiceInfo, permission: Permission) -> Result<TrackingService> {
        if permission == Permission::Denied {
            log::warn!("tracking service handshake denied");
            return Err(FusionError::PermissionDenied);
        }

        log::info!(
            "connected tracking service: version={} capabilities={:?}",
            info.version,
            info.capabilities
        );
        Ok(TrackingService { info })
    }

    pub fn info(&self) -> &ServiceInfo {
        &self.info
    }

    /// Start a fusion session for the given tracking mode.
    ///
    /// Returns the sender the service callback pushes samples into, and the
    /// session the render side reads. The mode must be covered by the
    /// service's capability bitmap.
    pub fn start_fusion(&self, mode: TrackingMode) -> Result<(PoseSender, FusionSession)> {
        let required = match mode {
            TrackingMode::MotionOnly => Capabilities::MOTION_TRACKING,
            TrackingMode::AreaDescription => Capabilities::AREA_LEARNING,
        };
        if !self.info.capabilities.contains(required) {
            return Err(FusionError::MissingCapability(required));
        }

        log::info!("starting fusion in {:?} mode", mode);
        let (sender, stream) = PoseStream::bounded(STREAM_CAPACITY);
        let session = FusionSession::start(stream)?;
        Ok((sender, session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denied_permission_fails_handshake() {
        let info = ServiceInfo::new("1.0", Capabilities::MOTION_TRACKING);
        let result = TrackingService::handshake(info, Permission::Denied);
        assert!(matches!(result, Err(FusionError::PermissionDenied)));
    }

    #[test]
    fn test_area_mode_requires_area_learning() {
        let info = ServiceInfo::new("1.0", Capabilities::MOTION_TRACKING);
        let service = TrackingService::handshake(info, Permission::Granted).unwrap();

        let result = service.start_fusion(TrackingMode::AreaDescription);
        assert!(matches!(
            result,
            Err(FusionError::MissingCapability(c)) if c == Capabilities::AREA_LEARNING
        ));
    }

    #[test]
    fn test_motion_mode_starts_with_motion_capability() {
        let info = ServiceInfo::new(
            "1.0",
            Capabilities::MOTION_TRACKING | Capabilities::AREA_LEARNING,
        );
        let service = TrackingService::handshake(info, Permission::Granted).unwrap();

        let (_sender, session) = service.start_fusion(TrackingMode::MotionOnly).unwrap();
        assert!(session.is_active());
        session.stop();
    }
}
