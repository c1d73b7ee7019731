use nalgebra::{UnitQuaternion, Vector3};

/// Coordinate frame the tracking service expresses poses against.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameId {
    /// The device body frame.
    Device = 0,
    /// Origin established when tracking began this session.
    StartOfService = 1,
    /// Persisted map-relative origin, meaningful only after relocalization.
    AreaDescription = 2,
    /// Raw inertial sensor frame. Reported by the service but not fused here.
    Imu = 3,
}

/// Ordered (base, target) pair identifying what a pose sample measures
/// relative to what.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramePair {
    pub base: FrameId,
    pub target: FrameId,
}

impl FramePair {
    pub const fn new(base: FrameId, target: FrameId) -> Self {
        Self { base, target }
    }

    /// Device with respect to start of service.
    pub const fn device_wrt_start() -> Self {
        Self::new(FrameId::StartOfService, FrameId::Device)
    }

    /// Device with respect to the area description.
    pub const fn device_wrt_area() -> Self {
        Self::new(FrameId::AreaDescription, FrameId::Device)
    }

    /// Start of service with respect to the area description. Seeing this
    /// pair is what signals relocalization.
    pub const fn start_wrt_area() -> Self {
        Self::new(FrameId::AreaDescription, FrameId::StartOfService)
    }
}

/// Validity status attached to each pose sample by the tracking service.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PoseStatus {
    Valid = 0,
    Invalid = 1,
    Initializing = 2,
    #[default]
    Unknown = 3,
}

/// One timestamped 6DOF pose sample from the tracking service.
///
/// Immutable once received; the timestamp is monotonic seconds on the
/// service's clock.
#[derive(Debug, Clone, Copy)]
pub struct PoseSample {
    pub pair: FramePair,
    /// Translation in meters, sensor convention.
    pub translation: Vector3<f64>,
    /// Unit orientation quaternion, sensor convention.
    pub orientation: UnitQuaternion<f64>,
    pub status: PoseStatus,
    pub timestamp: f64,
}

impl PoseSample {
    pub fn new(
        pair: FramePair,
        translation: Vector3<f64>,
        orientation: UnitQuaternion<f64>,
        status: PoseStatus,
        timestamp: f64,
    ) -> Self {
        Self {
            pair,
            translation,
            orientation,
            status,
            timestamp,
        }
    }
}

/// Fused pose in the engine's coordinate convention, ready for a scene
/// graph transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnginePose {
    pub position: Vector3<f64>,
    pub rotation: UnitQuaternion<f64>,
}

impl EnginePose {
    pub fn identity() -> Self {
        Self {
            position: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
        }
    }
}

bitflags::bitflags! {
    /// Capability bitmap reported by the tracking service handshake.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[repr(C)]
    pub struct Capabilities: u32 {
        const MOTION_TRACKING  = 1 << 0;
        const AREA_LEARNING    = 1 << 1;
        const DRIFT_CORRECTION = 1 << 2;
        const DEPTH            = 1 << 3;
        const LEARNING_MODE    = 1 << 4;
    }
}

/// Tracking mode requested when starting fusion.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingMode {
    /// Track against the start-of-service origin only.
    MotionOnly = 0,
    /// Load a persisted area description and expect relocalization.
    AreaDescription = 1,
}
