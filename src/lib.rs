//! # posefuse - Pose Fusion Adapter for 6DOF Motion-Tracking Streams
//!
//! Consumes timestamped 6DOF pose samples from a motion-tracking service,
//! selects the most authoritative frame relation, and converts the result
//! into the consuming engine's coordinate convention. Provides:
//! - Frame-slot bookkeeping for the three tracked relations
//!   (device/start-of-service, device/area-description, start/area-description)
//! - A relocalization latch that switches pose selection to the
//!   area-description frame once the device recognizes a persisted area
//! - Channel-based sample hand-off and a background fusion thread
//! - C FFI for integration with C/C++/Unity/Swift
//!
//! ## Quick Start
//! ```no_run
//! use posefuse::{Capabilities, Permission, ServiceInfo, TrackingMode, TrackingService};
//!
//! let info = ServiceInfo::new("1.0", Capabilities::MOTION_TRACKING);
//! let service = TrackingService::handshake(info, Permission::Granted).unwrap();
//! let (sender, session) = service.start_fusion(TrackingMode::MotionOnly).unwrap();
//! // the sensor callback pushes samples through `sender`;
//! // the render loop reads `session.latest()` each frame.
//! # let _ = (sender, session);
//! ```

pub mod error;
pub mod types;
pub mod basis;
pub mod fusion;
pub mod stream;
pub mod session;
pub mod service;
pub mod ffi;

pub use error::FusionError;
pub use types::*;
pub use fusion::PoseFusionAdapter;
pub use stream::{PoseSender, PoseStream};
pub use session::FusionSession;
pub use service::{Permission, ServiceInfo, TrackingService};

/// Result type alias for posefuse operations.
pub type Result<T> = std::result::Result<T, FusionError>;
