//! C FFI layer for posefuse.
//!
//! Provides an opaque handle-based API for host engines embedding the
//! adapter directly on their sensor callback thread. The generated C header
//! is written to `include/posefuse.h` by cbindgen.

use crate::error::LastError;
use crate::fusion::PoseFusionAdapter;
use crate::types::{EnginePose, FrameId, FramePair, PoseSample, PoseStatus};
use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use std::ffi::{c_char, c_int};

/// Process-wide last error message for C consumers.
static LAST_ERROR: LastError = LastError::new();

/// Opaque adapter handle for C consumers.
pub struct PfAdapter(PoseFusionAdapter);

/// Pose sample in C-compatible layout.
#[repr(C)]
pub struct PfSample {
    /// Base frame: 0 = device, 1 = start of service, 2 = area description,
    /// 3 = IMU.
    pub base_frame: c_int,
    /// Target frame, same encoding as `base_frame`.
    pub target_frame: c_int,
    /// Translation [x, y, z] in meters.
    pub translation: [f64; 3],
    /// Orientation quaternion [qx, qy, qz, qw].
    pub orientation: [f64; 4],
    /// Status: 0 = valid, 1 = invalid, 2 = initializing, 3 = unknown.
    pub status: c_int,
    /// Monotonic timestamp in seconds.
    pub timestamp: f64,
}

/// Fused pose in C-compatible layout.
#[repr(C)]
pub struct PfPose {
    /// Position [x, y, z] in engine convention.
    pub position: [f64; 3],
    /// Rotation quaternion [qx, qy, qz, qw] in engine convention.
    pub rotation: [f64; 4],
}

fn frame_id(value: c_int) -> Option<FrameId> {
    match value {
        0 => Some(FrameId::Device),
        1 => Some(FrameId::StartOfService),
        2 => Some(FrameId::AreaDescription),
        3 => Some(FrameId::Imu),
        _ => None,
    }
}

fn pose_status(value: c_int) -> Option<PoseStatus> {
    match value {
        0 => Some(PoseStatus::Valid),
        1 => Some(PoseStatus::Invalid),
        2 => Some(PoseStatus::Initializing),
        3 => Some(PoseStatus::Unknown),
        _ => None,
    }
}

fn write_pose(out: *mut PfPose, pose: &EnginePose) {
    if out.is_null() {
        return;
    }
    let q = pose.rotation.quaternion();
    let c_pose = PfPose {
        position: [pose.position.x, pose.position.y, pose.position.z],
        rotation: [q.i, q.j, q.k, q.w],
    };
    unsafe { out.write(c_pose) };
}

/// Create a fusion adapter. Free with `pf_adapter_free`.
#[no_mangle]
pub extern "C" fn pf_adapter_new() -> *mut PfAdapter {
    Box::into_raw(Box::new(PfAdapter(PoseFusionAdapter::new())))
}

/// Free an adapter.
///
/// # Safety
/// `adapter` must be a pointer returned by `pf_adapter_new`, or null.
#[no_mangle]
pub unsafe extern "C" fn pf_adapter_free(adapter: *mut PfAdapter) {
    if !adapter.is_null() {
        drop(Box::from_raw(adapter));
    }
}

/// Ingest one pose sample.
///
/// Returns 0 when a fused pose was produced (and written to `pose` if
/// non-null), 1 when the sample's frame pair is not tracked and was
/// ignored, or -1 on error (null handle/sample or out-of-range enum;
/// check `pf_last_error`). An erroneous call mutates no adapter state.
///
/// # Safety
/// `adapter`, `sample`, and `pose` must be valid pointers, or null.
#[no_mangle]
pub unsafe extern "C" fn pf_adapter_ingest(
    adapter: *mut PfAdapter,
    sample: *const PfSample,
    pose: *mut PfPose,
) -> c_int {
    if adapter.is_null() {
        LAST_ERROR.set_message("null adapter handle");
        return -1;
    }
    if sample.is_null() {
        log::warn!("ignoring null pose sample");
        LAST_ERROR.set_message("null pose sample");
        return -1;
    }
    let adapter = &mut *adapter;
    let sample = &*sample;

    let (base, target, status) = match (
        frame_id(sample.base_frame),
        frame_id(sample.target_frame),
        pose_status(sample.status),
    ) {
        (Some(base), Some(target), Some(status)) => (base, target, status),
        _ => {
            log::warn!(
                "ignoring malformed pose sample: base={} target={} status={}",
                sample.base_frame,
                sample.target_frame,
                sample.status
            );
            LAST_ERROR.set_message("malformed pose sample");
            return -1;
        }
    };

    let [qx, qy, qz, qw] = sample.orientation;
    let parsed = PoseSample::new(
        FramePair::new(base, target),
        Vector3::new(
            sample.translation[0],
            sample.translation[1],
            sample.translation[2],
        ),
        UnitQuaternion::from_quaternion(Quaternion::new(qw, qx, qy, qz)),
        status,
        sample.timestamp,
    );

    match adapter.0.ingest(&parsed) {
        Some(fused) => {
            write_pose(pose, &fused);
            0
        }
        None => 1,
    }
}

/// Write the most recent fused pose to `pose`. Returns 0 on success, -1 on
/// a null handle.
///
/// # Safety
/// `adapter` and `pose` must be valid pointers, or null.
#[no_mangle]
pub unsafe extern "C" fn pf_adapter_last(adapter: *const PfAdapter, pose: *mut PfPose) -> c_int {
    if adapter.is_null() {
        LAST_ERROR.set_message("null adapter handle");
        return -1;
    }
    let adapter = &*adapter;
    write_pose(pose, &adapter.0.last_pose());
    0
}

/// Whether the adapter is currently relocalized.
///
/// # Safety
/// `adapter` must be a valid adapter pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn pf_adapter_is_relocalized(adapter: *const PfAdapter) -> bool {
    if adapter.is_null() {
        return false;
    }
    let adapter = &*adapter;
    adapter.0.is_relocalized()
}

/// Reset all frame slots to startup defaults (host pause/suspend hook).
///
/// # Safety
/// `adapter` must be a valid adapter pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn pf_adapter_suspend(adapter: *mut PfAdapter) {
    if !adapter.is_null() {
        let adapter = &mut *adapter;
        adapter.0.suspend();
    }
}

/// Get the last error message. Returns NULL if no error.
/// The returned pointer is valid until the next posefuse API call.
#[no_mangle]
pub extern "C" fn pf_last_error() -> *const c_char {
    LAST_ERROR.as_ptr()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_sample() -> PfSample {
        PfSample {
            base_frame: 1,
            target_frame: 0,
            translation: [0.1, 0.2, 0.3],
            orientation: [0.0, 0.0, 0.0, 1.0],
            status: 0,
            timestamp: 1.0,
        }
    }

    #[test]
    fn test_ingest_round_trip() {
        let adapter = pf_adapter_new();
        let sample = valid_sample();
        let mut pose = PfPose {
            position: [0.0; 3],
            rotation: [0.0; 4],
        };

        let rc = unsafe { pf_adapter_ingest(adapter, &sample, &mut pose) };
        assert_eq!(rc, 0);
        assert!((pose.position[0] - 0.1).abs() < 1e-12);
        assert!((pose.position[1] - 0.3).abs() < 1e-12);
        assert!((pose.position[2] - 0.2).abs() < 1e-12);

        unsafe { pf_adapter_free(adapter) };
    }

    #[test]
    fn test_null_sample_is_rejected() {
        let adapter = pf_adapter_new();
        let rc = unsafe { pf_adapter_ingest(adapter, std::ptr::null(), std::ptr::null_mut()) };
        assert_eq!(rc, -1);
        assert!(!pf_last_error().is_null());

        // State untouched: the next valid sample is still the slot's first.
        let sample = valid_sample();
        let rc = unsafe { pf_adapter_ingest(adapter, &sample, std::ptr::null_mut()) };
        assert_eq!(rc, 0);

        unsafe { pf_adapter_free(adapter) };
    }

    #[test]
    fn test_untracked_pair_returns_ignored() {
        let adapter = pf_adapter_new();
        let mut sample = valid_sample();
        sample.base_frame = 0;
        sample.target_frame = 0;

        let rc = unsafe { pf_adapter_ingest(adapter, &sample, std::ptr::null_mut()) };
        assert_eq!(rc, 1);

        unsafe { pf_adapter_free(adapter) };
    }

    #[test]
    fn test_out_of_range_enum_is_malformed() {
        let adapter = pf_adapter_new();
        let mut sample = valid_sample();
        sample.status = 42;

        let rc = unsafe { pf_adapter_ingest(adapter, &sample, std::ptr::null_mut()) };
        assert_eq!(rc, -1);

        unsafe { pf_adapter_free(adapter) };
    }
}
