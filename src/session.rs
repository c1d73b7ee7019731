//! Background fusion session.
//!
//! Owns the adapter on a dedicated pump thread and publishes the latest
//! fused pose as a single mutex-guarded snapshot, so the render side never
//! observes a torn read across frame slots.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::fusion::PoseFusionAdapter;
use crate::stream::PoseStream;
use crate::types::EnginePose;
use crate::{FusionError, Result};

#[derive(Debug, Clone, Copy, Default)]
struct Snapshot {
    pose: Option<EnginePose>,
    relocalized: bool,
}

struct Shared {
    snapshot: Mutex<Snapshot>,
    suspend_requested: AtomicBool,
}

/// Handle to an active fusion session.
///
/// A background pump thread drains the pose stream into a
/// [`PoseFusionAdapter`]; the render thread reads [`FusionSession::latest`]
/// once per frame.
pub struct FusionSession {
    shared: Arc<Shared>,
    stop_flag: Arc<AtomicBool>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl FusionSession {
    /// Start the fusion pump thread draining `stream`.
    pub fn start(stream: PoseStream) -> Result<FusionSession> {
        let shared = Arc::new(Shared {
            snapshot: Mutex::new(Snapshot::default()),
            suspend_requested: AtomicBool::new(false),
        });
        let stop_flag = Arc::new(AtomicBool::new(false));

        let shared_clone = shared.clone();
        let stop_clone = stop_flag.clone();
        let thread = std::thread::Builder::new()
            .name("posefuse-fusion".into())
            .spawn(move || {
                fusion_pump_loop(stream, shared_clone, stop_clone);
            })
            .map_err(|e| FusionError::SessionStart(format!("failed to spawn thread: {}", e)))?;

        Ok(FusionSession {
            shared,
            stop_flag,
            thread: Some(thread),
        })
    }

    /// Latest fused pose, if any sample has produced one yet.
    pub fn latest(&self) -> Option<EnginePose> {
        self.shared
            .snapshot
            .lock()
            .map(|snap| snap.pose)
            .unwrap_or(None)
    }

    /// Whether the adapter was relocalized as of the latest sample.
    pub fn is_relocalized(&self) -> bool {
        self.shared
            .snapshot
            .lock()
            .map(|snap| snap.relocalized)
            .unwrap_or(false)
    }

    /// Request a slot reset, applied by the pump thread before the next
    /// sample. Called on host pause/suspend.
    pub fn suspend(&self) {
        self.shared.suspend_requested.store(true, Ordering::Relaxed);
    }

    /// Check if the session is still active.
    pub fn is_active(&self) -> bool {
        !self.stop_flag.load(Ordering::Relaxed)
    }

    /// Stop the session and wait for the pump thread to finish.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for FusionSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// The fusion pump runs in a dedicated thread: it is the sole owner of the
/// adapter, so slot updates and the relocalization latch mutate as a group.
fn fusion_pump_loop(stream: PoseStream, shared: Arc<Shared>, stop_flag: Arc<AtomicBool>) {
    let mut adapter = PoseFusionAdapter::new();

    log::info!("fusion pump started");

    loop {
        if stop_flag.load(Ordering::Relaxed) {
            log::info!("fusion pump stopping (stop flag set)");
            break;
        }

        if shared.suspend_requested.swap(false, Ordering::Relaxed) {
            adapter.suspend();
        }

        // 100ms timeout to periodically check the stop and suspend flags.
        let sample = match stream.recv_timeout(Duration::from_millis(100)) {
            Ok(sample) => sample,
            Err(FusionError::Timeout) => continue,
            Err(_) => {
                log::info!("pose stream disconnected, stopping fusion pump");
                stop_flag.store(true, Ordering::Relaxed);
                break;
            }
        };

        if let Some(pose) = adapter.ingest(&sample) {
            if let Ok(mut snap) = shared.snapshot.lock() {
                snap.pose = Some(pose);
                snap.relocalized = adapter.is_relocalized();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FramePair, PoseSample, PoseStatus};
    use nalgebra::{UnitQuaternion, Vector3};

    fn valid(pair: FramePair, x: f64, ts: f64) -> PoseSample {
        PoseSample::new(
            pair,
            Vector3::new(x, 0.0, 0.0),
            UnitQuaternion::identity(),
            PoseStatus::Valid,
            ts,
        )
    }

    fn wait_for<F: Fn() -> bool>(cond: F) -> bool {
        for _ in 0..200 {
            if cond() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn test_samples_surface_in_latest() {
        let (sender, stream) = PoseStream::bounded(16);
        let session = FusionSession::start(stream).unwrap();

        assert!(session.latest().is_none());
        sender.push(valid(FramePair::device_wrt_start(), 2.0, 1.0));

        assert!(wait_for(|| session.latest().is_some()));
        let pose = session.latest().unwrap();
        assert!((pose.position.x - 2.0).abs() < 1e-12);
        assert!(!session.is_relocalized());

        session.stop();
    }

    #[test]
    fn test_relocalization_visible_in_snapshot() {
        let (sender, stream) = PoseStream::bounded(16);
        let session = FusionSession::start(stream).unwrap();

        sender.push(valid(FramePair::start_wrt_area(), 0.0, 1.0));
        assert!(wait_for(|| session.is_relocalized()));

        session.stop();
    }

    #[test]
    fn test_session_stops_when_sender_drops() {
        let (sender, stream) = PoseStream::bounded(4);
        let session = FusionSession::start(stream).unwrap();
        assert!(session.is_active());

        drop(sender);
        assert!(wait_for(|| !session.is_active()));
    }

    #[test]
    fn test_suspend_resets_first_delta() {
        let (sender, stream) = PoseStream::bounded(16);
        let session = FusionSession::start(stream).unwrap();

        sender.push(valid(FramePair::device_wrt_start(), 1.0, 1.0));
        assert!(wait_for(|| session.latest().is_some()));

        session.suspend();
        // The reset is applied between samples; the next sample still fuses.
        sender.push(valid(FramePair::device_wrt_start(), 3.0, 2.0));
        assert!(wait_for(|| {
            session
                .latest()
                .map(|p| (p.position.x - 3.0).abs() < 1e-12)
                .unwrap_or(false)
        }));

        session.stop();
    }
}
