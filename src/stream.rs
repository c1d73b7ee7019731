//! Channel hand-off between the sensor callback context and the fusion
//! thread.
//!
//! The tracking service owns sample transport; it is handed a [`PoseSender`]
//! and pushes into it from its callback thread. The fusion side drains the
//! matching [`PoseStream`].

use crossbeam_channel::{Receiver, Sender};
use std::time::Duration;

use crate::types::PoseSample;
use crate::{FusionError, Result};

/// Producer half handed to the tracking service's callback.
#[derive(Clone)]
pub struct PoseSender {
    sender: Sender<PoseSample>,
}

impl PoseSender {
    /// Push a sample without blocking. The sensor callback must never stall,
    /// so a full channel drops the sample. Returns whether it was enqueued.
    pub fn push(&self, sample: PoseSample) -> bool {
        match self.sender.try_send(sample) {
            Ok(()) => true,
            Err(crossbeam_channel::TrySendError::Full(_)) => {
                log::trace!("pose channel full, dropping sample");
                false
            }
            Err(crossbeam_channel::TrySendError::Disconnected(_)) => {
                log::info!("pose channel disconnected");
                false
            }
        }
    }

    /// Blocking send, for harnesses that must not lose samples.
    pub fn send(&self, sample: PoseSample) -> Result<()> {
        self.sender
            .send(sample)
            .map_err(|_| FusionError::StreamStopped)
    }
}

/// Consumer half drained by the fusion session.
pub struct PoseStream {
    receiver: Receiver<PoseSample>,
}

impl PoseStream {
    /// Create a bounded sender/stream pair.
    pub fn bounded(capacity: usize) -> (PoseSender, PoseStream) {
        let (sender, receiver) = crossbeam_channel::bounded(capacity);
        (PoseSender { sender }, PoseStream { receiver })
    }

    /// Receive the next sample (blocks until available).
    pub fn recv(&self) -> Result<PoseSample> {
        self.receiver.recv().map_err(|_| FusionError::StreamStopped)
    }

    /// Try to receive a sample without blocking.
    pub fn try_recv(&self) -> Option<PoseSample> {
        self.receiver.try_recv().ok()
    }

    /// Receive a sample with a timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<PoseSample> {
        self.receiver.recv_timeout(timeout).map_err(|e| match e {
            crossbeam_channel::RecvTimeoutError::Timeout => FusionError::Timeout,
            crossbeam_channel::RecvTimeoutError::Disconnected => FusionError::StreamStopped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FramePair, PoseStatus};
    use nalgebra::{UnitQuaternion, Vector3};

    fn sample(ts: f64) -> PoseSample {
        PoseSample::new(
            FramePair::device_wrt_start(),
            Vector3::zeros(),
            UnitQuaternion::identity(),
            PoseStatus::Valid,
            ts,
        )
    }

    #[test]
    fn test_push_drops_when_full() {
        let (sender, stream) = PoseStream::bounded(1);
        assert!(sender.push(sample(1.0)));
        assert!(!sender.push(sample(2.0)));

        let received = stream.try_recv().unwrap();
        assert!((received.timestamp - 1.0).abs() < 1e-12);
        assert!(stream.try_recv().is_none());
    }

    #[test]
    fn test_recv_after_sender_drop_reports_stopped() {
        let (sender, stream) = PoseStream::bounded(4);
        sender.push(sample(1.0));
        drop(sender);

        assert!(stream.recv().is_ok());
        assert!(matches!(stream.recv(), Err(FusionError::StreamStopped)));
    }

    #[test]
    fn test_recv_timeout_on_idle_stream() {
        let (_sender, stream) = PoseStream::bounded(4);
        let result = stream.recv_timeout(Duration::from_millis(10));
        assert!(matches!(result, Err(FusionError::Timeout)));
    }
}
