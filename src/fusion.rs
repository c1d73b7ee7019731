//! The pose fusion adapter.
//!
//! Tracks the three frame relations reported by the motion-tracking
//! service, latches relocalization once the start-of-service origin has
//! been resolved against a persisted area description, and converts the
//! authoritative pose into the engine convention on every ingested sample.

use nalgebra::{Matrix4, UnitQuaternion, Vector3};

use crate::basis;
use crate::types::{EnginePose, FramePair, PoseSample, PoseStatus};

/// One of the three tracked frame relations.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameRelation {
    DeviceWrtStart = 0,
    DeviceWrtArea = 1,
    StartWrtArea = 2,
}

impl FrameRelation {
    /// Map a sample's frame pair onto a tracked relation. Any other pair is
    /// not tracked and must be ignored by the adapter.
    pub fn classify(pair: FramePair) -> Option<FrameRelation> {
        if pair == FramePair::device_wrt_start() {
            Some(FrameRelation::DeviceWrtStart)
        } else if pair == FramePair::device_wrt_area() {
            Some(FrameRelation::DeviceWrtArea)
        } else if pair == FramePair::start_wrt_area() {
            Some(FrameRelation::StartWrtArea)
        } else {
            None
        }
    }
}

/// Per-relation tracking state, mutated only by the adapter.
#[derive(Debug, Clone, Copy)]
pub struct FrameSlot {
    /// Last stored position (neutral zero after a non-valid sample).
    pub position: Vector3<f64>,
    /// Last stored rotation (identity after a non-valid sample).
    pub rotation: UnitQuaternion<f64>,
    /// Status of the most recent sample for this relation.
    pub status: PoseStatus,
    /// Consecutive samples at the current status.
    pub frame_count: i64,
    /// Seconds between the two most recent samples for this relation.
    pub delta_time: f64,
    prev_timestamp: f64,
}

impl FrameSlot {
    /// Startup state. The previous timestamp starts at -1, so a slot's first
    /// delta reads `timestamp + 1`.
    fn startup() -> Self {
        Self {
            position: Vector3::repeat(1.0),
            rotation: UnitQuaternion::identity(),
            status: PoseStatus::Unknown,
            frame_count: -1,
            delta_time: -1.0,
            prev_timestamp: -1.0,
        }
    }
}

/// Fuses the tracking service's pose stream into engine-convention poses.
///
/// Pure computation, single-owner state: one thread ingests samples, and
/// the fused output is handed off as a whole (`EnginePose` is `Copy`).
pub struct PoseFusionAdapter {
    slots: [FrameSlot; 3],
    relocalized: bool,
    world_from_service: Matrix4<f64>,
    device_from_engine: Matrix4<f64>,
    last_pose: EnginePose,
}

impl PoseFusionAdapter {
    pub fn new() -> Self {
        Self {
            slots: [FrameSlot::startup(); 3],
            relocalized: false,
            world_from_service: basis::world_from_service(),
            device_from_engine: basis::device_from_engine(),
            last_pose: EnginePose::identity(),
        }
    }

    /// Whether the start-of-service origin has been resolved against the
    /// area description.
    pub fn is_relocalized(&self) -> bool {
        self.relocalized
    }

    /// The most recent fused output. Unchanged by ignored samples.
    pub fn last_pose(&self) -> EnginePose {
        self.last_pose
    }

    /// Tracking state for one relation, for diagnostics overlays.
    pub fn slot(&self, relation: FrameRelation) -> &FrameSlot {
        &self.slots[relation as usize]
    }

    /// Ingest one pose sample and recompute the fused engine pose.
    ///
    /// Samples whose frame pair is not one of the three tracked relations
    /// are ignored: no slot is touched and `None` is returned.
    pub fn ingest(&mut self, sample: &PoseSample) -> Option<EnginePose> {
        let relation = FrameRelation::classify(sample.pair)?;

        if !self.relocalized && relation == FrameRelation::StartWrtArea {
            self.relocalized = true;
            log::debug!(
                "relocalized at t={:.3}: start of service resolved against area description",
                sample.timestamp
            );
        }

        let slot = &mut self.slots[relation as usize];
        if sample.status == PoseStatus::Valid {
            slot.position = sample.translation;
            slot.rotation = sample.orientation;
        } else {
            // Lost tracking overwrites the slot with a neutral pose rather
            // than holding the last known good one.
            slot.position = Vector3::zeros();
            slot.rotation = UnitQuaternion::identity();
            if self.relocalized {
                log::debug!(
                    "relocalization dropped: {:?} sample on {:?}",
                    sample.status,
                    relation
                );
            }
            self.relocalized = false;
        }

        if sample.status != slot.status {
            slot.frame_count = 0;
        }
        slot.status = sample.status;
        slot.frame_count += 1;

        slot.delta_time = sample.timestamp - slot.prev_timestamp;
        slot.prev_timestamp = sample.timestamp;

        // Binary selection, re-evaluated every call: the area-description
        // relation is authoritative only while relocalized.
        let source = if self.relocalized {
            FrameRelation::DeviceWrtArea
        } else {
            FrameRelation::DeviceWrtStart
        };
        let source = &self.slots[source as usize];

        let composed = self.world_from_service
            * basis::trs(&source.position, &source.rotation)
            * self.device_from_engine;

        let pose = EnginePose {
            position: basis::translation_of(&composed),
            rotation: basis::look_rotation(
                &basis::basis_column(&composed, 2),
                &basis::basis_column(&composed, 1),
            ),
        };
        self.last_pose = pose;
        Some(pose)
    }

    /// Reset all three slots, counters, and timestamps to startup defaults.
    ///
    /// The relocalization latch survives a suspend; only a non-valid sample
    /// clears it.
    pub fn suspend(&mut self) {
        self.slots = [FrameSlot::startup(); 3];
        log::info!("fusion state reset (suspend)");
    }
}

impl Default for PoseFusionAdapter {
    fn default() -> Self {
        Self::new()
    }
}
