//! Stream synthetic 6DOF pose samples through the fusion session to stdout.
//!
//! A background thread plays the tracking service: it pushes
//! device-wrt-start samples on a circular path and, in area mode, a
//! start-wrt-area sample partway through to trigger relocalization.
//!
//! Usage: cargo run --example stream
//!        POSEFUSE_MODE=area cargo run --example stream
//! Press Ctrl+C to stop.

use std::time::{Duration, Instant};

use nalgebra::{UnitQuaternion, Vector3};
use posefuse::{
    Capabilities, FramePair, Permission, PoseSample, PoseSender, PoseStatus, ServiceInfo,
    TrackingMode, TrackingService,
};

fn main() {
    env_logger::init();

    let mode = match std::env::var("POSEFUSE_MODE").as_deref() {
        Ok("area") => TrackingMode::AreaDescription,
        _ => TrackingMode::MotionOnly,
    };

    let info = ServiceInfo::new(
        "synthetic-1.0",
        Capabilities::MOTION_TRACKING | Capabilities::AREA_LEARNING,
    );
    let service = match TrackingService::handshake(info, Permission::Granted) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Handshake failed: {}", e);
            std::process::exit(1);
        }
    };

    println!("Service:  {}", service.info().version);
    println!("Mode:     {:?}", mode);
    println!();

    let (sender, session) = match service.start_fusion(mode) {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("Failed to start fusion: {}", e);
            std::process::exit(1);
        }
    };

    let producer = std::thread::Builder::new()
        .name("synthetic-sensor".into())
        .spawn(move || synthetic_sensor_loop(sender, mode))
        .expect("Failed to spawn sensor thread");

    println!("Streaming fused poses (Ctrl+C to stop)...");

    let start = Instant::now();
    let mut frames: u64 = 0;
    let mut last_report = Instant::now();

    while session.is_active() {
        // Render-side polling at ~60 Hz.
        std::thread::sleep(Duration::from_millis(16));

        let Some(pose) = session.latest() else { continue };
        frames += 1;

        if frames % 30 == 1 {
            let q = pose.rotation.quaternion();
            println!(
                "pos=[{:+.4}, {:+.4}, {:+.4}]  rot=[{:+.3}, {:+.3}, {:+.3}, {:+.3}]  relocalized={}",
                pose.position.x, pose.position.y, pose.position.z,
                q.i, q.j, q.k, q.w,
                session.is_relocalized(),
            );
        }

        let now = Instant::now();
        if now.duration_since(last_report) >= Duration::from_secs(3) {
            let elapsed = start.elapsed().as_secs_f64();
            println!(
                "--- {} frames in {:.1}s ({:.1} Hz) ---",
                frames,
                elapsed,
                frames as f64 / elapsed
            );
            last_report = now;
        }
    }

    let _ = producer.join();
}

/// Fake tracking service: pushes pose samples at ~100 Hz.
fn synthetic_sensor_loop(sender: PoseSender, mode: TrackingMode) {
    let mut t = 0.0f64;
    let mut relocalized_sent = false;

    loop {
        let angle = 0.4 * t;
        let translation = Vector3::new(angle.cos(), angle.sin(), 0.2 * t.sin());
        let orientation = UnitQuaternion::from_euler_angles(0.0, 0.0, angle);

        let sample = PoseSample::new(
            FramePair::device_wrt_start(),
            translation,
            orientation,
            PoseStatus::Valid,
            t,
        );
        if sender.send(sample).is_err() {
            // Session gone, stop producing.
            return;
        }

        if mode == TrackingMode::AreaDescription {
            // After five seconds the device recognizes the recorded area.
            if t >= 5.0 && !relocalized_sent {
                relocalized_sent = true;
                sender.push(PoseSample::new(
                    FramePair::start_wrt_area(),
                    Vector3::new(0.5, 0.5, 0.0),
                    UnitQuaternion::identity(),
                    PoseStatus::Valid,
                    t,
                ));
            }
            if relocalized_sent {
                sender.push(PoseSample::new(
                    FramePair::device_wrt_area(),
                    translation + Vector3::new(0.5, 0.5, 0.0),
                    orientation,
                    PoseStatus::Valid,
                    t,
                ));
            }
        }

        std::thread::sleep(Duration::from_millis(10));
        t += 0.01;
    }
}
