//! Stream fused poses as JSON lines for frontend integration.
//!
//! Outputs one JSON object per render frame:
//!
//! {"x":0.021,"y":0.002,"z":0.028,"qx":0.0,"qy":0.0,"qz":0.0,"qw":1.0,"relocalized":false}
//!
//! Usage: cargo run --release --example stream_json

use std::io::{self, Write};
use std::time::Duration;

use nalgebra::{UnitQuaternion, Vector3};
use posefuse::{
    Capabilities, FramePair, Permission, PoseSample, PoseStatus, ServiceInfo, TrackingMode,
    TrackingService,
};

fn main() {
    env_logger::init();

    let info = ServiceInfo::new("synthetic-1.0", Capabilities::MOTION_TRACKING);
    let service = match TrackingService::handshake(info, Permission::Granted) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Handshake failed: {}", e);
            std::process::exit(1);
        }
    };

    let (sender, session) = match service.start_fusion(TrackingMode::MotionOnly) {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("Failed to start fusion: {}", e);
            std::process::exit(1);
        }
    };

    std::thread::Builder::new()
        .name("synthetic-sensor".into())
        .spawn(move || {
            let mut t = 0.0f64;
            loop {
                let sample = PoseSample::new(
                    FramePair::device_wrt_start(),
                    Vector3::new(t.cos(), t.sin(), 0.0),
                    UnitQuaternion::from_euler_angles(0.0, 0.0, t),
                    PoseStatus::Valid,
                    t,
                );
                if sender.send(sample).is_err() {
                    return;
                }
                std::thread::sleep(Duration::from_millis(10));
                t += 0.01;
            }
        })
        .expect("Failed to spawn sensor thread");

    eprintln!("Streaming JSON (Ctrl+C to stop)...");

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());

    while session.is_active() {
        std::thread::sleep(Duration::from_millis(16));
        let Some(pose) = session.latest() else { continue };
        let q = pose.rotation.quaternion();
        let _ = writeln!(
            out,
            "{{\"x\":{:.4},\"y\":{:.4},\"z\":{:.4},\"qx\":{:.4},\"qy\":{:.4},\"qz\":{:.4},\"qw\":{:.4},\"relocalized\":{}}}",
            pose.position.x,
            pose.position.y,
            pose.position.z,
            q.i,
            q.j,
            q.k,
            q.w,
            session.is_relocalized(),
        );
        let _ = out.flush();
    }
}
