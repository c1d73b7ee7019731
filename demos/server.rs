//! Fused pose → WebSocket broadcast server.
//!
//! Streams fused engine poses as JSON over WebSocket to all connected
//! clients, fed by a synthetic tracking-service thread. Point any WebSocket
//! consumer at ws://localhost:8080.
//!
//! Usage: cargo run --release --example server

use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use nalgebra::{UnitQuaternion, Vector3};
use posefuse::{
    Capabilities, FramePair, Permission, PoseSample, PoseStatus, ServiceInfo, TrackingMode,
    TrackingService,
};
use tungstenite::Message;

const PORT: u16 = 8080;

type WsClient = Arc<Mutex<tungstenite::WebSocket<TcpStream>>>;

fn main() {
    env_logger::init();

    let clients: Arc<Mutex<Vec<WsClient>>> = Arc::new(Mutex::new(Vec::new()));

    let fusion_clients = clients.clone();
    let running = Arc::new(AtomicBool::new(true));
    let fusion_stop = running.clone();

    let fusion_thread = std::thread::Builder::new()
        .name("posefuse-broadcast".into())
        .spawn(move || {
            fusion_loop(fusion_clients, fusion_stop);
        })
        .expect("Failed to spawn fusion thread");

    let listener = TcpListener::bind(format!("0.0.0.0:{}", PORT)).unwrap_or_else(|e| {
        eprintln!("Failed to bind port {}: {}", PORT, e);
        std::process::exit(1);
    });

    eprintln!("[WS] Listening on ws://localhost:{}", PORT);

    for stream in listener.incoming() {
        let stream = match stream {
            Ok(s) => s,
            Err(e) => {
                eprintln!("[TCP] accept error: {}", e);
                continue;
            }
        };

        let clients = clients.clone();
        std::thread::spawn(move || {
            handle_websocket(stream, clients);
        });
    }

    running.store(false, Ordering::Relaxed);
    let _ = fusion_thread.join();
}

/// Handle WebSocket — add to broadcast list, wait for disconnect.
///
/// The fusion thread is the sole writer to the WebSocket. This thread just
/// stays alive and detects when the client is removed from the broadcast
/// list (due to send failure in the fusion thread).
fn handle_websocket(stream: TcpStream, clients: Arc<Mutex<Vec<WsClient>>>) {
    // Write timeout prevents the fusion thread from blocking on a slow client
    stream.set_write_timeout(Some(Duration::from_secs(2))).ok();
    stream.set_nodelay(true).ok();

    let ws = match tungstenite::accept(stream) {
        Ok(ws) => ws,
        Err(e) => {
            eprintln!("[WS] handshake error: {}", e);
            return;
        }
    };

    let ws = Arc::new(Mutex::new(ws));
    {
        let mut list = clients.lock().unwrap();
        list.push(ws.clone());
        eprintln!("[WS] Client connected ({} total)", list.len());
    }

    loop {
        std::thread::sleep(Duration::from_secs(1));
        let still_active = clients.lock().unwrap().iter().any(|c| Arc::ptr_eq(c, &ws));
        if !still_active {
            break;
        }
    }

    eprintln!(
        "[WS] Client disconnected ({} total)",
        clients.lock().unwrap().len()
    );
}

/// Fusion loop — drives a session from a synthetic sensor and broadcasts
/// JSON to WebSocket clients at ~60 Hz.
fn fusion_loop(clients: Arc<Mutex<Vec<WsClient>>>, running: Arc<AtomicBool>) {
    let info = ServiceInfo::new("synthetic-1.0", Capabilities::MOTION_TRACKING);
    let service = match TrackingService::handshake(info, Permission::Granted) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("[FUSE] handshake failed: {}", e);
            return;
        }
    };

    let (sender, session) = match service.start_fusion(TrackingMode::MotionOnly) {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("[FUSE] failed to start fusion: {}", e);
            return;
        }
    };

    let producer_stop = running.clone();
    std::thread::Builder::new()
        .name("synthetic-sensor".into())
        .spawn(move || {
            let mut t = 0.0f64;
            while producer_stop.load(Ordering::Relaxed) {
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

    eprintln!("[FUSE] Broadcasting fused poses to WebSocket clients...");

    while running.load(Ordering::Relaxed) && session.is_active() {
        std::thread::sleep(Duration::from_millis(16));

        let Some(pose) = session.latest() else { continue };
        let q = pose.rotation.quaternion();
        let json = format!(
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

        // Broadcast; drop clients whose sends fail.
        let mut list = clients.lock().unwrap();
        list.retain(|client| {
            let mut ws = match client.lock() {
                Ok(ws) => ws,
                Err(_) => return false,
            };
            ws.send(Message::Text(json.clone().into())).is_ok()
        });
    }
}
