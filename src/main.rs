//! Ballpit headless runner
//!
//! Usage: `ballpit [mode] [seconds] [config.json]`
//!
//! Runs a mode at 60 Hz with a pointer sweeping through the arena and logs
//! what the frame loop, sleep system and contact dispatcher did.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use std::path::Path;

    use ballpit::audio::{ContactDispatcher, VoiceQueue};
    use ballpit::renderer::FrameSnapshot;
    use ballpit::{ModeId, SimConfig, Simulation, TickInput};
    use glam::Vec2;

    const WIDTH: f32 = 1280.0;
    const HEIGHT: f32 = 720.0;
    const FRAME_DT: f32 = 1.0 / 60.0;
    /// Frames between log lines
    const REPORT_EVERY: u64 = 60;

    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mode = match args.first() {
        Some(name) => match ModeId::from_str(name) {
            Some(mode) => mode,
            None => {
                let names: Vec<_> = ModeId::ALL.iter().map(|m| m.as_str()).collect();
                eprintln!("unknown mode '{name}'; expected one of {}", names.join(", "));
                std::process::exit(2);
            }
        },
        None => ModeId::default(),
    };
    let seconds: f32 = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(10.0);
    let config = args
        .get(2)
        .map(|p| SimConfig::load(Path::new(p)))
        .unwrap_or_default();

    log::info!("Ballpit starting: mode={} seconds={seconds}", mode.as_str());

    let mut sim = Simulation::new(config, 0x5EED, WIDTH, HEIGHT);
    sim.switch_mode(mode);

    let mut dispatcher = ContactDispatcher::new();
    let mut voices = VoiceQueue::new(1.0);
    let mut contacts = Vec::new();
    let frames = (seconds / FRAME_DT).ceil().max(0.0) as u64;
    let mut total_voices = 0usize;
    let mut total_substeps = 0u64;
    let mut dropped = 0u32;

    for frame in 0..frames {
        let t = frame as f32 * FRAME_DT;
        // Pointer idles for the first half, then orbits the centre
        let active = t > seconds * 0.5;
        let center = Vec2::new(WIDTH, HEIGHT) * 0.5;
        let input = TickInput {
            pointer: center + Vec2::new(t.cos(), t.sin()) * 240.0,
            pointer_active: active,
            idle_secs: if active { 0.0 } else { t },
        };

        let report = sim.advance(&input, FRAME_DT);
        total_substeps += u64::from(report.substeps);
        if report.backlog_dropped {
            dropped += 1;
        }

        let now = sim.time();
        contacts.clear();
        contacts.extend(sim.drain_contacts());
        voices.voices.clear();
        total_voices += dispatcher.dispatch(&contacts, now, &mut voices);

        if frame % REPORT_EVERY == 0 {
            let snapshot = FrameSnapshot::capture(&sim, 24);
            log::info!(
                "t={:.1}s bodies={} asleep={} segments={} contacts={} outline={}",
                sim.time(),
                snapshot.bodies.len(),
                sim.asleep_count(),
                snapshot.segments.len(),
                contacts.len(),
                snapshot.outline.len(),
            );
        }
    }

    log::info!(
        "Done: {frames} frames, {total_substeps} substeps, {dropped} frames dropped backlog, {total_voices} collision sounds"
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Hosts drive `Simulation::advance` directly on this target
}
