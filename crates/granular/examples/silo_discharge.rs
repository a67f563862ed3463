//! Silo discharge driver
//!
//! Fills a silo with grains, lets them drain through the opening and writes
//! one frame every `FRAME_INTERVAL` simulated seconds to stdout:
//!
//! ```text
//! <particle count>
//! t=<time> exited=<total exited>
//! <id> <x> <y> <vx> <vy> <radius> <pressure>
//! ...
//! ```
//!
//! Run with: RUST_LOG=info cargo run --release --package granular --example silo_discharge [config.json]

use std::io::{self, BufWriter, Write};
use std::process::ExitCode;

use granular::config::SiloConfig;
use granular::error::Result;
use granular::integrator::{Gear5, Integrator};
use granular::scenario::fill_silo;
use granular::silo::GranularState;
use granular::state::SimulationState;
use granular::wall::silo_walls;
use rand::SeedableRng;
use rand_chacha::ChaChaRng;

const PARTICLES: usize = 200;
const RADIUS: (f64, f64) = (0.01, 0.015);
const MASS: f64 = 0.01;
const DT: f64 = 1e-5;
const DURATION: f64 = 2.0;
const FRAME_INTERVAL: f64 = 0.01;

fn write_frame(out: &mut impl Write, state: &GranularState) -> io::Result<()> {
    writeln!(out, "{}", state.particles().len())?;
    writeln!(out, "t={:.5} exited={}", state.time(), state.total_exited())?;
    for p in state.particles() {
        writeln!(
            out,
            "{} {:.6} {:.6} {:.6} {:.6} {:.6} {:.6}",
            p.id,
            p.position.x,
            p.position.y,
            p.velocity.x,
            p.velocity.y,
            p.radius,
            p.pressure()
        )?;
    }
    Ok(())
}

fn run() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => SiloConfig::from_path(path)?,
        None => SiloConfig::default(),
    };
    log::info!("configuration:\n{}", config.to_json()?);

    let mut rng = ChaChaRng::seed_from_u64(config.seed);
    let particles = fill_silo(&config, PARTICLES, RADIUS, MASS, &mut rng)?;
    let mut state = GranularState::new(particles, silo_walls(&config)?, &config)?;

    let integrator = Gear5::new();
    let steps = (DURATION / DT).round() as usize;
    let steps_per_frame = ((FRAME_INTERVAL / DT).round() as usize).max(1);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    write_frame(&mut out, &state)?;

    for step in 1..=steps {
        let report = integrator.step(&mut state, DT)?;

        if step % steps_per_frame == 0 {
            write_frame(&mut out, &state)?;
            log::info!(
                "t = {:.3} s: {} exited, {} pending, max normal force {:.3e} N, KE {:.3e} J",
                state.time(),
                state.total_exited(),
                state.pending_respawns(),
                report.max_normal_force,
                state.kinetic_energy()
            );
        }
    }

    out.flush()?;
    log::info!(
        "discharged {} grains in {:.2} s",
        state.total_exited(),
        state.time()
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("simulation failed: {e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
