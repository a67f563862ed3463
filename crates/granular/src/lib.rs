//! Two-dimensional discrete-element simulation of granular flow through a silo
//!
//! Circular grains interact through a Hookean contact law with viscous
//! tangential friction, fall under gravity, and are advanced with a
//! fifth-order Gear predictor-corrector. Grains leaving through the silo
//! opening are recycled into a spawn band at the top.
//!
//! ```no_run
//! use granular::config::SiloConfig;
//! use granular::integrator::{Gear5, Integrator};
//! use granular::scenario::fill_silo;
//! use granular::silo::GranularState;
//! use granular::wall::silo_walls;
//! use rand::SeedableRng;
//! use rand_chacha::ChaChaRng;
//!
//! # fn main() -> granular::error::Result<()> {
//! let config = SiloConfig::default();
//! let mut rng = ChaChaRng::seed_from_u64(config.seed);
//! let particles = fill_silo(&config, 200, (0.01, 0.015), 0.01, &mut rng)?;
//! let mut state = GranularState::new(particles, silo_walls(&config)?, &config)?;
//!
//! Gear5::new().integrate(&mut state, 1e-5, 1_000)?;
//! println!("{} grains discharged", state.total_exited());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod forces;
pub mod integrator;
pub mod neighbors;
pub mod particle;
pub mod respawn;
pub mod scenario;
pub mod silo;
pub mod state;
pub mod wall;

#[cfg(test)]
mod config_test;
#[cfg(test)]
mod scenario_test;
#[cfg(test)]
mod silo_test;
#[cfg(test)]
mod wall_test;
