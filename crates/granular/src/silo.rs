//! Granular silo scenario
//!
//! [`GranularState`] owns the particles, walls and neighbor index of a silo
//! discharge and supplies the force law the integrator evaluates. Particles
//! that fall below the exit height are recycled into the spawn band.

use std::collections::{HashMap, HashSet};

use nalgebra::Vector2;

use crate::config::SiloConfig;
use crate::error::{Error, Result};
use crate::forces::HookeanContact;
use crate::neighbors::{NeighborFinder, NeighborMap, finder_for};
use crate::particle::{Particle, ParticleId};
use crate::respawn::Respawner;
use crate::state::{DerivativeStore, Evaluation, SimulationState};
use crate::wall::Wall;

/// Particle flow during the last step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LifecycleReport {
    /// Particles that crossed the exit height
    pub exited: usize,
    /// Particles placed back in the spawn band
    pub respawned: usize,
    /// Particles still waiting for a free spot
    pub pending: usize,
    /// Placement attempts that failed
    pub exhausted: usize,
}

/// Granular silo simulation state
///
/// Owns the active particles, both derivative stores, the walls, the
/// neighbor finder and the respawn queue. Advanced by any [`Integrator`],
/// which calls back into the force law and lifecycle hooks.
///
/// [`Integrator`]: crate::integrator::Integrator
pub struct GranularState {
    time: f64,
    particles: Vec<Particle>,
    current: DerivativeStore,
    predicted: DerivativeStore,
    walls: Vec<Wall>,
    contact: HookeanContact,
    gravity: f64,
    exit_height: f64,
    finder: Box<dyn NeighborFinder>,
    neighbors: NeighborMap,
    /// Particle id → position in `particles`, valid from `pre_evaluate` to `post_fix`
    index: HashMap<ParticleId, usize>,
    respawner: Respawner,
    lifecycle: LifecycleReport,
    total_exited: usize,
}

impl GranularState {
    /// Builds the scenario from an initial packing.
    ///
    /// Every particle starts with the gravity-consistent force `(0, −m·g)`.
    /// The neighbor finder and respawn strategy are taken from `config`; the
    /// cell grid and slot size are derived from the largest radius.
    ///
    /// # Errors
    ///
    /// `Error::InvalidConfig` if `config` is invalid, `particles` is empty or
    /// holds duplicate ids, or the grid or spawn band cannot fit the largest
    /// particle.
    pub fn new(particles: Vec<Particle>, walls: Vec<Wall>, config: &SiloConfig) -> Result<Self> {
        config.validate()?;

        if particles.is_empty() {
            return Err(Error::InvalidConfig("at least one particle is required".into()));
        }
        let mut seen = HashSet::with_capacity(particles.len());
        if let Some(duplicate) = particles.iter().find(|p| !seen.insert(p.id)) {
            return Err(Error::InvalidConfig(format!(
                "particle id {} is used more than once",
                duplicate.id
            )));
        }

        let max_radius = particles.iter().map(|p| p.radius).fold(0.0, f64::max);
        let contact = HookeanContact::new(config.kn, config.kt)?;
        let finder = finder_for(config, max_radius)?;
        let respawner = Respawner::from_config(config, max_radius)?;

        let mut current = DerivativeStore::with_capacity(particles.len());
        let mut predicted = DerivativeStore::with_capacity(particles.len());
        let particles: Vec<Particle> = particles
            .into_iter()
            .map(|p| {
                let p = p.with_force(Vector2::new(0.0, -p.mass * config.gravity));
                current.insert(p.id, p.initial_derivatives());
                predicted.insert(p.id, p.initial_derivatives());
                p
            })
            .collect();

        log::info!(
            "silo: {} particles (max radius {max_radius}), {} walls, kn = {}, kt = {}",
            particles.len(),
            walls.len(),
            config.kn,
            config.kt
        );

        Ok(Self {
            time: 0.0,
            particles,
            current,
            predicted,
            walls,
            contact,
            gravity: config.gravity,
            exit_height: config.exit_height,
            finder,
            neighbors: NeighborMap::default(),
            index: HashMap::new(),
            respawner,
            lifecycle: LifecycleReport::default(),
            total_exited: 0,
        })
    }

    /// Simulated time in seconds
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn walls(&self) -> &[Wall] {
        &self.walls
    }

    /// Neighbor relation computed during the last evaluation
    pub fn neighbors(&self) -> &NeighborMap {
        &self.neighbors
    }

    pub fn lifecycle(&self) -> LifecycleReport {
        self.lifecycle
    }

    /// Exits since construction; the discharge count
    pub fn total_exited(&self) -> usize {
        self.total_exited
    }

    pub fn pending_respawns(&self) -> usize {
        self.respawner.pending()
    }

    pub fn respawner(&self) -> &Respawner {
        &self.respawner
    }

    pub fn kinetic_energy(&self) -> f64 {
        self.particles.iter().map(Particle::kinetic_energy).sum()
    }

    /// Moves every particle below the exit height to the respawn queue
    fn remove_exited(&mut self) {
        let exit = self.exit_height;
        let (exited, kept): (Vec<Particle>, Vec<Particle>) = std::mem::take(&mut self.particles)
            .into_iter()
            .partition(|p| p.position.y < exit);
        self.particles = kept;

        for particle in exited {
            log::debug!(
                "particle {} exited at ({}, {})",
                particle.id,
                particle.position.x,
                particle.position.y
            );
            self.finder.avoid(particle.id);
            self.current.remove(particle.id);
            self.predicted.remove(particle.id);
            self.respawner.enqueue(particle);
            self.lifecycle.exited += 1;
            self.total_exited += 1;
        }
    }

    fn respawn(&mut self) {
        let result = self.respawner.respawn(&self.particles, self.gravity);

        for particle in &result.placed {
            self.current.insert(particle.id, particle.initial_derivatives());
            self.predicted.insert(particle.id, particle.initial_derivatives());
        }
        self.lifecycle.respawned += result.placed.len();
        self.lifecycle.exhausted += result.exhausted;
        self.lifecycle.pending = self.respawner.pending();
        self.particles.extend(result.placed);

        if self.lifecycle.pending > 0 {
            log::warn!(
                "respawn queue not drained at t = {}: {} pending",
                self.time,
                self.lifecycle.pending
            );
        }
    }
}

impl SimulationState for GranularState {
    fn particles(&self) -> &[Particle] {
        &self.particles
    }

    fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    fn current(&self) -> &DerivativeStore {
        &self.current
    }

    fn current_mut(&mut self) -> &mut DerivativeStore {
        &mut self.current
    }

    fn predicted(&self) -> &DerivativeStore {
        &self.predicted
    }

    fn predicted_mut(&mut self) -> &mut DerivativeStore {
        &mut self.predicted
    }

    /// Contacts with neighbors and walls plus gravity, at predicted values.
    fn force_with_predicted(&self, idx: usize) -> Result<Evaluation> {
        let particle = &self.particles[idx];
        let mut force = Vector2::new(0.0, -particle.mass * self.gravity);
        let mut normal_force = 0.0;

        for id in self.neighbors.neighbors_of(particle.id) {
            let Some(&other) = self.index.get(&id) else {
                continue;
            };
            let contact = self.contact.between(particle, &self.particles[other])?;
            force += contact.total();
            normal_force += contact.normal_magnitude();
        }

        for (i, wall) in self.walls.iter().enumerate() {
            let contact = self.contact.with_wall(particle, wall, i)?;
            force += contact.total();
            normal_force += contact.normal_magnitude();
        }

        Ok(Evaluation {
            force,
            normal_force,
        })
    }

    fn pre_predict(&mut self) -> Result<()> {
        self.lifecycle = LifecycleReport {
            pending: self.respawner.pending(),
            ..LifecycleReport::default()
        };
        Ok(())
    }

    fn post_predict(&mut self) -> Result<()> {
        self.remove_exited();
        Ok(())
    }

    fn pre_evaluate(&mut self) -> Result<()> {
        self.neighbors = self.finder.find(&self.particles)?;
        self.index = self
            .particles
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id, i))
            .collect();
        Ok(())
    }

    fn post_fix(&mut self) -> Result<()> {
        self.remove_exited();
        self.respawn();
        Ok(())
    }

    fn advance_time(&mut self, dt: f64) {
        self.time += dt;
    }
}
