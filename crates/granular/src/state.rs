//! Simulation-state contract for the Gear predictor-corrector
//!
//! A concrete scenario owns the particle set and two derivative stores
//! (current and predicted) and exposes phase hooks the integrator calls
//! around predict, evaluate and fix. The integrator never touches scenario
//! data other than through this trait.

use std::collections::HashMap;
use std::ops::{Index, IndexMut};

use nalgebra::Vector2;

use crate::error::Result;
use crate::particle::{Particle, ParticleId};

/// Highest derivative order tracked by the integrator.
pub const ORDER: usize = 5;

/// Position, velocity, acceleration and three higher-order terms.
pub type Derivatives = [Vector2<f64>; ORDER + 1];

/// Per-particle derivative values, keyed by particle id.
///
/// Indexing with an id that is not stored panics: every active particle must
/// have an entry, so a miss is a bug in the scenario, not a runtime condition.
#[derive(Debug, Clone, Default)]
pub struct DerivativeStore {
    values: HashMap<ParticleId, Derivatives>,
}

impl DerivativeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: HashMap::with_capacity(capacity),
        }
    }

    pub fn insert(&mut self, id: ParticleId, derivatives: Derivatives) {
        self.values.insert(id, derivatives);
    }

    pub fn remove(&mut self, id: ParticleId) -> Option<Derivatives> {
        self.values.remove(&id)
    }

    pub fn get(&self, id: ParticleId) -> Option<&Derivatives> {
        self.values.get(&id)
    }

    pub fn contains(&self, id: ParticleId) -> bool {
        self.values.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Index<ParticleId> for DerivativeStore {
    type Output = Derivatives;

    fn index(&self, id: ParticleId) -> &Derivatives {
        match self.values.get(&id) {
            Some(r) => r,
            None => panic!("no derivatives stored for particle {id}"),
        }
    }
}

impl IndexMut<ParticleId> for DerivativeStore {
    fn index_mut(&mut self, id: ParticleId) -> &mut Derivatives {
        match self.values.get_mut(&id) {
            Some(r) => r,
            None => panic!("no derivatives stored for particle {id}"),
        }
    }
}

/// Result of evaluating the force law on one particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    /// Total force (contacts, walls and body forces)
    pub force: Vector2<f64>,
    /// Sum of normal contact force magnitudes, the pressure diagnostic
    pub normal_force: f64,
}

/// State advanced by [`crate::integrator::Gear5`].
///
/// Hooks run in this order every step:
/// `pre_predict`, `post_predict`, `pre_evaluate`, `post_evaluate`,
/// `pre_fix`, `post_fix`, then `advance_time`.
///
/// The active particle set may only change structurally in `post_predict`
/// and `post_fix`. When it does, both derivative stores must be updated in
/// the same hook so each active particle keeps exactly one entry in each.
pub trait SimulationState {
    /// Active particles
    fn particles(&self) -> &[Particle];

    fn particles_mut(&mut self) -> &mut [Particle];

    /// Derivatives at the start (and, after fix, the end) of the step
    fn current(&self) -> &DerivativeStore;

    fn current_mut(&mut self) -> &mut DerivativeStore;

    /// Scratch derivatives, valid between predict and fix
    fn predicted(&self) -> &DerivativeStore;

    fn predicted_mut(&mut self) -> &mut DerivativeStore;

    /// Force on `particles()[idx]` computed from predicted values.
    ///
    /// Takes `&self`: every particle's predicted state is final by the time
    /// this runs, so evaluations are independent of each other.
    fn force_with_predicted(&self, idx: usize) -> Result<Evaluation>;

    fn pre_predict(&mut self) -> Result<()> {
        Ok(())
    }

    fn post_predict(&mut self) -> Result<()> {
        Ok(())
    }

    /// Recompute anything derived from predicted positions (e.g. neighbors).
    fn pre_evaluate(&mut self) -> Result<()> {
        Ok(())
    }

    fn post_evaluate(&mut self) -> Result<()> {
        Ok(())
    }

    fn pre_fix(&mut self) -> Result<()> {
        Ok(())
    }

    /// Lifecycle mutations (exits, respawns) happen here.
    fn post_fix(&mut self) -> Result<()> {
        Ok(())
    }

    fn advance_time(&mut self, _dt: f64) {}
}
