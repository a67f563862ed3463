//! Neighbor search
//!
//! Two particles are neighbors when their border distance (center distance
//! minus both radii) is at most the configured cutoff. The relation is
//! symmetric and never contains a particle paired with itself.
//!
//! Provides two interchangeable strategies:
//! - BruteForce: O(N²) all-pairs, the correctness oracle
//! - CellIndex: uniform grid with a half-stencil sweep, incrementally maintained

pub mod brute_force;
pub mod cell_index;


use std::collections::{HashMap, HashSet};

use nalgebra::Point2;

use crate::config::{NeighborStrategy, SiloConfig};
use crate::error::Result;
use crate::particle::{Particle, ParticleId};

pub use brute_force::BruteForce;
pub use cell_index::CellIndex;

/// Symmetric particle → neighbors relation for one step
///
/// Every particle passed to [`NeighborFinder::find`] has an entry, possibly
/// empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NeighborMap {
    neighbors: HashMap<ParticleId, HashSet<ParticleId>>,
}

impl NeighborMap {
    /// Map with an empty neighbor set for each particle
    pub fn with_particles(particles: &[Particle]) -> Self {
        Self {
            neighbors: particles.iter().map(|p| (p.id, HashSet::new())).collect(),
        }
    }

    /// Records `a` and `b` as neighbors of each other. Self pairs are ignored.
    pub fn insert_pair(&mut self, a: ParticleId, b: ParticleId) {
        if a == b {
            return;
        }
        self.neighbors.entry(a).or_default().insert(b);
        self.neighbors.entry(b).or_default().insert(a);
    }

    pub fn get(&self, id: ParticleId) -> Option<&HashSet<ParticleId>> {
        self.neighbors.get(&id)
    }

    /// Neighbors of `id`; empty for unknown ids
    pub fn neighbors_of(&self, id: ParticleId) -> impl Iterator<Item = ParticleId> + '_ {
        self.neighbors.get(&id).into_iter().flatten().copied()
    }

    pub fn are_neighbors(&self, a: ParticleId, b: ParticleId) -> bool {
        self.neighbors.get(&a).is_some_and(|set| set.contains(&b))
    }

    /// Number of particles in the map
    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    /// Number of unordered neighbor pairs
    pub fn pair_count(&self) -> usize {
        self.neighbors.values().map(HashSet::len).sum::<usize>() / 2
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParticleId, &HashSet<ParticleId>)> {
        self.neighbors.iter().map(|(id, set)| (*id, set))
    }
}

/// A neighbor search strategy
pub trait NeighborFinder: Send + Sync {
    /// Computes the neighbor relation for `particles`.
    ///
    /// Stateful finders update their spatial index to the given positions;
    /// ids they track that are absent from `particles` are dropped.
    ///
    /// # Errors
    ///
    /// `Error::OutOfBounds` if a particle lies outside the indexed domain.
    fn find(&mut self, particles: &[Particle]) -> Result<NeighborMap>;

    /// Removes a particle from any internal index immediately.
    fn avoid(&mut self, id: ParticleId);
}

/// Builds the finder selected in `config` for particles up to `max_radius`.
pub fn finder_for(config: &SiloConfig, max_radius: f64) -> Result<Box<dyn NeighborFinder>> {
    let finder: Box<dyn NeighborFinder> = match config.neighbor_strategy {
        NeighborStrategy::BruteForce if config.periodic => Box::new(BruteForce::periodic(
            config.cutoff,
            config.width,
            config.total_length(),
        )?),
        NeighborStrategy::BruteForce => Box::new(BruteForce::new(config.cutoff)?),
        NeighborStrategy::CellIndex => {
            let (rows, cols) = config.grid_for(max_radius)?;
            Box::new(CellIndex::new(
                config.total_length(),
                config.width,
                rows,
                cols,
                config.cutoff,
                config.periodic,
            )?)
        }
    };
    Ok(finder)
}

/// Whether `particle` and a body of `radius` at `position` are within `cutoff`
/// border distance of each other
pub(crate) fn within_cutoff(
    particle: &Particle,
    position: Point2<f64>,
    radius: f64,
    cutoff: f64,
) -> bool {
    (particle.position - position).magnitude() - particle.radius - radius <= cutoff
}
