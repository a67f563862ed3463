//! Error types for the granular simulator
//!
//! Every fatal condition carries enough context to identify the offending
//! particle, wall or grid cell. Respawn placement failures are not errors:
//! they are reported through [`crate::silo::LifecycleReport`].

use crate::particle::ParticleId;
use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building or advancing a simulation.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid grid, stiffness or domain parameter. Raised at construction.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A particle maps outside the declared cell grid.
    ///
    /// Usually means the time step is too large (particles tunnel through
    /// walls) or the grid does not cover the domain.
    #[error(
        "particle {particle} is out of bounds: cell ({row}, {col}) is outside a {rows}x{cols} grid"
    )]
    OutOfBounds {
        particle: ParticleId,
        row: i64,
        col: i64,
        rows: usize,
        cols: usize,
    },

    /// Two particles sit at exactly the same position.
    #[error("particles {a} and {b} are at the same position")]
    CoincidentParticles { a: ParticleId, b: ParticleId },

    /// A particle center lies exactly on a wall.
    #[error("particle {particle} is centered on wall {wall}")]
    DegenerateWallContact { particle: ParticleId, wall: usize },

    /// I/O failure while reading a configuration file.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Malformed JSON configuration.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_is_informative() {
        let e = Error::InvalidConfig("kn must be > 0".to_string());
        let msg = e.to_string();
        assert!(msg.contains("invalid configuration"));
        assert!(msg.contains("kn"));
    }

    #[test]
    fn out_of_bounds_names_the_cell() {
        let e = Error::OutOfBounds {
            particle: ParticleId(7),
            row: -1,
            col: 1,
            rows: 2,
            cols: 2,
        };
        let msg = e.to_string();
        assert!(msg.contains("particle 7"));
        assert!(msg.contains("(-1, 1)"));
        assert!(msg.contains("2x2"));
    }

    #[test]
    fn coincident_particles_names_the_pair() {
        let e = Error::CoincidentParticles {
            a: ParticleId(3),
            b: ParticleId(4),
        };
        let msg = e.to_string();
        assert!(msg.contains('3'));
        assert!(msg.contains('4'));
    }
}
