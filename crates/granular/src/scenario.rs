//! Initial packings

use nalgebra::{Point2, Vector2};
use rand::Rng;

use crate::config::SiloConfig;
use crate::error::{Error, Result};
use crate::particle::{Particle, ParticleId};

/// Candidate positions tried per particle before giving up
pub const MAX_FILL_TRIES: usize = 10_000;

/// Places `count` particles at rest, without overlaps, inside the silo body
/// (between the floor and the spawn band, clear of the side walls).
///
/// Radii are drawn uniformly from `radius = (min, max)`; ids run from 0.
///
/// # Errors
///
/// `Error::InvalidConfig` if the radius range or mass is invalid, or if a
/// particle cannot be placed within [`MAX_FILL_TRIES`] attempts.
///
/// # Examples
///
/// ```
/// use granular::config::SiloConfig;
/// use granular::scenario::fill_silo;
/// use rand::SeedableRng;
/// use rand_chacha::ChaChaRng;
///
/// let config = SiloConfig::default();
/// let mut rng = ChaChaRng::seed_from_u64(config.seed);
/// let particles = fill_silo(&config, 50, (0.01, 0.015), 0.01, &mut rng).unwrap();
/// assert_eq!(particles.len(), 50);
/// ```
pub fn fill_silo<R: Rng>(
    config: &SiloConfig,
    count: usize,
    radius: (f64, f64),
    mass: f64,
    rng: &mut R,
) -> Result<Vec<Particle>> {
    let (r_min, r_max) = radius;
    if !(r_min.is_finite() && r_max.is_finite() && r_min > 0.0 && r_min <= r_max) {
        return Err(Error::InvalidConfig(format!(
            "radius range ({r_min}, {r_max}) is invalid"
        )));
    }

    let bottom = config.floor_height();
    let top = config.respawn_floor();
    let mut particles: Vec<Particle> = Vec::with_capacity(count);

    for i in 0..count {
        let id = ParticleId(i as u32);
        let r = if r_min == r_max {
            r_min
        } else {
            rng.random_range(r_min..=r_max)
        };
        if 2.0 * r >= config.width || 2.0 * r >= top - bottom {
            return Err(Error::InvalidConfig(format!(
                "particle {id} (radius {r}) does not fit in the silo"
            )));
        }

        let mut position = None;
        for _ in 0..MAX_FILL_TRIES {
            let candidate = Point2::new(
                rng.random_range(r..config.width - r),
                rng.random_range(bottom + r..top - r),
            );
            if particles.iter().all(|p| !p.overlaps(candidate, r)) {
                position = Some(candidate);
                break;
            }
        }
        let Some(position) = position else {
            return Err(Error::InvalidConfig(format!(
                "could not place particle {id} after {MAX_FILL_TRIES} tries; the silo is too full"
            )));
        };

        let particle = Particle::new(id, r, mass, position, Vector2::zeros())?
            .with_force(Vector2::new(0.0, -mass * config.gravity));
        particles.push(particle);
    }

    log::info!("filled silo with {count} particles");
    Ok(particles)
}
