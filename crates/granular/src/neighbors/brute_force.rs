use nalgebra::{Point2, Vector2};

use crate::error::{Error, Result};
use crate::neighbors::{NeighborFinder, NeighborMap, within_cutoff};
use crate::particle::{Particle, ParticleId};

/// All-pairs neighbor search
///
/// Checks every unordered pair once. In periodic mode distances use the
/// minimum image over a `width × length` domain.
///
/// # Examples
///
/// ```
/// use granular::neighbors::{BruteForce, NeighborFinder};
/// use granular::particle::{Particle, ParticleId};
/// use nalgebra::{Point2, Vector2};
///
/// let particles = vec![
///     Particle::new(ParticleId(0), 0.5, 1.0, Point2::new(1.0, 1.0), Vector2::zeros()).unwrap(),
///     Particle::new(ParticleId(1), 0.5, 1.0, Point2::new(2.5, 1.0), Vector2::zeros()).unwrap(),
/// ];
///
/// let mut finder = BruteForce::new(1.5).unwrap();
/// let map = finder.find(&particles).unwrap();
/// assert!(map.are_neighbors(ParticleId(0), ParticleId(1)));
/// ```
#[derive(Debug, Clone)]
pub struct BruteForce {
    cutoff: f64,
    /// `(width, length)` of the periodic domain
    period: Option<Vector2<f64>>,
}

impl BruteForce {
    /// # Errors
    ///
    /// `Error::InvalidConfig` if `cutoff` is negative or not finite.
    pub fn new(cutoff: f64) -> Result<Self> {
        check_cutoff(cutoff)?;
        Ok(Self {
            cutoff,
            period: None,
        })
    }

    /// Brute force with minimum-image distances over a `width × length` domain.
    ///
    /// # Errors
    ///
    /// `Error::InvalidConfig` if `cutoff` is negative or either extent is
    /// not positive.
    pub fn periodic(cutoff: f64, width: f64, length: f64) -> Result<Self> {
        check_cutoff(cutoff)?;
        if !(width.is_finite() && width > 0.0 && length.is_finite() && length > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "periodic domain must be positive (got {width}x{length})"
            )));
        }
        Ok(Self {
            cutoff,
            period: Some(Vector2::new(width, length)),
        })
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    pub fn is_periodic(&self) -> bool {
        self.period.is_some()
    }

    /// Position of `other` as seen from `from`: the nearest periodic image
    /// when periodic, `other` itself otherwise
    fn image_of(&self, from: Point2<f64>, other: Point2<f64>) -> Point2<f64> {
        let Some(period) = self.period else {
            return other;
        };
        let mut d = other - from;
        d.x -= period.x * (d.x / period.x).round();
        d.y -= period.y * (d.y / period.y).round();
        from + d
    }
}

impl NeighborFinder for BruteForce {
    fn find(&mut self, particles: &[Particle]) -> Result<NeighborMap> {
        let mut map = NeighborMap::with_particles(particles);

        for (i, a) in particles.iter().enumerate() {
            for b in &particles[i + 1..] {
                let image = self.image_of(a.position, b.position);
                if a.id != b.id && within_cutoff(a, image, b.radius, self.cutoff) {
                    map.insert_pair(a.id, b.id);
                }
            }
        }

        Ok(map)
    }

    fn avoid(&mut self, _id: ParticleId) {}
}

pub(crate) fn check_cutoff(cutoff: f64) -> Result<()> {
    if !cutoff.is_finite() || cutoff < 0.0 {
        return Err(Error::InvalidConfig(format!(
            "cutoff must be finite and >= 0 (got {cutoff})"
        )));
    }
    Ok(())
}
