//! Linear spring-dashpot contact law

use nalgebra::{Point2, Vector2};

use crate::error::{Error, Result};
use crate::particle::Particle;
use crate::wall::Wall;

/// Normal and tangential components of a contact force acting on one body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactForce {
    pub normal: Vector2<f64>,
    pub tangential: Vector2<f64>,
}

impl ContactForce {
    pub fn zero() -> Self {
        Self {
            normal: Vector2::zeros(),
            tangential: Vector2::zeros(),
        }
    }

    pub fn total(&self) -> Vector2<f64> {
        self.normal + self.tangential
    }

    /// Magnitude of the normal component, the pressure contribution
    pub fn normal_magnitude(&self) -> f64 {
        self.normal.magnitude()
    }
}

/// Normal and tangential unit vectors for a contact seen from `from`
///
/// The normal points from `from` toward `to`; the tangential is the normal
/// rotated a quarter turn counter-clockwise. Returns `None` when the points
/// coincide and no direction exists.
///
/// # Examples
///
/// ```
/// use granular::forces::versors;
/// use nalgebra::{Point2, Vector2};
///
/// let (n, t) = versors(Point2::new(0.0, 0.0), Point2::new(2.0, 0.0)).unwrap();
/// assert_eq!(n, Vector2::new(1.0, 0.0));
/// assert_eq!(t, Vector2::new(0.0, 1.0));
///
/// assert!(versors(Point2::new(1.0, 1.0), Point2::new(1.0, 1.0)).is_none());
/// ```
pub fn versors(from: Point2<f64>, to: Point2<f64>) -> Option<(Vector2<f64>, Vector2<f64>)> {
    let d = to - from;
    let distance = d.magnitude();
    if distance == 0.0 || !distance.is_finite() {
        return None;
    }
    let normal = d / distance;
    let tangential = Vector2::new(-normal.y, normal.x);
    Some((normal, tangential))
}

/// Hookean normal spring with overlap-proportional viscous friction
///
/// For an overlap ξ > 0, normal versor e_n (toward the other body) and
/// tangential versor e_t:
///
/// ```text
/// F_n = −kn · ξ · e_n
/// F_t = −kt · ξ · (v_rel · e_t) · e_t,   v_rel = v_self − v_other
/// ```
///
/// There is no restitution damping and the tangential force is not capped
/// by a Coulomb limit. Walls are static, so `v_rel` is the particle velocity.
///
/// # Examples
///
/// ```
/// use granular::forces::HookeanContact;
/// use granular::particle::{Particle, ParticleId};
/// use nalgebra::{Point2, Vector2};
///
/// let contact = HookeanContact::new(100.0, 0.0).unwrap();
/// let a = Particle::new(ParticleId(0), 0.5, 1.0, Point2::new(0.0, 0.0), Vector2::zeros()).unwrap();
/// let b = Particle::new(ParticleId(1), 0.5, 1.0, Point2::new(0.9, 0.0), Vector2::zeros()).unwrap();
///
/// let f = contact.between(&a, &b).unwrap();
/// assert!((f.normal.x + 10.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HookeanContact {
    /// Normal stiffness
    pub kn: f64,
    /// Tangential (viscous) coefficient
    pub kt: f64,
}

impl HookeanContact {
    /// # Errors
    ///
    /// `Error::InvalidConfig` unless `kn > 0` and `kt >= 0`, both finite.
    pub fn new(kn: f64, kt: f64) -> Result<Self> {
        if !kn.is_finite() || kn <= 0.0 {
            return Err(Error::InvalidConfig("kn must be finite and > 0".into()));
        }
        if !kt.is_finite() || kt < 0.0 {
            return Err(Error::InvalidConfig("kt must be finite and >= 0".into()));
        }
        Ok(Self { kn, kt })
    }

    /// Contact force for a given overlap and contact frame.
    pub fn force(
        &self,
        overlap: f64,
        normal: Vector2<f64>,
        tangential: Vector2<f64>,
        relative_velocity: Vector2<f64>,
    ) -> ContactForce {
        if overlap <= 0.0 {
            return ContactForce::zero();
        }
        let tangential_speed = relative_velocity.dot(&tangential);
        ContactForce {
            normal: normal * (-self.kn * overlap),
            tangential: tangential * (-self.kt * overlap * tangential_speed),
        }
    }

    /// Force exerted on `particle` by `other`.
    ///
    /// # Errors
    ///
    /// `Error::CoincidentParticles` if both centers are identical.
    pub fn between(&self, particle: &Particle, other: &Particle) -> Result<ContactForce> {
        let distance = (other.position - particle.position).magnitude();
        let overlap = particle.radius + other.radius - distance;
        if overlap <= 0.0 {
            return Ok(ContactForce::zero());
        }

        let (normal, tangential) =
            versors(particle.position, other.position).ok_or_else(|| {
                log::error!(
                    "particles {} and {} share position ({}, {})",
                    particle.id,
                    other.id,
                    particle.position.x,
                    particle.position.y
                );
                Error::CoincidentParticles {
                    a: particle.id,
                    b: other.id,
                }
            })?;

        let relative_velocity = particle.velocity - other.velocity;
        Ok(self.force(overlap, normal, tangential, relative_velocity))
    }

    /// Force exerted on `particle` by `wall` (`index` identifies the wall in errors).
    ///
    /// # Errors
    ///
    /// `Error::DegenerateWallContact` if the particle center lies on the wall.
    pub fn with_wall(&self, particle: &Particle, wall: &Wall, index: usize) -> Result<ContactForce> {
        let contact = wall.closest_point(particle.position);
        let overlap = particle.radius - (contact - particle.position).magnitude();
        if overlap <= 0.0 {
            return Ok(ContactForce::zero());
        }

        let (normal, tangential) = versors(particle.position, contact).ok_or_else(|| {
            log::error!("particle {} is centered on wall {}", particle.id, index);
            Error::DegenerateWallContact {
                particle: particle.id,
                wall: index,
            }
        })?;

        Ok(self.force(overlap, normal, tangential, particle.velocity))
    }
}
