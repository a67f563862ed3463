use std::fmt;

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::state::{Derivatives, ORDER};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticleId(pub u32);

impl fmt::Display for ParticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A circular grain.
///
/// `position`, `velocity` and `force` are a snapshot of the derivative
/// stores: the integrator refreshes them after the predict phase (so the
/// neighbor search sees predicted positions) and after the fix phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub id: ParticleId,
    pub radius: f64,
    pub mass: f64,
    pub position: Point2<f64>,
    pub velocity: Vector2<f64>,
    pub force: Vector2<f64>,
    /// Sum of normal contact force magnitudes from the last evaluation
    pub normal_force: f64,
    /// Optional user tag (e.g. grain species), preserved across respawns
    pub kind: Option<u32>,
}

impl Particle {
    /// Creates a particle at rest-free initial conditions, validating
    /// radius, mass and kinematics.
    ///
    /// # Errors
    ///
    /// `Error::InvalidConfig` if radius or mass is not finite and positive,
    /// or if position/velocity has a non-finite component.
    ///
    /// # Examples
    ///
    /// ```
    /// use granular::particle::{Particle, ParticleId};
    /// use nalgebra::{Point2, Vector2};
    ///
    /// let p = Particle::new(ParticleId(0), 0.5, 1.0, Point2::new(1.0, 2.0), Vector2::zeros()).unwrap();
    /// assert_eq!(p.normal_force, 0.0);
    /// assert!(Particle::new(ParticleId(1), 0.0, 1.0, Point2::origin(), Vector2::zeros()).is_err());
    /// ```
    pub fn new(
        id: ParticleId,
        radius: f64,
        mass: f64,
        position: Point2<f64>,
        velocity: Vector2<f64>,
    ) -> Result<Self> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "particle {id}: radius must be finite and > 0"
            )));
        }
        if !mass.is_finite() || mass <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "particle {id}: mass must be finite and > 0"
            )));
        }
        if !position.iter().all(|c| c.is_finite()) || !velocity.iter().all(|c| c.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "particle {id}: position and velocity must be finite"
            )));
        }

        Ok(Self {
            id,
            radius,
            mass,
            position,
            velocity,
            force: Vector2::zeros(),
            normal_force: 0.0,
            kind: None,
        })
    }

    pub fn with_kind(mut self, kind: u32) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_force(mut self, force: Vector2<f64>) -> Self {
        self.force = force;
        self
    }

    /// Derivative slots for a particle that is not interacting with anything:
    /// position, velocity and force/mass, higher orders zero.
    pub fn initial_derivatives(&self) -> Derivatives {
        let mut r = [Vector2::zeros(); ORDER + 1];
        r[0] = self.position.coords;
        r[1] = self.velocity;
        r[2] = self.force / self.mass;
        r
    }

    /// Copies position, velocity and force out of a derivative set.
    pub fn sync_from(&mut self, r: &Derivatives) {
        self.position = Point2::from(r[0]);
        self.velocity = r[1];
        self.force = r[2] * self.mass;
    }

    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.magnitude_squared()
    }

    /// Pressure diagnostic: accumulated normal force over the perimeter.
    pub fn pressure(&self) -> f64 {
        self.normal_force / (2.0 * std::f64::consts::PI * self.radius)
    }

    /// Center-to-center distance minus both radii (negative when overlapping).
    pub fn border_distance(&self, other: &Particle) -> f64 {
        (self.position - other.position).magnitude() - self.radius - other.radius
    }

    pub fn overlaps(&self, position: Point2<f64>, radius: f64) -> bool {
        (self.position - position).magnitude() <= self.radius + radius
    }
}
