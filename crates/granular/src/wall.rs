//! Static boundaries
//!
//! Walls are line segments. They never move and only push on particles.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::config::SiloConfig;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    pub start: Point2<f64>,
    pub end: Point2<f64>,
}

impl Wall {
    /// # Errors
    ///
    /// `Error::InvalidConfig` if the endpoints are not finite or coincide.
    pub fn new(start: Point2<f64>, end: Point2<f64>) -> Result<Self> {
        if !start.iter().chain(end.iter()).all(|c| c.is_finite()) {
            return Err(Error::InvalidConfig("wall endpoints must be finite".into()));
        }
        if start == end {
            return Err(Error::InvalidConfig("wall must have non-zero length".into()));
        }
        Ok(Self { start, end })
    }

    pub fn length(&self) -> f64 {
        (self.end - self.start).magnitude()
    }

    /// Point of the segment closest to `point`
    pub fn closest_point(&self, point: Point2<f64>) -> Point2<f64> {
        let direction = self.end - self.start;
        let t = (point - self.start).dot(&direction) / direction.magnitude_squared();
        self.start + direction * t.clamp(0.0, 1.0)
    }

    pub fn distance_to(&self, point: Point2<f64>) -> f64 {
        (point - self.closest_point(point)).magnitude()
    }
}

/// Walls of a flat-bottomed silo with a centered opening.
///
/// The silo floor sits at `y = fall_length` and spans `[0, width]`, split
/// around an opening of width `opening`. Side walls rise from the floor to
/// the top of the domain, enclosing the respawn band. The fall zone below
/// the floor is left open.
///
/// # Examples
///
/// ```
/// use granular::config::SiloConfig;
/// use granular::wall::silo_walls;
///
/// let config = SiloConfig::default();
/// let walls = silo_walls(&config).unwrap();
/// assert_eq!(walls.len(), 4);
/// ```
pub fn silo_walls(config: &SiloConfig) -> Result<Vec<Wall>> {
    let floor = config.fall_length;
    let top = config.total_length();
    let left_edge = (config.width - config.opening) / 2.0;
    let right_edge = left_edge + config.opening;

    let mut walls = vec![
        Wall::new(Point2::new(0.0, floor), Point2::new(0.0, top))?,
        Wall::new(Point2::new(config.width, floor), Point2::new(config.width, top))?,
    ];

    if left_edge > 0.0 {
        walls.push(Wall::new(Point2::new(0.0, floor), Point2::new(left_edge, floor))?);
    }
    if right_edge < config.width {
        walls.push(Wall::new(
            Point2::new(right_edge, floor),
            Point2::new(config.width, floor),
        )?);
    }

    Ok(walls)
}
