//! Silo configuration
//!
//! All lengths are in meters, masses in kilograms. The domain is a
//! `width × total_length()` rectangle with the origin at its bottom-left
//! corner, stacked from the bottom up as: fall zone, silo, respawn band.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::forces::G;

/// Which neighbor search the simulation uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeighborStrategy {
    /// O(N²) all-pairs search
    BruteForce,
    /// Uniform grid with a half-stencil sweep
    CellIndex,
}

/// How recycled particles are placed back in the respawn band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RespawnStrategy {
    /// A fixed row of slots, each reused once its occupant has left
    SlotGrid,
    /// Uniform random positions, rejected on overlap
    RandomRetry { max_tries: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiloConfig {
    /// Height of the silo itself
    pub length: f64,
    /// Width of the silo and of the whole domain
    pub width: f64,
    /// Width of the exit opening, centered in the floor
    pub opening: f64,
    /// Height of the free-fall zone below the silo floor
    pub fall_length: f64,
    /// Height of the band above the silo where particles respawn
    pub respawn_length: f64,
    /// Normal stiffness
    pub kn: f64,
    /// Tangential viscous coefficient
    pub kt: f64,
    /// Gravitational acceleration (pointing down)
    pub gravity: f64,
    /// Extra border distance still counted as a neighbor relation
    pub cutoff: f64,
    /// Wrap the neighbor search at the domain edges.
    ///
    /// Only the neighbor relation wraps: contact forces use real positions,
    /// so pairs that touch only across the wrap exert no force on each other.
    pub periodic: bool,
    pub neighbor_strategy: NeighborStrategy,
    pub respawn_strategy: RespawnStrategy,
    /// Explicit `[rows, cols]` for the cell index; derived when absent
    pub grid: Option<[usize; 2]>,
    /// Particles whose center drops below this height are recycled
    pub exit_height: f64,
    /// Seed for every random draw (initial packing, random respawn)
    pub seed: u64,
}

impl Default for SiloConfig {
    fn default() -> Self {
        Self {
            length: 1.0,
            width: 0.4,
            opening: 0.15,
            fall_length: 0.1,
            respawn_length: 0.1,
            kn: 1.0e5,
            kt: 2.0e5,
            gravity: G,
            cutoff: 0.0,
            periodic: false,
            neighbor_strategy: NeighborStrategy::CellIndex,
            respawn_strategy: RespawnStrategy::SlotGrid,
            grid: None,
            exit_height: 0.0,
            seed: 42,
        }
    }
}

impl SiloConfig {
    /// Parses and validates a JSON configuration. Missing fields take their
    /// default values.
    ///
    /// # Examples
    ///
    /// ```
    /// use granular::config::{NeighborStrategy, SiloConfig};
    ///
    /// let config = SiloConfig::from_json_str(r#"{ "width": 0.3, "neighbor_strategy": "brute_force" }"#).unwrap();
    /// assert_eq!(config.width, 0.3);
    /// assert_eq!(config.neighbor_strategy, NeighborStrategy::BruteForce);
    /// assert_eq!(config.length, 1.0);
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Height of the whole domain: fall zone + silo + respawn band
    pub fn total_length(&self) -> f64 {
        self.fall_length + self.length + self.respawn_length
    }

    /// Height of the silo floor
    pub fn floor_height(&self) -> f64 {
        self.fall_length
    }

    /// Bottom of the respawn band
    pub fn respawn_floor(&self) -> f64 {
        self.fall_length + self.length
    }

    /// # Errors
    ///
    /// `Error::InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("length", self.length),
            ("width", self.width),
            ("respawn_length", self.respawn_length),
            ("kn", self.kn),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be finite and > 0 (got {value})"
                )));
            }
        }

        let non_negative = [
            ("opening", self.opening),
            ("fall_length", self.fall_length),
            ("kt", self.kt),
            ("gravity", self.gravity),
            ("cutoff", self.cutoff),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be finite and >= 0 (got {value})"
                )));
            }
        }

        if self.opening > self.width {
            return Err(Error::InvalidConfig(format!(
                "opening ({}) is wider than the silo ({})",
                self.opening, self.width
            )));
        }
        if !self.exit_height.is_finite()
            || self.exit_height < 0.0
            || self.exit_height >= self.respawn_floor()
        {
            return Err(Error::InvalidConfig(format!(
                "exit_height ({}) must be >= 0 and below the respawn band",
                self.exit_height
            )));
        }
        if let Some([rows, cols]) = self.grid {
            if rows == 0 || cols == 0 {
                return Err(Error::InvalidConfig("grid dimensions must be > 0".into()));
            }
        }
        if let RespawnStrategy::RandomRetry { max_tries: 0 } = self.respawn_strategy {
            return Err(Error::InvalidConfig("max_tries must be > 0".into()));
        }

        Ok(())
    }

    /// Cell grid `(rows, cols)` for particles up to `max_radius`.
    ///
    /// Uses the explicit `grid` when set. Otherwise each dimension gets the
    /// largest cell count whose cell side is strictly greater than
    /// `cutoff + 2·max_radius`.
    ///
    /// # Errors
    ///
    /// `Error::InvalidConfig` if the domain cannot hold a single such cell.
    pub fn grid_for(&self, max_radius: f64) -> Result<(usize, usize)> {
        if let Some([rows, cols]) = self.grid {
            return Ok((rows, cols));
        }

        let interaction = self.cutoff + 2.0 * max_radius;
        if !interaction.is_finite() || interaction <= 0.0 {
            return Err(Error::InvalidConfig(
                "cannot derive a grid without a positive interaction range".into(),
            ));
        }

        let rows = cells_along(self.total_length(), interaction);
        let cols = cells_along(self.width, interaction);
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidConfig(format!(
                "domain {}x{} is smaller than one interaction range ({interaction})",
                self.width,
                self.total_length()
            )));
        }

        Ok((rows, cols))
    }
}

/// Largest M with extent / M > interaction
fn cells_along(extent: f64, interaction: f64) -> usize {
    let ratio = extent / interaction;
    let cells = ratio.floor();
    let cells = if cells == ratio { cells - 1.0 } else { cells };
    if cells < 1.0 { 0 } else { cells as usize }
}
