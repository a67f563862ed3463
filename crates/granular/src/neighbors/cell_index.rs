//! Cell index method
//!
//! The `width × length` domain is split into `rows × cols` cells. Row 0 is
//! the top of the domain and column 0 its left edge. Each occupied cell is
//! compared against itself and four of its neighbors (up, up-right, right,
//! down-right), so every adjacent pair of cells is visited once.
//!
//! Results are only complete when every cell side exceeds
//! `cutoff + 2·max_radius`; this is not checked here.

use std::collections::{BTreeSet, HashMap};

use nalgebra::Vector2;

use crate::error::{Error, Result};
use crate::neighbors::brute_force::check_cutoff;
use crate::neighbors::{NeighborFinder, NeighborMap, within_cutoff};
use crate::particle::{Particle, ParticleId};

/// `(row, col)` of a grid cell
pub type CellCoord = (usize, usize);

/// Self, up, up-right, right, down-right as `(row, col)` steps
const STENCIL: [(i64, i64); 5] = [(0, 0), (-1, 0), (-1, 1), (0, 1), (1, 1)];

#[derive(Debug, Clone)]
pub struct CellIndex {
    length: f64,
    width: f64,
    rows: usize,
    cols: usize,
    cutoff: f64,
    periodic: bool,
    /// Created on first use and kept for the rest of the run
    cells: HashMap<CellCoord, Vec<ParticleId>>,
    membership: HashMap<ParticleId, CellCoord>,
}

impl CellIndex {
    /// # Errors
    ///
    /// `Error::InvalidConfig` if `rows` or `cols` is zero, `cutoff` is
    /// negative, or either extent is not positive.
    pub fn new(
        length: f64,
        width: f64,
        rows: usize,
        cols: usize,
        cutoff: f64,
        periodic: bool,
    ) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidConfig(format!(
                "cell grid must have at least one row and column (got {rows}x{cols})"
            )));
        }
        check_cutoff(cutoff)?;
        if !(length.is_finite() && length > 0.0 && width.is_finite() && width > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "cell index domain must be positive (got {width}x{length})"
            )));
        }

        log::info!(
            "cell index: {rows}x{cols} cells over {width}x{length}, cutoff {cutoff}, periodic {periodic}"
        );

        Ok(Self {
            length,
            width,
            rows,
            cols,
            cutoff,
            periodic,
            cells: HashMap::new(),
            membership: HashMap::new(),
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_periodic(&self) -> bool {
        self.periodic
    }

    /// Cell currently holding `id`, if indexed
    pub fn cell_of(&self, id: ParticleId) -> Option<CellCoord> {
        self.membership.get(&id).copied()
    }

    /// Ids stored in a cell
    pub fn occupants(&self, cell: CellCoord) -> &[ParticleId] {
        self.cells.get(&cell).map(Vec::as_slice).unwrap_or_default()
    }

    /// Cell a particle maps to at its current position.
    ///
    /// # Errors
    ///
    /// `Error::OutOfBounds` if the position falls outside the grid or is not
    /// finite.
    pub fn locate(&self, particle: &Particle) -> Result<CellCoord> {
        let cell_height = self.length / self.rows as f64;
        let cell_width = self.width / self.cols as f64;

        let t_row = floor_index(particle.position.y / cell_height);
        let row = (self.rows as i64 - 1).saturating_sub(t_row);
        let col = floor_index(particle.position.x / cell_width);

        let finite = particle.position.iter().all(|c| c.is_finite());
        let inside = (0..self.rows as i64).contains(&row) && (0..self.cols as i64).contains(&col);
        if !finite || !inside {
            log::error!(
                "particle {} at ({}, {}) maps to cell ({row}, {col}) outside the {}x{} grid",
                particle.id,
                particle.position.x,
                particle.position.y,
                self.rows,
                self.cols
            );
            return Err(Error::OutOfBounds {
                particle: particle.id,
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }

        Ok((row as usize, col as usize))
    }

    /// Moves `particle` to the cell matching its position
    fn place(&mut self, particle: &Particle) -> Result<CellCoord> {
        let cell = self.locate(particle)?;

        match self.membership.get(&particle.id) {
            Some(&previous) if previous == cell => return Ok(cell),
            Some(&previous) => self.remove_from_cell(previous, particle.id),
            None => {}
        }

        self.cells.entry(cell).or_default().push(particle.id);
        self.membership.insert(particle.id, cell);
        Ok(cell)
    }

    fn remove_from_cell(&mut self, cell: CellCoord, id: ParticleId) {
        if let Some(occupants) = self.cells.get_mut(&cell) {
            if let Some(pos) = occupants.iter().position(|&other| other == id) {
                occupants.swap_remove(pos);
            }
        }
    }

    /// Cell reached from `cell` by `step`, with the offset to apply to its
    /// particles. `None` when the step leaves a non-periodic grid.
    fn stencil_target(&self, cell: CellCoord, step: (i64, i64)) -> Option<(CellCoord, Vector2<f64>)> {
        let rows = self.rows as i64;
        let cols = self.cols as i64;
        let mut row = cell.0 as i64 + step.0;
        let mut col = cell.1 as i64 + step.1;
        let mut offset = Vector2::zeros();

        if row < 0 {
            if !self.periodic {
                return None;
            }
            row = rows - 1;
            offset.y = self.length;
        } else if row == rows {
            if !self.periodic {
                return None;
            }
            row = 0;
            offset.y = -self.length;
        }

        if col == cols {
            if !self.periodic {
                return None;
            }
            col = 0;
            offset.x = self.width;
        }

        Some(((row as usize, col as usize), offset))
    }

    fn check_within(
        &self,
        cell: CellCoord,
        lookup: &HashMap<ParticleId, &Particle>,
        map: &mut NeighborMap,
    ) {
        let occupants = self.occupants(cell);
        for (i, a) in occupants.iter().enumerate() {
            let Some(pa) = lookup.get(a) else { continue };
            for b in &occupants[i + 1..] {
                let Some(pb) = lookup.get(b) else { continue };
                if within_cutoff(pa, pb.position, pb.radius, self.cutoff) {
                    map.insert_pair(*a, *b);
                }
            }
        }
    }

    /// Compares every particle of `cell` against virtual copies of the
    /// particles in `other`, shifted by `offset`. `other` may be `cell` itself.
    fn check_between(
        &self,
        cell: CellCoord,
        other: CellCoord,
        offset: Vector2<f64>,
        lookup: &HashMap<ParticleId, &Particle>,
        map: &mut NeighborMap,
    ) {
        for a in self.occupants(cell) {
            let Some(pa) = lookup.get(a) else { continue };
            for b in self.occupants(other) {
                if a == b {
                    continue;
                }
                let Some(pb) = lookup.get(b) else { continue };
                if within_cutoff(pa, pb.position + offset, pb.radius, self.cutoff) {
                    map.insert_pair(*a, *b);
                }
            }
        }
    }
}

impl NeighborFinder for CellIndex {
    fn find(&mut self, particles: &[Particle]) -> Result<NeighborMap> {
        let lookup: HashMap<ParticleId, &Particle> = particles.iter().map(|p| (p.id, p)).collect();

        let stale: Vec<ParticleId> = self
            .membership
            .keys()
            .filter(|id| !lookup.contains_key(id))
            .copied()
            .collect();
        for id in stale {
            self.avoid(id);
        }

        // ordered so the sweep is reproducible
        let mut occupied = BTreeSet::new();
        for particle in particles {
            occupied.insert(self.place(particle)?);
        }

        let mut map = NeighborMap::with_particles(particles);
        for &cell in &occupied {
            for step in STENCIL {
                let Some((other, offset)) = self.stencil_target(cell, step) else {
                    continue;
                };
                if other == cell && offset == Vector2::zeros() {
                    self.check_within(cell, &lookup, &mut map);
                } else if occupied.contains(&other) {
                    // a wrap onto the same cell (single row or column) compares
                    // the cell against its own shifted copies
                    self.check_between(cell, other, offset, &lookup, &mut map);
                }
            }
        }

        Ok(map)
    }

    fn avoid(&mut self, id: ParticleId) {
        if let Some(cell) = self.membership.remove(&id) {
            self.remove_from_cell(cell, id);
        }
    }
}

/// `floor(v)` as an index; NaN maps to `i64::MIN` so it is never in range
fn floor_index(v: f64) -> i64 {
    if v.is_nan() { i64::MIN } else { v.floor() as i64 }
}
