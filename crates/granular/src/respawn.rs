//! Particle recycling
//!
//! Particles that leave the silo wait in a FIFO queue until they can be
//! placed back in the spawn band at the top of the domain without touching
//! any other particle. A placement that fails leaves the particle queued for
//! the next attempt.

use std::collections::{HashMap, VecDeque};

use nalgebra::{Point2, Vector2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaChaRng;

use crate::config::{RespawnStrategy, SiloConfig};
use crate::error::{Error, Result};
use crate::particle::{Particle, ParticleId};

/// Slot width as a multiple of the largest radius
pub const SLOT_WIDTH_FACTOR: f64 = 2.2;

/// Axis-aligned rectangle where particles are reinserted
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnRegion {
    pub min: Point2<f64>,
    pub max: Point2<f64>,
}

impl SpawnRegion {
    /// # Errors
    ///
    /// `Error::InvalidConfig` unless `min` is strictly below and left of `max`.
    pub fn new(min: Point2<f64>, max: Point2<f64>) -> Result<Self> {
        let finite = min.iter().chain(max.iter()).all(|c| c.is_finite());
        if !finite || min.x >= max.x || min.y >= max.y {
            return Err(Error::InvalidConfig(format!(
                "spawn region [{}, {}]x[{}, {}] is empty",
                min.x, max.x, min.y, max.y
            )));
        }
        Ok(Self { min, max })
    }

    /// The band above the silo: full width, from the silo top to the domain top
    pub fn from_config(config: &SiloConfig) -> Result<Self> {
        Self::new(
            Point2::new(0.0, config.respawn_floor()),
            Point2::new(config.width, config.total_length()),
        )
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn contains(&self, point: Point2<f64>) -> bool {
        (self.min.x..=self.max.x).contains(&point.x) && (self.min.y..=self.max.y).contains(&point.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot {
    pub center: Point2<f64>,
    pub occupant: Option<ParticleId>,
}

#[derive(Debug, Clone)]
enum Placement {
    Slots { slots: Vec<Slot>, slot_width: f64 },
    Random { rng: ChaChaRng, max_tries: usize },
}

/// Outcome of one [`Respawner::respawn`] call
#[derive(Debug, Clone, Default)]
pub struct Respawned {
    /// Fresh particles to add to the active set
    pub placed: Vec<Particle>,
    /// Queued particles that could not be placed this time
    pub exhausted: usize,
}

#[derive(Debug, Clone)]
pub struct Respawner {
    region: SpawnRegion,
    placement: Placement,
    queue: VecDeque<Particle>,
}

impl Respawner {
    /// Builds the strategy selected in `config` for particles up to `max_radius`.
    pub fn from_config(config: &SiloConfig, max_radius: f64) -> Result<Self> {
        let region = SpawnRegion::from_config(config)?;
        match config.respawn_strategy {
            RespawnStrategy::SlotGrid => Self::slot_grid(region, max_radius),
            RespawnStrategy::RandomRetry { max_tries } => {
                Self::random_retry(region, max_radius, max_tries, config.seed)
            }
        }
    }

    /// A single row of slots `2.2 · max_radius` wide, centered at mid-height
    /// of the band.
    ///
    /// A slot is free again once its occupant is more than a slot width away
    /// from the slot center or no longer active.
    ///
    /// # Errors
    ///
    /// `Error::InvalidConfig` if the band cannot hold one slot.
    ///
    /// # Examples
    ///
    /// ```
    /// use granular::respawn::{Respawner, SpawnRegion};
    /// use nalgebra::Point2;
    ///
    /// let region = SpawnRegion::new(Point2::new(0.0, 10.0), Point2::new(1.0, 11.0)).unwrap();
    /// let respawner = Respawner::slot_grid(region, 0.1).unwrap();
    /// assert_eq!(respawner.slots().len(), 4);
    /// ```
    pub fn slot_grid(region: SpawnRegion, max_radius: f64) -> Result<Self> {
        check_fits(&region, max_radius)?;

        let slot_width = SLOT_WIDTH_FACTOR * max_radius;
        let count = (region.width() / slot_width).floor() as usize;
        if count == 0 {
            return Err(Error::InvalidConfig(format!(
                "spawn band ({} wide) cannot hold a slot {slot_width} wide",
                region.width()
            )));
        }

        let y = (region.min.y + region.max.y) / 2.0;
        let slots = (0..count)
            .map(|i| Slot {
                center: Point2::new(region.min.x + slot_width * (i as f64 + 0.5), y),
                occupant: None,
            })
            .collect();

        log::info!("respawn: {count} slots of width {slot_width} at y = {y}");

        Ok(Self {
            region,
            placement: Placement::Slots { slots, slot_width },
            queue: VecDeque::new(),
        })
    }

    /// Uniform random candidates inside the band, at most `max_tries` per
    /// particle and attempt.
    pub fn random_retry(
        region: SpawnRegion,
        max_radius: f64,
        max_tries: usize,
        seed: u64,
    ) -> Result<Self> {
        check_fits(&region, max_radius)?;
        if max_tries == 0 {
            return Err(Error::InvalidConfig("max_tries must be > 0".into()));
        }

        log::info!("respawn: random placement, {max_tries} tries per particle");

        Ok(Self {
            region,
            placement: Placement::Random {
                rng: ChaChaRng::seed_from_u64(seed),
                max_tries,
            },
            queue: VecDeque::new(),
        })
    }

    pub fn region(&self) -> &SpawnRegion {
        &self.region
    }

    /// Slot layout; empty for random placement
    pub fn slots(&self) -> &[Slot] {
        match &self.placement {
            Placement::Slots { slots, .. } => slots,
            Placement::Random { .. } => &[],
        }
    }

    pub fn enqueue(&mut self, particle: Particle) {
        self.queue.push_back(particle);
    }

    /// Number of particles waiting to be placed
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn queued(&self) -> impl Iterator<Item = &Particle> {
        self.queue.iter()
    }

    /// Tries to place every queued particle, in queue order.
    ///
    /// Placed particles keep id, radius, mass and kind; they start at rest
    /// with force `(0, −m·gravity)`. Candidates must clear every particle in
    /// `active` and every particle placed earlier in the same call.
    pub fn respawn(&mut self, active: &[Particle], gravity: f64) -> Respawned {
        self.release_slots(active);

        let mut result = Respawned::default();
        let mut waiting = VecDeque::with_capacity(self.queue.len());

        while let Some(particle) = self.queue.pop_front() {
            match self.place(&particle, active, &result.placed) {
                Some(position) => {
                    let mut fresh = particle;
                    fresh.position = position;
                    fresh.velocity = Vector2::zeros();
                    fresh.force = Vector2::new(0.0, -particle.mass * gravity);
                    fresh.normal_force = 0.0;
                    result.placed.push(fresh);
                }
                None => {
                    result.exhausted += 1;
                    waiting.push_back(particle);
                }
            }
        }

        self.queue = waiting;
        result
    }

    fn release_slots(&mut self, active: &[Particle]) {
        let Placement::Slots { slots, slot_width } = &mut self.placement else {
            return;
        };

        let positions: HashMap<ParticleId, Point2<f64>> =
            active.iter().map(|p| (p.id, p.position)).collect();

        for slot in slots.iter_mut() {
            let Some(id) = slot.occupant else { continue };
            let still_there = positions
                .get(&id)
                .is_some_and(|position| (position - slot.center).magnitude() <= *slot_width);
            if !still_there {
                slot.occupant = None;
            }
        }
    }

    fn place(
        &mut self,
        particle: &Particle,
        active: &[Particle],
        placed: &[Particle],
    ) -> Option<Point2<f64>> {
        let region = self.region;
        let clear = |candidate: Point2<f64>| {
            active
                .iter()
                .chain(placed)
                .all(|other| !other.overlaps(candidate, particle.radius))
        };

        match &mut self.placement {
            Placement::Slots { slots, .. } => {
                let mut free = slots.iter_mut().filter(|slot| slot.occupant.is_none()).peekable();
                if free.peek().is_none() {
                    log::debug!("no free respawn slot for particle {}", particle.id);
                    return None;
                }
                for slot in free {
                    if clear(slot.center) {
                        slot.occupant = Some(particle.id);
                        return Some(slot.center);
                    }
                }
                log::debug!("every free respawn slot is blocked for particle {}", particle.id);
                None
            }
            Placement::Random { rng, max_tries } => {
                let r = particle.radius;
                let (x_min, x_max) = (region.min.x + r, region.max.x - r);
                let (y_min, y_max) = (region.min.y + r, region.max.y - r);
                if x_min > x_max || y_min > y_max {
                    log::debug!("particle {} does not fit in the spawn band", particle.id);
                    return None;
                }
                for _ in 0..*max_tries {
                    let candidate = Point2::new(
                        rng.random_range(x_min..=x_max),
                        rng.random_range(y_min..=y_max),
                    );
                    if clear(candidate) {
                        return Some(candidate);
                    }
                }
                log::debug!(
                    "gave up placing particle {} after {max_tries} tries",
                    particle.id
                );
                None
            }
        }
    }
}

fn check_fits(region: &SpawnRegion, max_radius: f64) -> Result<()> {
    if !max_radius.is_finite() || max_radius <= 0.0 {
        return Err(Error::InvalidConfig(format!(
            "max radius must be finite and > 0 (got {max_radius})"
        )));
    }
    if region.height() < 2.0 * max_radius {
        return Err(Error::InvalidConfig(format!(
            "spawn band ({} high) is thinner than a particle ({})",
            region.height(),
            2.0 * max_radius
        )));
    }
    Ok(())
}
