//! Time integration for granular systems
//!
//! This module provides the fifth-order Gear predictor-corrector. Each step
//! extrapolates every derivative order with a Taylor series (predict),
//! evaluates the force law at the predicted state (evaluate), and corrects
//! every order in proportion to the acceleration mismatch (fix).

use std::collections::HashMap;

use nalgebra::Vector2;

use crate::error::Result;
use crate::particle::ParticleId;
use crate::state::{ORDER, SimulationState};

/// k! for k in 0..=ORDER
const FACTORIAL: [f64; ORDER + 1] = [1.0, 1.0, 2.0, 6.0, 24.0, 120.0];

/// Gear corrector coefficients for second-order equations, fifth order,
/// with velocity-dependent forces (Gear 1966; Allen & Tildesley, table E.1)
pub const GEAR5_ALPHA: [f64; ORDER + 1] = [
    3.0 / 16.0,
    251.0 / 360.0,
    1.0,
    11.0 / 18.0,
    1.0 / 6.0,
    1.0 / 60.0,
];

/// Same table with α0 = 3/20, valid when forces depend on position only
pub const GEAR5_ALPHA_POSITION_ONLY: [f64; ORDER + 1] = [
    3.0 / 20.0,
    251.0 / 360.0,
    1.0,
    11.0 / 18.0,
    1.0 / 6.0,
    1.0 / 60.0,
];

/// Per-step aggregate values gathered while evaluating forces
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepReport {
    /// Largest per-particle normal contact force of the step
    pub max_normal_force: f64,
    /// Number of particles evaluated
    pub particles: usize,
}

/// A fixed-step time integrator
pub trait Integrator: Send + Sync {
    /// Advance the state by one timestep
    ///
    /// # Arguments
    ///
    /// * `state` - Simulation state (modified in place)
    /// * `dt` - Timestep, fixed and positive
    fn step(&self, state: &mut dyn SimulationState, dt: f64) -> Result<StepReport>;

    /// Advance the state by `n_steps` timesteps
    ///
    /// Stops at the first error. Returns the report of the last step.
    fn integrate(
        &self,
        state: &mut dyn SimulationState,
        dt: f64,
        n_steps: usize,
    ) -> Result<StepReport> {
        let mut report = StepReport::default();
        for _ in 0..n_steps {
            report = self.step(state, dt)?;
        }
        Ok(report)
    }
}

/// Fifth-order Gear predictor-corrector
///
/// Predict:
///
/// ```text
/// p_k(t+dt) = Σ_{i=k}^{5} r_i(t) · dt^(i-k) / (i-k)!
/// ```
///
/// Evaluate:
///
/// ```text
/// ΔR2 = (F(p)/m − p_2) · dt² / 2!
/// ```
///
/// Fix:
///
/// ```text
/// r_k(t+dt) = p_k + α_k · k! / dt^k · ΔR2
/// ```
///
/// # Examples
///
/// ```
/// use granular::integrator::{Gear5, Integrator};
/// use granular::particle::{Particle, ParticleId};
/// use granular::state::{DerivativeStore, Evaluation, SimulationState};
/// use granular::error::Result;
/// use nalgebra::{Point2, Vector2};
///
/// struct Free {
///     particles: Vec<Particle>,
///     current: DerivativeStore,
///     predicted: DerivativeStore,
/// }
///
/// impl SimulationState for Free {
///     fn particles(&self) -> &[Particle] { &self.particles }
///     fn particles_mut(&mut self) -> &mut [Particle] { &mut self.particles }
///     fn current(&self) -> &DerivativeStore { &self.current }
///     fn current_mut(&mut self) -> &mut DerivativeStore { &mut self.current }
///     fn predicted(&self) -> &DerivativeStore { &self.predicted }
///     fn predicted_mut(&mut self) -> &mut DerivativeStore { &mut self.predicted }
///     fn force_with_predicted(&self, _idx: usize) -> Result<Evaluation> {
///         Ok(Evaluation { force: Vector2::zeros(), normal_force: 0.0 })
///     }
/// }
///
/// let p = Particle::new(ParticleId(0), 0.5, 1.0, Point2::origin(), Vector2::new(1.0, 0.0)).unwrap();
/// let mut current = DerivativeStore::new();
/// current.insert(p.id, p.initial_derivatives());
/// let mut state = Free { particles: vec![p], current, predicted: DerivativeStore::new() };
///
/// Gear5::new().step(&mut state, 0.5).unwrap();
/// assert_eq!(state.particles[0].position, Point2::new(0.5, 0.0));
/// ```
#[derive(Debug, Clone)]
pub struct Gear5 {
    /// Corrector coefficients α_0..α_5
    pub alpha: [f64; ORDER + 1],
}

impl Gear5 {
    /// Gear integrator for velocity-dependent forces (α0 = 3/16)
    pub fn new() -> Self {
        Self { alpha: GEAR5_ALPHA }
    }

    /// Gear integrator for position-only forces (α0 = 3/20)
    pub fn position_only() -> Self {
        Self {
            alpha: GEAR5_ALPHA_POSITION_ONLY,
        }
    }

    fn predict(&self, state: &mut dyn SimulationState, dt: f64) -> Result<()> {
        state.pre_predict()?;

        // dt^n / n!
        let mut taylor = [1.0; ORDER + 1];
        for n in 1..=ORDER {
            taylor[n] = dt.powi(n as i32) / FACTORIAL[n];
        }

        for idx in 0..state.particles().len() {
            let id = state.particles()[idx].id;
            let r = state.current()[id];

            let mut predicted = [Vector2::zeros(); ORDER + 1];
            for (k, p_k) in predicted.iter_mut().enumerate() {
                *p_k = (k..=ORDER).fold(Vector2::zeros(), |acc, i| acc + r[i] * taylor[i - k]);
            }

            state.predicted_mut().insert(id, predicted);
            state.particles_mut()[idx].sync_from(&predicted);
        }

        state.post_predict()
    }

    fn evaluate(
        &self,
        state: &mut dyn SimulationState,
        dt: f64,
    ) -> Result<(HashMap<ParticleId, Vector2<f64>>, StepReport)> {
        state.pre_evaluate()?;

        let n = state.particles().len();
        let constant = dt * dt / FACTORIAL[2];
        let mut delta_r2 = HashMap::with_capacity(n);
        let mut report = StepReport {
            max_normal_force: 0.0,
            particles: n,
        };

        for idx in 0..n {
            let evaluation = state.force_with_predicted(idx)?;
            let particle = &mut state.particles_mut()[idx];
            particle.normal_force = evaluation.normal_force;
            let (id, mass) = (particle.id, particle.mass);

            report.max_normal_force = report.max_normal_force.max(evaluation.normal_force);

            let acceleration = evaluation.force / mass;
            let delta = acceleration - state.predicted()[id][2];
            delta_r2.insert(id, delta * constant);
        }

        state.post_evaluate()?;
        Ok((delta_r2, report))
    }

    fn fix(
        &self,
        state: &mut dyn SimulationState,
        dt: f64,
        delta_r2: &HashMap<ParticleId, Vector2<f64>>,
    ) -> Result<()> {
        state.pre_fix()?;

        // α_k · k! / dt^k
        let mut constants = [0.0; ORDER + 1];
        for (k, c) in constants.iter_mut().enumerate() {
            *c = self.alpha[k] * FACTORIAL[k] / dt.powi(k as i32);
        }

        for idx in 0..state.particles().len() {
            let id = state.particles()[idx].id;
            let predicted = state.predicted()[id];
            let delta = delta_r2.get(&id).copied().unwrap_or_else(Vector2::zeros);

            let mut corrected = predicted;
            for (k, r_k) in corrected.iter_mut().enumerate() {
                *r_k += delta * constants[k];
            }

            state.current_mut().insert(id, corrected);
            state.particles_mut()[idx].sync_from(&corrected);
        }

        state.post_fix()
    }
}

impl Default for Gear5 {
    fn default() -> Self {
        Self::new()
    }
}

impl Integrator for Gear5 {
    fn step(&self, state: &mut dyn SimulationState, dt: f64) -> Result<StepReport> {
        self.predict(state, dt)?;
        let (delta_r2, report) = self.evaluate(state, dt)?;
        self.fix(state, dt, &delta_r2)?;
        state.advance_time(dt);
        Ok(report)
    }
}
