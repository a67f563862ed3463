use std::collections::HashSet;

use approx::assert_relative_eq;
use nalgebra::{Point2, Vector2};

use crate::config::{NeighborStrategy, SiloConfig};
use crate::error::Error;
use crate::integrator::{Gear5, Integrator};
use crate::particle::{Particle, ParticleId};
use crate::silo::{GranularState, LifecycleReport};
use crate::state::SimulationState;
use crate::wall::silo_walls;

const MASS: f64 = 0.01;

fn particle(id: u32, x: f64, y: f64, radius: f64) -> Particle {
    Particle::new(ParticleId(id), radius, MASS, Point2::new(x, y), Vector2::zeros()).unwrap()
}

fn silo(particles: Vec<Particle>, config: &SiloConfig) -> GranularState {
    GranularState::new(particles, silo_walls(config).unwrap(), config).unwrap()
}

fn assert_stores_consistent(state: &GranularState) {
    let ids: HashSet<ParticleId> = state.particles().iter().map(|p| p.id).collect();
    assert_eq!(ids.len(), state.particles().len(), "duplicate ids");
    assert_eq!(state.current().len(), ids.len());
    assert_eq!(state.predicted().len(), ids.len());
    for id in ids {
        assert!(state.current().contains(id));
        assert!(state.predicted().contains(id));
    }
}

#[test]
fn test_construction_errors() {
    let config = SiloConfig::default();
    let walls = silo_walls(&config).unwrap();

    assert!(matches!(
        GranularState::new(Vec::new(), walls.clone(), &config),
        Err(Error::InvalidConfig(_))
    ));

    let twins = vec![particle(1, 0.1, 0.5, 0.01), particle(1, 0.3, 0.5, 0.01)];
    assert!(matches!(
        GranularState::new(twins, walls.clone(), &config),
        Err(Error::InvalidConfig(_))
    ));

    let bad = SiloConfig { kn: -1.0, ..SiloConfig::default() };
    assert!(GranularState::new(vec![particle(0, 0.2, 0.5, 0.01)], walls, &bad).is_err());
}

#[test]
fn test_initial_state() {
    let config = SiloConfig::default();
    let state = silo(
        vec![particle(0, 0.1, 0.5, 0.01), particle(1, 0.3, 0.5, 0.01)],
        &config,
    );

    assert_eq!(state.walls().len(), 4);
    assert_eq!(state.time(), 0.0);
    assert_stores_consistent(&state);
    for p in state.particles() {
        assert_relative_eq!(p.force.y, -MASS * config.gravity);
        assert_relative_eq!(state.current()[p.id][2].y, -config.gravity);
    }
}

#[test]
fn test_free_fall_is_parabolic() {
    let config = SiloConfig::default();
    let mut state = silo(vec![particle(0, 0.2, 0.6, 0.01)], &config);

    Gear5::new().integrate(&mut state, 1e-4, 100).unwrap();

    let t = 0.01;
    let p = state.particles()[0];
    assert_relative_eq!(state.time(), t, epsilon = 1e-12);
    assert_relative_eq!(p.position.x, 0.2, epsilon = 1e-12);
    assert_relative_eq!(p.position.y, 0.6 - 0.5 * config.gravity * t * t, epsilon = 1e-10);
    assert_relative_eq!(p.velocity.y, -config.gravity * t, epsilon = 1e-10);
    assert_eq!(p.normal_force, 0.0);
}

#[test]
fn test_floor_pushes_up() {
    let config = SiloConfig::default();
    // 1 mm into the left floor segment
    let mut state = silo(vec![particle(0, 0.05, 0.109, 0.01)], &config);

    state.pre_evaluate().unwrap();
    let evaluation = state.force_with_predicted(0).unwrap();

    assert_relative_eq!(evaluation.normal_force, config.kn * 0.001, epsilon = 1e-6);
    assert_relative_eq!(
        evaluation.force.y,
        config.kn * 0.001 - MASS * config.gravity,
        epsilon = 1e-6
    );
    assert_relative_eq!(evaluation.force.x, 0.0);
}

#[test]
fn test_pair_contact_is_equal_and_opposite() {
    let config = SiloConfig::default();
    let mut state = silo(
        vec![particle(0, 0.2, 0.5, 0.01), particle(1, 0.215, 0.5, 0.01)],
        &config,
    );

    state.pre_evaluate().unwrap();
    assert!(state.neighbors().are_neighbors(ParticleId(0), ParticleId(1)));

    let gravity = Vector2::new(0.0, -MASS * config.gravity);
    let a = state.force_with_predicted(0).unwrap().force - gravity;
    let b = state.force_with_predicted(1).unwrap().force - gravity;

    assert_relative_eq!(a.x, -config.kn * 0.005, epsilon = 1e-6);
    assert_relative_eq!(a.x, -b.x, epsilon = 1e-9);
    assert_relative_eq!(a.y, -b.y, epsilon = 1e-9);
}

#[test]
fn test_exit_and_respawn_in_one_step() {
    let config = SiloConfig::default();
    let mut falling = particle(0, 0.2, 0.0005, 0.01).with_kind(2);
    falling.velocity = Vector2::new(0.1, -1.0);
    let mut state = silo(vec![falling, particle(1, 0.2, 0.5, 0.01)], &config);

    Gear5::new().step(&mut state, 1e-3).unwrap();

    assert_eq!(
        state.lifecycle(),
        LifecycleReport {
            exited: 1,
            respawned: 1,
            pending: 0,
            exhausted: 0
        }
    );
    assert_eq!(state.total_exited(), 1);
    assert_eq!(state.particles().len(), 2);
    assert_stores_consistent(&state);

    let respawned = state
        .particles()
        .iter()
        .find(|p| p.id == ParticleId(0))
        .copied()
        .unwrap();
    assert_eq!(respawned.kind, Some(2));
    assert_eq!(respawned.radius, 0.01);
    assert_eq!(respawned.velocity, Vector2::zeros());
    assert_relative_eq!(respawned.force.y, -MASS * config.gravity);
    assert!(respawned.position.y > config.respawn_floor());
    assert!(respawned.position.y < config.total_length());
    assert_eq!(state.current()[ParticleId(0)][1], Vector2::zeros());
}

#[test]
fn test_undrained_queue_waits_for_slots() {
    let config = SiloConfig {
        exit_height: 0.05,
        ..SiloConfig::default()
    };
    // 16 particles below the exit height, 12 slots in the spawn band
    let particles: Vec<Particle> = (0..16)
        .map(|i| {
            let y = if i < 8 { 0.045 } else { 0.01 };
            particle(i, 0.03 + 0.04 * (i % 8) as f64, y, 0.015)
        })
        .collect();
    let mut state = silo(particles, &config);
    assert_eq!(state.respawner().slots().len(), 12);

    Gear5::new().step(&mut state, 1e-4).unwrap();

    let report = state.lifecycle();
    assert_eq!(report.exited, 16);
    assert_eq!(report.respawned, 12);
    assert_eq!(report.pending, 4);
    assert_eq!(report.exhausted, 4);
    assert_eq!(state.particles().len() + state.pending_respawns(), 16);
    assert_stores_consistent(&state);

    // freshly placed particles still hold their slots
    Gear5::new().step(&mut state, 1e-4).unwrap();
    assert_eq!(state.lifecycle().respawned, 0);
    assert_eq!(state.pending_respawns(), 4);
}

#[test]
fn test_strategies_agree() {
    let line = || -> Vec<Particle> {
        (0..10)
            .map(|i| particle(i, 0.1 + 0.019 * i as f64, 0.5, 0.01))
            .collect()
    };
    let cell = SiloConfig::default();
    let brute = SiloConfig {
        neighbor_strategy: NeighborStrategy::BruteForce,
        ..SiloConfig::default()
    };

    let mut a = silo(line(), &cell);
    let mut b = silo(line(), &brute);
    Gear5::new().integrate(&mut a, 1e-5, 20).unwrap();
    Gear5::new().integrate(&mut b, 1e-5, 20).unwrap();

    for (pa, pb) in a.particles().iter().zip(b.particles()) {
        assert_eq!(pa.id, pb.id);
        assert_relative_eq!(pa.position.x, pb.position.x, epsilon = 1e-12);
        assert_relative_eq!(pa.position.y, pb.position.y, epsilon = 1e-12);
    }
    // the contacts pushed the ends of the line apart
    assert!(a.particles()[0].velocity.x < 0.0);
    assert!(a.particles()[9].velocity.x > 0.0);
}

#[test]
fn test_particle_outside_grid_fails_step() {
    let config = SiloConfig::default();
    let mut state = silo(vec![particle(7, 0.2, 1.5, 0.01)], &config);

    let err = Gear5::new().step(&mut state, 1e-4).unwrap_err();
    assert!(matches!(err, Error::OutOfBounds { particle: ParticleId(7), .. }));
}

#[test]
fn test_coincident_particles_fail_step() {
    let config = SiloConfig::default();
    let mut state = silo(
        vec![particle(0, 0.2, 0.5, 0.01), particle(1, 0.2, 0.5, 0.01)],
        &config,
    );

    let err = Gear5::new().step(&mut state, 1e-4).unwrap_err();
    assert!(matches!(err, Error::CoincidentParticles { .. }));
}

#[test]
fn test_periodic_brute_force_builds() {
    let config = SiloConfig {
        periodic: true,
        neighbor_strategy: NeighborStrategy::BruteForce,
        ..SiloConfig::default()
    };
    let mut state = silo(vec![particle(0, 0.2, 0.5, 0.01)], &config);
    Gear5::new().step(&mut state, 1e-4).unwrap();
    assert_eq!(state.particles().len(), 1);
}

#[test]
fn test_exit_below_grid_is_rejected() {
    let config = SiloConfig { exit_height: -0.05, ..SiloConfig::default() };
    let walls = silo_walls(&SiloConfig::default()).unwrap();
    let mut falling = particle(0, 0.2, 0.0005, 0.01);
    falling.velocity = Vector2::new(0.0, -1.0);

    assert!(matches!(
        GranularState::new(vec![falling], walls, &config),
        Err(Error::InvalidConfig(_))
    ));
}

#[test]
fn test_state_and_strategies_are_thread_safe() {
    fn assert_send_sync<T: Send + Sync + ?Sized>() {}

    assert_send_sync::<GranularState>();
    assert_send_sync::<Box<dyn crate::neighbors::NeighborFinder>>();
    assert_send_sync::<dyn Integrator>();
}
