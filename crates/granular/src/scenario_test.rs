use rand::SeedableRng;
use rand_chacha::ChaChaRng;

use crate::config::SiloConfig;
use crate::error::Error;
use crate::scenario::fill_silo;

#[test]
fn test_fill_is_non_overlapping_and_inside() {
    let config = SiloConfig::default();
    let mut rng = ChaChaRng::seed_from_u64(1);

    let particles = fill_silo(&config, 200, (0.01, 0.015), 0.01, &mut rng).unwrap();

    assert_eq!(particles.len(), 200);
    for (i, a) in particles.iter().enumerate() {
        assert_eq!(a.id.0 as usize, i);
        assert!(a.radius >= 0.01 && a.radius <= 0.015);
        assert!(a.position.x - a.radius >= 0.0 && a.position.x + a.radius <= config.width);
        assert!(a.position.y - a.radius >= config.floor_height());
        assert!(a.position.y + a.radius <= config.respawn_floor());
        for b in &particles[i + 1..] {
            assert!(a.border_distance(b) > 0.0);
        }
    }
}

#[test]
fn test_fill_is_reproducible() {
    let config = SiloConfig::default();
    let a = fill_silo(&config, 20, (0.01, 0.01), 0.01, &mut ChaChaRng::seed_from_u64(5)).unwrap();
    let b = fill_silo(&config, 20, (0.01, 0.01), 0.01, &mut ChaChaRng::seed_from_u64(5)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_fill_sets_gravity_force() {
    let config = SiloConfig::default();
    let particles =
        fill_silo(&config, 1, (0.01, 0.01), 0.5, &mut ChaChaRng::seed_from_u64(0)).unwrap();
    assert_eq!(particles[0].force.y, -0.5 * config.gravity);
}

#[test]
fn test_overfull_silo_fails() {
    let config = SiloConfig::default();
    let result = fill_silo(&config, 100, (0.1, 0.1), 0.01, &mut ChaChaRng::seed_from_u64(0));
    assert!(matches!(result, Err(Error::InvalidConfig(_))));
}

#[test]
fn test_invalid_radius_range() {
    let config = SiloConfig::default();
    let mut rng = ChaChaRng::seed_from_u64(0);
    assert!(fill_silo(&config, 1, (0.02, 0.01), 0.01, &mut rng).is_err());
    assert!(fill_silo(&config, 1, (0.0, 0.01), 0.01, &mut rng).is_err());
    assert!(fill_silo(&config, 1, (0.5, 0.5), 0.01, &mut rng).is_err());
}
