use approx::assert_relative_eq;

use crate::config::{NeighborStrategy, RespawnStrategy, SiloConfig};
use crate::error::Error;

#[test]
fn test_default_is_valid() {
    let config = SiloConfig::default();
    assert!(config.validate().is_ok());
    assert_relative_eq!(config.total_length(), 1.2);
    assert_relative_eq!(config.respawn_floor(), 1.1);
    assert_relative_eq!(config.floor_height(), 0.1);
}

#[test]
fn test_json_round_trip_keeps_strategies() {
    let config = SiloConfig {
        periodic: true,
        neighbor_strategy: NeighborStrategy::BruteForce,
        respawn_strategy: RespawnStrategy::RandomRetry { max_tries: 7 },
        grid: Some([4, 3]),
        ..SiloConfig::default()
    };

    let json = config.to_json().unwrap();
    let parsed = SiloConfig::from_json_str(&json).unwrap();

    assert_eq!(parsed, config);
}

#[test]
fn test_json_respawn_strategy_format() {
    let config =
        SiloConfig::from_json_str(r#"{ "respawn_strategy": { "kind": "random_retry", "max_tries": 5 } }"#)
            .unwrap();
    assert_eq!(
        config.respawn_strategy,
        RespawnStrategy::RandomRetry { max_tries: 5 }
    );

    let config = SiloConfig::from_json_str(r#"{ "respawn_strategy": { "kind": "slot_grid" } }"#).unwrap();
    assert_eq!(config.respawn_strategy, RespawnStrategy::SlotGrid);
}

#[test]
fn test_malformed_json_is_reported() {
    let err = SiloConfig::from_json_str("{ width: }").unwrap_err();
    assert!(matches!(err, Error::Json(_)));
}

#[test]
fn test_missing_file_is_io_error() {
    let err = SiloConfig::from_path("/nonexistent/silo.json").unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn test_invalid_values_rejected() {
    let cases = [
        SiloConfig { length: 0.0, ..SiloConfig::default() },
        SiloConfig { width: -1.0, ..SiloConfig::default() },
        SiloConfig { kn: 0.0, ..SiloConfig::default() },
        SiloConfig { kt: -1.0, ..SiloConfig::default() },
        SiloConfig { cutoff: -0.1, ..SiloConfig::default() },
        SiloConfig { gravity: f64::NAN, ..SiloConfig::default() },
        SiloConfig { opening: 0.5, width: 0.4, ..SiloConfig::default() },
        SiloConfig { respawn_length: 0.0, ..SiloConfig::default() },
        SiloConfig { exit_height: 1.5, ..SiloConfig::default() },
        SiloConfig { exit_height: -0.05, ..SiloConfig::default() },
        SiloConfig { grid: Some([0, 3]), ..SiloConfig::default() },
        SiloConfig {
            respawn_strategy: RespawnStrategy::RandomRetry { max_tries: 0 },
            ..SiloConfig::default()
        },
    ];

    for config in cases {
        assert!(
            matches!(config.validate(), Err(Error::InvalidConfig(_))),
            "accepted {config:?}"
        );
    }
}

#[test]
fn test_grid_derivation() {
    // total length 1.2, width 0.4, interaction 0.03 => 40 and 13.33
    let config = SiloConfig::default();
    let (rows, cols) = config.grid_for(0.015).unwrap();

    // 1.2 / 0.03 is 40 up to rounding
    assert!(rows == 39 || rows == 40);
    assert_eq!(cols, 13);
}

#[test]
fn test_grid_derivation_drops_exact_fit() {
    let config = SiloConfig {
        length: 2.0,
        width: 2.0,
        fall_length: 1.0,
        respawn_length: 1.0,
        ..SiloConfig::default()
    };

    // 4 / 1 and 2 / 1 are exact: one cell fewer in each direction
    assert_eq!(config.grid_for(0.5).unwrap(), (3, 1));
}

#[test]
fn test_explicit_grid_wins() {
    let config = SiloConfig {
        grid: Some([5, 2]),
        ..SiloConfig::default()
    };
    assert_eq!(config.grid_for(0.01).unwrap(), (5, 2));
}

#[test]
fn test_grid_too_small_for_particles() {
    let config = SiloConfig::default();
    assert!(config.grid_for(0.3).is_err());
}
