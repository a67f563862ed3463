use approx::assert_relative_eq;
use nalgebra::Point2;

use crate::config::SiloConfig;
use crate::wall::{Wall, silo_walls};

#[test]
fn test_zero_length_wall_rejected() {
    let p = Point2::new(1.0, 1.0);
    assert!(Wall::new(p, p).is_err());
    assert!(Wall::new(p, Point2::new(f64::INFINITY, 0.0)).is_err());
}

#[test]
fn test_closest_point_inside_segment() {
    let wall = Wall::new(Point2::new(0.0, 0.0), Point2::new(4.0, 0.0)).unwrap();

    assert_eq!(wall.closest_point(Point2::new(1.5, 2.0)), Point2::new(1.5, 0.0));
    assert_relative_eq!(wall.distance_to(Point2::new(1.5, -3.0)), 3.0);
    assert_relative_eq!(wall.length(), 4.0);
}

#[test]
fn test_closest_point_clamps_to_endpoints() {
    let wall = Wall::new(Point2::new(0.0, 0.0), Point2::new(4.0, 0.0)).unwrap();

    assert_eq!(wall.closest_point(Point2::new(-1.0, 1.0)), Point2::new(0.0, 0.0));
    assert_eq!(wall.closest_point(Point2::new(7.0, -4.0)), Point2::new(4.0, 0.0));
    assert_relative_eq!(wall.distance_to(Point2::new(7.0, -4.0)), 5.0);
}

#[test]
fn test_silo_walls_leave_opening() {
    let config = SiloConfig {
        width: 1.0,
        opening: 0.2,
        fall_length: 0.5,
        ..SiloConfig::default()
    };

    let walls = silo_walls(&config).unwrap();
    assert_eq!(walls.len(), 4);

    // a point at the opening center on the floor line touches no floor wall
    let center = Point2::new(0.5, 0.5);
    let floor_distance = walls[2..]
        .iter()
        .map(|w| w.distance_to(center))
        .fold(f64::INFINITY, f64::min);
    assert_relative_eq!(floor_distance, 0.1, epsilon = 1e-12);

    // side walls span the whole domain height
    assert_relative_eq!(walls[0].length(), config.total_length() - config.fall_length);
}

#[test]
fn test_silo_without_floor_when_fully_open() {
    let config = SiloConfig {
        width: 1.0,
        opening: 1.0,
        ..SiloConfig::default()
    };

    let walls = silo_walls(&config).unwrap();
    assert_eq!(walls.len(), 2);
}
