//! Force models for granular simulations
//!
//! Contacts are linear Hookean springs along the normal with a viscous
//! tangential term, both proportional to the overlap between bodies. Body
//! forces (gravity) are added by the scenario.

pub mod contact;


pub use contact::{ContactForce, HookeanContact, versors};

/// Standard gravity in m/s²
pub const G: f64 = 9.80665;
