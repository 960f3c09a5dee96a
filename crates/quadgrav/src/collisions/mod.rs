//! Collision detection and resolution for N-body systems
//!
//! Touching bodies (center distance below the sum of radii) merge into the
//! larger of the two, conserving mass and momentum.

pub mod detection;
pub mod resolution;


pub use detection::{CollisionEvent, contact, direct_contacts, search_half_dim, tree_contacts};
pub use resolution::{remove_collided, resolve_collisions};
