//! Barnes-Hut N-body simulation in the plane.
//!
//! Bodies attract each other through softened Newtonian gravity, merge when
//! they touch and advance with semi-implicit Euler. Far-field forces come
//! from an arena quadtree ([`quadtree::QuadTree`]) rebuilt every frame.
//!
//! Start from [`simulation::Simulation`]:
//!
//! ```
//! use quadgrav::params::SimulationParameters;
//! use quadgrav::simulation::Simulation;
//!
//! let mut sim = Simulation::new(SimulationParameters {
//!     num_bodies: 100,
//!     seed: Some(1),
//!     ..Default::default()
//! })
//! .unwrap();
//!
//! for _ in 0..10 {
//!     sim.step();
//! }
//! assert_eq!(sim.frame(), 10);
//! ```

pub mod body;
pub mod collisions;
pub mod forces;
pub mod integrator;
pub mod params;
pub mod quadtree;
pub mod seeding;
pub mod simulation;

#[cfg(test)]
mod simulation_test;
