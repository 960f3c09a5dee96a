//! Time integration for N-body systems
//!
//! Accelerations are computed by the force pass before integration runs, so
//! integrators here only advance velocities and positions from the
//! `acceleration` already stored on each body.

use crate::body::Body;

/// A time integrator for N-body systems
pub trait Integrator {
    /// Advance every body by one timestep using its stored acceleration
    fn step(&self, bodies: &mut [Body], dt: f64);
}

/// Semi-implicit (symplectic) Euler
///
/// The velocity is updated first and the new velocity moves the position:
///
/// 1. v(t + dt) = v(t) + a(t) * dt
/// 2. x(t + dt) = x(t) + v(t + dt) * dt
///
/// Unlike explicit Euler it keeps circular orbits bounded over long runs.
///
/// # Examples
///
/// ```
/// use quadgrav::body::{Body, BodyId};
/// use quadgrav::integrator::{Integrator, SemiImplicitEuler};
/// use nalgebra::{Point2, Vector2};
///
/// let mut bodies = vec![Body::new(
///     BodyId(0),
///     1.0,
///     1.0,
///     Point2::new(0.0, 0.0),
///     Vector2::new(1.0, 0.0),
/// )];
/// bodies[0].acceleration = Vector2::new(0.0, 2.0);
///
/// SemiImplicitEuler.step(&mut bodies, 0.5);
///
/// assert_eq!(bodies[0].velocity, Vector2::new(1.0, 1.0));
/// assert_eq!(bodies[0].position, Point2::new(0.5, 0.5));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SemiImplicitEuler;

impl Integrator for SemiImplicitEuler {
    fn step(&self, bodies: &mut [Body], dt: f64) {
        bodies.iter_mut().for_each(|body| {
            body.velocity += body.acceleration * dt;
            body.position += body.velocity * dt;
        });
    }
}

/// Explicit Euler (for comparison only)
///
/// Moves the position with the old velocity before updating it. Orbits
/// spiral outward, so the driver never uses it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Euler;

impl Integrator for Euler {
    fn step(&self, bodies: &mut [Body], dt: f64) {
        bodies.iter_mut().for_each(|body| {
            body.position += body.velocity * dt;
            body.velocity += body.acceleration * dt;
        });
    }
}
