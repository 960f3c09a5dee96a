//! Force models for N-body simulations
//!
//! Both models share one softened force law (see [`softened_acceleration`]),
//! so the tree model converges to the direct sum as theta goes to zero.

use nalgebra::{Point2, Vector2};

use crate::body::Body;

pub mod gravity;
pub mod tree_gravity;


pub use gravity::DirectGravity;
pub use tree_gravity::TreeGravity;

/// Smallest separation used in the force law.
///
/// Coincident bodies would otherwise produce a zero-length direction vector
/// and, with no softening, a division by zero.
pub const MIN_DISTANCE: f64 = 1e-9;

/// A source of acceleration on bodies
///
/// # Examples
///
/// ```
/// use quadgrav::body::{Body, BodyId};
/// use quadgrav::forces::{DirectGravity, ForceModel};
/// use nalgebra::{Point2, Vector2};
///
/// let bodies = vec![
///     Body::new(BodyId(0), 100.0, 1.0, Point2::new(0.0, 0.0), Vector2::zeros()),
///     Body::new(BodyId(1), 1.0, 1.0, Point2::new(5.0, 0.0), Vector2::zeros()),
/// ];
///
/// let gravity = DirectGravity::new(1.0, 0.0);
/// let accel = gravity.acceleration(&bodies[1], &bodies);
/// assert!(accel.x < 0.0);
/// ```
pub trait ForceModel {
    /// Acceleration on `body` from everything else in `bodies`.
    ///
    /// `body` itself may appear in `bodies`; it is recognised by id.
    fn acceleration(&self, body: &Body, bodies: &[Body]) -> Vector2<f64>;
}

/// Adds each body's acceleration under `force` to its `acceleration` field.
///
/// All accelerations are evaluated against the same positions before any
/// body is updated.
pub fn accumulate_accelerations(bodies: &mut [Body], force: &dyn ForceModel) {
    let current: &[Body] = bodies;
    let accelerations: Vec<Vector2<f64>> = current
        .iter()
        .map(|body| force.acceleration(body, current))
        .collect();

    bodies
        .iter_mut()
        .zip(accelerations)
        .for_each(|(body, accel)| body.acceleration += accel);
}

/// Acceleration at `from` due to `mass` located at `toward`:
/// `g * mass * dir / (dist² + softening²)`, with `dir` the unit vector toward
/// the mass and `dist` floored at [`MIN_DISTANCE`].
#[inline]
pub fn softened_acceleration(
    from: Point2<f64>,
    toward: Point2<f64>,
    mass: f64,
    g: f64,
    softening: f64,
) -> Vector2<f64> {
    let offset = toward - from;
    let distance = offset.magnitude().max(MIN_DISTANCE);
    let direction = offset / distance;

    direction * (g * mass / (distance * distance + softening * softening))
}
