//! Direct N-body gravity (O(N²) implementation)

use nalgebra::Vector2;

use crate::body::Body;
use crate::forces::{ForceModel, softened_acceleration};
use crate::params::SimulationParameters;

/// Direct O(N²) gravitational force computation
///
/// Sums the softened force law over every other body. Used as the accuracy
/// reference for [`crate::forces::TreeGravity`] and for small systems.
///
/// # Examples
///
/// ```
/// use quadgrav::forces::DirectGravity;
///
/// let gravity = DirectGravity::new(10.0, 0.5);
/// assert_eq!(gravity.g, 10.0);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DirectGravity {
    pub g: f64,
    pub softening: f64,
}

impl DirectGravity {
    pub fn new(g: f64, softening: f64) -> Self {
        Self { g, softening }
    }

    pub fn from_params(params: &SimulationParameters) -> Self {
        Self::new(params.g, params.softening_factor)
    }

    /// Softened potential energy, each pair counted once
    pub fn potential_energy(&self, bodies: &[Body]) -> f64 {
        let eps2 = self.softening * self.softening;

        bodies
            .iter()
            .enumerate()
            .flat_map(|(i, a)| {
                bodies[i + 1..].iter().map(move |b| {
                    let r = ((a.position - b.position).magnitude_squared() + eps2).sqrt();
                    -self.g * a.mass() * b.mass() / r
                })
            })
            .sum()
    }
}

impl ForceModel for DirectGravity {
    fn acceleration(&self, body: &Body, bodies: &[Body]) -> Vector2<f64> {
        bodies
            .iter()
            .filter(|other| other.id != body.id)
            .map(|other| {
                softened_acceleration(
                    body.position,
                    other.position,
                    other.mass(),
                    self.g,
                    self.softening,
                )
            })
            .fold(Vector2::zeros(), |acc, a| acc + a)
    }
}
