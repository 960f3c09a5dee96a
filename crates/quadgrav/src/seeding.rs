//! Initial body distributions
//!
//! Bodies are spread uniformly over the area of a disk of radius
//! `INITIALIZATION_RADIUS` centred on the origin. Two velocity modes exist:
//!
//! - **Central body**: body 0 is a fixed heavy mass at rest at the origin and
//!   every other body starts on a counter-clockwise circular orbit around it,
//!   `speed = sqrt(G * M_central / r)`.
//! - **Free bodies**: every velocity component is drawn independently from
//!   `[-MAX_INITIAL_VELOCITY, MAX_INITIAL_VELOCITY]`.

use std::f64::consts::TAU;

use log::debug;
use nalgebra::{Point2, Vector2};
use rand::Rng;
use rand_chacha::ChaChaRng;

use crate::body::{Body, BodyId, radius_from_mass};
use crate::params::SimulationParameters;

/// Seeds `params.num_bodies` bodies with ids `0..num_bodies`.
///
/// With a central body configured it counts toward `num_bodies`. Satellite
/// positions are redrawn until the satellite clears the central body's
/// surface, which [`SimulationParameters::validate`] guarantees is possible.
///
/// # Examples
///
/// ```
/// use quadgrav::params::SimulationParameters;
/// use quadgrav::seeding::initialize_bodies;
/// use rand::SeedableRng;
/// use rand_chacha::ChaChaRng;
///
/// let params = SimulationParameters {
///     num_bodies: 100,
///     ..Default::default()
/// };
/// let mut rng = ChaChaRng::seed_from_u64(42);
/// let bodies = initialize_bodies(&params, &mut rng);
///
/// assert_eq!(bodies.len(), 100);
/// assert_eq!(bodies[0].mass(), 1000.0);
/// assert!(bodies.iter().all(|b| b.orbital_radius() <= params.initialization_radius));
/// ```
pub fn initialize_bodies(params: &SimulationParameters, rng: &mut ChaChaRng) -> Vec<Body> {
    let mut bodies = Vec::with_capacity(params.num_bodies);

    match params.central_body_mass {
        Some(central_mass) if params.num_bodies > 0 => {
            let central = Body::new(
                BodyId(0),
                central_mass,
                params.density,
                Point2::origin(),
                Vector2::zeros(),
            );
            bodies.push(central);

            for id in 1..params.num_bodies {
                bodies.push(orbiting_body(id as u32, &central, params, rng));
            }
        }
        _ => {
            for id in 0..params.num_bodies {
                bodies.push(free_body(id as u32, params, rng));
            }
        }
    }

    debug!(
        "seeded {} bodies in a disk of radius {}",
        bodies.len(),
        params.initialization_radius
    );
    bodies
}

/// A point uniformly distributed over the area of a disk of `radius`
pub fn sample_disk(rng: &mut ChaChaRng, radius: f64) -> Point2<f64> {
    let r = radius * rng.random::<f64>().sqrt();
    let angle = rng.random_range(0.0..TAU);
    Point2::new(r * angle.cos(), r * angle.sin())
}

/// Counter-clockwise circular orbit velocity at `position` around `central`
pub fn circular_velocity(g: f64, central: &Body, position: Point2<f64>) -> Vector2<f64> {
    let offset = position - central.position;
    let r = offset.magnitude();
    if r == 0.0 {
        return central.velocity;
    }
    let speed = (g * central.mass() / r).sqrt();
    // (-sin, cos) of the position angle
    let tangent = Vector2::new(-offset.y, offset.x) / r;
    central.velocity + tangent * speed
}

fn sample_mass(params: &SimulationParameters, rng: &mut ChaChaRng) -> f64 {
    rng.random_range(params.min_mass..=params.max_mass)
}

fn orbiting_body(
    id: u32,
    central: &Body,
    params: &SimulationParameters,
    rng: &mut ChaChaRng,
) -> Body {
    let mass = sample_mass(params, rng);
    let clearance = central.radius() + radius_from_mass(mass, params.density);

    let position = loop {
        let candidate = sample_disk(rng, params.initialization_radius);
        if (candidate - central.position).magnitude() > clearance {
            break candidate;
        }
    };

    let velocity = circular_velocity(params.g, central, position);
    Body::new(BodyId(id), mass, params.density, position, velocity)
}

fn free_body(id: u32, params: &SimulationParameters, rng: &mut ChaChaRng) -> Body {
    let mass = sample_mass(params, rng);
    let position = sample_disk(rng, params.initialization_radius);
    let v = params.max_initial_velocity;
    let velocity = Vector2::new(rng.random_range(-v..=v), rng.random_range(-v..=v));
    Body::new(BodyId(id), mass, params.density, position, velocity)
}
