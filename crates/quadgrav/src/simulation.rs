//! Simulation driver
//!
//! [`Simulation`] owns everything a run needs: parameters, the live bodies,
//! the reusable quadtree, the RNG and the frame counter. Each call to
//! [`Simulation::step`] advances one frame through a fixed pipeline:
//!
//! 1. Rebuild the tree over the current bodies
//! 2. Merge touching bodies and drop the absorbed ones
//! 3. Reset accelerations
//! 4. Rebuild the tree over the survivors and aggregate its mass
//! 5. Accumulate Barnes-Hut accelerations
//! 6. Integrate with semi-implicit Euler
//!
//! The free function [`step`] runs the same pipeline over caller-owned state.

use log::{debug, info, warn};
use nalgebra::{Point2, Vector2};
use rand::SeedableRng;
use rand_chacha::ChaChaRng;
use serde::Serialize;

use crate::body::{Body, BodyId};
use crate::collisions::{CollisionEvent, resolve_collisions};
use crate::forces::{TreeGravity, accumulate_accelerations};
use crate::integrator::{Integrator, SemiImplicitEuler};
use crate::params::{ParameterError, SimulationParameters};
use crate::quadtree::{Boundary, QuadTree};
use crate::seeding::initialize_bodies;

/// Relative padding added around the bodies when sizing the root boundary
pub const BOUNDARY_PADDING: f64 = 0.01;

/// What happened during one step
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    /// Number of the frame this step produced, starting at 1
    pub frame: u64,
    /// Merges in the order they were resolved
    pub merges: Vec<CollisionEvent>,
    /// Bodies alive after the step
    pub live_bodies: usize,
    /// Bodies the tree could not index (non-finite positions)
    pub unindexed: usize,
}

/// Read-only view of a body for drawing
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BodySnapshot {
    pub id: u32,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

impl From<&Body> for BodySnapshot {
    fn from(body: &Body) -> Self {
        Self {
            id: body.id.0,
            x: body.position.x,
            y: body.position.y,
            radius: body.radius(),
        }
    }
}

/// A running N-body simulation
///
/// # Examples
///
/// ```
/// use quadgrav::params::SimulationParameters;
/// use quadgrav::simulation::Simulation;
///
/// let params = SimulationParameters {
///     num_bodies: 200,
///     seed: Some(7),
///     ..Default::default()
/// };
/// let mut sim = Simulation::new(params).unwrap();
///
/// let report = sim.step();
/// assert_eq!(report.frame, 1);
/// assert_eq!(report.live_bodies, sim.bodies().len());
/// assert_eq!(sim.snapshot().len(), sim.bodies().len());
/// ```
#[derive(Debug)]
pub struct Simulation {
    params: SimulationParameters,
    bodies: Vec<Body>,
    tree: QuadTree,
    rng: ChaChaRng,
    frame: u64,
    next_id: u32,
}

impl Simulation {
    /// Validates `params` and seeds `NUM_BODIES` bodies
    pub fn new(params: SimulationParameters) -> Result<Self, ParameterError> {
        let mut sim = Self::empty(params)?;
        sim.reseed();
        Ok(sim)
    }

    /// Validates `params` but starts with no bodies; populate with
    /// [`Simulation::add_body`]
    pub fn empty(params: SimulationParameters) -> Result<Self, ParameterError> {
        params.validate()?;
        let rng = rng_for(&params);
        let tree = empty_tree(&params);
        Ok(Self {
            params,
            bodies: Vec::new(),
            tree,
            rng,
            frame: 0,
            next_id: 0,
        })
    }

    /// Adds a body with the next unused id.
    ///
    /// Returns `None`, consuming no id, unless `mass` is finite and strictly
    /// positive and `position` and `velocity` are finite.
    pub fn add_body(
        &mut self,
        mass: f64,
        position: Point2<f64>,
        velocity: Vector2<f64>,
    ) -> Option<BodyId> {
        let finite = position.coords.iter().chain(velocity.iter()).all(|v| v.is_finite());
        if !(mass > 0.0 && mass.is_finite() && finite) {
            return None;
        }

        let id = BodyId(self.next_id);
        self.next_id += 1;
        self.bodies
            .push(Body::new(id, mass, self.params.density, position, velocity));
        Some(id)
    }

    /// Replaces the parameters and re-seeds the whole population.
    ///
    /// On error the simulation is left unchanged. Without a `SEED` the RNG
    /// stream simply continues, so each re-seed gives a fresh population.
    pub fn initialize(&mut self, params: SimulationParameters) -> Result<(), ParameterError> {
        params.validate()?;
        if params.seed.is_some() {
            self.rng = rng_for(&params);
        }
        self.tree = empty_tree(&params);
        self.params = params;
        self.reseed();
        Ok(())
    }

    fn reseed(&mut self) {
        self.bodies = initialize_bodies(&self.params, &mut self.rng);
        self.next_id = self.bodies.len() as u32;
        self.frame = 0;
        info!(
            "initialized {} bodies (central mass {:?}, seed {:?})",
            self.bodies.len(),
            self.params.central_body_mass,
            self.params.seed
        );
    }

    /// Advances the simulation by one frame
    pub fn step(&mut self) -> StepReport {
        self.frame += 1;
        let report = step(&mut self.bodies, &mut self.tree, &self.params);
        StepReport {
            frame: self.frame,
            ..report
        }
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn params(&self) -> &SimulationParameters {
        &self.params
    }

    /// The tree as left by the last step, aggregated over the survivors
    pub fn tree(&self) -> &QuadTree {
        &self.tree
    }

    /// Frames stepped since the last (re)initialization
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Id, position and radius of every live body
    pub fn snapshot(&self) -> Vec<BodySnapshot> {
        self.bodies.iter().map(BodySnapshot::from).collect()
    }

    pub fn total_mass(&self) -> f64 {
        self.bodies.iter().map(|b| b.mass()).sum()
    }

    pub fn total_momentum(&self) -> Vector2<f64> {
        self.bodies
            .iter()
            .fold(Vector2::zeros(), |acc, b| acc + b.momentum())
    }

    pub fn kinetic_energy(&self) -> f64 {
        self.bodies.iter().map(|b| b.kinetic_energy()).sum()
    }
}

/// Advances `bodies` by one frame, reusing `tree`'s allocation.
///
/// `params` are assumed valid. The returned report's `frame` is 0;
/// [`Simulation::step`] numbers its frames.
pub fn step(
    bodies: &mut Vec<Body>,
    tree: &mut QuadTree,
    params: &SimulationParameters,
) -> StepReport {
    rebuild_tree(tree, bodies, params.initialization_radius);
    let merges = resolve_collisions(bodies, tree, params.density);

    bodies
        .iter_mut()
        .for_each(|body| body.acceleration = Vector2::zeros());

    let unindexed = rebuild_tree(tree, bodies, params.initialization_radius);
    tree.compute_mass_distribution();

    accumulate_accelerations(bodies, &TreeGravity::from_params(tree, params));
    SemiImplicitEuler.step(bodies, params.dt);

    if unindexed > 0 {
        warn!("{unindexed} bodies have non-finite positions and were left out of the tree");
    }
    debug!(
        "step: {} merges, {} bodies, tree of {} nodes at depth {}",
        merges.len(),
        bodies.len(),
        tree.node_count(),
        tree.depth()
    );

    StepReport {
        frame: 0,
        merges,
        live_bodies: bodies.len(),
        unindexed,
    }
}

/// Square enclosing every finite body position, padded by
/// [`BOUNDARY_PADDING`] and never smaller than `min_half_dim`
pub fn root_boundary(bodies: &[Body], min_half_dim: f64) -> Boundary {
    Boundary::enclosing(bodies.iter().map(|b| b.position), BOUNDARY_PADDING, min_half_dim)
}

/// Clears `tree`, re-roots it around `bodies` and inserts them by slice
/// index. Returns the number of bodies that could not be indexed.
pub fn rebuild_tree(tree: &mut QuadTree, bodies: &[Body], min_half_dim: f64) -> usize {
    tree.reset(root_boundary(bodies, min_half_dim));
    bodies
        .iter()
        .enumerate()
        .filter(|&(i, body)| !tree.insert(i, body))
        .count()
}

fn empty_tree(params: &SimulationParameters) -> QuadTree {
    QuadTree::new(
        Boundary::new(Point2::origin(), params.initialization_radius),
        params.node_capacity,
    )
}

fn rng_for(params: &SimulationParameters) -> ChaChaRng {
    match params.seed {
        Some(seed) => ChaChaRng::seed_from_u64(seed),
        None => ChaChaRng::from_os_rng(),
    }
}
