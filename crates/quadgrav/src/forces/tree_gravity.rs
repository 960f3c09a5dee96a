//! Tree-based gravity using Barnes-Hut algorithm (O(N log N))

use nalgebra::Vector2;

use crate::body::Body;
use crate::forces::ForceModel;
use crate::params::SimulationParameters;
use crate::quadtree::QuadTree;

/// Barnes-Hut gravitational force over an already built quadtree
///
/// The tree must contain the bodies being evaluated and its mass
/// distribution must be current. The `bodies` slice passed to
/// [`ForceModel::acceleration`] is not consulted; the tree holds everything
/// the traversal needs.
///
/// # Opening threshold (θ)
///
/// A node is collapsed into one pseudo-body when `side / distance < θ`:
/// - θ = 0.0: every leaf is visited, same result as the direct sum
/// - θ = 0.5: good accuracy/speed balance
/// - θ ≥ 1.0: fast, noticeably approximate
///
/// # Examples
///
/// ```
/// use nalgebra::{Point2, Vector2};
/// use quadgrav::body::{Body, BodyId};
/// use quadgrav::forces::{ForceModel, TreeGravity};
/// use quadgrav::quadtree::{Boundary, QuadTree};
///
/// let bodies = vec![
///     Body::new(BodyId(0), 50.0, 1.0, Point2::new(-5.0, 0.0), Vector2::zeros()),
///     Body::new(BodyId(1), 50.0, 1.0, Point2::new(5.0, 0.0), Vector2::zeros()),
/// ];
/// let mut tree = QuadTree::new(Boundary::new(Point2::origin(), 10.0), 1);
/// for (i, b) in bodies.iter().enumerate() {
///     tree.insert(i, b);
/// }
/// tree.compute_mass_distribution();
///
/// let gravity = TreeGravity::new(&tree, 0.5, 1.0, 0.0);
/// let accel = gravity.acceleration(&bodies[0], &bodies);
/// assert!(accel.x > 0.0);
/// ```
pub struct TreeGravity<'t> {
    tree: &'t QuadTree,
    pub theta: f64,
    pub g: f64,
    pub softening: f64,
}

impl<'t> TreeGravity<'t> {
    pub fn new(tree: &'t QuadTree, theta: f64, g: f64, softening: f64) -> Self {
        Self {
            tree,
            theta,
            g,
            softening,
        }
    }

    pub fn from_params(tree: &'t QuadTree, params: &SimulationParameters) -> Self {
        Self::new(tree, params.theta, params.g, params.softening_factor)
    }
}

impl ForceModel for TreeGravity<'_> {
    fn acceleration(&self, body: &Body, _bodies: &[Body]) -> Vector2<f64> {
        self.tree
            .calculate_force(body, self.theta, self.g, self.softening)
    }
}
