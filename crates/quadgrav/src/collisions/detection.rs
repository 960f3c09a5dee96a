//! Contact detection
//!
//! Provides the pairwise contact test used by the resolver, plus two ways of
//! listing every touching pair in a body set:
//! - [`direct_contacts`]: O(N²), checks every pair
//! - [`tree_contacts`]: O(N log N), proximity queries against a built quadtree

use crate::body::{Body, BodyId};
use crate::quadtree::{Boundary, QuadTree};

/// A merge performed by the collision resolver
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionEvent {
    /// Body that kept its id and gained the mass
    pub survivor: BodyId,
    /// Body that was flagged and removed
    pub absorbed: BodyId,
    /// Center distance at the time of contact
    pub separation: f64,
    /// Sum of radii the separation fell below
    pub contact_distance: f64,
}

/// Separation of `a` and `b` if they touch (`distance < radius_a + radius_b`)
///
/// # Examples
///
/// ```
/// use quadgrav::body::{Body, BodyId};
/// use quadgrav::collisions::contact;
/// use nalgebra::{Point2, Vector2};
///
/// let a = Body::new(BodyId(0), 1.0, 1.0, Point2::new(0.0, 0.0), Vector2::zeros());
/// let b = Body::new(BodyId(1), 1.0, 1.0, Point2::new(1.5, 0.0), Vector2::zeros());
/// let c = Body::new(BodyId(2), 1.0, 1.0, Point2::new(2.5, 0.0), Vector2::zeros());
///
/// assert_eq!(contact(&a, &b), Some(1.5)); // radii are 1.0 each
/// assert_eq!(contact(&a, &c), None);
/// ```
pub fn contact(a: &Body, b: &Body) -> Option<f64> {
    let separation = a.distance_to(b);
    (separation < a.radius() + b.radius()).then_some(separation)
}

/// Half-dimension of the square searched around a body of `radius`.
///
/// Twice the body's own radius covers partners no larger than itself;
/// `radius + largest_radius` covers every partner in the set.
pub fn search_half_dim(radius: f64, largest_radius: f64) -> f64 {
    (2.0 * radius).max(radius + largest_radius)
}

/// Slice indices of the bodies in `tree` that could touch `bodies[index]`,
/// restricted to higher ids and sorted by ascending id.
pub(crate) fn candidates(
    tree: &QuadTree,
    bodies: &[Body],
    index: usize,
    largest_radius: f64,
    found: &mut Vec<usize>,
) {
    let body = &bodies[index];
    let range = Boundary::new(body.position, search_half_dim(body.radius(), largest_radius));

    found.clear();
    tree.query(&range, found);
    found.retain(|&j| bodies[j].id > body.id);
    found.sort_unstable_by_key(|&j| bodies[j].id);
}

/// Every touching pair, checked directly. Pairs are `(lower id, higher id)`
/// in ascending order.
pub fn direct_contacts(bodies: &[Body]) -> Vec<(BodyId, BodyId)> {
    let mut pairs: Vec<(BodyId, BodyId)> = bodies
        .iter()
        .enumerate()
        .flat_map(|(i, a)| {
            bodies[i + 1..]
                .iter()
                .filter(move |b| contact(a, b).is_some())
                .map(move |b| ordered(a.id, b.id))
        })
        .collect();
    pairs.sort_unstable();
    pairs
}

/// Every touching pair, found through proximity queries on `tree`.
///
/// `tree` must index `bodies` by slice position. Returns the same list as
/// [`direct_contacts`] for any body set the tree fully indexes.
pub fn tree_contacts(bodies: &[Body], tree: &QuadTree) -> Vec<(BodyId, BodyId)> {
    let largest = largest_radius(bodies);
    let mut found = Vec::new();
    let mut pairs = Vec::new();

    for i in 0..bodies.len() {
        candidates(tree, bodies, i, largest, &mut found);
        pairs.extend(
            found
                .iter()
                .filter(|&&j| contact(&bodies[i], &bodies[j]).is_some())
                .map(|&j| ordered(bodies[i].id, bodies[j].id)),
        );
    }

    pairs.sort_unstable();
    pairs
}

pub(crate) fn largest_radius(bodies: &[Body]) -> f64 {
    bodies.iter().map(|b| b.radius()).fold(0.0, f64::max)
}

fn ordered(a: BodyId, b: BodyId) -> (BodyId, BodyId) {
    if a < b { (a, b) } else { (b, a) }
}
