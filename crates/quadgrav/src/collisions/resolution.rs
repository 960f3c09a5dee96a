//! Collision resolution through momentum-conserving mergers
//!
//! When two bodies touch, the one with the smaller radius is absorbed into
//! the other. The survivor keeps its id and position and gains:
//! - the combined mass
//! - the momentum-weighted average velocity
//! - a radius recomputed from the new mass
//!
//! # Iteration order
//!
//! Bodies are visited in ascending id order and each body's candidates are
//! checked in ascending id order. A body may absorb several partners in one
//! pass, growing as it goes, so the outcome depends on this order; it is
//! fixed so that runs are reproducible.

use log::trace;

use crate::body::Body;
use crate::collisions::detection::{CollisionEvent, candidates, contact, largest_radius};
use crate::quadtree::QuadTree;

/// Merges every touching pair and removes the absorbed bodies.
///
/// `tree` must index `bodies` by slice position, as built at the start of the
/// step. Returns one event per merge in the order they happened.
///
/// # Examples
///
/// ```
/// use nalgebra::{Point2, Vector2};
/// use quadgrav::body::{Body, BodyId};
/// use quadgrav::collisions::resolve_collisions;
/// use quadgrav::quadtree::{Boundary, QuadTree};
///
/// let mut bodies = vec![
///     Body::new(BodyId(0), 8.0, 1.0, Point2::new(0.0, 0.0), Vector2::new(1.0, 0.0)),
///     Body::new(BodyId(1), 1.0, 1.0, Point2::new(2.0, 0.0), Vector2::new(-1.0, 0.0)),
/// ];
/// let mut tree = QuadTree::new(Boundary::new(Point2::origin(), 10.0), 4);
/// for (i, b) in bodies.iter().enumerate() {
///     tree.insert(i, b);
/// }
///
/// let events = resolve_collisions(&mut bodies, &tree, 1.0);
///
/// assert_eq!(events.len(), 1);
/// assert_eq!(bodies.len(), 1);
/// assert_eq!(bodies[0].id, BodyId(0));
/// assert_eq!(bodies[0].mass(), 9.0);
/// ```
pub fn resolve_collisions(
    bodies: &mut Vec<Body>,
    tree: &QuadTree,
    density: f64,
) -> Vec<CollisionEvent> {
    let mut order: Vec<usize> = (0..bodies.len()).collect();
    order.sort_unstable_by_key(|&i| bodies[i].id);

    let mut largest = largest_radius(bodies);
    let mut found = Vec::new();
    let mut events = Vec::new();

    for i in order {
        if bodies[i].collided {
            continue;
        }

        candidates(tree, bodies, i, largest, &mut found);

        for &j in &found {
            if bodies[j].collided {
                continue;
            }
            let Some(separation) = contact(&bodies[i], &bodies[j]) else {
                continue;
            };
            let contact_distance = bodies[i].radius() + bodies[j].radius();

            let (survivor, absorbed) = if bodies[i].radius() < bodies[j].radius() {
                (j, i)
            } else {
                (i, j)
            };

            let absorbed_body = bodies[absorbed];
            bodies[survivor].absorb(&absorbed_body, density);
            bodies[absorbed].collided = true;
            largest = largest.max(bodies[survivor].radius());

            let event = CollisionEvent {
                survivor: bodies[survivor].id,
                absorbed: absorbed_body.id,
                separation,
                contact_distance,
            };
            trace!("merge {event:?}");
            events.push(event);

            if absorbed == i {
                break;
            }
        }
    }

    remove_collided(bodies);
    events
}

/// Drops every body flagged as collided, keeping the others in order
pub fn remove_collided(bodies: &mut Vec<Body>) -> usize {
    let before = bodies.len();
    bodies.retain(|b| !b.collided);
    before - bodies.len()
}
