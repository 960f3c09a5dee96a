//! Arena-based Barnes-Hut quadtree.
//!
//! Nodes are stored contiguously in a `Vec` and reference their children by
//! index. The tree is rebuilt from scratch every step: [`QuadTree::clear`]
//! truncates the arena back to an empty root but keeps its allocation.
//!
//! # Node invariant
//!
//! A node is either a leaf holding at most `capacity` bodies, or it has been
//! subdivided into exactly four children and holds no bodies itself. When a
//! leaf overflows, its bodies migrate into the four new children together
//! with the incoming body. The [`NodeKind`] enum makes any other state
//! unrepresentable.
//!
//! # Aggregates
//!
//! Mass and center of mass are only meaningful after
//! [`QuadTree::compute_mass_distribution`] has run on the finished tree.
//!
//! # Example
//!
//! ```rust
//! use nalgebra::{Point2, Vector2};
//! use quadgrav::body::{Body, BodyId};
//! use quadgrav::quadtree::{Boundary, QuadTree};
//!
//! let bodies = vec![
//!     Body::new(BodyId(0), 100.0, 1.0, Point2::new(0.0, 0.0), Vector2::zeros()),
//!     Body::new(BodyId(1), 1.0, 1.0, Point2::new(10.0, 0.0), Vector2::zeros()),
//! ];
//!
//! let mut tree = QuadTree::new(Boundary::new(Point2::origin(), 50.0), 1);
//! for (i, body) in bodies.iter().enumerate() {
//!     tree.insert(i, body);
//! }
//! tree.compute_mass_distribution();
//!
//! let accel = tree.calculate_force(&bodies[1], 0.5, 1.0, 0.0);
//! assert!(accel.x < 0.0);
//! ```

use nalgebra::{Point2, Vector2};

use crate::body::{Body, BodyId};
use crate::forces::softened_acceleration;

/// Depth at which leaves stop subdividing and accept bodies beyond capacity.
///
/// Without a limit, more than `capacity` bodies at one position would
/// subdivide forever.
pub const MAX_DEPTH: u32 = 30;

/// An axis-aligned square: `center` ± `half_dim` on both axes
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Boundary {
    pub center: Point2<f64>,
    pub half_dim: f64,
}

impl Boundary {
    pub fn new(center: Point2<f64>, half_dim: f64) -> Self {
        debug_assert!(half_dim > 0.0, "boundary half-dimension must be positive");
        Self { center, half_dim }
    }

    /// Smallest square centered on the bounding box of `points` that encloses
    /// all of them, padded by `padding` (a fraction of the half-dimension) and
    /// never smaller than `min_half_dim`.
    ///
    /// Non-finite points are ignored.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use nalgebra::Point2;
    /// use quadgrav::quadtree::Boundary;
    ///
    /// let points = [Point2::new(-2.0, -1.0), Point2::new(6.0, 3.0)];
    /// let bounds = Boundary::enclosing(points.iter().copied(), 0.0, 1.0);
    ///
    /// assert_eq!(bounds.center, Point2::new(2.0, 1.0));
    /// assert_eq!(bounds.half_dim, 4.0);
    /// assert!(points.iter().all(|p| bounds.contains(p)));
    /// ```
    pub fn enclosing<I>(points: I, padding: f64, min_half_dim: f64) -> Self
    where
        I: IntoIterator<Item = Point2<f64>>,
    {
        let (min, max) = points
            .into_iter()
            .filter(|p| p.x.is_finite() && p.y.is_finite())
            .fold(
                (
                    Point2::new(f64::INFINITY, f64::INFINITY),
                    Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
                ),
                |(min, max), p| {
                    (
                        Point2::new(min.x.min(p.x), min.y.min(p.y)),
                        Point2::new(max.x.max(p.x), max.y.max(p.y)),
                    )
                },
            );

        if min.x > max.x {
            // No finite points at all
            return Self::new(Point2::origin(), min_half_dim);
        }

        let center = Point2::new((min.x + max.x) / 2.0, (min.y + max.y) / 2.0);
        let extent = ((max.x - min.x) / 2.0).max((max.y - min.y) / 2.0);
        Self::new(center, (extent * (1.0 + padding)).max(min_half_dim))
    }

    /// Side length of the square
    pub fn side(&self) -> f64 {
        2.0 * self.half_dim
    }

    /// Closed containment test: points on the edges are inside
    pub fn contains(&self, point: &Point2<f64>) -> bool {
        point.x >= self.center.x - self.half_dim
            && point.x <= self.center.x + self.half_dim
            && point.y >= self.center.y - self.half_dim
            && point.y <= self.center.y + self.half_dim
    }

    /// Axis-aligned overlap test, inclusive of touching edges
    pub fn intersects(&self, other: &Boundary) -> bool {
        !(other.center.x - other.half_dim > self.center.x + self.half_dim
            || other.center.x + other.half_dim < self.center.x - self.half_dim
            || other.center.y - other.half_dim > self.center.y + self.half_dim
            || other.center.y + other.half_dim < self.center.y - self.half_dim)
    }

    /// Which child quadrant (0-3) a point belongs to.
    ///
    /// Quadrant layout:
    /// ```text
    /// +-------+-------+
    /// |   2   |   3   |
    /// +-------+-------+
    /// |   0   |   1   |
    /// +-------+-------+
    /// ```
    /// Points on a split line go to the upper/right quadrant.
    fn quadrant(&self, point: &Point2<f64>) -> usize {
        let x_bit = (point.x >= self.center.x) as usize;
        let y_bit = (point.y >= self.center.y) as usize;
        x_bit | (y_bit << 1)
    }

    /// Grown by a few ulps.
    ///
    /// Bodies are routed against the exact parent center, but child squares
    /// are rounded, so a body on a split line can sit just outside the child
    /// square it is stored under. Pruning against the loosened square keeps
    /// such bodies reachable.
    fn loosened(&self) -> Self {
        let scale = self.center.x.abs().max(self.center.y.abs()) + self.half_dim;
        Boundary {
            center: self.center,
            half_dim: self.half_dim + 4.0 * f64::EPSILON * scale,
        }
    }

    /// The square covering the given quadrant, with half the half-dimension
    fn child(&self, quadrant: usize) -> Self {
        let quarter = self.half_dim / 2.0;
        let dx = if quadrant & 1 != 0 { quarter } else { -quarter };
        let dy = if quadrant & 2 != 0 { quarter } else { -quarter };
        Boundary {
            center: Point2::new(self.center.x + dx, self.center.y + dy),
            half_dim: quarter,
        }
    }
}

/// Index into the node arena
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeId(u32);

impl NodeId {
    const ROOT: NodeId = NodeId(0);

    fn new(index: usize) -> Self {
        debug_assert!(index < u32::MAX as usize, "NodeId overflow");
        NodeId(index as u32)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// What the tree remembers about an inserted body.
///
/// A copy is taken at insertion so the tree never borrows the body slice;
/// `index` points back into the slice the caller inserted from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TreeEntry {
    pub index: usize,
    pub id: BodyId,
    pub position: Point2<f64>,
    pub mass: f64,
}

#[derive(Clone, Debug)]
pub enum NodeKind {
    /// Bodies stored directly in this region
    Leaf(Vec<TreeEntry>),
    /// Four child quadrants [bottom-left, bottom-right, top-left, top-right]
    Internal([NodeId; 4]),
}

#[derive(Clone, Debug)]
pub struct Node {
    pub boundary: Boundary,
    pub kind: NodeKind,
    depth: u32,
    total_mass: f64,
    center_of_mass: Point2<f64>,
    body_count: usize,
}

impl Node {
    fn leaf(boundary: Boundary, depth: u32) -> Self {
        Node {
            boundary,
            kind: NodeKind::Leaf(Vec::new()),
            depth,
            total_mass: 0.0,
            center_of_mass: boundary.center,
            body_count: 0,
        }
    }
}

/// Barnes-Hut quadtree over a set of bodies
#[derive(Clone, Debug)]
pub struct QuadTree {
    nodes: Vec<Node>,
    capacity: usize,
    len: usize,
    aggregated: bool,
}

impl QuadTree {
    /// Creates an empty tree covering `boundary`.
    ///
    /// A `capacity` of zero is treated as one.
    pub fn new(boundary: Boundary, capacity: usize) -> Self {
        Self {
            nodes: vec![Node::leaf(boundary, 0)],
            capacity: capacity.max(1),
            len: 0,
            aggregated: false,
        }
    }

    /// Region covered by the root node
    pub fn boundary(&self) -> Boundary {
        self.nodes[NodeId::ROOT.index()].boundary
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of bodies currently indexed
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Deepest level reached by any node (the root is level 0)
    pub fn depth(&self) -> u32 {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Resets to a single empty leaf, discarding children and aggregates
    pub fn clear(&mut self) {
        let boundary = self.boundary();
        self.reset(boundary);
    }

    /// Like [`QuadTree::clear`], but also moves the root to `boundary`
    pub fn reset(&mut self, boundary: Boundary) {
        self.nodes.clear();
        self.nodes.push(Node::leaf(boundary, 0));
        self.len = 0;
        self.aggregated = false;
    }

    /// Indexes `body`, remembering `index` as its position in the caller's slice.
    ///
    /// Returns `false` (and leaves the tree untouched) if the body lies
    /// outside the root boundary.
    pub fn insert(&mut self, index: usize, body: &Body) -> bool {
        let entry = TreeEntry {
            index,
            id: body.id,
            position: body.position,
            mass: body.mass(),
        };

        if !self.nodes[NodeId::ROOT.index()]
            .boundary
            .contains(&entry.position)
        {
            return false;
        }

        let mut current = NodeId::ROOT;
        loop {
            let node = &mut self.nodes[current.index()];
            match &mut node.kind {
                NodeKind::Internal(children) => {
                    current = children[node.boundary.quadrant(&entry.position)];
                }
                NodeKind::Leaf(entries) => {
                    if entries.len() < self.capacity || node.depth >= MAX_DEPTH {
                        entries.push(entry);
                        break;
                    }
                    // Full: split, then retry the same node as an internal one
                    self.subdivide(current);
                }
            }
        }

        self.len += 1;
        self.aggregated = false;
        true
    }

    /// Turns a full leaf into an internal node with four empty children and
    /// moves its bodies down one level.
    fn subdivide(&mut self, id: NodeId) {
        let (boundary, depth, entries) = {
            let node = &mut self.nodes[id.index()];
            let entries = match &mut node.kind {
                NodeKind::Leaf(entries) => std::mem::take(entries),
                NodeKind::Internal(_) => return,
            };
            (node.boundary, node.depth, entries)
        };

        let first = self.nodes.len();
        self.nodes
            .extend((0..4).map(|q| Node::leaf(boundary.child(q), depth + 1)));
        let children: [NodeId; 4] = std::array::from_fn(|q| NodeId::new(first + q));

        // A leaf held at most `capacity` bodies, so no child can overflow here
        for entry in entries {
            let child = children[boundary.quadrant(&entry.position)];
            if let NodeKind::Leaf(child_entries) = &mut self.nodes[child.index()].kind {
                child_entries.push(entry);
            }
        }

        self.nodes[id.index()].kind = NodeKind::Internal(children);
    }

    /// Appends to `found` the slice index of every body inside `range`
    ///
    /// # Examples
    ///
    /// ```rust
    /// use nalgebra::{Point2, Vector2};
    /// use quadgrav::body::{Body, BodyId};
    /// use quadgrav::quadtree::{Boundary, QuadTree};
    ///
    /// let bodies: Vec<Body> = [0.0, 1.0, 10.0]
    ///     .iter()
    ///     .enumerate()
    ///     .map(|(i, &x)| {
    ///         Body::new(BodyId(i as u32), 1.0, 1.0, Point2::new(x, 0.0), Vector2::zeros())
    ///     })
    ///     .collect();
    ///
    /// let mut tree = QuadTree::new(Boundary::new(Point2::origin(), 20.0), 1);
    /// for (i, body) in bodies.iter().enumerate() {
    ///     tree.insert(i, body);
    /// }
    ///
    /// let mut found = Vec::new();
    /// tree.query(&Boundary::new(Point2::origin(), 2.0), &mut found);
    /// found.sort();
    /// assert_eq!(found, vec![0, 1]);
    /// ```
    pub fn query(&self, range: &Boundary, found: &mut Vec<usize>) {
        self.query_recursive(NodeId::ROOT, range, found);
    }

    fn query_recursive(&self, id: NodeId, range: &Boundary, found: &mut Vec<usize>) {
        let node = &self.nodes[id.index()];
        if !node.boundary.loosened().intersects(range) {
            return;
        }

        match &node.kind {
            NodeKind::Leaf(entries) => found.extend(
                entries
                    .iter()
                    .filter(|e| range.contains(&e.position))
                    .map(|e| e.index),
            ),
            NodeKind::Internal(children) => {
                for &child in children {
                    self.query_recursive(child, range, found);
                }
            }
        }
    }

    /// Computes total mass, center of mass and body count for every node.
    ///
    /// Children are always allocated after their parent, so sweeping the
    /// arena backwards visits every child before its parent.
    pub fn compute_mass_distribution(&mut self) {
        for i in (0..self.nodes.len()).rev() {
            let (mass, weighted, count) = match &self.nodes[i].kind {
                NodeKind::Leaf(entries) => entries.iter().fold(
                    (0.0, Vector2::<f64>::zeros(), 0usize),
                    |(m, w, n), e| (m + e.mass, w + e.position.coords * e.mass, n + 1),
                ),
                NodeKind::Internal(children) => children.iter().fold(
                    (0.0, Vector2::<f64>::zeros(), 0usize),
                    |(m, w, n), child| {
                        let c = &self.nodes[child.index()];
                        (
                            m + c.total_mass,
                            w + c.center_of_mass.coords * c.total_mass,
                            n + c.body_count,
                        )
                    },
                ),
            };

            let node = &mut self.nodes[i];
            node.total_mass = mass;
            node.body_count = count;
            node.center_of_mass = match &node.kind {
                NodeKind::Leaf(entries) if entries.len() == 1 => entries[0].position,
                _ if mass > 0.0 => Point2::from(weighted / mass),
                _ => node.boundary.center,
            };
        }
        self.aggregated = true;
    }

    /// Total mass of every indexed body (after aggregation)
    pub fn total_mass(&self) -> f64 {
        self.nodes[NodeId::ROOT.index()].total_mass
    }

    /// Center of mass of every indexed body (after aggregation)
    pub fn center_of_mass(&self) -> Point2<f64> {
        self.nodes[NodeId::ROOT.index()].center_of_mass
    }

    /// Barnes-Hut acceleration on `body` from every other indexed body.
    ///
    /// A node whose `side / distance` falls below `theta` and that aggregates
    /// more than one body is treated as a single mass at its center of mass.
    /// Otherwise the traversal descends into the children, or sums the
    /// bodies of a leaf pairwise. The body's own entry is skipped by id.
    ///
    /// Requires [`QuadTree::compute_mass_distribution`] to have run.
    pub fn calculate_force(
        &self,
        body: &Body,
        theta: f64,
        g: f64,
        softening: f64,
    ) -> Vector2<f64> {
        debug_assert!(self.aggregated, "calculate_force on a stale tree");
        self.force_recursive(NodeId::ROOT, body, theta, g, softening)
    }

    fn force_recursive(
        &self,
        id: NodeId,
        body: &Body,
        theta: f64,
        g: f64,
        softening: f64,
    ) -> Vector2<f64> {
        let node = &self.nodes[id.index()];

        if node.body_count == 0 {
            return Vector2::zeros();
        }
        if let NodeKind::Leaf(entries) = &node.kind {
            if entries.len() == 1 && entries[0].id == body.id {
                return Vector2::zeros();
            }
        }

        let distance = (node.center_of_mass - body.position).magnitude();
        if node.body_count > 1 && node.boundary.side() / distance < theta {
            return softened_acceleration(
                body.position,
                node.center_of_mass,
                node.total_mass,
                g,
                softening,
            );
        }

        match &node.kind {
            NodeKind::Internal(children) => children
                .iter()
                .map(|&child| self.force_recursive(child, body, theta, g, softening))
                .fold(Vector2::zeros(), |a, b| a + b),
            NodeKind::Leaf(entries) => entries
                .iter()
                .filter(|e| e.id != body.id)
                .map(|e| softened_acceleration(body.position, e.position, e.mass, g, softening))
                .fold(Vector2::zeros(), |a, b| a + b),
        }
    }
}
