use nalgebra::{Point2, Vector2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyId(pub u32);

/// A point mass moving in the simulation plane.
///
/// Mass and radius are private: the radius is always derived from the mass
/// through `cbrt(mass / density)` and is recomputed whenever the mass changes.
#[derive(Debug, Clone, Copy)]
pub struct Body {
    pub id: BodyId,
    pub position: Point2<f64>,
    pub velocity: Vector2<f64>,
    /// Reset to zero at the start of every force pass
    pub acceleration: Vector2<f64>,
    /// Set when the body has been absorbed; removed at the end of the collision pass
    pub collided: bool,
    mass: f64,
    radius: f64,
}

impl Body {
    /// Creates a body at rest acceleration-wise, deriving its radius from `density`
    ///
    /// # Examples
    ///
    /// ```
    /// use quadgrav::body::{Body, BodyId};
    /// use nalgebra::{Point2, Vector2};
    ///
    /// let body = Body::new(BodyId(0), 8.0, 1.0, Point2::new(0.0, 0.0), Vector2::zeros());
    /// assert!((body.radius() - 2.0).abs() < 1e-12);
    /// ```
    pub fn new(
        id: BodyId,
        mass: f64,
        density: f64,
        position: Point2<f64>,
        velocity: Vector2<f64>,
    ) -> Self {
        debug_assert!(mass > 0.0, "body mass must be strictly positive");
        Body {
            id,
            position,
            velocity,
            acceleration: Vector2::zeros(),
            collided: false,
            mass,
            radius: radius_from_mass(mass, density),
        }
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Merges `other` into this body.
    ///
    /// Velocity becomes the momentum-weighted average of both bodies, mass
    /// becomes the sum and the radius is recomputed. Position is unchanged.
    pub fn absorb(&mut self, other: &Body, density: f64) {
        let total_mass = self.mass + other.mass;
        self.velocity = (self.momentum() + other.momentum()) / total_mass;
        self.mass = total_mass;
        self.radius = radius_from_mass(total_mass, density);
    }

    pub fn momentum(&self) -> Vector2<f64> {
        self.velocity * self.mass
    }

    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.magnitude_squared()
    }

    pub fn distance_to(&self, other: &Body) -> f64 {
        (self.position - other.position).magnitude()
    }

    /// Distance from the origin, where the central body sits when present
    pub fn orbital_radius(&self) -> f64 {
        self.position.coords.magnitude()
    }

    pub fn speed(&self) -> f64 {
        self.velocity.magnitude()
    }
}

/// Radius of a body of the given mass: `cbrt(mass / density)`
pub fn radius_from_mass(mass: f64, density: f64) -> f64 {
    (mass / density).cbrt()
}
