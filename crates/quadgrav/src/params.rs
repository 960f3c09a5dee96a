//! Simulation parameters
//!
//! Parameters are immutable for the duration of a step. Replacing them goes
//! through [`crate::simulation::Simulation::initialize`], which validates and
//! re-seeds the whole population.
//!
//! The serde field names are the upper-case keys used by scenario files:
//!
//! ```
//! use quadgrav::params::SimulationParameters;
//!
//! let params: SimulationParameters = serde_yaml::from_str(
//!     "G: 2.0\nNUM_BODIES: 50\nTHETA: 0.7\n",
//! ).unwrap();
//!
//! assert_eq!(params.g, 2.0);
//! assert_eq!(params.num_bodies, 50);
//! assert_eq!(params.density, SimulationParameters::default().density);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::body::radius_from_mass;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationParameters {
    /// Gravitational constant (scaled for visualization)
    #[serde(rename = "G")]
    pub g: f64,
    /// Mass to radius divisor: `radius = cbrt(mass / density)`
    #[serde(rename = "DENSITY")]
    pub density: f64,
    /// Number of bodies seeded, including the central body when present
    #[serde(rename = "NUM_BODIES")]
    pub num_bodies: usize,
    /// Radius of the disk bodies are seeded in
    #[serde(rename = "INITIALIZATION_RADIUS")]
    pub initialization_radius: f64,
    /// Fixed timestep
    #[serde(rename = "DT")]
    pub dt: f64,
    /// Softening length, added squared to squared distances
    #[serde(rename = "SOFTENING_FACTOR")]
    pub softening_factor: f64,
    #[serde(rename = "MIN_MASS")]
    pub min_mass: f64,
    #[serde(rename = "MAX_MASS")]
    pub max_mass: f64,
    /// Mass of the body anchored at the origin; `None` seeds free bodies only
    #[serde(rename = "CENTRAL_BODY_MASS")]
    pub central_body_mass: Option<f64>,
    /// Barnes-Hut opening threshold (node side / distance)
    #[serde(rename = "THETA")]
    pub theta: f64,
    /// Per-axis speed bound for seeding without a central body
    #[serde(rename = "MAX_INITIAL_VELOCITY")]
    pub max_initial_velocity: f64,
    /// Bodies a tree leaf holds before it subdivides
    #[serde(rename = "NODE_CAPACITY")]
    pub node_capacity: usize,
    /// RNG seed for initialization; drawn from the OS when absent
    #[serde(rename = "SEED")]
    pub seed: Option<u64>,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            g: 10.0,
            density: 1.0,
            num_bodies: 1000,
            initialization_radius: 100.0,
            dt: 0.05,
            softening_factor: 10.0,
            min_mass: 0.001,
            max_mass: 0.1,
            central_body_mass: Some(1000.0),
            theta: 0.5,
            max_initial_velocity: 10.0,
            node_capacity: 4,
            seed: None,
        }
    }
}

impl SimulationParameters {
    /// Checks every invariant the step arithmetic relies on.
    ///
    /// # Examples
    ///
    /// ```
    /// use quadgrav::params::{ParameterError, SimulationParameters};
    ///
    /// let mut params = SimulationParameters::default();
    /// assert!(params.validate().is_ok());
    ///
    /// params.density = 0.0;
    /// assert_eq!(params.validate(), Err(ParameterError::NonPositiveDensity(0.0)));
    /// ```
    pub fn validate(&self) -> Result<(), ParameterError> {
        if !self.g.is_finite() {
            return Err(ParameterError::NonFinite("G"));
        }
        if !(self.density > 0.0 && self.density.is_finite()) {
            return Err(ParameterError::NonPositiveDensity(self.density));
        }
        if !(self.initialization_radius > 0.0 && self.initialization_radius.is_finite()) {
            return Err(ParameterError::NonPositiveInitializationRadius(
                self.initialization_radius,
            ));
        }
        if !(self.dt > 0.0 && self.dt.is_finite()) {
            return Err(ParameterError::NonPositiveTimestep(self.dt));
        }
        if !(self.softening_factor >= 0.0 && self.softening_factor.is_finite()) {
            return Err(ParameterError::NegativeSoftening(self.softening_factor));
        }
        if !(self.min_mass > 0.0 && self.min_mass.is_finite()) {
            return Err(ParameterError::NonPositiveMass(self.min_mass));
        }
        if !(self.max_mass >= self.min_mass && self.max_mass.is_finite()) {
            return Err(ParameterError::InvertedMassBounds {
                min: self.min_mass,
                max: self.max_mass,
            });
        }
        if let Some(mass) = self.central_body_mass {
            if !(mass > 0.0 && mass.is_finite()) {
                return Err(ParameterError::NonPositiveCentralMass(mass));
            }
            // satellites must fit between the central surface and the disk edge
            let clearance = radius_from_mass(mass, self.density)
                + radius_from_mass(self.max_mass, self.density);
            if clearance >= self.initialization_radius {
                return Err(ParameterError::CentralBodyTooLarge {
                    clearance,
                    initialization_radius: self.initialization_radius,
                });
            }
        }
        if !(self.theta >= 0.0 && self.theta.is_finite()) {
            return Err(ParameterError::NegativeTheta(self.theta));
        }
        if !(self.max_initial_velocity >= 0.0 && self.max_initial_velocity.is_finite()) {
            return Err(ParameterError::NonFinite("MAX_INITIAL_VELOCITY"));
        }
        if self.node_capacity == 0 {
            return Err(ParameterError::ZeroCapacity);
        }
        Ok(())
    }
}

/// A parameter set that would lead to undefined per-step arithmetic
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterError {
    NonFinite(&'static str),
    NonPositiveDensity(f64),
    NonPositiveInitializationRadius(f64),
    NonPositiveTimestep(f64),
    NegativeSoftening(f64),
    NonPositiveMass(f64),
    InvertedMassBounds { min: f64, max: f64 },
    NonPositiveCentralMass(f64),
    /// Central radius plus the largest satellite radius reaches the disk edge
    CentralBodyTooLarge {
        clearance: f64,
        initialization_radius: f64,
    },
    NegativeTheta(f64),
    ZeroCapacity,
}

impl fmt::Display for ParameterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterError::NonFinite(field) => write!(f, "{field} must be a finite number"),
            ParameterError::NonPositiveDensity(v) => {
                write!(f, "DENSITY must be positive, got {v}")
            }
            ParameterError::NonPositiveInitializationRadius(v) => {
                write!(f, "INITIALIZATION_RADIUS must be positive, got {v}")
            }
            ParameterError::NonPositiveTimestep(v) => write!(f, "DT must be positive, got {v}"),
            ParameterError::NegativeSoftening(v) => {
                write!(f, "SOFTENING_FACTOR must not be negative, got {v}")
            }
            ParameterError::NonPositiveMass(v) => write!(f, "MIN_MASS must be positive, got {v}"),
            ParameterError::InvertedMassBounds { min, max } => {
                write!(f, "MAX_MASS ({max}) must not be below MIN_MASS ({min})")
            }
            ParameterError::NonPositiveCentralMass(v) => {
                write!(f, "CENTRAL_BODY_MASS must be positive when set, got {v}")
            }
            ParameterError::CentralBodyTooLarge {
                clearance,
                initialization_radius,
            } => write!(
                f,
                "CENTRAL_BODY_MASS leaves no room for satellites: clearance {clearance} \
                 reaches INITIALIZATION_RADIUS {initialization_radius}"
            ),
            ParameterError::NegativeTheta(v) => write!(f, "THETA must not be negative, got {v}"),
            ParameterError::ZeroCapacity => write!(f, "NODE_CAPACITY must be at least 1"),
        }
    }
}

impl std::error::Error for ParameterError {}
