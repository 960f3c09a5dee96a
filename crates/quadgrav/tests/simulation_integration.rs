//! Integration tests for the full simulation driver.
//!
//! These run the complete per-frame pipeline (tree, collisions, forces,
//! integration) through the public API.

use std::f64::consts::TAU;

use approx::assert_relative_eq;
use nalgebra::{Point2, Vector2};

use quadgrav::body::BodyId;
use quadgrav::forces::{DirectGravity, ForceModel, TreeGravity};
use quadgrav::params::SimulationParameters;
use quadgrav::quadtree::{Boundary, QuadTree};
use quadgrav::simulation::{Simulation, rebuild_tree};

fn empty_sim(params: SimulationParameters) -> Simulation {
    Simulation::empty(SimulationParameters {
        num_bodies: 0,
        central_body_mass: None,
        seed: Some(0),
        ..params
    })
    .unwrap()
}

#[test]
fn two_body_momentum_is_conserved() {
    let mut sim = empty_sim(SimulationParameters {
        g: 10.0,
        softening_factor: 1.0,
        dt: 0.01,
        ..Default::default()
    });
    sim.add_body(0.1, Point2::new(-5.0, 0.0), Vector2::new(0.0, 0.3));
    sim.add_body(0.05, Point2::new(5.0, 0.0), Vector2::new(0.2, -0.6));

    let initial = sim.total_momentum();

    for _ in 0..2_000 {
        let report = sim.step();
        assert!(report.merges.is_empty());
    }

    let drift = (sim.total_momentum() - initial).magnitude();
    println!("momentum drift after 2000 steps: {drift:.3e}");
    assert!(drift < 1e-12);
}

#[test]
fn circular_orbit_closes_after_one_period() {
    let (g, central_mass, r) = (10.0, 1000.0, 50.0);
    let mut sim = empty_sim(SimulationParameters {
        g,
        softening_factor: 0.0,
        dt: 0.001,
        ..Default::default()
    });

    let v = (g * central_mass / r).sqrt();
    sim.add_body(central_mass, Point2::origin(), Vector2::zeros());
    sim.add_body(1e-6, Point2::new(r, 0.0), Vector2::new(0.0, v));

    let period = TAU * r / v;
    let steps = (period / sim.params().dt).round() as usize;
    for _ in 0..steps {
        sim.step();
    }

    let satellite = sim.bodies()[1];
    let radius = (satellite.position - sim.bodies()[0].position).magnitude();
    println!(
        "after {steps} steps: radius {radius:.4}, position ({:.3}, {:.3})",
        satellite.position.x, satellite.position.y
    );

    assert_eq!(sim.bodies().len(), 2);
    assert_relative_eq!(radius, r, max_relative = 1e-3);
    assert!((satellite.position - Point2::new(r, 0.0)).magnitude() < 0.01 * r);
}

#[test]
fn touching_bodies_merge_in_one_step() {
    let density = 1.25;
    let mut sim = empty_sim(SimulationParameters {
        density,
        ..Default::default()
    });
    sim.add_body(10.0, Point2::new(0.0, 0.0), Vector2::new(2.0, 0.0));
    sim.add_body(5.0, Point2::new(1.0, 0.0), Vector2::new(-1.0, 0.0));

    let report = sim.step();

    assert_eq!(report.merges.len(), 1);
    assert_eq!(report.merges[0].survivor, BodyId(0));
    assert_eq!(report.merges[0].absorbed, BodyId(1));
    assert_eq!(sim.bodies().len(), 1);

    let merged = sim.bodies()[0];
    assert_relative_eq!(merged.mass(), 15.0);
    assert_relative_eq!(merged.radius(), (15.0_f64 / density).cbrt(), epsilon = 1e-12);
    assert_relative_eq!(merged.velocity.x, 1.0, epsilon = 1e-12);
}

#[test]
fn seeded_runs_are_reproducible() {
    let params = SimulationParameters {
        num_bodies: 400,
        seed: Some(2024),
        ..Default::default()
    };
    let mut a = Simulation::new(params.clone()).unwrap();
    let mut b = Simulation::new(params).unwrap();

    for _ in 0..25 {
        let ra = a.step();
        let rb = b.step();
        assert_eq!(ra, rb);
    }
    assert_eq!(a.snapshot(), b.snapshot());
}

#[test]
fn default_disk_stays_bounded() {
    let params = SimulationParameters {
        num_bodies: 1000,
        seed: Some(7),
        ..Default::default()
    };
    let mut sim = Simulation::new(params).unwrap();
    let mass = sim.total_mass();

    let mut merges = 0;
    for _ in 0..50 {
        let report = sim.step();
        assert_eq!(report.unindexed, 0);
        merges += report.merges.len();
    }

    println!("1000-body disk: {merges} merges in 50 frames");
    assert_eq!(sim.bodies().len(), 1000 - merges);
    assert_relative_eq!(sim.total_mass(), mass, max_relative = 1e-12);
    assert!(
        sim.bodies()
            .iter()
            .all(|b| b.position.x.is_finite() && b.position.y.is_finite())
    );

    let mut ids: Vec<BodyId> = sim.bodies().iter().map(|b| b.id).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), sim.bodies().len());
}

#[test]
fn tree_force_tracks_direct_sum_on_seeded_disk() {
    let params = SimulationParameters {
        num_bodies: 800,
        central_body_mass: None,
        seed: Some(3),
        ..Default::default()
    };
    let sim = Simulation::new(params.clone()).unwrap();
    let bodies = sim.bodies();

    let mut tree = QuadTree::new(Boundary::new(Point2::origin(), 1.0), params.node_capacity);
    assert_eq!(rebuild_tree(&mut tree, bodies, params.initialization_radius), 0);
    tree.compute_mass_distribution();

    let tree_gravity = TreeGravity::from_params(&tree, &params);
    let direct = DirectGravity::from_params(&params);

    let (error, scale) = bodies.iter().fold((0.0, 0.0), |(e, s), b| {
        let exact = direct.acceleration(b, bodies);
        (
            e + (tree_gravity.acceleration(b, bodies) - exact).magnitude(),
            s + exact.magnitude(),
        )
    });

    println!("mean relative force error at theta {}: {:.4}", params.theta, error / scale);
    assert!(error / scale < 0.03);
}
