use approx::assert_relative_eq;
use nalgebra::{Point2, Vector2};

use crate::body::{Body, BodyId};
use crate::params::{ParameterError, SimulationParameters};
use crate::quadtree::QuadTree;
use crate::simulation::{BodySnapshot, Simulation, rebuild_tree, root_boundary, step};

fn quiet_params() -> SimulationParameters {
    SimulationParameters {
        num_bodies: 0,
        central_body_mass: None,
        g: 1.0,
        softening_factor: 0.1,
        dt: 0.01,
        seed: Some(1),
        ..Default::default()
    }
}

#[test]
fn test_new_rejects_invalid_params() {
    let params = SimulationParameters {
        density: 0.0,
        ..Default::default()
    };
    assert_eq!(
        Simulation::new(params).err(),
        Some(ParameterError::NonPositiveDensity(0.0))
    );
}

#[test]
fn test_new_seeds_bodies() {
    let params = SimulationParameters {
        num_bodies: 150,
        seed: Some(3),
        ..Default::default()
    };
    let sim = Simulation::new(params).unwrap();

    assert_eq!(sim.bodies().len(), 150);
    assert_eq!(sim.frame(), 0);
}

#[test]
fn test_frames_count_up_and_reset() {
    let params = SimulationParameters {
        num_bodies: 50,
        seed: Some(4),
        ..Default::default()
    };
    let mut sim = Simulation::new(params.clone()).unwrap();

    assert_eq!(sim.step().frame, 1);
    assert_eq!(sim.step().frame, 2);
    assert_eq!(sim.frame(), 2);

    sim.initialize(params).unwrap();
    assert_eq!(sim.frame(), 0);
    assert_eq!(sim.bodies().len(), 50);
}

#[test]
fn test_initialize_with_same_seed_is_reproducible() {
    let params = SimulationParameters {
        num_bodies: 80,
        seed: Some(11),
        ..Default::default()
    };
    let mut sim = Simulation::new(params.clone()).unwrap();
    let first = sim.snapshot();

    for _ in 0..5 {
        sim.step();
    }
    sim.initialize(params).unwrap();

    assert_eq!(sim.snapshot(), first);
}

#[test]
fn test_initialize_rejects_and_keeps_state() {
    let params = SimulationParameters {
        num_bodies: 30,
        seed: Some(5),
        ..Default::default()
    };
    let mut sim = Simulation::new(params.clone()).unwrap();
    sim.step();

    let bad = SimulationParameters {
        min_mass: 2.0,
        max_mass: 1.0,
        ..params.clone()
    };
    assert!(sim.initialize(bad).is_err());
    assert_eq!(sim.params(), &params);
    assert_eq!(sim.frame(), 1);
}

#[test]
fn test_initialize_replaces_parameters() {
    let mut sim = Simulation::new(SimulationParameters {
        num_bodies: 20,
        seed: Some(6),
        ..Default::default()
    })
    .unwrap();

    sim.initialize(SimulationParameters {
        num_bodies: 40,
        central_body_mass: None,
        node_capacity: 1,
        seed: Some(6),
        ..Default::default()
    })
    .unwrap();

    assert_eq!(sim.bodies().len(), 40);
    assert_eq!(sim.params().node_capacity, 1);
    sim.step();
    assert_eq!(sim.tree().capacity(), 1);
}

#[test]
fn test_add_body_assigns_fresh_ids() {
    let mut sim = Simulation::empty(quiet_params()).unwrap();
    let a = sim.add_body(1.0, Point2::new(-10.0, 0.0), Vector2::zeros());
    let b = sim.add_body(1.0, Point2::new(10.0, 0.0), Vector2::zeros());

    assert_eq!(a, Some(BodyId(0)));
    assert_eq!(b, Some(BodyId(1)));
    assert_eq!(sim.bodies().len(), 2);
}

#[test]
fn test_add_body_rejects_invalid_state() {
    let mut sim = Simulation::empty(quiet_params()).unwrap();

    assert_eq!(sim.add_body(-1.0, Point2::origin(), Vector2::zeros()), None);
    assert_eq!(sim.add_body(0.0, Point2::origin(), Vector2::zeros()), None);
    assert_eq!(sim.add_body(f64::NAN, Point2::origin(), Vector2::zeros()), None);
    assert_eq!(sim.add_body(f64::INFINITY, Point2::origin(), Vector2::zeros()), None);
    assert_eq!(sim.add_body(1.0, Point2::new(f64::NAN, 0.0), Vector2::zeros()), None);
    assert_eq!(sim.add_body(1.0, Point2::origin(), Vector2::new(0.0, f64::INFINITY)), None);
    assert!(sim.bodies().is_empty());

    // rejected bodies do not consume ids
    assert_eq!(sim.add_body(2.0, Point2::origin(), Vector2::zeros()), Some(BodyId(0)));
    assert!(sim.bodies()[0].radius().is_finite());
}

#[test]
fn test_merge_during_step() {
    let params = SimulationParameters {
        density: 1.25,
        ..quiet_params()
    };
    let mut sim = Simulation::empty(params).unwrap();
    sim.add_body(10.0, Point2::new(0.0, 0.0), Vector2::new(1.5, 0.0));
    sim.add_body(5.0, Point2::new(0.0, 0.0), Vector2::new(0.0, 3.0));

    let report = sim.step();

    assert_eq!(report.merges.len(), 1);
    assert_eq!(report.merges[0].survivor, BodyId(0));
    assert_eq!(report.live_bodies, 1);

    let merged = sim.bodies()[0];
    assert_relative_eq!(merged.mass(), 15.0);
    assert_relative_eq!(merged.radius(), 12.0_f64.cbrt(), epsilon = 1e-12);
    // alone after the merge: no acceleration, moves with the merged velocity
    assert_relative_eq!(merged.velocity.x, 1.0, epsilon = 1e-12);
    assert_relative_eq!(merged.velocity.y, 1.0, epsilon = 1e-12);
    assert_relative_eq!(merged.position.x, 0.01, epsilon = 1e-12);
}

#[test]
fn test_accelerations_reset_each_step() {
    let mut sim = Simulation::empty(quiet_params()).unwrap();
    sim.add_body(1.0, Point2::new(-20.0, 0.0), Vector2::zeros());
    sim.add_body(1.0, Point2::new(20.0, 0.0), Vector2::zeros());

    sim.step();
    let first = sim.bodies()[0].acceleration;
    sim.step();
    let second = sim.bodies()[0].acceleration;

    // the pull grows slightly as the bodies approach, but is never doubled
    assert!(second.x > first.x);
    assert!(second.x < 1.01 * first.x);
}

#[test]
fn test_snapshot_matches_bodies() {
    let mut sim = Simulation::empty(quiet_params()).unwrap();
    sim.add_body(1.0, Point2::new(3.0, 4.0), Vector2::zeros());

    assert_eq!(
        sim.snapshot(),
        vec![BodySnapshot {
            id: 0,
            x: 3.0,
            y: 4.0,
            radius: 1.0,
        }]
    );
}

#[test]
fn test_step_conserves_mass() {
    let params = SimulationParameters {
        num_bodies: 300,
        initialization_radius: 30.0,
        seed: Some(9),
        ..Default::default()
    };
    let mut sim = Simulation::new(params).unwrap();
    let mass = sim.total_mass();

    let merges: usize = (0..20).map(|_| sim.step().merges.len()).sum();

    assert_eq!(sim.bodies().len(), 300 - merges);
    assert_relative_eq!(sim.total_mass(), mass, max_relative = 1e-12);
}

#[test]
fn test_root_boundary_encloses_everything() {
    let bodies = vec![
        Body::new(BodyId(0), 1.0, 1.0, Point2::new(-500.0, 3.0), Vector2::zeros()),
        Body::new(BodyId(1), 1.0, 1.0, Point2::new(250.0, 800.0), Vector2::zeros()),
    ];
    let bounds = root_boundary(&bodies, 100.0);
    assert!(bodies.iter().all(|b| bounds.contains(&b.position)));

    let small = root_boundary(&bodies[..1], 100.0);
    assert_eq!(small.half_dim, 100.0);
}

#[test]
fn test_non_finite_bodies_are_reported() {
    let mut bodies = vec![
        Body::new(BodyId(0), 1.0, 1.0, Point2::new(0.0, 0.0), Vector2::zeros()),
        Body::new(BodyId(1), 1.0, 1.0, Point2::new(f64::NAN, 0.0), Vector2::zeros()),
        Body::new(BodyId(2), 1.0, 1.0, Point2::new(5.0, 0.0), Vector2::zeros()),
    ];
    let params = quiet_params();
    let mut tree = QuadTree::new(root_boundary(&bodies, 1.0), 4);

    assert_eq!(rebuild_tree(&mut tree, &bodies, 1.0), 1);

    let report = step(&mut bodies, &mut tree, &params);
    assert_eq!(report.unindexed, 1);
    assert_eq!(report.live_bodies, 3);
    assert!(bodies[0].position.x.is_finite());
    assert!(bodies[2].position.x.is_finite());
}

#[test]
fn test_step_with_no_bodies() {
    let mut sim = Simulation::empty(quiet_params()).unwrap();
    let report = sim.step();

    assert_eq!(report.live_bodies, 0);
    assert!(report.merges.is_empty());
}
