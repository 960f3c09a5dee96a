use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use quadgrav::simulation::Simulation;

use crate::renderer::AsciiRenderer;
use crate::{Args, FrameStats, RenderMode, apply_overrides, load_parameters, run};

fn scenario(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("scenarios")
        .join(name)
}

#[test]
fn test_shipped_scenarios_are_valid() {
    for name in ["default.yaml", "free_bodies.yaml", "dense_cluster.yaml"] {
        let params = load_parameters(Some(scenario(name).as_path())).unwrap();
        assert!(params.validate().is_ok(), "{name}");
    }
}

#[test]
fn test_default_scenario_matches_defaults() {
    let params = load_parameters(Some(scenario("default.yaml").as_path())).unwrap();
    assert_eq!(params, quadgrav::params::SimulationParameters::default());
}

#[test]
fn test_missing_scenario_names_the_path() {
    let err = load_parameters(Some(scenario("no_such_file.yaml").as_path())).unwrap_err();
    assert!(format!("{err:#}").contains("no_such_file.yaml"));
}

#[test]
fn test_overrides() {
    let args = Args::parse_from([
        "quadgrav", "--seed", "9", "-n", "123", "--theta", "0.8", "--render", "none",
    ]);
    let mut params = load_parameters(None).unwrap();
    apply_overrides(&mut params, &args);

    assert_eq!(params.seed, Some(9));
    assert_eq!(params.num_bodies, 123);
    assert_eq!(params.theta, 0.8);
    assert_eq!(args.render, RenderMode::None);
}

#[test]
fn test_frame_stats() {
    let budget = Duration::from_millis(10);
    let mut stats = FrameStats::default();
    assert_eq!(stats.mean(), Duration::ZERO);

    stats.record(Duration::from_millis(4), 2, budget);
    stats.record(Duration::from_millis(20), 1, budget);

    assert_eq!(stats.frames, 2);
    assert_eq!(stats.merges, 3);
    assert_eq!(stats.max, Duration::from_millis(20));
    assert_eq!(stats.mean(), Duration::from_millis(12));
    assert_eq!(stats.over_budget, 1);
}

#[test]
fn test_run_applies_view_options() {
    let args = Args::parse_from([
        "quadgrav", "--steps", "1", "--seed", "1", "-n", "20", "--render", "none", "--width",
        "8", "--height", "4", "--zoom", "2",
    ]);
    let mut params = load_parameters(None).unwrap();
    apply_overrides(&mut params, &args);
    let mut sim = Simulation::new(params).unwrap();
    let mut renderer = AsciiRenderer::default();

    run(&args, &mut sim, &mut renderer).unwrap();

    let rows = renderer.draw(&[]);
    assert_eq!(rows.len(), 4);
    assert!(rows.iter().all(|r| r.len() == 8));
    // view radius 100 / zoom 2
    assert!(renderer.cell(40.0, 0.0).is_some());
    assert_eq!(renderer.cell(60.0, 0.0), None);
}

#[test]
fn test_run_counts_frames() {
    let args = Args::parse_from([
        "quadgrav", "--steps", "5", "--seed", "1", "-n", "20", "--render", "none",
    ]);
    let mut params = load_parameters(None).unwrap();
    apply_overrides(&mut params, &args);
    let mut sim = Simulation::new(params).unwrap();

    let stats = run(&args, &mut sim, &mut AsciiRenderer::new(8, 4)).unwrap();
    assert_eq!(stats.frames, 5);
    assert_eq!(sim.frame(), 5);
}
