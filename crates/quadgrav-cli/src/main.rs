//! Headless driver for the quadgrav simulation.
//!
//! Loads a YAML scenario, applies command line overrides and runs the
//! `step -> render` loop for a fixed number of frames, then
//! prints step timing against the frame budget.

mod renderer;

#[cfg(test)]
mod main_test;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, ensure};
use clap::{Parser, ValueEnum};
use log::{debug, info};
use quadgrav::params::SimulationParameters;
use quadgrav::simulation::Simulation;

use crate::renderer::{AsciiRenderer, LogRenderer, Renderer};

#[derive(Parser, Debug)]
#[command(name = "quadgrav", version, about = "Barnes-Hut N-body simulation in the plane")]
struct Args {
    /// YAML scenario with upper-case parameter keys; built-in defaults if omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Frames to simulate
    #[arg(short, long, default_value_t = 500)]
    steps: u64,

    /// Overrides SEED
    #[arg(long)]
    seed: Option<u64>,

    /// Overrides NUM_BODIES
    #[arg(short = 'n', long)]
    bodies: Option<usize>,

    /// Overrides THETA
    #[arg(long)]
    theta: Option<f64>,

    #[arg(short, long, value_enum, default_value_t = RenderMode::Log)]
    render: RenderMode,

    /// Render every N frames (0 disables rendering)
    #[arg(short, long, default_value_t = 50)]
    every: u64,

    /// Wall-clock budget for one step
    #[arg(long, default_value_t = 16.7)]
    frame_budget_ms: f64,

    /// ASCII grid width in characters
    #[arg(long, default_value_t = 80)]
    width: usize,

    /// ASCII grid height in characters
    #[arg(long, default_value_t = 40)]
    height: usize,

    /// Initial zoom; 2.0 shows the inner half of the seeding disk
    #[arg(long, default_value_t = 1.0)]
    zoom: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum RenderMode {
    Ascii,
    Log,
    None,
}

fn load_parameters(path: Option<&Path>) -> Result<SimulationParameters> {
    let Some(path) = path else {
        return Ok(SimulationParameters::default());
    };
    let file =
        File::open(path).with_context(|| format!("failed to open scenario {}", path.display()))?;
    let params = serde_yaml::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse scenario {}", path.display()))?;
    Ok(params)
}

fn apply_overrides(params: &mut SimulationParameters, args: &Args) {
    if let Some(seed) = args.seed {
        params.seed = Some(seed);
    }
    if let Some(bodies) = args.bodies {
        params.num_bodies = bodies;
    }
    if let Some(theta) = args.theta {
        params.theta = theta;
    }
}

/// Step timing gathered over a run
#[derive(Debug, Default)]
struct FrameStats {
    frames: u64,
    merges: usize,
    total: Duration,
    max: Duration,
    over_budget: u64,
}

impl FrameStats {
    fn record(&mut self, elapsed: Duration, merges: usize, budget: Duration) {
        self.frames += 1;
        self.merges += merges;
        self.total += elapsed;
        self.max = self.max.max(elapsed);
        if elapsed > budget {
            self.over_budget += 1;
        }
    }

    fn mean(&self) -> Duration {
        match u32::try_from(self.frames) {
            Ok(0) => Duration::ZERO,
            Ok(frames) => self.total / frames,
            Err(_) => Duration::from_secs_f64(self.total.as_secs_f64() / self.frames as f64),
        }
    }
}

fn run(args: &Args, sim: &mut Simulation, renderer: &mut dyn Renderer) -> Result<FrameStats> {
    let budget = Duration::from_secs_f64(args.frame_budget_ms / 1000.0);
    let mut stats = FrameStats::default();

    renderer.init(sim.params().initialization_radius)?;
    renderer.handle_resize(args.width, args.height);
    renderer.handle_zoom(args.zoom);

    for _ in 0..args.steps {
        let started = Instant::now();
        let report = sim.step();
        let elapsed = started.elapsed();
        stats.record(elapsed, report.merges.len(), budget);

        if elapsed > budget {
            debug!(
                "frame {} took {:.2} ms, over the {} ms budget",
                report.frame,
                elapsed.as_secs_f64() * 1000.0,
                args.frame_budget_ms
            );
        }
        if args.render != RenderMode::None && args.every > 0 && report.frame % args.every == 0 {
            renderer.render(report.frame, &sim.snapshot())?;
        }
    }

    Ok(stats)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    ensure!(
        args.frame_budget_ms.is_finite() && args.frame_budget_ms > 0.0,
        "--frame-budget-ms must be a positive number, got {}",
        args.frame_budget_ms
    );
    ensure!(
        args.zoom.is_finite() && args.zoom > 0.0,
        "--zoom must be a positive number, got {}",
        args.zoom
    );

    let mut params = load_parameters(args.config.as_deref())?;
    apply_overrides(&mut params, &args);
    let mut sim = Simulation::new(params).context("invalid simulation parameters")?;

    let mut renderer: Box<dyn Renderer> = match args.render {
        RenderMode::Ascii => Box::new(AsciiRenderer::default()),
        // `None` still needs a sink for events; it is never asked to render
        RenderMode::Log | RenderMode::None => Box::new(LogRenderer),
    };

    info!(
        "running {} frames of {} bodies",
        args.steps,
        sim.bodies().len()
    );
    let stats = run(&args, &mut sim, renderer.as_mut())?;

    println!("frames:         {}", stats.frames);
    println!("final bodies:   {}", sim.bodies().len());
    println!("merges:         {}", stats.merges);
    println!("mean step:      {:.3} ms", stats.mean().as_secs_f64() * 1000.0);
    println!("max step:       {:.3} ms", stats.max.as_secs_f64() * 1000.0);
    println!(
        "over budget:    {} of {} ({} ms)",
        stats.over_budget, stats.frames, args.frame_budget_ms
    );

    Ok(())
}
