//! Front ends that consume per-frame snapshots.
//!
//! Renderers only ever see [`BodySnapshot`]s and cannot influence the
//! physics. Both implementations here are headless.

use std::io::{self, Write};

use anyhow::Result;
use log::info;
use quadgrav::simulation::BodySnapshot;

pub trait Renderer {
    /// Prepares the output; `initialization_radius` sets the visible extent
    fn init(&mut self, initialization_radius: f64) -> Result<()>;

    fn render(&mut self, frame: u64, bodies: &[BodySnapshot]) -> Result<()>;

    fn handle_resize(&mut self, width: usize, height: usize);

    /// Multiplies the current zoom, as a pinch gesture would
    fn handle_zoom(&mut self, _factor: f64) {}
}

/// Draws bodies onto a character grid written to stdout
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    extent: f64,
    zoom: f64,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            extent: 1.0,
            zoom: 1.0,
        }
    }

    /// Grid cell for a world position, `None` when off screen.
    ///
    /// The view is square in world units and spans `2 * extent / zoom`.
    /// Rows grow downwards, so world `y` is flipped.
    pub fn cell(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let half = self.extent / self.zoom;
        let u = (x / half + 1.0) / 2.0;
        let v = (1.0 - y / half) / 2.0;
        if !(0.0..1.0).contains(&u) || !(0.0..1.0).contains(&v) {
            return None;
        }
        Some((
            (u * self.width as f64) as usize,
            (v * self.height as f64) as usize,
        ))
    }

    /// Renders `bodies` into rows of text
    pub fn draw(&self, bodies: &[BodySnapshot]) -> Vec<String> {
        let mut grid = vec![vec![' '; self.width]; self.height];
        let mut sizes = vec![vec![0.0_f64; self.width]; self.height];

        for body in bodies {
            if let Some((col, row)) = self.cell(body.x, body.y) {
                // the largest body in a cell decides its glyph
                if body.radius >= sizes[row][col] {
                    sizes[row][col] = body.radius;
                    grid[row][col] = glyph(body.radius);
                }
            }
        }

        grid.into_iter().map(|row| row.into_iter().collect()).collect()
    }
}

fn glyph(radius: f64) -> char {
    match radius {
        r if r < 0.3 => '.',
        r if r < 1.0 => 'o',
        r if r < 5.0 => 'O',
        _ => '@',
    }
}

impl Default for AsciiRenderer {
    fn default() -> Self {
        Self::new(80, 40)
    }
}

impl Renderer for AsciiRenderer {
    fn init(&mut self, initialization_radius: f64) -> Result<()> {
        self.extent = initialization_radius;
        Ok(())
    }

    fn render(&mut self, frame: u64, bodies: &[BodySnapshot]) -> Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "frame {frame}: {} bodies", bodies.len())?;
        writeln!(out, "+{}+", "-".repeat(self.width))?;
        for row in self.draw(bodies) {
            writeln!(out, "|{row}|")?;
        }
        writeln!(out, "+{}+", "-".repeat(self.width))?;
        out.flush()?;
        Ok(())
    }

    fn handle_resize(&mut self, width: usize, height: usize) {
        self.width = width.max(1);
        self.height = height.max(1);
    }

    fn handle_zoom(&mut self, factor: f64) {
        if factor.is_finite() && factor > 0.0 {
            self.zoom *= factor;
        }
    }
}

/// Logs a one-line summary per rendered frame
#[derive(Default)]
pub struct LogRenderer;

impl Renderer for LogRenderer {
    fn init(&mut self, initialization_radius: f64) -> Result<()> {
        info!("log renderer ready, view radius {initialization_radius}");
        Ok(())
    }

    fn render(&mut self, frame: u64, bodies: &[BodySnapshot]) -> Result<()> {
        let largest = bodies.iter().max_by(|a, b| a.radius.total_cmp(&b.radius));
        match largest {
            Some(body) => info!(
                "frame {frame}: {} bodies, largest #{} r={:.3} at ({:.1}, {:.1})",
                bodies.len(),
                body.id,
                body.radius,
                body.x,
                body.y
            ),
            None => info!("frame {frame}: no bodies"),
        }
        Ok(())
    }

    fn handle_resize(&mut self, _width: usize, _height: usize) {}
}
