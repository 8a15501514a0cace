//! Terminal rendering of recorded trajectories

use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use crate::infra::{GRID_SIDE, NUM_CELLS, col_of};
use crate::track::{FINISH_POSITIONS, START_POSITION, Subgrids};

/// Consumes a trajectory of cell indices
pub trait TrajectoryRenderer {
    fn render(&mut self, trajectory: &[usize]);
}

// ANSI color codes
const RESET: &str = "\x1b[0m";
const CAR: &str = "\x1b[1;33m"; // Bright yellow
const VISITED: &str = "\x1b[33m"; // Yellow
const INTERIOR: &str = "\x1b[90m"; // Dark gray
const FINISH: &str = "\x1b[1;32m"; // Bright green
const START: &str = "\x1b[1;36m"; // Bright cyan

/// Draws one frame per trajectory step to a writer
pub struct AsciiRenderer<W: Write> {
    writer: W,
    subgrids: Subgrids,
    frame_delay: Option<Duration>,
}

impl AsciiRenderer<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> AsciiRenderer<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            subgrids: Subgrids::partition(),
            frame_delay: None,
        }
    }

    /// Pause between frames
    pub fn with_frame_delay(mut self, delay: Duration) -> Self {
        self.frame_delay = Some(delay);
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    /// The track with the car at `trajectory[step]` and the cells before it marked
    pub fn draw_frame(&self, trajectory: &[usize], step: usize) -> String {
        let mut output = String::new();
        let car = trajectory.get(step).copied();
        let visited = &trajectory[..step.min(trajectory.len())];

        for cell in 0..NUM_CELLS {
            let glyph = if Some(cell) == car {
                format!("{}@{}", CAR, RESET)
            } else if self.subgrids.locate(cell) == Some(Subgrids::INTERIOR) {
                format!("{}█{}", INTERIOR, RESET)
            } else if visited.contains(&cell) {
                format!("{}*{}", VISITED, RESET)
            } else if FINISH_POSITIONS.contains(&cell) {
                format!("{}F{}", FINISH, RESET)
            } else if cell == START_POSITION {
                format!("{}S{}", START, RESET)
            } else {
                ".".to_string()
            };
            output.push_str(&glyph);

            if col_of(cell) == GRID_SIDE - 1 {
                output.push('\n');
            }
        }
        output
    }

    fn write_frames(&mut self, trajectory: &[usize]) -> io::Result<()> {
        let last = trajectory.len().saturating_sub(1);
        for (step, position) in trajectory.iter().enumerate() {
            writeln!(self.writer, "step {}/{} position {}", step, last, position)?;
            let frame = self.draw_frame(trajectory, step);
            writeln!(self.writer, "{}", frame)?;
            self.writer.flush()?;

            if let Some(delay) = self.frame_delay {
                thread::sleep(delay);
            }
        }
        Ok(())
    }
}

impl<W: Write> TrajectoryRenderer for AsciiRenderer<W> {
    fn render(&mut self, trajectory: &[usize]) {
        if let Err(e) = self.write_frames(trajectory) {
            tracing::warn!("Failed to render trajectory: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip_ansi(s: &str) -> String {
        let mut out = String::new();
        let mut chars = s.chars();
        while let Some(c) = chars.next() {
            if c == '\x1b' {
                for c in chars.by_ref() {
                    if c == 'm' {
                        break;
                    }
                }
            } else {
                out.push(c);
            }
        }
        out
    }

    #[test]
    fn test_frame_layout() {
        let renderer = AsciiRenderer::new(Vec::new());
        let frame = strip_ansi(&renderer.draw_frame(&[36, 37], 0));
        let rows: Vec<&str> = frame.lines().collect();

        assert_eq!(rows.len(), GRID_SIDE);
        assert!(rows.iter().all(|r| r.chars().count() == GRID_SIDE));
        assert_eq!(rows[0], "............");
        assert_eq!(rows[3], "@...........");
        assert_eq!(rows[4], "FFFF████....");
        assert_eq!(rows[5], "....████....");
    }

    #[test]
    fn test_visited_cells_marked() {
        let renderer = AsciiRenderer::new(Vec::new());
        let frame = strip_ansi(&renderer.draw_frame(&[36, 37, 39], 2));
        let rows: Vec<&str> = frame.lines().collect();
        assert_eq!(rows[3], "**.@........");
    }

    #[test]
    fn test_render_writes_every_frame() {
        let mut renderer = AsciiRenderer::new(Vec::new());
        renderer.render(&[36, 37, 39]);
        let output = String::from_utf8(renderer.into_inner()).unwrap();

        assert_eq!(output.matches("step ").count(), 3);
        assert!(output.contains("step 2/2 position 39"));
    }
}
