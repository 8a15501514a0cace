//! Racetrack environment - gym-like interface for training

use std::fmt;
use std::ops::Range;

use crate::infra::{Action, GRID_SIDE, TrackError, Velocity};

use super::grid::Subgrids;
use super::mask::ActionMask;

/// Cell the car starts from, and returns to after an illegal move.
pub const START_POSITION: usize = 36;
/// Cells of the finish line.
pub const FINISH_POSITIONS: Range<usize> = 48..52;

/// Reward when the car stands on cell 0.
pub const ORIGIN_REWARD: f64 = 0.0;
/// Reward for crossing the finish line.
pub const FINISH_REWARD: f64 = 1000.0;
/// Penalty for an illegal move.
pub const CRASH_PENALTY: f64 = -5.0;
/// Cost of every other step.
pub const STEP_PENALTY: f64 = -1.0;

/// Observation returned by the environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Observation {
    /// Cell index in [0, 144)
    pub position: usize,
    /// Current velocity
    pub velocity: Velocity,
}

impl Observation {
    pub fn start() -> Self {
        Self {
            position: START_POSITION,
            velocity: Velocity::default(),
        }
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, ({}, {}))",
            self.position, self.velocity.vx, self.velocity.vy
        )
    }
}

/// Episode state machine.
///
/// `Truncated` means the last step was rejected and the car is already back
/// on the start cell, so stepping again behaves exactly as from `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EpisodeStatus {
    #[default]
    Running,
    Terminated,
    Truncated,
}

/// Why a move was rejected by the legality check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Candidate position is outside the grid
    OffGrid,
    /// Candidate subgrid lies behind the current one on the loop
    Backward,
    /// Candidate subgrid is more than one step ahead
    SkippedSubgrid,
    /// Candidate lies in the hollow interior
    Interior,
    /// Moving left from the left edge
    LeftEdge,
    /// Moving right from the right edge
    RightEdge,
}

/// Additional information from a step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepInfo {
    /// Steps taken since the last reset
    pub steps: usize,
    /// Subgrid of the car after the step
    pub subgrid: Option<usize>,
    /// Set when the move was rejected
    pub rejection: Option<Rejection>,
}

/// Step result from the environment
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    /// Next observation
    pub observation: Observation,
    pub reward: f64,
    /// Reached the finish line
    pub terminated: bool,
    /// Illegal move, the car was sent back to the start
    pub truncated: bool,
    /// Additional info
    pub info: StepInfo,
}

impl StepResult {
    pub fn done(&self) -> bool {
        self.terminated || self.truncated
    }
}

/// Gym-like environment interface
pub trait Env {
    fn reset(&mut self, seed: Option<u64>) -> (Observation, StepInfo);
    fn step(&mut self, action: Action) -> StepResult;
    fn observation(&self) -> Observation;
    fn mask(&self) -> &ActionMask;
}

/// The racetrack MDP over a 12x12 grid
#[derive(Debug, Clone)]
pub struct Track {
    row: usize,
    subgrids: Subgrids,
    mask: ActionMask,
    position: usize,
    velocity: Velocity,
    status: EpisodeStatus,
    steps: usize,
    seed: Option<u64>,
}

impl Track {
    /// Create a track over `size` cells; the grid side is the square root of `size`.
    pub fn new(size: usize) -> Result<Self, TrackError> {
        let row = size.isqrt();
        if row * row != size || row != GRID_SIDE {
            return Err(TrackError::UnsupportedSize { size });
        }

        Ok(Self {
            row,
            ..Self::default()
        })
    }

    pub fn status(&self) -> EpisodeStatus {
        self.status
    }

    /// Grid side length
    pub fn row(&self) -> usize {
        self.row
    }

    pub fn size(&self) -> usize {
        self.row * self.row
    }

    pub fn subgrids(&self) -> &Subgrids {
        &self.subgrids
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Legality check for moving from `position` to `candidate` with the
    /// unclamped horizontal velocity `vx`.
    fn check_move(&self, candidate: i64, vx: i32) -> Result<usize, Rejection> {
        let now = self
            .subgrids
            .locate(self.position)
            .ok_or(Rejection::OffGrid)?;
        let next = self
            .subgrids
            .locate_signed(candidate)
            .ok_or(Rejection::OffGrid)?;

        let advance = next as i64 - now as i64;
        if advance < 0 {
            return Err(Rejection::Backward);
        }
        if advance > 1 {
            return Err(Rejection::SkippedSubgrid);
        }
        if next == Subgrids::INTERIOR {
            return Err(Rejection::Interior);
        }
        let col = self.position % self.row;
        if col == 0 && vx < 0 {
            return Err(Rejection::LeftEdge);
        }
        if col == self.row - 1 && vx > 0 {
            return Err(Rejection::RightEdge);
        }

        // locate() succeeded, so the candidate is on the grid
        Ok(candidate as usize)
    }

    fn reward(&self, truncated: bool) -> f64 {
        if self.position == 0 {
            ORIGIN_REWARD
        } else if FINISH_POSITIONS.contains(&self.position) {
            FINISH_REWARD
        } else if truncated {
            CRASH_PENALTY
        } else {
            STEP_PENALTY
        }
    }

    fn restart(&mut self) {
        self.position = START_POSITION;
        self.velocity = Velocity::default();
    }
}

impl Default for Track {
    fn default() -> Self {
        Self {
            row: GRID_SIDE,
            subgrids: Subgrids::partition(),
            mask: ActionMask::build(),
            position: START_POSITION,
            velocity: Velocity::default(),
            status: EpisodeStatus::Running,
            steps: 0,
            seed: None,
        }
    }
}

impl Env for Track {
    /// Reset the car to the start cell
    fn reset(&mut self, seed: Option<u64>) -> (Observation, StepInfo) {
        self.restart();
        self.status = EpisodeStatus::Running;
        self.steps = 0;
        if seed.is_some() {
            self.seed = seed;
        }

        let info = StepInfo {
            steps: 0,
            subgrid: self.subgrids.locate(self.position),
            rejection: None,
        };
        (self.observation(), info)
    }

    /// Apply an acceleration and move the car
    fn step(&mut self, action: Action) -> StepResult {
        if self.status == EpisodeStatus::Terminated {
            tracing::debug!("Stepping past the finish line at {}", self.position);
        }
        self.steps += 1;

        let raw = self.velocity.accelerate(action);
        let candidate =
            self.position as i64 + raw.vx as i64 + raw.vy as i64 * self.row as i64;

        let rejection = match self.check_move(candidate, raw.vx) {
            Ok(next) => {
                self.position = next;
                self.velocity = raw.clamped();
                None
            }
            Err(reason) => {
                tracing::debug!(
                    "Rejected move {} -> {} ({:?}), back to start",
                    self.position,
                    candidate,
                    reason
                );
                self.restart();
                Some(reason)
            }
        };

        let truncated = rejection.is_some();
        let terminated = FINISH_POSITIONS.contains(&self.position);
        let reward = self.reward(truncated);

        self.status = if terminated {
            EpisodeStatus::Terminated
        } else if truncated {
            EpisodeStatus::Truncated
        } else {
            EpisodeStatus::Running
        };

        StepResult {
            observation: self.observation(),
            reward,
            terminated,
            truncated,
            info: StepInfo {
                steps: self.steps,
                subgrid: self.subgrids.locate(self.position),
                rejection,
            },
        }
    }

    fn observation(&self) -> Observation {
        Observation {
            position: self.position,
            velocity: self.velocity,
        }
    }

    fn mask(&self) -> &ActionMask {
        &self.mask
    }
}
