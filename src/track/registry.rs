//! Environment registration metadata and the episode time limit.

use crate::infra::{Action, NUM_CELLS, TrackError};

use super::env::{Env, Observation, StepInfo, StepResult, Track};
use super::mask::ActionMask;

/// Registration entry for an environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvSpec {
    /// Symbolic identifier
    pub id: &'static str,
    /// Steps after which the episode is truncated
    pub max_episode_steps: usize,
    /// Number of grid cells passed to the constructor
    pub size: usize,
}

pub const DRIVE_GRID: EnvSpec = EnvSpec {
    id: "DriveGrid-v0",
    max_episode_steps: 300,
    size: NUM_CELLS,
};

const REGISTRY: &[EnvSpec] = &[DRIVE_GRID];

impl Default for EnvSpec {
    fn default() -> Self {
        DRIVE_GRID
    }
}

impl EnvSpec {
    pub fn make(&self) -> Result<TimeLimit<Track>, TrackError> {
        let track = Track::new(self.size)?;
        Ok(TimeLimit::new(track, self.max_episode_steps))
    }
}

/// Look up a registered environment
pub fn spec(id: &str) -> Result<EnvSpec, TrackError> {
    REGISTRY
        .iter()
        .find(|s| s.id == id)
        .copied()
        .ok_or_else(|| TrackError::UnknownEnv { id: id.to_string() })
}

/// Instantiate a registered environment wrapped in its time limit
pub fn make(id: &str) -> Result<TimeLimit<Track>, TrackError> {
    spec(id)?.make()
}

/// Truncates episodes after a fixed number of steps
#[derive(Debug, Clone)]
pub struct TimeLimit<E: Env> {
    env: E,
    max_episode_steps: usize,
    elapsed_steps: usize,
}

impl<E: Env> TimeLimit<E> {
    pub fn new(env: E, max_episode_steps: usize) -> Self {
        Self {
            env,
            max_episode_steps,
            elapsed_steps: 0,
        }
    }

    pub fn inner(&self) -> &E {
        &self.env
    }

    pub fn max_episode_steps(&self) -> usize {
        self.max_episode_steps
    }

    pub fn elapsed_steps(&self) -> usize {
        self.elapsed_steps
    }
}

impl<E: Env> Env for TimeLimit<E> {
    fn reset(&mut self, seed: Option<u64>) -> (Observation, StepInfo) {
        self.elapsed_steps = 0;
        self.env.reset(seed)
    }

    fn step(&mut self, action: Action) -> StepResult {
        let mut result = self.env.step(action);
        self.elapsed_steps += 1;
        if self.elapsed_steps >= self.max_episode_steps {
            result.truncated = true;
        }
        result
    }

    fn observation(&self) -> Observation {
        self.env.observation()
    }

    fn mask(&self) -> &ActionMask {
        self.env.mask()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_registered() {
        let env = make("DriveGrid-v0").unwrap();
        assert_eq!(env.max_episode_steps(), 300);
        assert_eq!(env.inner().size(), 144);
    }

    #[test]
    fn test_unknown_id() {
        let err = make("DriveGrid-v9").unwrap_err();
        assert!(matches!(err, TrackError::UnknownEnv { .. }));
    }

    #[test]
    fn test_time_limit_truncates() {
        let mut env = TimeLimit::new(Track::default(), 3);
        env.reset(None);
        let stay = Action::new(0, 0).unwrap();

        assert!(!env.step(stay).truncated);
        assert!(!env.step(stay).truncated);
        let result = env.step(stay);
        assert!(result.truncated);
        assert_eq!(result.info.rejection, None);
        assert_eq!(env.elapsed_steps(), 3);

        env.reset(None);
        assert_eq!(env.elapsed_steps(), 0);
        assert!(!env.step(stay).truncated);
    }
}
