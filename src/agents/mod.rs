//! Q-learning agents for the racetrack
//!
//! Two agents share the canonical action slot order of [`crate::infra::DIRECTIONS`]:
//! - [`TabularAgent`]: explicit Q-table over (position, action)
//! - [`LinearAgent`]: linear Q over the legal-move mask features, trained with
//!   semi-gradient TD(0) through a pluggable [`QGradient`]
//!
//! ```text
//! Trainer
//!     │  reset / step
//!     ▼
//! ┌──────────────┐  Observation   ┌──────────────────────────┐
//! │  Env (Track) │ ─────────────▶ │  Agent::policy (ε-greedy) │
//! └──────────────┘ ◀───────────── └──────────────────────────┘
//!     │              Action                   ▲
//!     ▼                                       │ Transition
//! StepResult ─────────────────────────▶ Agent::update
//! ```

pub mod gradient;
pub mod linear;
pub mod metrics;
pub mod observer;
pub mod tabular;
pub mod train;

pub use gradient::{ClosedFormGradient, QGradient, WeightMatrix};
pub use linear::LinearAgent;
pub use metrics::{CsvLogger, MovingAverage, TrainingMetrics};
pub use observer::{DefaultObserver, TrainingObserver};
pub use tabular::TabularAgent;
pub use train::{EpisodeSummary, TrainConfig, Trainer};

#[cfg(feature = "autodiff")]
pub use gradient::{AutodiffNdArray, BurnGradient};

use crate::infra::{Action, TrackError};
use crate::track::Observation;

/// Hyper-parameters shared by both agents
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentConfig {
    /// Step size α
    pub learning_rate: f64,
    /// Discount factor γ
    pub gamma: f64,
    /// Initial exploration rate
    pub epsilon: f64,
    /// Amount subtracted from ε after every episode
    pub epsilon_decay: f64,
    /// Floor for ε
    pub final_epsilon: f64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            gamma: 0.95,
            epsilon: 1.0,
            epsilon_decay: 1.0 / 500.0,
            final_epsilon: 0.1,
        }
    }
}

/// Linearly decaying ε schedule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exploration {
    epsilon: f64,
    decay: f64,
    final_epsilon: f64,
}

impl Exploration {
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            epsilon: config.epsilon,
            decay: config.epsilon_decay,
            final_epsilon: config.final_epsilon,
        }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn decay(&mut self) {
        self.epsilon = (self.epsilon - self.decay).max(self.final_epsilon);
    }
}

/// One environment transition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub state: Observation,
    pub action: Action,
    pub reward: f64,
    pub terminated: bool,
    pub next_state: Observation,
}

/// Common interface of the learning agents
pub trait Agent {
    /// ε-greedy action for `state`
    fn policy(&mut self, state: &Observation) -> Action;

    /// Greedy action for `state`
    fn greedy(&self, state: &Observation) -> Action;

    /// Learn from one transition, returns the TD error
    fn update(&mut self, transition: &Transition) -> Result<f64, TrackError>;

    fn decay_epsilon(&mut self);

    fn epsilon(&self) -> f64;

    /// TD errors of every update so far
    fn training_error(&self) -> &[f64];

    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epsilon_floor() {
        let config = AgentConfig {
            epsilon: 0.5,
            epsilon_decay: 0.2,
            final_epsilon: 0.05,
            ..AgentConfig::default()
        };
        let mut exploration = Exploration::new(&config);

        exploration.decay();
        assert!((exploration.epsilon() - 0.3).abs() < 1e-9);

        for _ in 0..100 {
            exploration.decay();
            assert!(exploration.epsilon() >= config.final_epsilon);
        }
        assert!((exploration.epsilon() - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_agent_config_default() {
        let config = AgentConfig::default();
        assert!((config.gamma - 0.95).abs() < 1e-9);
        assert!((config.final_epsilon - 0.1).abs() < 1e-9);
    }
}
