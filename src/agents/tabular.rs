//! Tabular Q-learning over (position, action)

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::infra::{Action, NUM_CELLS, NUM_SLOTS, TrackError};
use crate::track::Observation;

use super::{Agent, AgentConfig, Exploration, Transition};

/// Q-learning agent with a dense table indexed by `position * NUM_SLOTS + slot`
#[derive(Debug, Clone)]
pub struct TabularAgent {
    q_values: Vec<f64>,
    learning_rate: f64,
    gamma: f64,
    exploration: Exploration,
    training_error: Vec<f64>,
    rng: StdRng,
}

impl TabularAgent {
    pub fn new(config: AgentConfig, seed: u64) -> Self {
        Self {
            q_values: vec![0.0; NUM_CELLS * NUM_SLOTS],
            learning_rate: config.learning_rate,
            gamma: config.gamma,
            exploration: Exploration::new(&config),
            training_error: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn row(&self, position: usize) -> &[f64] {
        assert!(
            position < NUM_CELLS,
            "position {} outside the Q-table",
            position
        );
        &self.q_values[position * NUM_SLOTS..(position + 1) * NUM_SLOTS]
    }

    pub fn q(&self, position: usize, action: Action) -> f64 {
        self.row(position)[action.slot()]
    }

    /// Best action value for `position`
    pub fn max_q(&self, position: usize) -> f64 {
        self.row(position)
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// First slot with the highest value for `position`
    fn best_slot(&self, position: usize) -> usize {
        let row = self.row(position);
        let mut best = 0;
        for slot in 1..NUM_SLOTS {
            if row[slot] > row[best] {
                best = slot;
            }
        }
        best
    }

    pub fn table_len(&self) -> usize {
        self.q_values.len()
    }

    pub fn values(&self) -> &[f64] {
        &self.q_values
    }

    /// TD(0) update, returns the TD error
    pub fn learn(
        &mut self,
        state: &Observation,
        action: Action,
        reward: f64,
        terminated: bool,
        next_state: &Observation,
    ) -> f64 {
        let future = if terminated {
            0.0
        } else {
            self.max_q(next_state.position)
        };
        let current = self.q(state.position, action);
        let td = reward + self.gamma * future - current;

        self.q_values[state.position * NUM_SLOTS + action.slot()] += self.learning_rate * td;
        self.training_error.push(td);
        td
    }
}

impl Agent for TabularAgent {
    fn policy(&mut self, state: &Observation) -> Action {
        if self.rng.random::<f64>() < self.exploration.epsilon() {
            Action::at_slot(self.rng.random_range(0..NUM_SLOTS))
        } else {
            self.greedy(state)
        }
    }

    fn greedy(&self, state: &Observation) -> Action {
        Action::at_slot(self.best_slot(state.position))
    }

    fn update(&mut self, transition: &Transition) -> Result<f64, TrackError> {
        Ok(self.learn(
            &transition.state,
            transition.action,
            transition.reward,
            transition.terminated,
            &transition.next_state,
        ))
    }

    fn decay_epsilon(&mut self) {
        self.exploration.decay();
    }

    fn epsilon(&self) -> f64 {
        self.exploration.epsilon()
    }

    fn training_error(&self) -> &[f64] {
        &self.training_error
    }

    fn name(&self) -> &'static str {
        "tabular"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::Velocity;

    fn obs(position: usize) -> Observation {
        Observation {
            position,
            velocity: Velocity::default(),
        }
    }

    fn greedy_config() -> AgentConfig {
        AgentConfig {
            learning_rate: 0.5,
            gamma: 0.9,
            epsilon: 0.0,
            epsilon_decay: 0.0,
            final_epsilon: 0.0,
        }
    }

    #[test]
    fn test_table_starts_empty() {
        let agent = TabularAgent::new(AgentConfig::default(), 0);
        assert_eq!(agent.table_len(), 144 * 9);
        assert!(agent.values().iter().all(|&q| q == 0.0));
    }

    #[test]
    fn test_update_moves_towards_target() {
        let mut agent = TabularAgent::new(greedy_config(), 0);
        let east = Action::new(1, 0).unwrap();

        let td = agent.learn(&obs(36), east, -1.0, false, &obs(37));
        assert!((td + 1.0).abs() < 1e-9);
        assert!((agent.q(36, east) + 0.5).abs() < 1e-9);
        assert_eq!(agent.training_error().len(), 1);

        // Bootstraps from the best value of the next position
        agent.learn(&obs(37), east, 10.0, false, &obs(38));
        let td = agent.learn(&obs(36), east, -1.0, false, &obs(37));
        let expected = -1.0 + 0.9 * 5.0 - (-0.5);
        assert!((td - expected).abs() < 1e-9);
    }

    #[test]
    fn test_terminal_update_ignores_future() {
        let mut agent = TabularAgent::new(greedy_config(), 0);
        let stay = Action::new(0, 0).unwrap();
        agent.learn(&obs(50), stay, 100.0, false, &obs(51));

        let td = agent.learn(&obs(61), stay, 1000.0, true, &obs(50));
        assert!((td - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_greedy_picks_best_action() {
        let mut agent = TabularAgent::new(greedy_config(), 0);
        let south = Action::new(0, 1).unwrap();
        agent.learn(&obs(36), south, 4.0, true, &obs(48));

        assert_eq!(agent.policy(&obs(36)), south);
        // All zeros: first slot wins
        assert_eq!(agent.greedy(&obs(37)), Action::at_slot(0));
    }

    #[test]
    fn test_exploration_is_seeded() {
        let config = AgentConfig {
            epsilon: 1.0,
            ..AgentConfig::default()
        };
        let mut a = TabularAgent::new(config, 42);
        let mut b = TabularAgent::new(config, 42);
        for _ in 0..50 {
            assert_eq!(a.policy(&obs(36)), b.policy(&obs(36)));
        }
    }

    #[test]
    fn test_decay_epsilon_floor() {
        let config = AgentConfig {
            epsilon: 0.3,
            epsilon_decay: 0.1,
            final_epsilon: 0.15,
            ..AgentConfig::default()
        };
        let mut agent = TabularAgent::new(config, 0);
        for _ in 0..10 {
            agent.decay_epsilon();
        }
        assert!((agent.epsilon() - 0.15).abs() < 1e-9);
    }

    #[test]
    #[should_panic]
    fn test_out_of_range_position_panics() {
        let agent = TabularAgent::new(AgentConfig::default(), 0);
        agent.q(144, Action::new(0, 0).unwrap());
    }
}
