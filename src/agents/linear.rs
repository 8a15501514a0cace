//! Q-learning with linear value function approximation
//!
//! The state features are the 0/1 legal-move indicator of the car's cell, and
//! `q(s, a) = x(s) · w[:, a]`. Only legal slots are ever proposed by the policy.

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use crate::infra::{Action, NUM_SLOTS, STAY_SLOT, TrackError};
use crate::track::{ActionMask, Observation};

use super::gradient::{ClosedFormGradient, QGradient, WeightMatrix};
use super::{Agent, AgentConfig, Exploration, Transition};

/// Linear Q agent, generic over how the value gradient is obtained
#[derive(Debug, Clone)]
pub struct LinearAgent<G: QGradient = ClosedFormGradient> {
    weights: WeightMatrix,
    mask: ActionMask,
    gradient: G,
    learning_rate: f64,
    gamma: f64,
    exploration: Exploration,
    training_error: Vec<f64>,
    rng: StdRng,
}

impl LinearAgent<ClosedFormGradient> {
    /// Agent with all-ones initial weights
    pub fn new(config: AgentConfig, mask: ActionMask, seed: u64) -> Self {
        Self::with_gradient(config, mask, ClosedFormGradient, seed)
    }

    /// Agent with caller-supplied initial weights, `weights[feature][slot]`
    pub fn with_weights(
        config: AgentConfig,
        mask: ActionMask,
        weights: &[Vec<f64>],
        seed: u64,
    ) -> Result<Self, TrackError> {
        let mut agent = Self::new(config, mask, seed);
        agent.set_weights(weights)?;
        Ok(agent)
    }
}

impl<G: QGradient> LinearAgent<G> {
    pub fn with_gradient(config: AgentConfig, mask: ActionMask, gradient: G, seed: u64) -> Self {
        Self {
            weights: [[1.0; NUM_SLOTS]; NUM_SLOTS],
            mask,
            gradient,
            learning_rate: config.learning_rate,
            gamma: config.gamma,
            exploration: Exploration::new(&config),
            training_error: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn set_weights(&mut self, weights: &[Vec<f64>]) -> Result<(), TrackError> {
        let cols = weights.first().map_or(0, |row| row.len());
        if weights.len() != NUM_SLOTS || weights.iter().any(|row| row.len() != NUM_SLOTS) {
            return Err(TrackError::InvalidWeights {
                rows: weights.len(),
                cols,
            });
        }
        for (dst, src) in self.weights.iter_mut().zip(weights) {
            dst.copy_from_slice(src);
        }
        Ok(())
    }

    pub fn weights(&self) -> &WeightMatrix {
        &self.weights
    }

    /// State features of `position`
    pub fn features(&self, position: usize) -> [f64; NUM_SLOTS] {
        self.mask.indicator(position)
    }

    pub fn q(&self, position: usize, slot: usize) -> f64 {
        let x = self.features(position);
        x.iter()
            .zip(self.weights.iter())
            .map(|(xi, row)| xi * row[slot])
            .sum()
    }

    /// First legal slot with the highest value
    fn best_legal_slot(&self, position: usize) -> usize {
        let mut best: Option<(usize, f64)> = None;
        for slot in self.mask.legal_slots(position) {
            let value = self.q(position, slot);
            if best.is_none_or(|(_, v)| value > v) {
                best = Some((slot, value));
            }
        }
        best.map_or(STAY_SLOT, |(slot, _)| slot)
    }

    fn max_legal_q(&self, position: usize) -> f64 {
        self.mask
            .legal_slots(position)
            .map(|slot| self.q(position, slot))
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Semi-gradient TD(0) step, returns δ
    pub fn learn(
        &mut self,
        state: &Observation,
        action: Action,
        reward: f64,
        next_state: &Observation,
    ) -> Result<f64, TrackError> {
        let slot = action.slot();
        let target = reward + self.gamma * self.max_legal_q(next_state.position);
        let delta = target - self.q(state.position, slot);

        let x = self.features(state.position);
        let grad = self.gradient.gradient(&x, &self.weights, slot)?;
        for (row, grad_row) in self.weights.iter_mut().zip(grad.iter()) {
            for (w, g) in row.iter_mut().zip(grad_row.iter()) {
                *w += self.learning_rate * delta * g;
            }
        }

        self.training_error.push(delta);
        Ok(delta)
    }
}

impl<G: QGradient> Agent for LinearAgent<G> {
    fn policy(&mut self, state: &Observation) -> Action {
        if self.rng.random::<f64>() < self.exploration.epsilon() {
            let legal: Vec<usize> = self.mask.legal_slots(state.position).collect();
            let slot = legal.choose(&mut self.rng).copied().unwrap_or(STAY_SLOT);
            Action::at_slot(slot)
        } else {
            self.greedy(state)
        }
    }

    fn greedy(&self, state: &Observation) -> Action {
        Action::at_slot(self.best_legal_slot(state.position))
    }

    fn update(&mut self, transition: &Transition) -> Result<f64, TrackError> {
        // No terminal special case: the bootstrap always uses the next state
        self.learn(
            &transition.state,
            transition.action,
            transition.reward,
            &transition.next_state,
        )
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
        "linear"
    }
}
