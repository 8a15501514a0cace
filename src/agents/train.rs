//! Episode loop for the Q-learning agents

use std::path::PathBuf;

use tracing::info;

use crate::infra::TrackError;
use crate::track::Env;

use super::metrics::{CsvLogger, TrainingMetrics};
use super::observer::TrainingObserver;
use super::{Agent, AgentConfig, Transition};

/// Training configuration
#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// Number of episodes
    pub episodes: usize,
    /// Hard cap on the length of one episode
    pub max_episode_steps: usize,
    /// Agent hyper-parameters
    pub agent: AgentConfig,
    /// Moving average window for the metrics
    pub window: usize,
    /// CSV logging frequency (episodes)
    pub log_every: usize,
    /// Seed for the agent and the first reset
    pub seed: u64,
    /// CSV log directory, no CSV output when unset
    pub log_dir: Option<PathBuf>,
}

impl TrainConfig {
    /// Config for `episodes` episodes, with ε reaching its floor halfway through
    pub fn with_episodes(episodes: usize) -> Self {
        let half = (episodes / 2).max(1);
        Self {
            episodes,
            agent: AgentConfig {
                epsilon_decay: 1.0 / half as f64,
                ..AgentConfig::default()
            },
            ..Self::default()
        }
    }
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            episodes: 1000,
            max_episode_steps: 300,
            agent: AgentConfig::default(),
            window: 100,
            log_every: 100,
            seed: 0,
            log_dir: None,
        }
    }
}

/// Outcome of one training episode
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeSummary {
    /// 1-based episode number
    pub episode: usize,
    /// Undiscounted return
    pub reward: f64,
    pub steps: usize,
    /// Reached the finish line
    pub terminated: bool,
    /// Ended by an illegal move
    pub crashed: bool,
    pub mean_abs_td: f64,
    /// ε after the end-of-episode decay
    pub epsilon: f64,
}

/// Runs episodes and feeds every transition to the agent
pub struct Trainer {
    config: TrainConfig,
    logger: Option<CsvLogger>,
}

impl Trainer {
    pub fn new(config: TrainConfig) -> Result<Self, TrackError> {
        let logger = match &config.log_dir {
            Some(dir) => {
                let logger = CsvLogger::new(dir)?;
                info!("Logging metrics to {}", logger.log_dir().display());
                Some(logger)
            }
            None => None,
        };
        Ok(Self { config, logger })
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Train `agent` for the configured number of episodes
    pub fn run<E, A, O>(
        &mut self,
        env: &mut E,
        agent: &mut A,
        observer: &mut O,
    ) -> Result<TrainingMetrics, TrackError>
    where
        E: Env,
        A: Agent,
        O: TrainingObserver,
    {
        observer.on_train_start(agent.name(), &self.config);
        let mut metrics = TrainingMetrics::new(self.config.window);
        let log_every = self.config.log_every.max(1);

        for episode in 1..=self.config.episodes {
            let summary = self.run_episode(episode, env, agent)?;
            metrics.record_episode(&summary);

            if let Some(logger) = &mut self.logger {
                if episode % log_every == 0 {
                    logger.log_metrics(&metrics)?;
                }
            }
            observer.on_episode_end(&summary, &metrics);
        }

        observer.on_train_end(&metrics);
        Ok(metrics)
    }

    fn run_episode<E: Env, A: Agent>(
        &self,
        episode: usize,
        env: &mut E,
        agent: &mut A,
    ) -> Result<EpisodeSummary, TrackError> {
        let seed = (episode == 1).then_some(self.config.seed);
        let (mut state, _) = env.reset(seed);

        let mut reward = 0.0;
        let mut steps = 0;
        let mut td_sum = 0.0;
        let mut terminated = false;
        let mut crashed = false;

        while steps < self.config.max_episode_steps {
            let action = agent.policy(&state);
            let result = env.step(action);
            let td = agent.update(&Transition {
                state,
                action,
                reward: result.reward,
                terminated: result.terminated,
                next_state: result.observation,
            })?;

            steps += 1;
            reward += result.reward;
            td_sum += td.abs();
            state = result.observation;

            if result.done() {
                terminated = result.terminated;
                crashed = result.info.rejection.is_some();
                break;
            }
        }

        agent.decay_epsilon();

        Ok(EpisodeSummary {
            episode,
            reward,
            steps,
            terminated,
            crashed,
            mean_abs_td: if steps > 0 { td_sum / steps as f64 } else { 0.0 },
            epsilon: agent.epsilon(),
        })
    }

    /// Positions visited by the greedy policy from a fresh reset, start cell included
    pub fn rollout_greedy<E: Env, A: Agent>(&self, env: &mut E, agent: &A) -> Vec<usize> {
        let (mut state, _) = env.reset(None);
        let mut trajectory = vec![state.position];

        for _ in 0..self.config.max_episode_steps {
            let result = env.step(agent.greedy(&state));
            state = result.observation;
            trajectory.push(state.position);
            if result.done() {
                break;
            }
        }
        trajectory
    }
}
