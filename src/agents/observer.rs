use tracing::info;

use super::metrics::TrainingMetrics;
use super::train::{EpisodeSummary, TrainConfig};

/// Trait for observing training events
pub trait TrainingObserver {
    /// Called once before the first episode
    fn on_train_start(&mut self, agent: &str, config: &TrainConfig);

    /// Called after every episode, once the metrics include it
    fn on_episode_end(&mut self, summary: &EpisodeSummary, metrics: &TrainingMetrics);

    /// Called once after the last episode
    fn on_train_end(&mut self, metrics: &TrainingMetrics);
}

/// Logs progress every `log_every` episodes
pub struct DefaultObserver {
    log_every: usize,
}

impl DefaultObserver {
    pub fn new(log_every: usize) -> Self {
        Self {
            log_every: log_every.max(1),
        }
    }
}

impl Default for DefaultObserver {
    fn default() -> Self {
        Self::new(100)
    }
}

impl TrainingObserver for DefaultObserver {
    fn on_train_start(&mut self, agent: &str, config: &TrainConfig) {
        info!("Training {} agent", agent);
        info!("- episodes: {}", config.episodes);
        info!("- max episode steps: {}", config.max_episode_steps);
        info!(
            "- learning rate: {}, gamma: {}",
            config.agent.learning_rate, config.agent.gamma
        );
        info!(
            "- epsilon: {} -> {} (decay {:.5})",
            config.agent.epsilon, config.agent.final_epsilon, config.agent.epsilon_decay
        );
        info!("- seed: {}", config.seed);
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary, metrics: &TrainingMetrics) {
        if summary.terminated {
            tracing::debug!(
                "Episode {} finished in {} steps",
                summary.episode,
                summary.steps
            );
        }
        if metrics.episodes % self.log_every == 0 {
            metrics.log_to_console();
        }
    }

    fn on_train_end(&mut self, metrics: &TrainingMetrics) {
        info!(
            "Training finished after {} episodes ({:.1}s)",
            metrics.episodes,
            metrics.training_duration_secs()
        );
        info!(
            "- finished laps: {} ({:.1}% in the last window)",
            metrics.completions,
            metrics.completion_rate.average() * 100.0
        );
        info!("- best return: {:.1}", metrics.best_reward);
    }
}
