//! Metrics and CSV logging for training runs

use std::collections::VecDeque;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use time::{OffsetDateTime, format_description};

use super::train::EpisodeSummary;

/// Moving average calculator
#[derive(Debug, Clone)]
pub struct MovingAverage {
    values: VecDeque<f64>,
    window_size: usize,
    sum: f64,
}

impl MovingAverage {
    pub fn new(window_size: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(window_size),
            window_size: window_size.max(1),
            sum: 0.0,
        }
    }

    pub fn push(&mut self, value: f64) {
        if self.values.len() >= self.window_size {
            if let Some(old) = self.values.pop_front() {
                self.sum -= old;
            }
        }
        self.values.push_back(value);
        self.sum += value;
    }

    pub fn average(&self) -> f64 {
        if self.values.is_empty() {
            0.0
        } else {
            self.sum / self.values.len() as f64
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Training metrics tracker
#[derive(Debug)]
pub struct TrainingMetrics {
    /// Episode returns
    pub episode_rewards: MovingAverage,
    /// Episode lengths
    pub episode_lengths: MovingAverage,
    /// Finish line reached
    pub completion_rate: MovingAverage,
    /// Episode ended by an illegal move
    pub crash_rate: MovingAverage,
    /// Mean absolute TD error per episode
    pub td_error: MovingAverage,
    /// Episodes recorded
    pub episodes: usize,
    /// Finished episodes overall
    pub completions: usize,
    /// Total environment steps
    pub total_steps: usize,
    /// Exploration rate after the last episode
    pub epsilon: f64,
    /// Best single-episode return
    pub best_reward: f64,
    /// Training start time
    start_time: Instant,
}

impl TrainingMetrics {
    pub fn new(window_size: usize) -> Self {
        Self {
            episode_rewards: MovingAverage::new(window_size),
            episode_lengths: MovingAverage::new(window_size),
            completion_rate: MovingAverage::new(window_size),
            crash_rate: MovingAverage::new(window_size),
            td_error: MovingAverage::new(window_size),
            episodes: 0,
            completions: 0,
            total_steps: 0,
            epsilon: 0.0,
            best_reward: f64::NEG_INFINITY,
            start_time: Instant::now(),
        }
    }

    /// Record episode completion
    pub fn record_episode(&mut self, summary: &EpisodeSummary) {
        self.episodes += 1;
        self.total_steps += summary.steps;
        self.epsilon = summary.epsilon;
        self.best_reward = self.best_reward.max(summary.reward);
        if summary.terminated {
            self.completions += 1;
        }

        self.episode_rewards.push(summary.reward);
        self.episode_lengths.push(summary.steps as f64);
        self.completion_rate
            .push(if summary.terminated { 1.0 } else { 0.0 });
        self.crash_rate.push(if summary.crashed { 1.0 } else { 0.0 });
        self.td_error.push(summary.mean_abs_td);
    }

    /// Get training duration in seconds
    pub fn training_duration_secs(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }

    /// Get steps per second
    pub fn steps_per_second(&self) -> f64 {
        let duration = self.training_duration_secs();
        if duration > 0.0 {
            self.total_steps as f64 / duration
        } else {
            0.0
        }
    }

    /// Log current metrics to console
    pub fn log_to_console(&self) {
        tracing::info!(
            "Episode {} | Steps {} | SPS {:.1} | epsilon {:.3}",
            self.episodes,
            self.total_steps,
            self.steps_per_second(),
            self.epsilon
        );
        tracing::info!(
            "  reward={:.2}, length={:.1}, finish={:.1}%, crash={:.1}%, |td|={:.4}",
            self.episode_rewards.average(),
            self.episode_lengths.average(),
            self.completion_rate.average() * 100.0,
            self.crash_rate.average() * 100.0,
            self.td_error.average()
        );
    }
}

impl Default for TrainingMetrics {
    fn default() -> Self {
        Self::new(100)
    }
}

/// Appends `step,value` rows to one CSV file per tag
pub struct CsvLogger {
    log_dir: PathBuf,
}

impl CsvLogger {
    /// Create a run directory under `root`, named after the local time
    pub fn new(root: &Path) -> io::Result<Self> {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        let format = format_description::parse("[year][month][day]-[hour][minute][second]")
            .map_err(io::Error::other)?;
        let stamp = now.format(&format).map_err(io::Error::other)?;

        let log_dir = root.join(stamp);
        fs::create_dir_all(&log_dir)?;
        Ok(Self { log_dir })
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Log a scalar value
    pub fn log_scalar(&mut self, tag: &str, value: f64, step: usize) -> io::Result<()> {
        let csv_path = self.log_dir.join(format!("{}.csv", tag.replace('/', "_")));

        let file_exists = csv_path.exists();
        let mut file = OpenOptions::new().create(true).append(true).open(&csv_path)?;
        if !file_exists {
            writeln!(file, "step,value")?;
        }
        writeln!(file, "{},{}", step, value)
    }

    /// Log the moving averages of `metrics`
    pub fn log_metrics(&mut self, metrics: &TrainingMetrics) -> io::Result<()> {
        let step = metrics.episodes;

        self.log_scalar("episode/reward", metrics.episode_rewards.average(), step)?;
        self.log_scalar("episode/length", metrics.episode_lengths.average(), step)?;
        self.log_scalar("episode/finish_rate", metrics.completion_rate.average(), step)?;
        self.log_scalar("episode/crash_rate", metrics.crash_rate.average(), step)?;
        self.log_scalar("learning/td_error", metrics.td_error.average(), step)?;
        self.log_scalar("learning/epsilon", metrics.epsilon, step)
    }
}
