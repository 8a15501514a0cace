pub mod agents;
pub mod infra;
pub mod render;
pub mod track;

// Re-export commonly used types for convenience
pub use agents::{Agent, AgentConfig, LinearAgent, TabularAgent, TrainConfig, Trainer};
pub use infra::{Action, TrackError, Velocity};
pub use track::{Env, Observation, StepResult, Track};
