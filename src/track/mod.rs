mod env;
mod grid;
mod mask;
pub mod registry;

pub use env::{
    CRASH_PENALTY, Env, EpisodeStatus, FINISH_POSITIONS, FINISH_REWARD, ORIGIN_REWARD,
    Observation, Rejection, START_POSITION, STEP_PENALTY, StepInfo, StepResult, Track,
};
pub use grid::Subgrids;
pub use mask::ActionMask;
pub use registry::{DRIVE_GRID, EnvSpec, TimeLimit, make};
