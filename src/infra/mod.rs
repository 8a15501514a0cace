mod error;
mod types;

pub use error::TrackError;
pub use types::{
    Action, DIRECTIONS, Direction, GRID_SIDE, MAX_SPEED, NUM_CELLS, NUM_SLOTS, STAY_SLOT,
    Velocity, col_of, row_of,
};
