use std::error::Error;
use std::fmt;
use std::io;

#[derive(Debug)]
pub enum TrackError {
    UnsupportedSize { size: usize },
    UnknownEnv { id: String },
    InvalidAction { dvx: i32, dvy: i32 },
    InvalidWeights { rows: usize, cols: usize },
    Io(io::Error),
    #[cfg(feature = "autodiff")]
    Autodiff(String),
}

impl fmt::Display for TrackError {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TrackError::UnsupportedSize { size } => {
                write!(formatter, "Unsupported grid size {} (only 144 = 12x12)", size)
            }
            TrackError::UnknownEnv { id } => write!(formatter, "Unknown environment id {}", id),
            TrackError::InvalidAction { dvx, dvy } => {
                write!(
                    formatter,
                    "Invalid action ({}, {}), components must be in -1..=1",
                    dvx, dvy
                )
            }
            TrackError::InvalidWeights { rows, cols } => {
                write!(formatter, "Invalid weight matrix {}x{} (expected 9x9)", rows, cols)
            }
            TrackError::Io(e) => write!(formatter, "IO error: {}", e),
            #[cfg(feature = "autodiff")]
            TrackError::Autodiff(reason) => write!(formatter, "Autodiff failed: {}", reason),
        }
    }
}

impl Error for TrackError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TrackError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for TrackError {
    fn from(e: io::Error) -> Self {
        TrackError::Io(e)
    }
}
