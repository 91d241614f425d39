use thiserror::Error;

#[derive(Debug, Error)]
pub enum BatteryError {
    #[error("capacity must be positive and finite, got {0} Ah")]
    InvalidCapacity(f64),

    #[error("reference temperature must be finite, got {0} °C")]
    InvalidTemperature(f64),

    #[error("timestep must be positive and finite, got {0} s")]
    InvalidTimestep(f64),

    #[error("profile segment {index} has invalid duration {duration} s")]
    InvalidDuration { index: usize, duration: f64 },

    #[error("profile needs {0} steps (expected <= {})", crate::analysis::MAX_PROFILE_STEPS)]
    TooManySteps(f64),

    #[error("malformed calibration table: {0}")]
    Calibration(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = BatteryError> = std::result::Result<T, E>;
