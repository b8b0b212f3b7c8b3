use thiserror::Error;

/// Errors raised by the projection engine once its configuration is valid.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("no feed conversion ratio for stage {0:?}")]
    UnknownStage(String),

    #[error("feed cost needs a non-negative amount and price, got {amount} kg at {price}")]
    InvalidFeedCost { amount: f64, price: f64 },

    #[error("{quantity} is not finite on day {day}")]
    NonFiniteValue { quantity: &'static str, day: u32 },

    #[error("run aborted on day {day}: {}", errors.join("; "))]
    RunAborted { day: u32, errors: Vec<String> },
}
