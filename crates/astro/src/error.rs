/// Errors from parsing or validating calculation input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AstroError {
    #[error("invalid timezone offset '{0}'")]
    InvalidTzOffset(String),

    #[error("invalid date_time '{0}'")]
    InvalidDateTime(String),

    #[error("date_time '{0}' is outside the supported range")]
    DateTimeOutOfRange(String),

    /// A coordinate outside its permitted range.
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}
