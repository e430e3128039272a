use thiserror::Error;

/// Fatal error carrying the process exit code.
///
/// Exit codes: 2 = usage/input, 3 = no usable data, 4 = runtime (network, IO, terminal).
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Why an exponential fit could not be produced for a window.
///
/// These are expected outcomes of user-chosen windows, not process failures:
/// the pipeline keeps them as values and the presentation layer reports them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    #[error("insufficient data: {found} row(s) in the fit window, need at least 2")]
    InsufficientData { found: usize },
    #[error("invalid data: {series} is {value} on {date}, the logarithm is undefined")]
    NonPositiveValue {
        series: &'static str,
        value: f64,
        date: String,
    },
    #[error("invalid window: start {start} is after end {end}")]
    InvalidWindow { start: String, end: String },
    #[error("least-squares system is singular")]
    Singular,
}
