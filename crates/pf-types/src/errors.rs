use thiserror::Error;

/// Main error type for the forecast harness
#[derive(Error, Debug)]
pub enum PfError {
    #[error("Sweep error: {0}")]
    Sweep(#[from] SweepError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Transformation error: {0}")]
    Transformation(#[from] TransformationError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error("Tracking error: {0}")]
    Tracking(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Sweep generation errors. All of these abort generation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SweepError {
    #[error("Invalid sweep for parameter '{parameter}': {reason}")]
    InvalidSweepSpec {
        parameter: String,
        reason: InvalidSweepReason,
    },

    #[error("Parameter '{parameter}' is declared more than once")]
    DuplicateParameter { parameter: String },

    #[error("Schema mismatch for operation {operation}: {message}")]
    SchemaMismatch { operation: String, message: String },
}

/// Why a single sweep specification cannot be expanded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidSweepReason {
    #[error("range sampling requires `samples`")]
    MissingSamples,

    #[error("range sampling requires at least 2 samples, got {samples}")]
    TooFewSamples { samples: usize },

    #[error("range sampling requires both `min` and `max`")]
    MissingBounds,

    #[error("range bounds must be finite")]
    NonFiniteBounds,

    #[error("{kind} sweeps require `hard_coded_choices`")]
    ChoicesRequired { kind: String },
}

/// Raw data retrieval errors
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Data source not found: {0}")]
    SourceNotFound(String),

    #[error("Unknown state: {state}")]
    UnknownState { state: String },

    #[error("Invalid data format: {message}")]
    InvalidFormat { message: String },

    #[error("Insufficient data: {message}")]
    InsufficientData { message: String },

    #[error("Data loading failed: {message}")]
    LoadingFailed { message: String },

    #[error("Data parsing error: {message}")]
    ParseError { message: String },
}

/// Data transformation errors
#[derive(Error, Debug)]
pub enum TransformationError {
    #[error("Invalid transformation options: {message}")]
    InvalidOptions { message: String },

    #[error("Insufficient data: {message}")]
    InsufficientData { message: String },

    #[error("No columns left after {stage}")]
    NoColumnsLeft { stage: String },

    #[error("Cannot restore column {column}: {message}")]
    Restore { column: String, message: String },
}

/// Model fitting and forecasting errors
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Invalid hyperparameters: {message}")]
    InvalidHyperparameters { message: String },

    #[error("Insufficient observations: need more than {required}, have {available}")]
    InsufficientObservations { required: usize, available: usize },

    #[error("Least squares solve failed: {message}")]
    SolveFailed { message: String },

    #[error("Forecast diverged: {message}")]
    NonFinite { message: String },
}

/// Evaluation errors
#[derive(Error, Debug)]
pub enum EvaluationError {
    #[error("Shape mismatch: actual {actual_rows}x{actual_cols}, forecast {forecast_rows}x{forecast_cols}")]
    ShapeMismatch {
        actual_rows: usize,
        actual_cols: usize,
        forecast_rows: usize,
        forecast_cols: usize,
    },

    #[error("Nothing to evaluate: {message}")]
    Empty { message: String },
}

/// Result type alias for harness operations
pub type PfResult<T> = Result<T, PfError>;

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::PfError::Config(format!($($arg)*))
    };
}
