use thiserror::Error;

/// Error type for member selection.
///
/// None of these are transient: they all indicate inconsistent inputs or
/// configuration and abort the selection run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClimsipsError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Cannot normalise '{variable}': the series has zero variance")]
    DegenerateInput { variable: String },
    #[error("No projection point for member '{member}'. The candidate pool and response data are out of sync")]
    MissingProjection { member: String },
    #[error("Model group '{group}' has no members")]
    EmptyGroup { group: String },
    #[error("'{0}' is not a valid member identifier. Expected <model>-r<N>i<N>p<N>[f<N>]")]
    InvalidMember(String),
    #[error("Unknown scenario '{0}'. Expected <SEASON>_<REGION>, e.g. JJA_CEU")]
    UnknownScenario(String),
    #[error("Unknown predictor field '{0}'")]
    UnknownField(String),
    #[error("Unknown ensemble '{0}'")]
    UnknownEnsemble(String),
    #[error("Could not parse data table {table}: {details}")]
    DataTable { table: String, details: String },
    #[error("Could not read {path}: {details}")]
    Io { path: String, details: String },
}

/// Convenience type for `Result<T, ClimsipsError>`.
pub type ClimsipsResult<T> = Result<T, ClimsipsError>;
