//! Error taxonomy for the finite-volume kernel
//!
//! Every failure is fatal for the run: configuration errors are caught before
//! any heavy computation, numerical failures surface from the factorization,
//! and dimension mismatches indicate a broken contract between stages.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PoroError {
    /// Invalid arrangement/scheme combination, degenerate polygon, malformed
    /// boundary table, non-positive material constant, ...
    #[error("configuration error: {0}")]
    Config(String),

    /// The assembled operator has no usable LU factorization
    #[error(
        "singular operator ({rows} rows) on a {nx}x{ny} grid, {discretization}"
    )]
    Singular {
        rows: usize,
        nx: usize,
        ny: usize,
        discretization: String,
    },

    /// The factorization produced non-finite values or the triangular solve failed
    #[error("factorization failure: {0}")]
    Factorization(String),

    #[error("dimension mismatch in {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },

    /// `solve_step` called before `factorize` (or after `finish`)
    #[error("solver is not in the factored state")]
    NotFactored,

    #[error("index map corruption: {0}")]
    IndexMap(String),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, PoroError>;

impl PoroError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        PoroError::Config(msg.into())
    }
}
