pub mod angle;
pub mod convergence;
pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "annuity")]
pub mod annuity;

#[cfg(feature = "solar")]
pub mod solar;

pub use error::FinSolarError;
pub use types::*;

/// Standard result type for all finsolar operations
pub type FinSolarResult<T> = Result<T, FinSolarError>;
