pub mod annuity;
pub mod solar;
