pub mod currency;
pub mod format;
pub mod link_ref;
pub mod models;
pub mod stats;

use thiserror::Error;

/// Input problems caught before any record is written or any wallet call
/// is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("amount must be greater than zero")]
    NonPositiveAmount,
    #[error("invalid recipient address")]
    InvalidAddress,
}
