use passpay_core::ValidationError;
use thiserror::Error;

/// Everything a payment attempt can fail with. The settlement variants
/// carry the fixed user-facing message for their category.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Failed to connect wallet")]
    ConnectionFailed,
    #[error("wallet is not connected")]
    NotConnected,
    #[error("a payment attempt is already in progress")]
    InFlight,
    #[error("Insufficient balance. Please add funds to your wallet.")]
    InsufficientBalance,
    #[error("Transaction was cancelled.")]
    Cancelled,
    #[error("Transaction timed out. Please try again.")]
    Timeout,
    #[error("Signing failed. Please try again.")]
    SigningFailed,
    #[error("Network error. Please check your connection.")]
    Network,
    #[error("{0}")]
    Other(String),
}

/// Best-effort mapping of a wallet failure description onto a user-facing
/// category. The collaborator gives us free text, not a typed contract,
/// so this is substring matching with the raw text as the fallback.
pub fn classify_settlement_error(message: &str) -> PaymentError {
    let msg = message.to_lowercase();
    if msg.contains("insufficient") || msg.contains("balance") {
        PaymentError::InsufficientBalance
    } else if msg.contains("cancelled") || msg.contains("canceled") || msg.contains("abort") {
        PaymentError::Cancelled
    } else if msg.contains("timeout") {
        PaymentError::Timeout
    } else if msg.contains("sign") {
        PaymentError::SigningFailed
    } else if msg.contains("network") || msg.contains("connection") {
        PaymentError::Network
    } else {
        PaymentError::Other(message.to_string())
    }
}
