//! The wallet collaborator boundary. Everything cryptographic lives on
//! the other side of [`WalletClient`]; this crate only describes what to
//! sign (the instruction set) and ships a mock client for local runs and
//! tests.

pub mod instructions;
pub mod mock;

use anyhow::Result;
use async_trait::async_trait;
use instructions::Instruction;

/// Who pays the network fee for a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeeMode {
    /// A paymaster service sponsors the fee (gasless for the user).
    #[default]
    Paymaster,
    /// The connected wallet pays its own fee.
    Payer,
}

#[derive(Debug, Clone, Default)]
pub struct ConnectOptions {
    pub fee_mode: FeeMode,
}

/// External wallet capability: passkey connection plus the single
/// sign-and-submit call. Both async calls may suspend for as long as the
/// user takes to confirm, and both may fail.
#[async_trait]
pub trait WalletClient: Send + Sync {
    /// Establish a connection; resolves to the connected wallet address.
    async fn connect(&self, options: ConnectOptions) -> Result<String>;

    fn disconnect(&self);

    /// The connected wallet address, if any.
    fn connected_address(&self) -> Option<String>;

    /// Sign and submit the instruction set; resolves to the settlement
    /// reference once the network accepts it.
    async fn sign_and_send(&self, instructions: &[Instruction]) -> Result<String>;
}
