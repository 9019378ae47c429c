use super::{ConnectOptions, FeeMode, WalletClient};
use crate::instructions::Instruction;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rand::{distributions::Alphanumeric, Rng};
use std::sync::Mutex;
use tokio::time::{sleep, Duration};

const BASE58_ALPHABET: &[u8] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// In-process stand-in for the passkey wallet SDK. Connects after a short
/// simulated latency and settles every transaction with a random
/// reference, unless a failure was injected at construction.
pub struct MockWallet {
    address: Mutex<Option<String>>,
    fee_mode: Mutex<Option<FeeMode>>,
    preset_address: Option<String>,
    connect_failure: Option<String>,
    send_failure: Option<String>,
    latency: Duration,
}

impl Default for MockWallet {
    fn default() -> Self {
        Self {
            address: Mutex::new(None),
            fee_mode: Mutex::new(None),
            preset_address: None,
            connect_failure: None,
            send_failure: None,
            latency: Duration::from_millis(200),
        }
    }
}

impl MockWallet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock that always connects as `address`, so partitions stay stable
    /// across runs.
    pub fn with_address(address: &str) -> Self {
        Self {
            preset_address: Some(address.to_string()),
            ..Self::default()
        }
    }

    /// Mock whose connect call fails with the given message.
    pub fn failing_connect(message: &str) -> Self {
        Self {
            connect_failure: Some(message.to_string()),
            latency: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Mock that connects but fails sign-and-send with the given message.
    pub fn failing_send(message: &str) -> Self {
        Self {
            send_failure: Some(message.to_string()),
            latency: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Override the simulated latency; tests use a long one to hold a
    /// call in flight.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn random_address() -> String {
        let mut rng = rand::thread_rng();
        (0..44)
            .map(|_| BASE58_ALPHABET[rng.gen_range(0..BASE58_ALPHABET.len())] as char)
            .collect()
    }

    fn random_signature() -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(64)
            .map(char::from)
            .collect()
    }

    /// Fee mode requested by the last successful connect.
    pub fn connected_fee_mode(&self) -> Option<FeeMode> {
        *self.fee_mode.lock().unwrap()
    }
}

#[async_trait]
impl WalletClient for MockWallet {
    async fn connect(&self, options: ConnectOptions) -> Result<String> {
        // simulate the passkey prompt
        sleep(self.latency).await;
        if let Some(message) = &self.connect_failure {
            return Err(anyhow!("{message}"));
        }
        let address = self
            .preset_address
            .clone()
            .unwrap_or_else(Self::random_address);
        *self.address.lock().unwrap() = Some(address.clone());
        *self.fee_mode.lock().unwrap() = Some(options.fee_mode);
        Ok(address)
    }

    fn disconnect(&self) {
        *self.address.lock().unwrap() = None;
    }

    fn connected_address(&self) -> Option<String> {
        self.address.lock().unwrap().clone()
    }

    async fn sign_and_send(&self, instructions: &[Instruction]) -> Result<String> {
        if self.connected_address().is_none() {
            return Err(anyhow!("wallet not connected"));
        }
        if instructions.is_empty() {
            return Err(anyhow!("empty instruction set"));
        }
        sleep(self.latency).await;
        if let Some(message) = &self.send_failure {
            return Err(anyhow!("{message}"));
        }
        Ok(Self::random_signature())
    }
}
