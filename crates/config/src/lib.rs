use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const APP_NAME: &str = "passpay";

/// Devnet USDC test mint.
const USDC_MINT_DEVNET: &str = "Gh9ZwEmdLJ8DscKNTkTqPbNwLNNBjuSzaG9Vp2KGtKJr";
/// Mainnet USDC mint.
const USDC_MINT_MAINNET: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cluster {
    #[default]
    Devnet,
    Mainnet,
}

impl Cluster {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cluster::Devnet => "devnet",
            Cluster::Mainnet => "mainnet",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub cluster: Cluster,
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    /// Base URL the shareable checkout references are built under.
    #[serde(default = "default_checkout_base_url")]
    pub checkout_base_url: String,
    /// Directory of the local record database.
    #[serde(default = "default_storage_path")]
    pub storage_path: String,
    /// Default owning wallet address for dashboard operations, used when
    /// no wallet is connected yet.
    pub owner_address: Option<String>,
    #[serde(default)]
    pub wallet: WalletConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cluster: Cluster::Devnet,
            rpc_url: default_rpc_url(),
            checkout_base_url: default_checkout_base_url(),
            storage_path: default_storage_path(),
            owner_address: None,
            wallet: WalletConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    #[serde(default = "default_wallet_kind")]
    pub kind: String, // "mock" is the only built-in provider
    /// "paymaster" (sponsored fees, default) or "payer".
    #[serde(default = "default_fee_mode")]
    pub fee_mode: String,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            kind: default_wallet_kind(),
            fee_mode: default_fee_mode(),
        }
    }
}

fn default_rpc_url() -> String {
    "https://api.devnet.solana.com".to_string()
}

fn default_checkout_base_url() -> String {
    "https://pay.passpay.local".to_string()
}

fn default_storage_path() -> String {
    ".passpay_store".to_string()
}

fn default_wallet_kind() -> String {
    "mock".to_string()
}

fn default_fee_mode() -> String {
    "paymaster".to_string()
}

pub fn load() -> Result<AppConfig> {
    let cfg: AppConfig = confy::load(APP_NAME, None).context("Failed to load app config")?;
    Ok(cfg)
}

pub fn store(cfg: &AppConfig) -> Result<()> {
    confy::store(APP_NAME, None, cfg).context("Failed to store app config")?;
    Ok(())
}

pub fn usdc_mint(cluster: Cluster) -> &'static str {
    match cluster {
        Cluster::Devnet => USDC_MINT_DEVNET,
        Cluster::Mainnet => USDC_MINT_MAINNET,
    }
}

/// Explorer link for a settlement reference; devnet needs the cluster
/// query parameter.
pub fn explorer_url(cluster: Cluster, signature: &str) -> String {
    match cluster {
        Cluster::Devnet => format!("https://explorer.solana.com/tx/{signature}?cluster=devnet"),
        Cluster::Mainnet => format!("https://explorer.solana.com/tx/{signature}"),
    }
}
