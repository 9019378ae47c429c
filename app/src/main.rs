mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use store::invoices::Invoices;
use store::links::Links;
use store::transactions::Transactions;
use store::Store;
use wallet::{mock::MockWallet, WalletClient};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(env_filter))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn create_wallet_client(cfg: &config::AppConfig) -> Result<Arc<dyn WalletClient>> {
    match cfg.wallet.kind.as_str() {
        "mock" => {
            tracing::info!("Using mock wallet provider");
            Ok(match &cfg.owner_address {
                Some(address) => Arc::new(MockWallet::with_address(address)),
                None => Arc::new(MockWallet::new()),
            })
        }
        other => anyhow::bail!("unsupported wallet provider: {other}"),
    }
}

#[derive(Parser)]
#[command(name = "passpay", about = "Local payment ledger over a passkey wallet", version)]
struct Cli {
    /// Owning wallet address for dashboard operations; defaults to the
    /// configured owner.
    #[arg(long, global = true)]
    owner: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage shareable payment links.
    Link {
        #[command(subcommand)]
        command: commands::LinkCommand,
    },
    /// Manage invoices.
    Invoice {
        #[command(subcommand)]
        command: commands::InvoiceCommand,
    },
    /// Send a payment through the connected wallet.
    Pay(commands::PayArgs),
    /// Pay a shareable checkout reference.
    PayLink(commands::PayLinkArgs),
    /// List recorded transactions.
    Tx,
    /// Dashboard summary for the owner.
    Stats,
    /// Show or change application settings.
    Settings {
        #[command(subcommand)]
        command: commands::SettingsCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let cfg = config::load().unwrap_or_default();
    let store = Store::open(&cfg.storage_path)?;
    let checkout_base = Url::parse(&cfg.checkout_base_url)?;

    let app = commands::App {
        transactions: Transactions::new(store.clone()),
        links: Links::new(store.clone(), checkout_base),
        invoices: Invoices::new(store.clone()),
        wallet: create_wallet_client(&cfg)?,
        store,
        owner: cli.owner.or_else(|| cfg.owner_address.clone()),
        cfg,
    };

    match cli.command {
        Commands::Link { command } => commands::link(&app, command),
        Commands::Invoice { command } => commands::invoice(&app, command),
        Commands::Pay(args) => commands::pay(&app, args).await,
        Commands::PayLink(args) => commands::pay_link(&app, args).await,
        Commands::Tx => commands::list_transactions(&app),
        Commands::Stats => commands::stats(&app),
        Commands::Settings { command } => commands::settings(&app, command),
    }
}
