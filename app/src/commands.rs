use anyhow::{anyhow, Context, Result};
use chrono::{Duration, Utc};
use clap::{Args, Subcommand};
use passpay_core::currency::Currency;
use passpay_core::format::{relative_time, truncate_address};
use passpay_core::link_ref::CheckoutRequest;
use passpay_core::models::{InvoiceStatus, LineItem, LinkStatus};
use passpay_core::stats::{dashboard_stats, invoice_stats, link_stats};
use flow::{PaymentFlow, PaymentRequest};
use store::invoices::{CreateInvoice, Invoices};
use store::links::{CreateLink, Links, ViewTracker};
use store::transactions::Transactions;
use store::Store;
use wallet::{ConnectOptions, FeeMode, WalletClient};
use std::sync::Arc;

pub struct App {
    pub cfg: config::AppConfig,
    pub store: Store,
    pub transactions: Transactions,
    pub links: Links,
    pub invoices: Invoices,
    pub wallet: Arc<dyn WalletClient>,
    pub owner: Option<String>,
}

impl App {
    fn owner(&self) -> Result<&str> {
        self.owner
            .as_deref()
            .ok_or_else(|| anyhow!("no owner address; pass --owner or set one via settings"))
    }

    fn flow(&self) -> PaymentFlow {
        PaymentFlow::new(
            self.transactions.clone(),
            self.links.clone(),
            config::usdc_mint(self.cfg.cluster).to_string(),
        )
    }
}

#[derive(Subcommand)]
pub enum LinkCommand {
    /// Create a shareable payment link.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        amount: f64,
        #[arg(long, default_value = "SOL")]
        currency: String,
        #[arg(long)]
        recipient: String,
        #[arg(long)]
        memo: Option<String>,
        #[arg(long)]
        merchant: Option<String>,
    },
    /// List the owner's links.
    List,
    /// Simulate a checkout page load of a link, counting one view.
    View { id: String },
    /// Flip a link between active and inactive.
    SetStatus {
        id: String,
        #[arg(long)]
        active: bool,
    },
    /// Delete a link permanently.
    Delete { id: String },
    /// Aggregate link metrics.
    Stats,
}

pub fn link(app: &App, command: LinkCommand) -> Result<()> {
    match command {
        LinkCommand::Create {
            name,
            amount,
            currency,
            recipient,
            memo,
            merchant,
        } => {
            let link = app.links.create(
                app.owner()?,
                CreateLink {
                    name,
                    amount,
                    currency: currency.parse::<Currency>()?,
                    recipient,
                    memo,
                    merchant,
                },
            )?;
            tracing::info!(link_id = %link.id, "payment link created");
            println!("{}  {}", link.id, link.url);
        }
        LinkCommand::List => {
            for link in app.links.list(app.owner()?) {
                println!(
                    "{}  {:<20} {} {}  views={} payments={}  {:?}",
                    link.id,
                    link.name,
                    link.amount,
                    link.currency,
                    link.views,
                    link.payments,
                    link.status
                );
            }
        }
        LinkCommand::View { id } => {
            let link = app.links.get(&id).ok_or_else(|| anyhow!("no such link"))?;
            let request = CheckoutRequest::parse(&link.url)?;
            let mut tracker = ViewTracker::new();
            tracker.track(&app.links, &id);
            println!(
                "{} requests {} {} to {}",
                link.merchant.as_deref().unwrap_or("Payment Request"),
                request.amount,
                request.currency,
                truncate_address(&request.recipient, 4, 4)
            );
        }
        LinkCommand::SetStatus { id, active } => {
            let status = if active {
                LinkStatus::Active
            } else {
                LinkStatus::Inactive
            };
            app.links
                .set_status(&id, status)
                .ok_or_else(|| anyhow!("no such link"))?;
            println!("{id} -> {status:?}");
        }
        LinkCommand::Delete { id } => {
            if app.links.delete(&id) {
                println!("deleted {id}");
            } else {
                println!("no such link: {id}");
            }
        }
        LinkCommand::Stats => {
            let stats = link_stats(&app.links.list(app.owner()?));
            println!(
                "links={} active={} views={} payments={}",
                stats.total_links, stats.active_links, stats.total_views, stats.total_payments
            );
        }
    }
    Ok(())
}

#[derive(Subcommand)]
pub enum InvoiceCommand {
    /// Create an invoice, optionally sending it immediately.
    Create {
        #[arg(long)]
        client: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        amount: f64,
        #[arg(long, default_value = "SOL")]
        currency: String,
        #[arg(long, default_value_t = 7)]
        due_in_days: i64,
        /// Line item as "description:amount"; repeatable.
        #[arg(long = "item")]
        items: Vec<String>,
        #[arg(long)]
        send: bool,
    },
    /// Move a draft invoice to pending.
    Send { id: String },
    /// Mark a pending or overdue invoice paid.
    MarkPaid {
        id: String,
        #[arg(long)]
        signature: Option<String>,
    },
    /// Mark every past-due pending invoice overdue.
    Sweep,
    /// List invoices, optionally by status.
    List {
        #[arg(long)]
        status: Option<String>,
    },
    /// Delete an invoice permanently.
    Delete { id: String },
    /// Aggregate invoice metrics.
    Stats,
}

fn parse_items(raw: &[String]) -> Result<Vec<LineItem>> {
    raw.iter()
        .map(|spec| {
            let (description, amount) = spec
                .rsplit_once(':')
                .ok_or_else(|| anyhow!("item must be \"description:amount\": {spec}"))?;
            Ok(LineItem {
                description: description.to_string(),
                amount: amount
                    .parse()
                    .with_context(|| format!("bad item amount: {spec}"))?,
            })
        })
        .collect()
}

fn parse_invoice_status(raw: &str) -> Result<InvoiceStatus> {
    match raw.to_ascii_lowercase().as_str() {
        "draft" => Ok(InvoiceStatus::Draft),
        "pending" => Ok(InvoiceStatus::Pending),
        "paid" => Ok(InvoiceStatus::Paid),
        "overdue" => Ok(InvoiceStatus::Overdue),
        other => Err(anyhow!("unknown invoice status: {other}")),
    }
}

pub fn invoice(app: &App, command: InvoiceCommand) -> Result<()> {
    match command {
        InvoiceCommand::Create {
            client,
            email,
            amount,
            currency,
            due_in_days,
            items,
            send,
        } => {
            let invoice = app.invoices.create(
                app.owner()?,
                CreateInvoice {
                    client,
                    email,
                    amount,
                    currency: currency.parse::<Currency>()?,
                    due_date: Utc::now() + Duration::days(due_in_days),
                    items: parse_items(&items)?,
                },
                send,
            );
            tracing::info!(invoice_id = %invoice.id, "invoice created");
            println!("{}  {:?}", invoice.id, invoice.status);
        }
        InvoiceCommand::Send { id } => {
            let invoice = app
                .invoices
                .send(&id)
                .ok_or_else(|| anyhow!("no such invoice"))?;
            println!("{}  {:?}", invoice.id, invoice.status);
        }
        InvoiceCommand::MarkPaid { id, signature } => {
            let invoice = app
                .invoices
                .mark_paid(&id, signature.as_deref())
                .ok_or_else(|| anyhow!("no such invoice"))?;
            println!("{}  {:?}", invoice.id, invoice.status);
        }
        InvoiceCommand::Sweep => {
            let swept = app.invoices.sweep_overdue(app.owner()?);
            println!("{swept} invoice(s) marked overdue");
        }
        InvoiceCommand::List { status } => {
            let owner = app.owner()?;
            let invoices = match status.as_deref() {
                Some(raw) => app.invoices.list_by_status(owner, parse_invoice_status(raw)?),
                None => app.invoices.list(owner),
            };
            for inv in invoices {
                println!(
                    "{}  {:<20} {} {}  due {}  {:?}",
                    inv.id,
                    inv.client,
                    inv.amount,
                    inv.currency,
                    inv.due_date.format("%Y-%m-%d"),
                    inv.status
                );
            }
        }
        InvoiceCommand::Delete { id } => {
            if app.invoices.delete(&id) {
                println!("deleted {id}");
            } else {
                println!("no such invoice: {id}");
            }
        }
        InvoiceCommand::Stats => {
            let stats = invoice_stats(&app.invoices.list(app.owner()?));
            println!(
                "total={} draft={} pending={} paid={} overdue={}",
                stats.total,
                stats.draft_count,
                stats.pending_count,
                stats.paid_count,
                stats.overdue_count
            );
            println!(
                "paid_amount={} pending_amount={} overdue_amount={}",
                stats.paid_amount, stats.pending_amount, stats.overdue_amount
            );
        }
    }
    Ok(())
}

#[derive(Args)]
pub struct PayArgs {
    #[arg(long)]
    pub recipient: String,
    #[arg(long)]
    pub amount: f64,
    #[arg(long, default_value = "SOL")]
    pub currency: String,
    #[arg(long)]
    pub memo: Option<String>,
    /// Attribute the payment to a payment link.
    #[arg(long)]
    pub link: Option<String>,
}

pub async fn pay(app: &App, args: PayArgs) -> Result<()> {
    let request = PaymentRequest {
        recipient: args.recipient,
        amount: args.amount,
        currency: args.currency.parse::<Currency>()?,
        memo: args.memo,
        link_id: args.link,
    };
    settle(app, request).await
}

#[derive(Args)]
pub struct PayLinkArgs {
    /// The shareable checkout reference (URL).
    pub reference: String,
}

pub async fn pay_link(app: &App, args: PayLinkArgs) -> Result<()> {
    // an invalid reference is rejected before any payment interaction
    let checkout = CheckoutRequest::parse(&args.reference)?;

    if let Some(link_id) = &checkout.link_id {
        let mut tracker = ViewTracker::new();
        tracker.track(&app.links, link_id);
    }

    let request = PaymentRequest {
        recipient: checkout.recipient,
        amount: checkout.amount,
        currency: checkout.currency,
        memo: checkout.memo,
        link_id: checkout.link_id,
    };
    settle(app, request).await
}

async fn settle(app: &App, request: PaymentRequest) -> Result<()> {
    let flow = app.flow();
    let wallet = app.wallet.as_ref();
    let options = ConnectOptions {
        fee_mode: match app.cfg.wallet.fee_mode.as_str() {
            "payer" => FeeMode::Payer,
            _ => FeeMode::Paymaster,
        },
    };

    let address = flow.connect(wallet, options).await?;
    println!(
        "connected as {}",
        truncate_address(&address, 4, 4)
    );

    let signature = flow.pay(wallet, request).await?;
    println!("settled: {signature}");
    println!("{}", config::explorer_url(app.cfg.cluster, &signature));
    Ok(())
}

pub fn list_transactions(app: &App) -> Result<()> {
    let now = Utc::now();
    for tx in app.transactions.list(app.owner()?) {
        println!(
            "{}  {:?} {} {}  {:?}  {}",
            truncate_address(&tx.signature, 8, 8),
            tx.direction,
            tx.amount,
            tx.currency,
            tx.status,
            relative_time(tx.timestamp, now)
        );
    }
    Ok(())
}

pub fn stats(app: &App) -> Result<()> {
    let owner = app.owner()?;
    let stats = dashboard_stats(
        &app.transactions.list(owner),
        &app.links.list(owner),
        &app.invoices.list(owner),
    );
    println!(
        "revenue={} transactions={} avg_payment={}",
        stats.total_revenue, stats.total_transactions, stats.avg_payment
    );
    println!(
        "links={} views={} invoices_paid={} pending_amount={}",
        stats.total_payment_links,
        stats.total_views,
        stats.total_invoices_paid,
        stats.pending_amount
    );
    Ok(())
}

#[derive(Subcommand)]
pub enum SettingsCommand {
    /// Print the active configuration.
    Show,
    /// Update configuration values.
    Set {
        #[arg(long)]
        cluster: Option<String>,
        #[arg(long)]
        owner: Option<String>,
        #[arg(long)]
        checkout_base: Option<String>,
        #[arg(long)]
        storage: Option<String>,
        /// "paymaster" (sponsored fees) or "payer".
        #[arg(long)]
        fee_mode: Option<String>,
    },
    /// Drop every stored record.
    ClearData,
}

pub fn settings(app: &App, command: SettingsCommand) -> Result<()> {
    match command {
        SettingsCommand::Show => {
            println!("cluster:       {}", app.cfg.cluster.as_str());
            println!("rpc_url:       {}", app.cfg.rpc_url);
            println!("checkout_base: {}", app.cfg.checkout_base_url);
            println!("storage_path:  {}", app.cfg.storage_path);
            println!(
                "owner:         {}",
                app.cfg.owner_address.as_deref().unwrap_or("(unset)")
            );
            println!("wallet:        {}", app.cfg.wallet.kind);
            println!("fee_mode:      {}", app.cfg.wallet.fee_mode);
        }
        SettingsCommand::Set {
            cluster,
            owner,
            checkout_base,
            storage,
            fee_mode,
        } => {
            let mut cfg = app.cfg.clone();
            if let Some(raw) = cluster {
                cfg.cluster = match raw.to_ascii_lowercase().as_str() {
                    "devnet" => config::Cluster::Devnet,
                    "mainnet" => config::Cluster::Mainnet,
                    other => return Err(anyhow!("unknown cluster: {other}")),
                };
            }
            if let Some(owner) = owner {
                cfg.owner_address = Some(owner);
            }
            if let Some(base) = checkout_base {
                cfg.checkout_base_url = base;
            }
            if let Some(path) = storage {
                cfg.storage_path = path;
            }
            if let Some(mode) = fee_mode {
                match mode.as_str() {
                    "paymaster" | "payer" => cfg.wallet.fee_mode = mode,
                    other => return Err(anyhow!("unknown fee mode: {other}")),
                }
            }
            config::store(&cfg)?;
            tracing::info!("Settings updated");
        }
        SettingsCommand::ClearData => {
            app.store.clear_all();
            println!("all records cleared");
        }
    }
    Ok(())
}
