use crate::currency::Currency;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Incoming,
    Outgoing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Pending,
    Confirmed,
    Failed,
}

/// One observed fund movement, scoped to the owning wallet address.
///
/// `signature` is the external settlement reference and is unique across
/// the whole store; `seq` orders listings newest-first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: String,
    pub signature: String,
    pub direction: Direction,
    pub amount: f64,
    pub currency: Currency,
    pub from: Option<String>,
    pub to: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub status: TxStatus,
    pub memo: Option<String>,
    pub owner: String,
    #[serde(default)]
    pub seq: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    Active,
    Inactive,
}

/// A reusable, shareable payment request owned by one wallet.
///
/// `views` and `payments` are monotonic and only ever move through the
/// dedicated increment operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentLink {
    pub id: String,
    pub name: String,
    pub amount: f64,
    pub currency: Currency,
    pub recipient: String,
    pub memo: Option<String>,
    pub merchant: Option<String>,
    pub created_at: DateTime<Utc>,
    pub views: u64,
    pub payments: u64,
    pub status: LinkStatus,
    pub url: String,
    pub owner: String,
    #[serde(default)]
    pub seq: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Draft,
    Pending,
    Paid,
    Overdue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub amount: f64,
}

/// A billing record with a due date. The id is a sequential display
/// identifier like `INV-007`, unique within the owner's partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    pub client: String,
    pub email: Option<String>,
    pub amount: f64,
    pub currency: Currency,
    pub status: InvoiceStatus,
    pub due_date: DateTime<Utc>,
    pub paid_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<LineItem>,
    pub owner: String,
    pub payment_signature: Option<String>,
    #[serde(default)]
    pub seq: u64,
}
