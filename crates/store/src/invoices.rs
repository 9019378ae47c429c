//! Invoice lifecycle. Status moves one way: draft to pending on send,
//! pending or overdue to paid on mark_paid, and pending to overdue only
//! through the pull-based sweep. Paid invoices are never swept back.

use crate::audit::{write_audit_event, AuditEvent};
use crate::{fetch, load_all, mutate, remove, save, Store, INVOICES_TREE, META_TREE};
use chrono::{DateTime, Utc};
use passpay_core::currency::Currency;
use passpay_core::models::{Invoice, InvoiceStatus, LineItem};

#[derive(Debug, Clone)]
pub struct CreateInvoice {
    pub client: String,
    pub email: Option<String>,
    pub amount: f64,
    pub currency: Currency,
    pub due_date: DateTime<Utc>,
    pub items: Vec<LineItem>,
}

const INVOICE_COUNTER_KEY: &str = "invoice_counter";

#[derive(Clone)]
pub struct Invoices {
    store: Store,
}

impl Invoices {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn list(&self, owner: &str) -> Vec<Invoice> {
        let Some(tree) = self.store.tree(INVOICES_TREE) else {
            return Vec::new();
        };
        let mut invoices: Vec<Invoice> = load_all(&tree)
            .into_iter()
            .filter(|inv: &Invoice| inv.owner == owner)
            .collect();
        invoices.sort_by(|a, b| b.seq.cmp(&a.seq));
        invoices
    }

    pub fn list_by_status(&self, owner: &str, status: InvoiceStatus) -> Vec<Invoice> {
        self.list(owner)
            .into_iter()
            .filter(|inv| inv.status == status)
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<Invoice> {
        let tree = self.store.tree(INVOICES_TREE)?;
        fetch(&tree, id)
    }

    /// Next display number from a persistent counter. Counting the tree
    /// instead would reissue a deleted invoice's number, and with it the
    /// storage key under that record.
    fn next_display_number(&self) -> u64 {
        let fallback = || {
            self.store
                .tree(INVOICES_TREE)
                .map(|tree| tree.len() as u64)
                .unwrap_or(0)
                + 1
        };
        let Some(meta) = self.store.tree(META_TREE) else {
            return fallback();
        };
        let bumped = meta.update_and_fetch(INVOICE_COUNTER_KEY, |current| {
            let current = current
                .and_then(|bytes| <[u8; 8]>::try_from(bytes).ok())
                .map(u64::from_be_bytes)
                .unwrap_or(0);
            Some((current + 1).to_be_bytes().to_vec())
        });
        match bumped {
            Ok(Some(bytes)) => <[u8; 8]>::try_from(bytes.as_ref())
                .map(u64::from_be_bytes)
                .unwrap_or_else(|_| fallback()),
            Ok(None) => fallback(),
            Err(e) => {
                tracing::warn!(error = %e, "invoice counter unavailable");
                fallback()
            }
        }
    }

    /// Creates the invoice in draft, or directly in pending when the
    /// caller asked to send immediately. The display id is a padded
    /// sequential number that is never reissued, even after a delete.
    pub fn create(&self, owner: &str, params: CreateInvoice, send_immediately: bool) -> Invoice {
        let invoice = Invoice {
            id: format!("INV-{:03}", self.next_display_number()),
            client: params.client,
            email: params.email,
            amount: params.amount,
            currency: params.currency,
            status: if send_immediately {
                InvoiceStatus::Pending
            } else {
                InvoiceStatus::Draft
            },
            due_date: params.due_date,
            paid_date: None,
            created_at: Utc::now(),
            items: params.items,
            owner: owner.to_string(),
            payment_signature: None,
            seq: self.store.next_seq(),
        };

        if let Some(tree) = self.store.tree(INVOICES_TREE) {
            save(&tree, &invoice.id, &invoice);
            let _ = write_audit_event(
                &AuditEvent::new("invoice_created", &invoice.id)
                    .with_owner(owner)
                    .with_state(if send_immediately { "pending" } else { "draft" })
                    .with_amount(invoice.amount),
            );
        }
        invoice
    }

    /// Draft -> pending. Idempotent: sending an already-pending invoice
    /// returns it unchanged. Paid and overdue invoices are left alone.
    pub fn send(&self, id: &str) -> Option<Invoice> {
        let tree = self.store.tree(INVOICES_TREE)?;
        let mut sent = false;
        let invoice = mutate(&tree, id, |inv: &mut Invoice| {
            if inv.status == InvoiceStatus::Draft {
                inv.status = InvoiceStatus::Pending;
                sent = true;
            }
        })?;
        if sent {
            let _ = write_audit_event(
                &AuditEvent::new("invoice_sent", id).with_owner(&invoice.owner),
            );
        }
        Some(invoice)
    }

    /// Pending or overdue -> paid, stamping the paid date and the optional
    /// settlement signature.
    pub fn mark_paid(&self, id: &str, signature: Option<&str>) -> Option<Invoice> {
        let tree = self.store.tree(INVOICES_TREE)?;
        let mut paid = false;
        let invoice = mutate(&tree, id, |inv: &mut Invoice| {
            if matches!(inv.status, InvoiceStatus::Pending | InvoiceStatus::Overdue) {
                inv.status = InvoiceStatus::Paid;
                inv.paid_date = Some(Utc::now());
                inv.payment_signature = signature.map(str::to_string);
                paid = true;
            }
        })?;
        if paid {
            let mut event =
                AuditEvent::new("invoice_paid", id).with_owner(&invoice.owner);
            if let Some(sig) = signature {
                event = event.with_signature(sig);
            }
            let _ = write_audit_event(&event);
        }
        Some(invoice)
    }

    /// Batch transition of this owner's pending invoices whose due date
    /// has passed. Pull-based: overdue detection is only as fresh as the
    /// last call. Returns how many invoices transitioned.
    pub fn sweep_overdue(&self, owner: &str) -> usize {
        let Some(tree) = self.store.tree(INVOICES_TREE) else {
            return 0;
        };
        let now = Utc::now();
        let mut swept = 0;
        for invoice in load_all::<Invoice>(&tree) {
            if invoice.owner == owner
                && invoice.status == InvoiceStatus::Pending
                && invoice.due_date < now
            {
                let transitioned = mutate(&tree, &invoice.id, |inv: &mut Invoice| {
                    inv.status = InvoiceStatus::Overdue;
                });
                if transitioned.is_some() {
                    swept += 1;
                    let _ = write_audit_event(
                        &AuditEvent::new("invoice_overdue", &invoice.id).with_owner(owner),
                    );
                }
            }
        }
        if swept > 0 {
            tracing::info!(owner, swept, "invoices marked overdue");
        }
        swept
    }

    pub fn delete(&self, id: &str) -> bool {
        let Some(tree) = self.store.tree(INVOICES_TREE) else {
            return false;
        };
        let existed = remove(&tree, id);
        if existed {
            let _ = write_audit_event(&AuditEvent::new("invoice_deleted", id));
        }
        existed
    }
}
