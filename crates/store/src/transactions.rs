//! The transaction ledger. Inserts are idempotent on the settlement
//! signature: a second insert carrying a signature the store already holds
//! is a silent no-op and the stored record wins.

use crate::audit::{write_audit_event, AuditEvent};
use crate::{load_all, remove, save, Store, TRANSACTIONS_TREE};
use chrono::Utc;
use passpay_core::currency::Currency;
use passpay_core::models::{Direction, TransactionRecord, TxStatus};
use uuid::Uuid;

/// Input for a new ledger entry; id, timestamp and sequence number are
/// assigned on insert.
#[derive(Debug, Clone)]
pub struct TransactionDraft {
    pub signature: String,
    pub direction: Direction,
    pub amount: f64,
    pub currency: Currency,
    pub from: Option<String>,
    pub to: Option<String>,
    pub status: TxStatus,
    pub memo: Option<String>,
    pub owner: String,
}

/// Partial update applied by settlement signature; counters and identity
/// fields are not reachable from here.
#[derive(Debug, Clone, Default)]
pub struct TransactionChanges {
    pub status: Option<TxStatus>,
    pub memo: Option<String>,
}

#[derive(Clone)]
pub struct Transactions {
    store: Store,
}

impl Transactions {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// All records for one owner, newest first.
    pub fn list(&self, owner: &str) -> Vec<TransactionRecord> {
        let Some(tree) = self.store.tree(TRANSACTIONS_TREE) else {
            return Vec::new();
        };
        let mut records: Vec<TransactionRecord> = load_all(&tree)
            .into_iter()
            .filter(|tx: &TransactionRecord| tx.owner == owner)
            .collect();
        records.sort_by(|a, b| b.seq.cmp(&a.seq));
        records
    }

    /// Insert a record unless its signature is already present anywhere in
    /// the store. On a duplicate the existing record is returned and the
    /// operation completes as successful: the intended state already holds.
    pub fn add(&self, draft: TransactionDraft) -> TransactionRecord {
        let record = TransactionRecord {
            id: Uuid::new_v4().to_string(),
            signature: draft.signature,
            direction: draft.direction,
            amount: draft.amount,
            currency: draft.currency,
            from: draft.from,
            to: draft.to,
            timestamp: Utc::now(),
            status: draft.status,
            memo: draft.memo,
            owner: draft.owner,
            seq: self.store.next_seq(),
        };

        let Some(tree) = self.store.tree(TRANSACTIONS_TREE) else {
            return record;
        };

        if let Some(existing) = find_by_signature_in(&tree, &record.signature) {
            tracing::debug!(signature = %record.signature, "duplicate settlement insert ignored");
            return existing;
        }

        save(&tree, &record.id, &record);
        let _ = write_audit_event(
            &AuditEvent::new("transaction_recorded", &record.id)
                .with_owner(&record.owner)
                .with_signature(&record.signature)
                .with_amount(record.amount),
        );
        record
    }

    pub fn find_by_signature(&self, signature: &str) -> Option<TransactionRecord> {
        let tree = self.store.tree(TRANSACTIONS_TREE)?;
        find_by_signature_in(&tree, signature)
    }

    /// Merge externally observed changes (e.g. a confirmation or failure)
    /// into the record with this settlement signature.
    pub fn update_by_signature(
        &self,
        signature: &str,
        changes: TransactionChanges,
    ) -> Option<TransactionRecord> {
        let tree = self.store.tree(TRANSACTIONS_TREE)?;
        let mut record = find_by_signature_in(&tree, signature)?;
        if let Some(status) = changes.status {
            record.status = status;
        }
        if let Some(memo) = changes.memo {
            record.memo = Some(memo);
        }
        if !save(&tree, &record.id, &record) {
            return None;
        }
        let _ = write_audit_event(
            &AuditEvent::new("transaction_updated", &record.id)
                .with_owner(&record.owner)
                .with_signature(signature),
        );
        Some(record)
    }

    pub fn delete(&self, id: &str) -> bool {
        let Some(tree) = self.store.tree(TRANSACTIONS_TREE) else {
            return false;
        };
        let existed = remove(&tree, id);
        if existed {
            let _ = write_audit_event(&AuditEvent::new("transaction_deleted", id));
        }
        existed
    }

    /// Drop one owner's records, or every record when no owner is given.
    pub fn clear(&self, owner: Option<&str>) {
        let Some(tree) = self.store.tree(TRANSACTIONS_TREE) else {
            return;
        };
        match owner {
            Some(owner) => {
                let doomed: Vec<String> = load_all::<TransactionRecord>(&tree)
                    .into_iter()
                    .filter(|tx| tx.owner == owner)
                    .map(|tx| tx.id)
                    .collect();
                for id in doomed {
                    remove(&tree, &id);
                }
            }
            None => {
                if let Err(e) = tree.clear() {
                    tracing::warn!(error = %e, "transaction clear failed");
                }
            }
        }
    }
}

fn find_by_signature_in(tree: &sled::Tree, signature: &str) -> Option<TransactionRecord> {
    load_all::<TransactionRecord>(tree)
        .into_iter()
        .find(|tx| tx.signature == signature)
}
