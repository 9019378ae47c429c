//! Partitioned record persistence over a local sled database.
//!
//! One named tree per record kind; values are JSON documents keyed by the
//! record id. Every record carries its owning wallet address, and all list
//! operations filter to one owner. Persistence failures never propagate
//! past this crate: reads degrade to empty results, writes to no-ops, each
//! with a warn log. The only fallible entry point is [`Store::open`].

mod audit;
pub mod invoices;
pub mod links;
pub mod transactions;

use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::{Db, Tree};
use std::path::Path;

pub(crate) const TRANSACTIONS_TREE: &str = "transactions";
pub(crate) const PAYMENT_LINKS_TREE: &str = "payment_links";
pub(crate) const INVOICES_TREE: &str = "invoices";
/// Counters and other non-record state; not touched by [`Store::clear_all`]
/// so identifiers keep advancing across a data wipe.
pub(crate) const META_TREE: &str = "meta";

/// Handle to the underlying database. Cheap to clone; all managers share
/// one `Store`.
#[derive(Clone)]
pub struct Store {
    db: Db,
}

impl Store {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Monotonic sequence number used to keep listings in insertion order.
    pub(crate) fn next_seq(&self) -> u64 {
        self.db.generate_id().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "sequence generation failed");
            0
        })
    }

    pub(crate) fn tree(&self, name: &str) -> Option<Tree> {
        match self.db.open_tree(name) {
            Ok(tree) => Some(tree),
            Err(e) => {
                tracing::warn!(tree = name, error = %e, "storage unavailable");
                None
            }
        }
    }

    /// Drops every record in every tree. Maintenance operation behind the
    /// settings surface.
    pub fn clear_all(&self) {
        for name in [TRANSACTIONS_TREE, PAYMENT_LINKS_TREE, INVOICES_TREE] {
            if let Some(tree) = self.tree(name) {
                if let Err(e) = tree.clear() {
                    tracing::warn!(tree = name, error = %e, "clear failed");
                }
            }
        }
    }
}

/// Decode every record in the tree, skipping values that fail to decode.
pub(crate) fn load_all<T: DeserializeOwned>(tree: &Tree) -> Vec<T> {
    let mut out = Vec::new();
    for item in tree.iter() {
        match item {
            Ok((_key, value)) => match serde_json::from_slice(&value) {
                Ok(record) => out.push(record),
                Err(e) => tracing::warn!(error = %e, "skipping undecodable record"),
            },
            Err(e) => {
                tracing::warn!(error = %e, "storage read failed");
                break;
            }
        }
    }
    out
}

/// Persist one record under its id; false (and a warn) when the write or
/// the encoding failed.
pub(crate) fn save<T: Serialize>(tree: &Tree, key: &str, record: &T) -> bool {
    let bytes = match serde_json::to_vec(record) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(key, error = %e, "record encoding failed");
            return false;
        }
    };
    match tree.insert(key.as_bytes(), bytes) {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(key, error = %e, "storage write failed");
            false
        }
    }
}

pub(crate) fn fetch<T: DeserializeOwned>(tree: &Tree, key: &str) -> Option<T> {
    match tree.get(key.as_bytes()) {
        Ok(Some(value)) => match serde_json::from_slice(&value) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(key, error = %e, "record decoding failed");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(key, error = %e, "storage read failed");
            None
        }
    }
}

pub(crate) fn remove(tree: &Tree, key: &str) -> bool {
    match tree.remove(key.as_bytes()) {
        Ok(existing) => existing.is_some(),
        Err(e) => {
            tracing::warn!(key, error = %e, "storage delete failed");
            false
        }
    }
}

/// Read-modify-write of one record; None when the record is absent or
/// storage failed.
pub(crate) fn mutate<T, F>(tree: &Tree, key: &str, f: F) -> Option<T>
where
    T: DeserializeOwned + Serialize,
    F: FnOnce(&mut T),
{
    let mut record: T = fetch(tree, key)?;
    f(&mut record);
    if save(tree, key, &record) {
        Some(record)
    } else {
        None
    }
}
