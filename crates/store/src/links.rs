//! Payment-link lifecycle. A link's id is generated before the record so
//! it can be embedded in the shareable checkout URL; view and payment
//! counters only move through their dedicated increment operations.

use crate::audit::{write_audit_event, AuditEvent};
use crate::{fetch, load_all, mutate, remove, save, Store, PAYMENT_LINKS_TREE};
use chrono::Utc;
use passpay_core::currency::Currency;
use passpay_core::format::is_valid_address;
use passpay_core::link_ref::CheckoutRequest;
use passpay_core::models::{LinkStatus, PaymentLink};
use passpay_core::ValidationError;
use std::collections::HashSet;
use url::Url;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CreateLink {
    pub name: String,
    pub amount: f64,
    pub currency: Currency,
    pub recipient: String,
    pub memo: Option<String>,
    pub merchant: Option<String>,
}

/// Owner-editable fields. Counters are deliberately absent: a bulk update
/// can never overwrite views or payments.
#[derive(Debug, Clone, Default)]
pub struct LinkChanges {
    pub name: Option<String>,
    pub memo: Option<String>,
    pub merchant: Option<String>,
    pub status: Option<LinkStatus>,
}

#[derive(Clone)]
pub struct Links {
    store: Store,
    checkout_base: Url,
}

impl Links {
    pub fn new(store: Store, checkout_base: Url) -> Self {
        Self {
            store,
            checkout_base,
        }
    }

    pub fn list(&self, owner: &str) -> Vec<PaymentLink> {
        let Some(tree) = self.store.tree(PAYMENT_LINKS_TREE) else {
            return Vec::new();
        };
        let mut links: Vec<PaymentLink> = load_all(&tree)
            .into_iter()
            .filter(|link: &PaymentLink| link.owner == owner)
            .collect();
        links.sort_by(|a, b| b.seq.cmp(&a.seq));
        links
    }

    pub fn get(&self, id: &str) -> Option<PaymentLink> {
        let tree = self.store.tree(PAYMENT_LINKS_TREE)?;
        fetch(&tree, id)
    }

    /// Validates the request, then inserts an active link with zeroed
    /// counters and the generated checkout URL.
    pub fn create(&self, owner: &str, params: CreateLink) -> Result<PaymentLink, ValidationError> {
        if !(params.amount > 0.0) {
            return Err(ValidationError::NonPositiveAmount);
        }
        if !is_valid_address(&params.recipient) {
            return Err(ValidationError::InvalidAddress);
        }

        // The id goes into the URL so later views and payments can be
        // attributed back to this record.
        let id = Uuid::new_v4().to_string();
        let url = CheckoutRequest {
            recipient: params.recipient.clone(),
            amount: params.amount,
            currency: params.currency,
            memo: params.memo.clone(),
            merchant: params.merchant.clone(),
            link_id: Some(id.clone()),
        }
        .to_url(&self.checkout_base);

        let link = PaymentLink {
            id,
            name: params.name,
            amount: params.amount,
            currency: params.currency,
            recipient: params.recipient,
            memo: params.memo,
            merchant: params.merchant,
            created_at: Utc::now(),
            views: 0,
            payments: 0,
            status: LinkStatus::Active,
            url: url.to_string(),
            owner: owner.to_string(),
            seq: self.store.next_seq(),
        };

        if let Some(tree) = self.store.tree(PAYMENT_LINKS_TREE) {
            save(&tree, &link.id, &link);
            let _ = write_audit_event(
                &AuditEvent::new("link_created", &link.id)
                    .with_owner(owner)
                    .with_amount(link.amount),
            );
        }
        Ok(link)
    }

    /// Count one view. The caller guards against double-counting a single
    /// page load, typically through a [`ViewTracker`].
    pub fn record_view(&self, id: &str) -> Option<PaymentLink> {
        let tree = self.store.tree(PAYMENT_LINKS_TREE)?;
        let link = mutate(&tree, id, |link: &mut PaymentLink| {
            link.views += 1;
        })?;
        let _ = write_audit_event(&AuditEvent::new("link_viewed", id).with_owner(&link.owner));
        Some(link)
    }

    /// Count one settled payment against this link. Called exactly once
    /// per settlement by the payment flow.
    pub fn record_payment(&self, id: &str) -> Option<PaymentLink> {
        let tree = self.store.tree(PAYMENT_LINKS_TREE)?;
        let link = mutate(&tree, id, |link: &mut PaymentLink| {
            link.payments += 1;
        })?;
        let _ = write_audit_event(&AuditEvent::new("link_paid", id).with_owner(&link.owner));
        Some(link)
    }

    pub fn update(&self, id: &str, changes: LinkChanges) -> Option<PaymentLink> {
        let tree = self.store.tree(PAYMENT_LINKS_TREE)?;
        mutate(&tree, id, |link: &mut PaymentLink| {
            if let Some(name) = changes.name {
                link.name = name;
            }
            if let Some(memo) = changes.memo {
                link.memo = Some(memo);
            }
            if let Some(merchant) = changes.merchant {
                link.merchant = Some(merchant);
            }
            if let Some(status) = changes.status {
                link.status = status;
            }
        })
    }

    pub fn set_status(&self, id: &str, status: LinkStatus) -> Option<PaymentLink> {
        self.update(
            id,
            LinkChanges {
                status: Some(status),
                ..LinkChanges::default()
            },
        )
    }

    pub fn delete(&self, id: &str) -> bool {
        let Some(tree) = self.store.tree(PAYMENT_LINKS_TREE) else {
            return false;
        };
        let existed = remove(&tree, id);
        if existed {
            let _ = write_audit_event(&AuditEvent::new("link_deleted", id));
        }
        existed
    }
}

/// Per-session guard so one checkout page load counts at most one view,
/// no matter how often the page re-renders.
#[derive(Debug, Default)]
pub struct ViewTracker {
    seen: HashSet<String>,
}

impl ViewTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a view unless this tracker already counted the link.
    /// Returns whether a view was recorded.
    pub fn track(&mut self, links: &Links, id: &str) -> bool {
        if !self.seen.insert(id.to_string()) {
            return false;
        }
        links.record_view(id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const RECIPIENT: &str = "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU";

    fn open_links(dir: &TempDir) -> Links {
        let store = Store::open(dir.path().join("db")).unwrap();
        Links::new(store, Url::parse("https://pay.example.com").unwrap())
    }

    fn params() -> CreateLink {
        CreateLink {
            name: "Demo".to_string(),
            amount: 0.05,
            currency: Currency::Sol,
            recipient: RECIPIENT.to_string(),
            memo: None,
            merchant: None,
        }
    }

    #[test]
    fn create_embeds_id_in_url() {
        let dir = TempDir::new().unwrap();
        let links = open_links(&dir);

        let link = links.create("alice", params()).unwrap();
        assert_eq!(link.views, 0);
        assert_eq!(link.payments, 0);
        assert_eq!(link.status, LinkStatus::Active);

        let parsed = CheckoutRequest::parse(&link.url).unwrap();
        assert_eq!(parsed.link_id.as_deref(), Some(link.id.as_str()));
        assert_eq!(parsed.recipient, RECIPIENT);
    }

    #[test]
    fn create_rejects_invalid_input() {
        let dir = TempDir::new().unwrap();
        let links = open_links(&dir);

        let mut bad_amount = params();
        bad_amount.amount = 0.0;
        assert_eq!(
            links.create("alice", bad_amount).unwrap_err(),
            ValidationError::NonPositiveAmount
        );

        let mut bad_addr = params();
        bad_addr.recipient = "nope".to_string();
        assert_eq!(
            links.create("alice", bad_addr).unwrap_err(),
            ValidationError::InvalidAddress
        );
        assert!(links.list("alice").is_empty());
    }

    #[test]
    fn counters_follow_their_operations() {
        let dir = TempDir::new().unwrap();
        let links = open_links(&dir);
        let link = links.create("alice", params()).unwrap();
        let other = links.create("alice", params()).unwrap();

        links.record_view(&link.id);
        links.record_view(&link.id);
        links.record_payment(&link.id);
        links.record_view(&other.id);

        let link = links.get(&link.id).unwrap();
        assert_eq!(link.views, 2);
        assert_eq!(link.payments, 1);
        let other = links.get(&other.id).unwrap();
        assert_eq!(other.views, 1);
        assert_eq!(other.payments, 0);
    }

    #[test]
    fn bulk_update_cannot_touch_counters() {
        let dir = TempDir::new().unwrap();
        let links = open_links(&dir);
        let link = links.create("alice", params()).unwrap();
        links.record_view(&link.id);

        let updated = links
            .update(
                &link.id,
                LinkChanges {
                    name: Some("Renamed".to_string()),
                    status: Some(LinkStatus::Inactive),
                    ..LinkChanges::default()
                },
            )
            .unwrap();
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.status, LinkStatus::Inactive);
        assert_eq!(updated.views, 1);
        assert_eq!(updated.payments, 0);
    }

    #[test]
    fn view_tracker_counts_once_per_session() {
        let dir = TempDir::new().unwrap();
        let links = open_links(&dir);
        let link = links.create("alice", params()).unwrap();

        let mut tracker = ViewTracker::new();
        assert!(tracker.track(&links, &link.id));
        assert!(!tracker.track(&links, &link.id));
        assert_eq!(links.get(&link.id).unwrap().views, 1);

        // a fresh session counts again
        let mut second = ViewTracker::new();
        assert!(second.track(&links, &link.id));
        assert_eq!(links.get(&link.id).unwrap().views, 2);
    }

    #[test]
    fn delete_is_hard() {
        let dir = TempDir::new().unwrap();
        let links = open_links(&dir);
        let link = links.create("alice", params()).unwrap();

        assert!(links.delete(&link.id));
        assert!(!links.delete(&link.id));
        assert!(links.get(&link.id).is_none());
    }
}
