//! Pure aggregations over one owner's records. Recomputed on every call;
//! nothing here caches or mutates.

use crate::models::{
    Direction, Invoice, InvoiceStatus, LinkStatus, PaymentLink, TransactionRecord, TxStatus,
};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DashboardStats {
    /// Sum of confirmed incoming transaction amounts.
    pub total_revenue: f64,
    /// Count of confirmed transactions, either direction.
    pub total_transactions: usize,
    /// Average confirmed incoming payment; 0 when there are none.
    pub avg_payment: f64,
    pub total_payment_links: usize,
    pub total_views: u64,
    pub total_invoices_paid: usize,
    /// Sum of pending and overdue invoice amounts.
    pub pending_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct InvoiceStats {
    pub total: usize,
    pub draft_count: usize,
    pub pending_count: usize,
    pub paid_count: usize,
    pub overdue_count: usize,
    pub paid_amount: f64,
    pub pending_amount: f64,
    pub overdue_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LinkStats {
    pub total_links: usize,
    pub active_links: usize,
    pub total_views: u64,
    pub total_payments: u64,
}

pub fn dashboard_stats(
    transactions: &[TransactionRecord],
    links: &[PaymentLink],
    invoices: &[Invoice],
) -> DashboardStats {
    let incoming: Vec<_> = transactions
        .iter()
        .filter(|tx| tx.direction == Direction::Incoming && tx.status == TxStatus::Confirmed)
        .collect();

    let total_revenue: f64 = incoming.iter().map(|tx| tx.amount).sum();
    let avg_payment = if incoming.is_empty() {
        0.0
    } else {
        total_revenue / incoming.len() as f64
    };

    let pending_amount = invoices
        .iter()
        .filter(|inv| matches!(inv.status, InvoiceStatus::Pending | InvoiceStatus::Overdue))
        .map(|inv| inv.amount)
        .sum();

    DashboardStats {
        total_revenue,
        total_transactions: transactions
            .iter()
            .filter(|tx| tx.status == TxStatus::Confirmed)
            .count(),
        avg_payment,
        total_payment_links: links.len(),
        total_views: links.iter().map(|link| link.views).sum(),
        total_invoices_paid: invoices
            .iter()
            .filter(|inv| inv.status == InvoiceStatus::Paid)
            .count(),
        pending_amount,
    }
}

pub fn invoice_stats(invoices: &[Invoice]) -> InvoiceStats {
    let mut stats = InvoiceStats {
        total: invoices.len(),
        ..InvoiceStats::default()
    };
    for inv in invoices {
        match inv.status {
            InvoiceStatus::Draft => stats.draft_count += 1,
            InvoiceStatus::Pending => {
                stats.pending_count += 1;
                stats.pending_amount += inv.amount;
            }
            InvoiceStatus::Paid => {
                stats.paid_count += 1;
                stats.paid_amount += inv.amount;
            }
            InvoiceStatus::Overdue => {
                stats.overdue_count += 1;
                stats.overdue_amount += inv.amount;
            }
        }
    }
    stats
}

pub fn link_stats(links: &[PaymentLink]) -> LinkStats {
    LinkStats {
        total_links: links.len(),
        active_links: links
            .iter()
            .filter(|link| link.status == LinkStatus::Active)
            .count(),
        total_views: links.iter().map(|link| link.views).sum(),
        total_payments: links.iter().map(|link| link.payments).sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::Currency;
    use chrono::Utc;

    fn tx(direction: Direction, amount: f64, status: TxStatus) -> TransactionRecord {
        TransactionRecord {
            id: "t".to_string(),
            signature: "s".to_string(),
            direction,
            amount,
            currency: Currency::Sol,
            from: None,
            to: None,
            timestamp: Utc::now(),
            status,
            memo: None,
            owner: "owner".to_string(),
            seq: 0,
        }
    }

    fn invoice(status: InvoiceStatus, amount: f64) -> Invoice {
        Invoice {
            id: "INV-001".to_string(),
            client: "Acme".to_string(),
            email: None,
            amount,
            currency: Currency::Sol,
            status,
            due_date: Utc::now(),
            paid_date: None,
            created_at: Utc::now(),
            items: vec![],
            owner: "owner".to_string(),
            payment_signature: None,
            seq: 0,
        }
    }

    #[test]
    fn avg_payment_is_zero_without_confirmed_incoming() {
        let txs = vec![
            tx(Direction::Outgoing, 5.0, TxStatus::Confirmed),
            tx(Direction::Incoming, 3.0, TxStatus::Pending),
        ];
        let stats = dashboard_stats(&txs, &[], &[]);
        assert_eq!(stats.avg_payment, 0.0);
        assert_eq!(stats.total_revenue, 0.0);
        assert_eq!(stats.total_transactions, 1);
    }

    #[test]
    fn revenue_counts_only_confirmed_incoming() {
        let txs = vec![
            tx(Direction::Incoming, 2.0, TxStatus::Confirmed),
            tx(Direction::Incoming, 4.0, TxStatus::Confirmed),
            tx(Direction::Incoming, 100.0, TxStatus::Failed),
            tx(Direction::Outgoing, 50.0, TxStatus::Confirmed),
        ];
        let stats = dashboard_stats(&txs, &[], &[]);
        assert_eq!(stats.total_revenue, 6.0);
        assert_eq!(stats.avg_payment, 3.0);
        assert_eq!(stats.total_transactions, 3);
    }

    #[test]
    fn pending_amount_includes_overdue() {
        let invoices = vec![
            invoice(InvoiceStatus::Pending, 1.0),
            invoice(InvoiceStatus::Overdue, 2.0),
            invoice(InvoiceStatus::Paid, 10.0),
            invoice(InvoiceStatus::Draft, 100.0),
        ];
        let stats = dashboard_stats(&[], &[], &invoices);
        assert_eq!(stats.pending_amount, 3.0);
        assert_eq!(stats.total_invoices_paid, 1);
    }

    #[test]
    fn invoice_stats_group_by_status() {
        let invoices = vec![
            invoice(InvoiceStatus::Draft, 1.0),
            invoice(InvoiceStatus::Pending, 2.0),
            invoice(InvoiceStatus::Pending, 3.0),
            invoice(InvoiceStatus::Paid, 4.0),
            invoice(InvoiceStatus::Overdue, 5.0),
        ];
        let stats = invoice_stats(&invoices);
        assert_eq!(stats.total, 5);
        assert_eq!(stats.draft_count, 1);
        assert_eq!(stats.pending_count, 2);
        assert_eq!(stats.pending_amount, 5.0);
        assert_eq!(stats.paid_count, 1);
        assert_eq!(stats.paid_amount, 4.0);
        assert_eq!(stats.overdue_count, 1);
        assert_eq!(stats.overdue_amount, 5.0);
    }
}
