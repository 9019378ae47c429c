//! The payment flow controller: one small status machine per payment
//! attempt, driving the wallet collaborator and booking the outcome into
//! the record store.
//!
//! A pay request is only honored from `Idle` or `Error`, which doubles as
//! the re-entrancy guard while a wallet call is outstanding. Dismissing
//! the flow bumps an attempt counter; a wallet call that resolves for a
//! superseded attempt is discarded without touching state or the store.

pub mod error;

pub use error::PaymentError;

use error::classify_settlement_error;
use passpay_core::currency::Currency;
use passpay_core::models::{Direction, TxStatus};
use store::links::Links;
use store::transactions::{TransactionDraft, Transactions};
use wallet::instructions::build_transfer;
use wallet::{ConnectOptions, WalletClient};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStatus {
    Idle,
    Connecting,
    Signing,
    Confirming,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    pub recipient: String,
    pub amount: f64,
    pub currency: Currency,
    pub memo: Option<String>,
    /// Set when this attempt came through a shareable payment link.
    pub link_id: Option<String>,
}

#[derive(Debug)]
struct FlowState {
    status: FlowStatus,
    request: Option<PaymentRequest>,
    signature: Option<String>,
    error: Option<PaymentError>,
    attempt: u64,
}

impl FlowState {
    fn new() -> Self {
        Self {
            status: FlowStatus::Idle,
            request: None,
            signature: None,
            error: None,
            attempt: 0,
        }
    }
}

/// Cheap-to-clone handle; clones share the same attempt state.
#[derive(Clone)]
pub struct PaymentFlow {
    state: Arc<Mutex<FlowState>>,
    transactions: Transactions,
    links: Links,
    usdc_mint: String,
}

impl PaymentFlow {
    pub fn new(transactions: Transactions, links: Links, usdc_mint: String) -> Self {
        Self {
            state: Arc::new(Mutex::new(FlowState::new())),
            transactions,
            links,
            usdc_mint,
        }
    }

    pub fn status(&self) -> FlowStatus {
        self.state.lock().unwrap().status
    }

    pub fn signature(&self) -> Option<String> {
        self.state.lock().unwrap().signature.clone()
    }

    pub fn last_error(&self) -> Option<PaymentError> {
        self.state.lock().unwrap().error.clone()
    }

    /// The request of the current or last attempt; kept across retries.
    pub fn last_request(&self) -> Option<PaymentRequest> {
        self.state.lock().unwrap().request.clone()
    }

    /// Establish the wallet connection. On success the flow returns to
    /// `Idle` with the wallet connected, awaiting the pay action.
    pub async fn connect(
        &self,
        wallet: &dyn WalletClient,
        options: ConnectOptions,
    ) -> Result<String, PaymentError> {
        let attempt = {
            let mut state = self.state.lock().unwrap();
            if !matches!(state.status, FlowStatus::Idle | FlowStatus::Error) {
                return Err(PaymentError::InFlight);
            }
            state.status = FlowStatus::Connecting;
            state.error = None;
            state.attempt
        };

        let result = wallet.connect(options).await;

        let mut state = self.state.lock().unwrap();
        if state.attempt != attempt {
            tracing::debug!("discarding connect result for a dismissed attempt");
            return Err(PaymentError::Cancelled);
        }
        match result {
            Ok(address) => {
                state.status = FlowStatus::Idle;
                tracing::info!(address = %address, "wallet connected");
                Ok(address)
            }
            Err(e) => {
                tracing::warn!(error = %e, "wallet connect failed");
                state.status = FlowStatus::Error;
                state.error = Some(PaymentError::ConnectionFailed);
                Err(PaymentError::ConnectionFailed)
            }
        }
    }

    /// Drive one payment attempt to settlement. Rejected while another
    /// attempt is mid-flight.
    pub async fn pay(
        &self,
        wallet: &dyn WalletClient,
        request: PaymentRequest,
    ) -> Result<String, PaymentError> {
        let payer = wallet
            .connected_address()
            .ok_or(PaymentError::NotConnected)?;

        let attempt = {
            let mut state = self.state.lock().unwrap();
            if !matches!(state.status, FlowStatus::Idle | FlowStatus::Error) {
                return Err(PaymentError::InFlight);
            }
            state.status = FlowStatus::Signing;
            state.signature = None;
            state.error = None;
            state.request = Some(request.clone());
            state.attempt
        };

        // Validation failures never reach the wallet; the flow drops back
        // to idle for inline correction.
        let instructions = match build_transfer(
            &payer,
            &request.recipient,
            request.amount,
            request.currency,
            &self.usdc_mint,
        ) {
            Ok(instructions) => instructions,
            Err(e) => {
                let mut state = self.state.lock().unwrap();
                if state.attempt == attempt {
                    state.status = FlowStatus::Idle;
                }
                return Err(PaymentError::Validation(e));
            }
        };

        {
            let mut state = self.state.lock().unwrap();
            if state.attempt != attempt {
                return Err(PaymentError::Cancelled);
            }
            // one blocking wallet call covers both signing and submission;
            // the two named states are caller-facing labels around it
            state.status = FlowStatus::Confirming;
        }

        let result = wallet.sign_and_send(&instructions).await;

        let mut state = self.state.lock().unwrap();
        if state.attempt != attempt {
            tracing::debug!("discarding settlement result for a dismissed attempt");
            return Err(PaymentError::Cancelled);
        }
        match result {
            Ok(signature) => {
                state.status = FlowStatus::Success;
                state.signature = Some(signature.clone());
                drop(state);
                self.book_settlement(&payer, &request, &signature);
                Ok(signature)
            }
            Err(e) => {
                let classified = classify_settlement_error(&e.to_string());
                tracing::warn!(error = %e, "payment failed");
                state.status = FlowStatus::Error;
                state.error = Some(classified.clone());
                Err(classified)
            }
        }
    }

    /// From `Error` back to `Idle`, keeping the request parameters so the
    /// attempt can be re-submitted as-is.
    pub fn retry(&self) {
        let mut state = self.state.lock().unwrap();
        if state.status == FlowStatus::Error {
            state.status = FlowStatus::Idle;
            state.signature = None;
            state.error = None;
        }
    }

    /// Dismiss the flow entirely. Any wallet call still in flight resolves
    /// against a superseded attempt and is discarded.
    pub fn close(&self) {
        let mut state = self.state.lock().unwrap();
        state.attempt += 1;
        *state = FlowState {
            attempt: state.attempt,
            ..FlowState::new()
        };
    }

    fn book_settlement(&self, payer: &str, request: &PaymentRequest, signature: &str) {
        self.transactions.add(TransactionDraft {
            signature: signature.to_string(),
            direction: Direction::Outgoing,
            amount: request.amount,
            currency: request.currency,
            from: Some(payer.to_string()),
            to: Some(request.recipient.clone()),
            status: TxStatus::Confirmed,
            memo: request.memo.clone(),
            owner: payer.to_string(),
        });
        // Mirrored booking under the recipient's partition. This is a
        // client-local ledger, so the payer-side record above is the
        // authoritative one; signature idempotency in the store decides
        // the mirror's fate.
        self.transactions.add(TransactionDraft {
            signature: signature.to_string(),
            direction: Direction::Incoming,
            amount: request.amount,
            currency: request.currency,
            from: Some(payer.to_string()),
            to: Some(request.recipient.clone()),
            status: TxStatus::Confirmed,
            memo: request.memo.clone(),
            owner: request.recipient.clone(),
        });
        if let Some(link_id) = &request.link_id {
            self.links.record_payment(link_id);
        }
        tracing::info!(signature, amount = request.amount, "payment settled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use passpay_core::models::TxStatus;
    use store::links::CreateLink;
    use store::Store;
    use wallet::mock::MockWallet;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio::time::Duration;
    use url::Url;

    const PAYER: &str = "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU";
    const RECIPIENT: &str = "So11111111111111111111111111111111111111112";
    const MINT: &str = "Gh9ZwEmdLJ8DscKNTkTqPbNwLNNBjuSzaG9Vp2KGtKJr";

    struct Harness {
        _dir: TempDir,
        transactions: Transactions,
        links: Links,
        flow: PaymentFlow,
    }

    fn harness() -> Harness {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path().join("db")).unwrap();
        let transactions = Transactions::new(store.clone());
        let links = Links::new(store, Url::parse("https://pay.example.com").unwrap());
        let flow = PaymentFlow::new(transactions.clone(), links.clone(), MINT.to_string());
        Harness {
            _dir: dir,
            transactions,
            links,
            flow,
        }
    }

    fn request() -> PaymentRequest {
        PaymentRequest {
            recipient: RECIPIENT.to_string(),
            amount: 0.05,
            currency: Currency::Sol,
            memo: None,
            link_id: None,
        }
    }

    async fn connected_wallet() -> MockWallet {
        let wallet = MockWallet::with_address(PAYER).with_latency(Duration::ZERO);
        wallet.connect(ConnectOptions::default()).await.unwrap();
        wallet
    }

    #[tokio::test]
    async fn settlement_books_the_payer_side_record() {
        let h = harness();
        let wallet = connected_wallet().await;

        let signature = h.flow.pay(&wallet, request()).await.unwrap();
        assert_eq!(h.flow.status(), FlowStatus::Success);
        assert_eq!(h.flow.signature(), Some(signature.clone()));

        let booked = h.transactions.list(PAYER);
        assert_eq!(booked.len(), 1);
        assert_eq!(booked[0].signature, signature);
        assert_eq!(booked[0].direction, Direction::Outgoing);
        assert_eq!(booked[0].status, TxStatus::Confirmed);
        // the mirrored incoming record shares the signature, so the
        // payer-side record wins and the recipient partition stays empty
        assert!(h.transactions.list(RECIPIENT).is_empty());
    }

    #[tokio::test]
    async fn paying_through_a_link_counts_one_payment() {
        let h = harness();
        let wallet = connected_wallet().await;

        let link = h
            .links
            .create(
                PAYER,
                CreateLink {
                    name: "Demo".to_string(),
                    amount: 0.05,
                    currency: Currency::Sol,
                    recipient: RECIPIENT.to_string(),
                    memo: None,
                    merchant: None,
                },
            )
            .unwrap();

        let mut req = request();
        req.link_id = Some(link.id.clone());
        h.flow.pay(&wallet, req).await.unwrap();

        assert_eq!(h.links.get(&link.id).unwrap().payments, 1);
    }

    #[tokio::test]
    async fn settlement_failure_is_classified() {
        let h = harness();
        let wallet = MockWallet::failing_send("Insufficient balance for transfer");
        wallet.connect(ConnectOptions::default()).await.unwrap();

        let err = h.flow.pay(&wallet, request()).await.unwrap_err();
        assert_eq!(err, PaymentError::InsufficientBalance);
        assert_eq!(h.flow.status(), FlowStatus::Error);
        assert_eq!(h.flow.last_error(), Some(PaymentError::InsufficientBalance));
        assert!(h.transactions.list(PAYER).is_empty());
    }

    #[tokio::test]
    async fn validation_failures_never_reach_the_wallet() {
        let h = harness();
        let wallet = connected_wallet().await;

        let mut req = request();
        req.amount = 0.0;
        let err = h.flow.pay(&wallet, req).await.unwrap_err();
        assert!(matches!(err, PaymentError::Validation(_)));
        // back to idle for inline correction, not the error state
        assert_eq!(h.flow.status(), FlowStatus::Idle);
    }

    #[tokio::test]
    async fn pay_requires_a_connection() {
        let h = harness();
        let wallet = MockWallet::new().with_latency(Duration::ZERO);
        let err = h.flow.pay(&wallet, request()).await.unwrap_err();
        assert_eq!(err, PaymentError::NotConnected);
    }

    #[tokio::test]
    async fn concurrent_pay_is_rejected_mid_flight() {
        let h = harness();
        let wallet = Arc::new(
            MockWallet::with_address(PAYER).with_latency(Duration::from_millis(200)),
        );
        wallet.connect(ConnectOptions::default()).await.unwrap();

        let flow = h.flow.clone();
        let in_flight = {
            let wallet = Arc::clone(&wallet);
            tokio::spawn(async move { flow.pay(wallet.as_ref(), request()).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let err = h.flow.pay(wallet.as_ref(), request()).await.unwrap_err();
        assert_eq!(err, PaymentError::InFlight);

        in_flight.await.unwrap().unwrap();
        assert_eq!(h.flow.status(), FlowStatus::Success);
    }

    #[tokio::test]
    async fn dismissed_attempt_discards_a_late_settlement() {
        let h = harness();
        let wallet = Arc::new(
            MockWallet::with_address(PAYER).with_latency(Duration::from_millis(200)),
        );
        wallet.connect(ConnectOptions::default()).await.unwrap();

        let flow = h.flow.clone();
        let in_flight = {
            let wallet = Arc::clone(&wallet);
            tokio::spawn(async move { flow.pay(wallet.as_ref(), request()).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        h.flow.close();

        let result = in_flight.await.unwrap();
        assert_eq!(result.unwrap_err(), PaymentError::Cancelled);
        // nothing was booked and the flow is back at rest
        assert!(h.transactions.list(PAYER).is_empty());
        assert_eq!(h.flow.status(), FlowStatus::Idle);
    }

    #[tokio::test]
    async fn retry_keeps_the_request_parameters() {
        let h = harness();
        let wallet = MockWallet::failing_send("network unreachable");
        wallet.connect(ConnectOptions::default()).await.unwrap();

        let err = h.flow.pay(&wallet, request()).await.unwrap_err();
        assert_eq!(err, PaymentError::Network);
        assert_eq!(h.flow.status(), FlowStatus::Error);

        h.flow.retry();
        assert_eq!(h.flow.status(), FlowStatus::Idle);
        assert_eq!(h.flow.last_request(), Some(request()));
        assert!(h.flow.last_error().is_none());
        assert!(h.flow.signature().is_none());
    }

    #[tokio::test]
    async fn connect_failure_reports_generically_and_retries() {
        let h = harness();
        let wallet = MockWallet::failing_connect("portal closed");

        let err = h
            .flow
            .connect(&wallet, ConnectOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err, PaymentError::ConnectionFailed);
        assert_eq!(h.flow.status(), FlowStatus::Error);

        h.flow.retry();
        let wallet = MockWallet::with_address(PAYER).with_latency(Duration::ZERO);
        let address = h
            .flow
            .connect(&wallet, ConnectOptions::default())
            .await
            .unwrap();
        assert_eq!(address, PAYER);
        assert_eq!(h.flow.status(), FlowStatus::Idle);
    }
}
