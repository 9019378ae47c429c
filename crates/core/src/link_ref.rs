//! The shareable payment reference: a checkout URL whose query string
//! encodes the payment request. Parsing one back is how the
//! checkout-by-link flow reconstructs the request, so a reference without
//! a structurally valid recipient and a positive amount is rejected
//! outright.

use crate::currency::Currency;
use crate::format::is_valid_address;
use thiserror::Error;
use url::Url;

const CHECKOUT_PATH: &str = "/pay/checkout";

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutRequest {
    pub recipient: String,
    pub amount: f64,
    pub currency: Currency,
    pub memo: Option<String>,
    pub merchant: Option<String>,
    /// Present when the reference was generated from a payment link, so
    /// views and payments can be attributed back to it.
    pub link_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkRefError {
    #[error("not a parsable URL")]
    Malformed,
    #[error("missing or invalid recipient address")]
    InvalidRecipient,
    #[error("amount must be greater than zero")]
    InvalidAmount,
}

impl CheckoutRequest {
    /// Build the shareable URL under `base`, e.g.
    /// `https://host/pay/checkout?to=...&amount=...&token=SOL&linkId=...`.
    pub fn to_url(&self, base: &Url) -> Url {
        let mut url = base.clone();
        url.set_path(CHECKOUT_PATH);
        {
            let mut q = url.query_pairs_mut();
            q.clear();
            q.append_pair("to", &self.recipient);
            q.append_pair("amount", &self.amount.to_string());
            q.append_pair("token", self.currency.as_str());
            if let Some(link_id) = &self.link_id {
                q.append_pair("linkId", link_id);
            }
            if let Some(memo) = &self.memo {
                q.append_pair("memo", memo);
            }
            if let Some(merchant) = &self.merchant {
                q.append_pair("merchant", merchant);
            }
        }
        url
    }

    /// Parse a shareable reference. An unknown `token` value falls back to
    /// SOL; a missing or invalid recipient or non-positive amount is an
    /// error, never a half-valid request.
    pub fn parse(reference: &str) -> Result<Self, LinkRefError> {
        let url = Url::parse(reference).map_err(|_| LinkRefError::Malformed)?;

        let mut recipient = None;
        let mut amount = 0.0f64;
        let mut currency = Currency::Sol;
        let mut memo = None;
        let mut merchant = None;
        let mut link_id = None;

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "to" => recipient = Some(value.into_owned()),
                "amount" => amount = value.parse().unwrap_or(0.0),
                "token" => currency = value.parse().unwrap_or(Currency::Sol),
                "memo" if !value.is_empty() => memo = Some(value.into_owned()),
                "merchant" if !value.is_empty() => merchant = Some(value.into_owned()),
                "linkId" if !value.is_empty() => link_id = Some(value.into_owned()),
                _ => {}
            }
        }

        let recipient = match recipient {
            Some(addr) if is_valid_address(&addr) => addr,
            _ => return Err(LinkRefError::InvalidRecipient),
        };
        if !(amount > 0.0) {
            return Err(LinkRefError::InvalidAmount);
        }

        Ok(CheckoutRequest {
            recipient,
            amount,
            currency,
            memo,
            merchant,
            link_id,
        })
    }
}
