//! Typed description of the transfer instruction set handed to
//! [`WalletClient::sign_and_send`](crate::WalletClient::sign_and_send).
//! A native transfer is a single system instruction; a USDC transfer
//! prepends an idempotent destination-account creation so the recipient
//! needs no prior token account.

use passpay_core::currency::Currency;
use passpay_core::format::is_valid_address;
use passpay_core::ValidationError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    /// Direct native-coin transfer, amount in lamports.
    SystemTransfer {
        from: String,
        to: String,
        lamports: u64,
    },
    /// Create the recipient's associated token account if it does not
    /// exist yet; succeeds silently when it already does.
    CreateAtaIdempotent {
        payer: String,
        owner: String,
        mint: String,
    },
    /// Token transfer between the parties' associated token accounts,
    /// amount in base units.
    TokenTransfer {
        source_owner: String,
        destination_owner: String,
        mint: String,
        base_units: u64,
    },
}

/// Build the instruction set for one transfer. Validates both addresses
/// and the amount before anything reaches the wallet.
pub fn build_transfer(
    from: &str,
    to: &str,
    amount: f64,
    currency: Currency,
    usdc_mint: &str,
) -> Result<Vec<Instruction>, ValidationError> {
    if !(amount > 0.0) {
        return Err(ValidationError::NonPositiveAmount);
    }
    if !is_valid_address(from) || !is_valid_address(to) {
        return Err(ValidationError::InvalidAddress);
    }

    let base_units = currency.to_base_units(amount);
    let instructions = match currency {
        Currency::Sol => vec![Instruction::SystemTransfer {
            from: from.to_string(),
            to: to.to_string(),
            lamports: base_units,
        }],
        Currency::Usdc => vec![
            Instruction::CreateAtaIdempotent {
                payer: from.to_string(),
                owner: to.to_string(),
                mint: usdc_mint.to_string(),
            },
            Instruction::TokenTransfer {
                source_owner: from.to_string(),
                destination_owner: to.to_string(),
                mint: usdc_mint.to_string(),
                base_units,
            },
        ],
    };
    Ok(instructions)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FROM: &str = "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU";
    const TO: &str = "So11111111111111111111111111111111111111112";
    const MINT: &str = "Gh9ZwEmdLJ8DscKNTkTqPbNwLNNBjuSzaG9Vp2KGtKJr";

    #[test]
    fn sol_transfer_is_one_system_instruction() {
        let ixs = build_transfer(FROM, TO, 1.5, Currency::Sol, MINT).unwrap();
        assert_eq!(
            ixs,
            vec![Instruction::SystemTransfer {
                from: FROM.to_string(),
                to: TO.to_string(),
                lamports: 1_500_000_000,
            }]
        );
    }

    #[test]
    fn usdc_transfer_prepends_ata_creation() {
        let ixs = build_transfer(FROM, TO, 10.0, Currency::Usdc, MINT).unwrap();
        assert_eq!(ixs.len(), 2);
        assert!(matches!(&ixs[0], Instruction::CreateAtaIdempotent { owner, .. } if owner == TO));
        assert!(matches!(
            &ixs[1],
            Instruction::TokenTransfer { base_units, .. } if *base_units == 10_000_000
        ));
    }

    #[test]
    fn rejects_invalid_input_before_any_wallet_call() {
        assert_eq!(
            build_transfer(FROM, TO, 0.0, Currency::Sol, MINT),
            Err(ValidationError::NonPositiveAmount)
        );
        assert_eq!(
            build_transfer("bad", TO, 1.0, Currency::Sol, MINT),
            Err(ValidationError::InvalidAddress)
        );
        assert_eq!(
            build_transfer(FROM, "bad", 1.0, Currency::Sol, MINT),
            Err(ValidationError::InvalidAddress)
        );
    }
}
