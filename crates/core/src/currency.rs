use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// SOL has 9 decimals (lamports), USDC has 6.
pub const SOL_DECIMALS: u32 = 9;
pub const USDC_DECIMALS: u32 = 6;

/// The currency units this ledger records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    #[serde(rename = "SOL")]
    Sol,
    #[serde(rename = "USDC")]
    Usdc,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Sol => "SOL",
            Currency::Usdc => "USDC",
        }
    }

    pub fn decimals(&self) -> u32 {
        match self {
            Currency::Sol => SOL_DECIMALS,
            Currency::Usdc => USDC_DECIMALS,
        }
    }

    /// Convert a human-readable amount to base units (lamports for SOL),
    /// flooring any fraction of a base unit.
    pub fn to_base_units(&self, amount: f64) -> u64 {
        (amount * 10f64.powi(self.decimals() as i32)).floor() as u64
    }

    pub fn from_base_units(&self, base_units: u64) -> f64 {
        base_units as f64 / 10f64.powi(self.decimals() as i32)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Currency {
    type Err = UnknownCurrency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SOL" => Ok(Currency::Sol),
            "USDC" => Ok(Currency::Usdc),
            other => Err(UnknownCurrency(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown currency: {0}")]
pub struct UnknownCurrency(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_unit_conversion_floors() {
        assert_eq!(Currency::Sol.to_base_units(1.0), 1_000_000_000);
        assert_eq!(Currency::Usdc.to_base_units(10.0), 10_000_000);
        // 0.0000000015 SOL is 1.5 lamports; fractional lamports are floored
        assert_eq!(Currency::Sol.to_base_units(0.000_000_001_5), 1);
        assert_eq!(Currency::Usdc.from_base_units(2_500_000), 2.5);
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("sol".parse::<Currency>().unwrap(), Currency::Sol);
        assert_eq!("USDC".parse::<Currency>().unwrap(), Currency::Usdc);
        assert!("BTC".parse::<Currency>().is_err());
    }
}
