//! Decimal money amounts and minor-unit conversion.
//!
//! `MoneyAmount` is adapted from the teacher's `util/money_amount.rs`: a
//! validated, human-readable decimal used for `max_budget_usdc` and
//! `bid_price_usdc`. Minor units (the smallest indivisible on-chain
//! denomination) are plain `u64`, matching `PaymentChallenge::amount_minor`.

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MoneyAmount(#[serde(with = "decimal_as_string")] pub Decimal);

#[derive(Debug, thiserror::Error)]
pub enum MoneyAmountError {
    #[error("invalid decimal amount")]
    InvalidFormat,
    #[error("amount must be positive")]
    NotPositive,
    #[error("amount exceeds the maximum representable value")]
    OutOfRange,
}

impl MoneyAmount {
    pub fn parse(input: &str) -> Result<Self, MoneyAmountError> {
        let parsed = Decimal::from_str(input.trim()).map_err(|_| MoneyAmountError::InvalidFormat)?;
        Self::from_decimal(parsed)
    }

    fn from_decimal(parsed: Decimal) -> Result<Self, MoneyAmountError> {
        if parsed.is_sign_negative() || parsed.is_zero() {
            return Err(MoneyAmountError::NotPositive);
        }
        Ok(MoneyAmount(parsed))
    }

    /// Converts to the integer minor-unit representation for a token with
    /// `decimals` places (e.g. 6 for USDC).
    pub fn to_minor_units(self, decimals: u32) -> Option<u64> {
        let scaled = self.0 * Decimal::from(10u64.pow(decimals));
        scaled.to_u64()
    }

    pub fn from_minor_units(minor: u64, decimals: u32) -> Self {
        let value = Decimal::from(minor) / Decimal::from(10u64.pow(decimals));
        MoneyAmount(value)
    }
}

impl TryFrom<f64> for MoneyAmount {
    type Error = MoneyAmountError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        let decimal = Decimal::from_f64(value).ok_or(MoneyAmountError::OutOfRange)?;
        Self::from_decimal(decimal)
    }
}

impl FromStr for MoneyAmount {
    type Err = MoneyAmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MoneyAmount::parse(s)
    }
}

impl fmt::Display for MoneyAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

mod decimal_as_string {
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.normalize().to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Decimal::from_str(&s).map_err(serde::de::Error::custom)
    }
}
