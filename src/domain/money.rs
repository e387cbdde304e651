use crate::error::PortalError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A monetary amount in the ledger currency.
///
/// Wraps `rust_decimal::Decimal` so premiums and commissions never go through
/// floating point. Negative values are allowed: reconciliation differences
/// routinely go below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(pub Decimal);

impl Money {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Builds an amount that must not be negative, e.g. a premium.
    pub fn non_negative(value: Decimal, field: &str) -> Result<Self, PortalError> {
        if value >= Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(PortalError::ValidationError(format!(
                "{field} must not be negative"
            )))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn checked_add(self, rhs: Self) -> Result<Self, PortalError> {
        self.0.checked_add(rhs.0).map(Self).ok_or_else(out_of_range)
    }

    pub fn checked_sub(self, rhs: Self) -> Result<Self, PortalError> {
        self.0.checked_sub(rhs.0).map(Self).ok_or_else(out_of_range)
    }

    /// `self × pct / 100`
    pub fn percent(self, pct: Percentage) -> Result<Self, PortalError> {
        self.0
            .checked_mul(pct.fraction())
            .map(Self)
            .ok_or_else(out_of_range)
    }

    /// Rounded to cents for display and export, without trailing zeros.
    pub fn rounded(&self) -> Decimal {
        self.0.round_dp(2).normalize()
    }
}

fn out_of_range() -> PortalError {
    PortalError::ValidationError("Amount is out of range".to_string())
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rounded())
    }
}

/// A commission rate expressed in the 0–100 range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Percentage(Decimal);

impl Percentage {
    pub fn new(value: Decimal) -> Result<Self, PortalError> {
        if value >= Decimal::ZERO && value <= Decimal::ONE_HUNDRED {
            Ok(Self(value))
        } else {
            Err(PortalError::ValidationError(format!(
                "Commission percentage must be between 0 and 100, got {value}"
            )))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn fraction(&self) -> Decimal {
        self.0 / Decimal::ONE_HUNDRED
    }
}

impl From<Percentage> for Decimal {
    fn from(pct: Percentage) -> Self {
        pct.0
    }
}

impl TryFrom<Decimal> for Percentage {
    type Error = PortalError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
