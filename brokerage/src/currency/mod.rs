use rust_decimal::Decimal;
use rusty_money::{iso, Money};
use serde::{Serialize, Serializer};
use thiserror::Error;

use std::str::FromStr;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CurrencyError {
    #[error("CurrencyError - Malformed: '{0}' is not a decimal number")]
    Malformed(String),
    #[error("CurrencyError - TooPrecise: {0} has more than {1} decimal places")]
    TooPrecise(Decimal, u32),
    #[error("CurrencyError - Negative: {0}")]
    Negative(Decimal),
}

fn parse_decimal(s: &str) -> Result<Decimal, CurrencyError> {
    Decimal::from_str(s.trim()).map_err(|_| CurrencyError::Malformed(s.to_string()))
}

fn check(value: Decimal, places: u32) -> Result<Decimal, CurrencyError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(CurrencyError::Negative(value));
    }
    let normalized = value.normalize();
    if normalized.scale() > places {
        return Err(CurrencyError::TooPrecise(value, places));
    }
    Ok(normalized)
}

/// Non-negative US dollar amount held at cent precision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, sqlx::Type)]
#[sqlx(transparent)]
pub struct UsdAmount(Decimal);

impl UsdAmount {
    pub const DECIMAL_PLACES: u32 = 2;

    pub fn zero() -> Self {
        Self::with_scale(Decimal::ZERO)
    }

    pub fn try_new(value: Decimal) -> Result<Self, CurrencyError> {
        Ok(Self::with_scale(check(value, Self::DECIMAL_PLACES)?))
    }

    /// Rounds half-to-even onto the cent grid.
    pub fn rounded(value: Decimal) -> Result<Self, CurrencyError> {
        Self::try_new(value.round_dp(Self::DECIMAL_PLACES))
    }

    fn with_scale(mut value: Decimal) -> Self {
        value.rescale(Self::DECIMAL_PLACES);
        Self(value)
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Price of `quantity` shares at `self` per share, rounded to cents.
    pub fn times(&self, quantity: ShareQuantity) -> Option<UsdAmount> {
        self.0
            .checked_mul(quantity.0)
            .map(|total| Self::with_scale(total.round_dp(Self::DECIMAL_PLACES)))
    }

    pub fn checked_add(&self, other: UsdAmount) -> Option<UsdAmount> {
        self.0.checked_add(other.0).map(Self::with_scale)
    }

    /// `None` when the result would go below zero.
    pub fn checked_sub(&self, other: UsdAmount) -> Option<UsdAmount> {
        if other.0 > self.0 {
            return None;
        }
        Some(Self::with_scale(self.0 - other.0))
    }
}

impl std::fmt::Display for UsdAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Money::from_decimal(self.0, iso::USD))
    }
}

impl FromStr for UsdAmount {
    type Err = CurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_new(parse_decimal(s)?)
    }
}

impl TryFrom<Decimal> for UsdAmount {
    type Error = CurrencyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::try_new(value)
    }
}

impl From<UsdAmount> for Decimal {
    fn from(amount: UsdAmount) -> Self {
        amount.0
    }
}

impl Serialize for UsdAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut value = self.0;
        value.rescale(Self::DECIMAL_PLACES);
        serializer.serialize_str(&value.to_string())
    }
}

/// Non-negative number of shares, fractional down to 1/10_000.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, sqlx::Type)]
#[sqlx(transparent)]
pub struct ShareQuantity(Decimal);

impl ShareQuantity {
    pub const DECIMAL_PLACES: u32 = 4;

    pub fn try_new(value: Decimal) -> Result<Self, CurrencyError> {
        Ok(Self(check(value, Self::DECIMAL_PLACES)?))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(&self, other: ShareQuantity) -> Option<ShareQuantity> {
        self.0.checked_add(other.0).map(|v| Self(v.normalize()))
    }

    /// `None` when the result would go below zero.
    pub fn checked_sub(&self, other: ShareQuantity) -> Option<ShareQuantity> {
        if other.0 > self.0 {
            return None;
        }
        Some(Self((self.0 - other.0).normalize()))
    }
}

impl std::fmt::Display for ShareQuantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl FromStr for ShareQuantity {
    type Err = CurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_new(parse_decimal(s)?)
    }
}

impl TryFrom<Decimal> for ShareQuantity {
    type Error = CurrencyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::try_new(value)
    }
}

impl Serialize for ShareQuantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.normalize().to_string())
    }
}
