//! Currency amounts.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// Largest accepted amount, in cents (ten trillion currency units).
const MAX_CENTS: f64 = 1e15;

/// Non-negative amount of money in the smallest currency unit (cents).
///
/// Decimal input is converted once, at the boundary, with half-up rounding to
/// two decimal places. All arithmetic after that is exact.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(u64);

impl ValueObject for Money {}

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    pub const fn cents(self) -> u64 {
        self.0
    }

    /// Convert a decimal amount (e.g. `79.99`) into cents.
    ///
    /// `field` names the offending input in the returned validation error.
    pub fn from_decimal(field: &str, amount: f64) -> DomainResult<Self> {
        if !amount.is_finite() {
            return Err(DomainError::validation(field, "must be a finite number"));
        }
        if amount < 0.0 {
            return Err(DomainError::validation(field, "must not be negative"));
        }

        // Strip binary representation noise (1.005 * 100 = 100.49999...) before
        // rounding half-up to whole cents.
        let scaled = ((amount * 100.0) * 1e6).round() / 1e6;
        let cents = scaled.round();
        if cents > MAX_CENTS {
            return Err(DomainError::validation(field, "is too large"));
        }

        Ok(Self(cents as u64))
    }

    /// Decimal representation, for presentation only.
    pub fn to_decimal(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// `self × quantity`, or `None` on overflow.
    pub fn checked_times(self, quantity: u32) -> Option<Self> {
        self.0.checked_mul(u64::from(quantity)).map(Self)
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}
