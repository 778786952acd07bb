//! Fixed-point money in integer minor units (two decimal places).
//!
//! Inputs arrive as `rust_decimal::Decimal`, strings or `f64`. Each is checked
//! for two-decimal precision once, at the boundary; everything after that is
//! integer arithmetic on [`Cents`].

use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

/// A signed amount in minor units (hundredths).
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use settlement_ledger::Cents;
///
/// let amount = Cents::from_str("10.5").unwrap();
/// assert_eq!(amount.minor(), 1050);
/// assert_eq!(amount.to_string(), "10.50");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Cents(i64);

impl Cents {
    /// The number of decimal places represented.
    pub const SCALE: u32 = 2;

    /// Zero value.
    pub const ZERO: Self = Cents(0);

    /// Creates a value from a raw minor-unit count.
    pub const fn new(minor: i64) -> Self {
        Cents(minor)
    }

    /// Returns the raw minor-unit count.
    pub const fn minor(self) -> i64 {
        self.0
    }

    /// Returns `true` if this value is zero.
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if this value is strictly negative.
    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Returns `true` if this value is strictly positive.
    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Absolute value.
    pub fn abs(self) -> Self {
        Cents(self.0.abs())
    }

    /// Addition that returns `None` instead of overflowing.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Cents)
    }

    /// Negation that returns `None` for the one value with no positive counterpart.
    pub fn checked_neg(self) -> Option<Self> {
        self.0.checked_neg().map(Cents)
    }

    /// Sums `values`, failing with `AmountInvalid` if the total leaves the `i64` range.
    ///
    /// Use this for totals over stored movements; the operators panic on overflow.
    pub fn try_sum<I>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = Cents>,
    {
        values.into_iter().try_fold(Cents::ZERO, |total, value| {
            total
                .checked_add(value)
                .ok_or_else(|| out_of_range(total, value))
        })
    }

    /// Converts a decimal with at most two fractional digits.
    ///
    /// Trailing zeros do not count towards precision, so `"1.500"` is accepted.
    pub fn from_decimal(value: Decimal) -> Result<Self> {
        let normalized = value.normalize();
        if normalized.scale() > Self::SCALE {
            return Err(invalid(value, "more than two decimal places"));
        }

        let mut scaled = normalized;
        scaled.rescale(Self::SCALE);
        i64::try_from(scaled.mantissa())
            .map(Cents)
            .map_err(|_| invalid(value, "out of range"))
    }

    /// Converts a float, rejecting values that are not representable in
    /// two decimal places.
    ///
    /// A residue below `0.0001` of a minor unit is treated as binary
    /// floating-point noise (`0.29 * 100.0 == 28.999999999999996`).
    pub fn from_f64(value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(LedgerError::AmountInvalid {
                amount: value.to_string(),
                reason: "not a finite number",
            });
        }

        let scaled = value * 100.0;
        let rounded = scaled.round();
        if (scaled - rounded).abs() >= 1e-4 {
            return Err(LedgerError::AmountInvalid {
                amount: value.to_string(),
                reason: "more than two decimal places",
            });
        }
        if rounded.abs() >= i64::MAX as f64 {
            return Err(LedgerError::AmountInvalid {
                amount: value.to_string(),
                reason: "out of range",
            });
        }

        Ok(Cents(rounded as i64))
    }

    /// Returns the value as a two-decimal `Decimal`.
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, Self::SCALE)
    }
}

fn invalid(value: Decimal, reason: &'static str) -> LedgerError {
    LedgerError::AmountInvalid {
        amount: value.to_string(),
        reason,
    }
}

pub(crate) fn out_of_range(total: Cents, value: Cents) -> LedgerError {
    LedgerError::AmountInvalid {
        amount: format!("{} + {}", total, value),
        reason: "total out of range",
    }
}

impl FromStr for Cents {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let decimal = Decimal::from_str(trimmed).map_err(|_| LedgerError::AmountInvalid {
            amount: trimmed.to_string(),
            reason: "not a decimal number",
        })?;
        Cents::from_decimal(decimal)
    }
}

impl fmt::Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

impl Add for Cents {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Cents(self.0 + rhs.0)
    }
}

impl AddAssign for Cents {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Cents {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Cents(self.0 - rhs.0)
    }
}

impl SubAssign for Cents {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Cents {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Cents(-self.0)
    }
}

impl Sum for Cents {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Cents::ZERO, Add::add)
    }
}

impl Serialize for Cents {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Cents {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Cents::from_str(&s).map_err(serde::de::Error::custom)
    }
}
