//! Chilean peso amounts.
//!
//! The storefront only ever prices in CLP, which has no minor unit in
//! circulation. Amounts are therefore whole pesos; anything fractional coming
//! from the backend is rounded once at the boundary (see [`Clp::from_decimal`])
//! so that all downstream arithmetic is exact integer arithmetic.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// An amount of Chilean pesos.
///
/// Displays with `es-CL` conventions: a `$` prefix, `.` as the thousands
/// separator and no decimals.
///
/// ```
/// use hazel_lab_core::Clp;
///
/// assert_eq!(Clp::new(103_990).to_string(), "$103.990");
/// assert_eq!(Clp::ZERO.to_string(), "$0");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Clp(i64);

impl Clp {
    /// Zero pesos.
    pub const ZERO: Self = Self(0);

    /// Create an amount from whole pesos.
    #[must_use]
    pub const fn new(pesos: i64) -> Self {
        Self(pesos)
    }

    /// Whole pesos.
    #[must_use]
    pub const fn pesos(self) -> i64 {
        self.0
    }

    /// Convert a decimal amount, rounding half away from zero to whole pesos.
    ///
    /// Returns `None` if the rounded value does not fit in an `i64`.
    #[must_use]
    pub fn from_decimal(amount: Decimal) -> Option<Self> {
        amount
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .map(Self)
    }

    /// Multiply by a quantity, saturating at the numeric bounds.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(i64::from(quantity)))
    }

    /// Returns `true` if the amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl Add for Clp {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Clp {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl From<i64> for Clp {
    fn from(pesos: i64) -> Self {
        Self(pesos)
    }
}

impl fmt::Display for Clp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }

        if self.0 < 0 {
            write!(f, "-${grouped}")
        } else {
            write!(f, "${grouped}")
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Clp::new(0).to_string(), "$0");
        assert_eq!(Clp::new(990).to_string(), "$990");
        assert_eq!(Clp::new(3_990).to_string(), "$3.990");
        assert_eq!(Clp::new(103_990).to_string(), "$103.990");
        assert_eq!(Clp::new(1_234_567).to_string(), "$1.234.567");
    }

    #[test]
    fn test_display_negative() {
        assert_eq!(Clp::new(-1_000).to_string(), "-$1.000");
    }

    #[test]
    fn test_from_decimal_rounds_half_away_from_zero() {
        let half = Decimal::from_str("49990.5").unwrap();
        assert_eq!(Clp::from_decimal(half), Some(Clp::new(49_991)));

        let below = Decimal::from_str("49990.49").unwrap();
        assert_eq!(Clp::from_decimal(below), Some(Clp::new(49_990)));
    }

    #[test]
    fn test_times_and_sum() {
        let lines = [Clp::new(50_000).times(2), Clp::new(1_990).times(3)];
        let total: Clp = lines.into_iter().sum();
        assert_eq!(total, Clp::new(105_970));
    }

    #[test]
    fn test_times_saturates() {
        assert_eq!(Clp::new(i64::MAX).times(2), Clp::new(i64::MAX));
    }

    #[test]
    fn test_serde_transparent() {
        assert_eq!(serde_json::to_string(&Clp::new(3990)).unwrap(), "3990");
    }
}
