//! Fixed-point money type used for every balance and share.
//!
//! Values are stored at 4 decimal places so that equal splits keep sub-cent
//! precision; rendering and settlement comparisons round to the precision
//! policy's scale instead.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

/// A monetary amount held at exactly 4 decimal places.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use trip_settle::Money;
///
/// let amount = Money::from_str("10.5").unwrap();
/// assert_eq!(amount.to_string(), "10.50");
/// assert_eq!(amount.split_evenly(3).format(4), "3.5000");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(Decimal);

impl Money {
    /// Storage scale.
    pub const SCALE: u32 = 4;

    /// Scale used by `Display`.
    pub const DISPLAY_SCALE: u32 = 2;

    /// Zero value.
    pub const ZERO: Self = Money(Decimal::ZERO);

    /// Creates a new `Money` from a `Decimal`, normalizing to 4 decimal places.
    pub fn new(value: Decimal) -> Self {
        let mut normalized = value;
        normalized.rescale(Self::SCALE);
        if normalized.is_zero() {
            // drop the sign of a negative zero
            return Self::ZERO;
        }
        Money(normalized)
    }

    /// Creates an amount from a whole number of minor units (cents).
    pub fn from_cents(cents: i64) -> Self {
        Money::new(Decimal::new(cents, 2))
    }

    /// The smallest amount representable at `scale` decimal places.
    pub fn unit(scale: u32) -> Self {
        Money::new(Decimal::new(1, scale))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns `true` if this value is strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Returns `true` if this value is strictly less than zero.
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Rounds to `scale` decimal places, halves away from zero.
    pub fn round(&self, scale: u32) -> Self {
        Money::new(
            self.0
                .round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Divides the amount into `count` equal parts. Zero parts yield zero.
    pub fn split_evenly(&self, count: usize) -> Self {
        if count == 0 {
            return Self::ZERO;
        }
        Money::new(self.0 / Decimal::from(count))
    }

    /// Splits the amount in proportion to `weights` so that the parts add up
    /// to exactly `self` at storage scale.
    ///
    /// Each part is first truncated to 4 decimal places; the units lost that
    /// way are then handed out one at a time to the positively weighted
    /// parts, in order. A zero total weight yields all zeros.
    pub fn allocate(&self, weights: &[Decimal]) -> Vec<Money> {
        let total: Decimal = weights.iter().copied().sum();
        if total.is_zero() {
            return vec![Money::ZERO; weights.len()];
        }

        let mut parts: Vec<Money> = weights
            .iter()
            .map(|w| {
                Money::new(
                    (self.0 * *w / total)
                        .round_dp_with_strategy(Self::SCALE, RoundingStrategy::ToZero),
                )
            })
            .collect();

        let mut remaining = *self - parts.iter().sum::<Money>();
        let unit = if remaining.is_negative() {
            -Money::unit(Self::SCALE)
        } else {
            Money::unit(Self::SCALE)
        };
        let eligible: Vec<usize> = (0..weights.len())
            .filter(|&idx| weights[idx] > Decimal::ZERO)
            .collect();

        for idx in eligible.into_iter().cycle() {
            if remaining.is_zero() {
                break;
            }
            parts[idx] += unit;
            remaining -= unit;
        }

        parts
    }

    /// Renders the amount rounded to `scale` decimal places.
    pub fn format(&self, scale: u32) -> String {
        let rounded = self.round(scale);
        format!("{:.*}", scale as usize, rounded.0)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        let decimal = Decimal::from_str(trimmed)?;
        Ok(Money::new(decimal))
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Money::new(value)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(Self::DISPLAY_SCALE))
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Money::new(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Money::new(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Money::new(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
