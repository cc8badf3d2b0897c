//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    0.1 + 0.2 = 0.30000000000000004                                      │
//! │                                                                         │
//! │  An order-level gift keyed on "subtotal >= 5000.00" must never flip     │
//! │  because a sum landed on 4999.9999999.                                  │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units (cents / paisa)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use fieldorder_core::money::Money;
//!
//! let unit = Money::from_cents(1099);
//! let line = unit.multiply_quantity(3);
//! assert_eq!(line.cents(), 3297);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Where Money is Used
/// ```text
/// Product.trade_price_cents ──► OrderLine.unit_price ──► OrderLine.amount
///                                                            │
///                               OrderSummary.subtotal ◄──────┘
///                                        │
///                                        ▼
///                          order-level gift threshold check
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ```rust
    /// use fieldorder_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Multiplies a unit price by a quantity, saturating at the `i64` bounds.
    ///
    /// ```rust
    /// use fieldorder_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Difference clamped at zero. Used for "spend X more to unlock" hints.
    ///
    /// ```rust
    /// use fieldorder_core::money::Money;
    ///
    /// let target = Money::from_cents(5000);
    /// assert_eq!(target.shortfall_from(Money::from_cents(3500)).cents(), 1500);
    /// assert_eq!(target.shortfall_from(Money::from_cents(9000)).cents(), 0);
    /// ```
    #[inline]
    pub fn shortfall_from(&self, reached: Money) -> Money {
        Money(self.0.saturating_sub(reached.0).max(0))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-oriented display. The order screens do their own localized formatting.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.dollars().abs(), self.cents_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

/// Arithmetic saturates: catalog prices are not validated, and an absurd
/// price must not take the order screen down.
impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
