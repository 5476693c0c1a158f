//! Exact monetary amounts.
//!
//! Fare and rental prices must compare exactly — three 3.40 tickets cost
//! precisely 10.20, and the fare engine's choice between ticket
//! combinations hinges on such comparisons. Amounts are therefore stored
//! in minor units (cents) of the deployment currency rather than as
//! floating point.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// A monetary amount in minor units (one hundredth of the major unit).
///
/// # Examples
///
/// ```
/// use journey_core::domain::Money;
///
/// let single = Money::from_cents(340);
/// assert_eq!(single * 3, Money::from_cents(1020));
/// assert_eq!((single * 3).to_string(), "10.20");
/// assert_eq!(Money::from_major(-1).to_string(), "-1.00");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Amount from minor units.
    pub const fn from_cents(cents: i64) -> Money {
        Money(cents)
    }

    /// Amount from whole major units.
    pub const fn from_major(major: i64) -> Money {
        Money(major * 100)
    }

    /// The amount in minor units.
    pub const fn cents(self) -> i64 {
        self.0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// The amount as a floating point number of major units. Only for
    /// feeding into scalar search weights — never for price comparisons.
    pub fn as_major_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn min(self, other: Money) -> Money {
        Money(self.0.min(other.0))
    }

    pub fn max(self, other: Money) -> Money {
        Money(self.0.max(other.0))
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl Mul<i64> for Money {
    type Output = Money;

    fn mul(self, rhs: i64) -> Money {
        Money(self.0 * rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}
