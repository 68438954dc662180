use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;

/// GST-inclusive totals carry 1/11 of their value as GST (10% on top of the net amount).
pub const GST_INCLUSIVE_DIVISOR: i64 = 11;

/// An amount of Australian currency held as whole cents.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    pub fn to_cents(self) -> i64 {
        self.0
    }

    /// Rounds half away from zero to the nearest cent. `None` when the value
    /// does not fit in `i64` cents.
    pub fn from_decimal(decimal: Decimal) -> Option<Self> {
        decimal
            .checked_mul(Decimal::from(100))?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .map(Money)
    }

    pub fn zero() -> Self {
        Money(0)
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// The GST component of a GST-inclusive amount, `round(total / 11)`.
    pub fn gst_component(self) -> Money {
        // i128 so that doubling never overflows; the result is at most |total| / 11.
        let divisor = i128::from(GST_INCLUSIVE_DIVISOR);
        let magnitude = (i128::from(self.0).abs() * 2 + divisor) / (divisor * 2);
        Money((magnitude as i64) * self.0.signum())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}${}.{:02}", abs / 100, abs % 100)
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Money(self.0 - rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::zero(), |a, b| a + b)
    }
}

// ── Parsing ───────────────────────────────────────────────────────────────────

const CURRENCY_SYMBOLS: [char; 4] = ['$', '£', '€', '¥'];

/// Parses a free-form currency string into cents.
///
/// Accepts currency symbols, thousands separators, a leading minus or
/// accounting parentheses for negatives. Returns `None` for blank input or
/// anything that is not a number once the decoration is removed, so callers
/// can tell "absent" apart from zero.
pub fn parse_currency(raw: &str) -> Option<i64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !CURRENCY_SYMBOLS.contains(c) && *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let (wrapped, body) = match cleaned
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
    {
        Some(inner) => (true, inner),
        None => (false, cleaned.as_str()),
    };
    let (minus, body) = match body.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, body),
    };
    if body.is_empty() || body.starts_with(['-', '+', '(']) {
        return None;
    }

    let value = Decimal::from_str(body).ok()?;
    let cents = Money::from_decimal(value)?.to_cents();
    Some(if wrapped || minus { -cents } else { cents })
}

/// Parses a business-use percentage into a whole number in `0..=100`.
///
/// Blank or unreadable input means full business use. A bare value in
/// `(0, 1]` without a `%` sign is read as a fraction.
pub fn parse_percentage(raw: &str) -> u8 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 100;
    }

    let (body, explicit) = match trimmed.strip_suffix('%') {
        Some(body) => (body.trim(), true),
        None => (trimmed, false),
    };
    let Ok(mut value) = Decimal::from_str(body) else {
        return 100;
    };

    if !explicit && value > Decimal::ZERO && value <= Decimal::ONE {
        value *= Decimal::from(100);
    }

    value
        .clamp(Decimal::ZERO, Decimal::from(100))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u8()
        .unwrap_or(100)
}
