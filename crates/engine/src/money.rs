use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::EngineError;

/// Largest magnitude a stored amount may have, in minor units.
///
/// Amounts are persisted with `DECIMAL(12,2)` semantics: ten integer digits and
/// two fractional digits.
pub const MAX_ABS_MINOR: i64 = 999_999_999_999;

/// Signed ledger amount represented as **integer minor units** (cents).
///
/// Every monetary value in the engine (expense amounts, day totals, statistic
/// sums) goes through this type, so summation is exact.
///
/// The value is signed:
/// - positive = expense
/// - negative = income
///
/// # Examples
///
/// ```rust
/// use engine::Amount;
///
/// let amount = Amount::from_minor(-194_270);
/// assert_eq!(amount.minor(), -194_270);
/// assert_eq!(amount.to_string(), "-1942.70");
/// ```
///
/// Parsing from user input (accepts `.` or `,` as decimal separator; rejects >
/// 2 decimals):
///
/// ```rust
/// use engine::Amount;
///
/// assert_eq!("45.3".parse::<Amount>().unwrap().minor(), 4530);
/// assert_eq!("-2000,00".parse::<Amount>().unwrap().minor(), -200_000);
/// assert!("12.345".parse::<Amount>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    /// Creates a new amount from integer minor units.
    #[must_use]
    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// Returns the raw value in minor units.
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    /// Returns the amount if it fits the stored precision.
    pub fn ensure_storable(self) -> Result<Self, EngineError> {
        if self.0.unsigned_abs() > MAX_ABS_MINOR.unsigned_abs() {
            return Err(EngineError::InvalidAmount(format!(
                "{self} exceeds the storable range"
            )));
        }
        Ok(self)
    }

    /// Sums amounts exactly, failing instead of wrapping.
    pub fn try_sum<I>(amounts: I) -> Result<Self, EngineError>
    where
        I: IntoIterator<Item = Amount>,
    {
        amounts.into_iter().try_fold(Amount::ZERO, |acc, amount| {
            acc.checked_add(amount)
                .ok_or_else(|| EngineError::InvalidAmount("sum overflow".to_string()))
        })
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let units = abs / 100;
        let cents = abs % 100;
        write!(f, "{sign}{units}.{cents:02}")
    }
}

impl FromStr for Amount {
    type Err = EngineError;

    /// Parses a decimal string into minor units.
    ///
    /// Accepts `.` or `,` as decimal separator and an optional leading `+`/`-`.
    ///
    /// Validation rules:
    /// - max 2 fractional digits (rejects `12.345`)
    /// - rejects empty/invalid strings
    /// - rejects values outside the storable range
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidAmount(format!("'{}' is not a decimal", s.trim()));
        let overflow = || EngineError::InvalidAmount("amount too large".to_string());

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(EngineError::InvalidAmount("empty amount".to_string()));
        }

        let (negative, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
            (true, stripped)
        } else if let Some(stripped) = trimmed.strip_prefix('+') {
            (false, stripped)
        } else {
            (false, trimmed)
        };

        let rest = rest.replace(',', ".");
        let mut parts = rest.split('.');
        let units_str = parts.next().ok_or_else(invalid)?;
        let frac_str = parts.next();

        if parts.next().is_some() {
            return Err(invalid());
        }
        if units_str.is_empty() || !units_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let units: i64 = units_str.parse().map_err(|_| overflow())?;

        let cents: i64 = match frac_str {
            None => 0,
            Some(frac) => {
                if frac.is_empty() || !frac.chars().all(|c| c.is_ascii_digit()) {
                    return Err(invalid());
                }
                match frac.len() {
                    1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
                    2 => frac.parse::<i64>().map_err(|_| invalid())?,
                    _ => {
                        return Err(EngineError::InvalidAmount(format!(
                            "'{trimmed}' has more than 2 decimals"
                        )));
                    }
                }
            }
        };

        let total = units
            .checked_mul(100)
            .and_then(|v| v.checked_add(cents))
            .ok_or_else(overflow)?;
        let signed = if negative { -total } else { total };

        Amount(signed).ensure_storable()
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
