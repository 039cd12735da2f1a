//! Monetary amounts.
//!
//! Amounts are held as a count of minor units (cents) so that balance
//! predicates such as `balance >= price` are exact both in Rust and in the
//! database. At the edges they are exchanged as decimal numbers.

use std::fmt;

use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::{Error, Result};

/// Number of fractional digits carried by an [`Amount`].
pub const SCALE: u32 = 2;

/// A monetary amount in minor units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(i64);

impl Amount {
  pub const ZERO: Amount = Amount(0);

  pub const fn from_minor(minor: i64) -> Self { Amount(minor) }

  pub const fn minor(self) -> i64 { self.0 }

  /// Exact conversion from a decimal. Fails on sub-cent precision or when the
  /// value does not fit.
  pub fn from_decimal(value: Decimal) -> Result<Self> {
    if value.round_dp(SCALE) != value {
      return Err(Error::InvalidAmount);
    }
    let minor = value
      .checked_mul(Decimal::ONE_HUNDRED)
      .and_then(|v| v.to_i64())
      .ok_or(Error::InvalidAmount)?;
    Ok(Amount(minor))
  }

  pub fn to_decimal(self) -> Decimal { Decimal::new(self.0, SCALE) }

  pub fn is_positive(self) -> bool { self.0 > 0 }

  pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
    self.0.checked_add(rhs.0).map(Amount)
  }

  pub fn checked_sub(self, rhs: Amount) -> Option<Amount> {
    self.0.checked_sub(rhs.0).map(Amount)
  }
}

impl fmt::Display for Amount {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.to_decimal())
  }
}

impl std::iter::Sum for Amount {
  fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
    Amount(iter.map(|a| a.0).sum())
  }
}

impl Serialize for Amount {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let value = self.to_decimal();
    if value.fract().is_zero() {
      serializer.serialize_i64(self.0 / 100)
    } else {
      serializer.serialize_f64(value.to_f64().unwrap_or_default())
    }
  }
}

impl<'de> Deserialize<'de> for Amount {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let value = <Decimal as Deserialize>::deserialize(deserializer)?;
    Amount::from_decimal(value).map_err(de::Error::custom)
  }
}

#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use super::*;

  fn dec(s: &str) -> Decimal { Decimal::from_str(s).unwrap() }

  #[test]
  fn converts_two_decimal_places_exactly() {
    assert_eq!(Amount::from_decimal(dec("231.11")).unwrap().minor(), 23111);
    assert_eq!(Amount::from_decimal(dec("1.3")).unwrap().minor(), 130);
    assert_eq!(Amount::from_decimal(dec("8")).unwrap().minor(), 800);
  }

  #[test]
  fn rejects_sub_cent_precision() {
    assert!(matches!(
      Amount::from_decimal(dec("0.001")),
      Err(Error::InvalidAmount)
    ));
  }

  #[test]
  fn rejects_out_of_range() {
    assert!(Amount::from_decimal(Decimal::MAX).is_err());
  }

  #[test]
  fn deserializes_from_json_numbers() {
    let amount: Amount = serde_json::from_str("231.11").unwrap();
    assert_eq!(amount.minor(), 23111);
    let amount: Amount = serde_json::from_str("8").unwrap();
    assert_eq!(amount.minor(), 800);
    assert!(serde_json::from_str::<Amount>("0.001").is_err());
  }

  #[test]
  fn displays_as_decimal() {
    assert_eq!(Amount::from_minor(8000).to_string(), "80.00");
    assert_eq!(Amount::from_minor(5).to_string(), "0.05");
  }
}
