//! Fare calculation.
//!
//! Prices are whole currency units. The fee rate is expressed in basis points
//! so that the fee is an exact integer floor of `price × rate`.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Per-kilometre tariff with a minimum fare and a platform fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tariff {
  pub base_rate:        i64,
  pub minimum_fare:     i64,
  /// Platform fee in 1/10 000ths of the price; 1000 is 10 %.
  pub fee_basis_points: i64,
}

impl Default for Tariff {
  fn default() -> Self {
    Self { base_rate: 2000, minimum_fare: 7000, fee_basis_points: 1000 }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fare {
  pub price:   i64,
  pub app_fee: i64,
}

impl Tariff {
  /// Reject tariffs that would quote negative prices or fees.
  pub fn validate(&self) -> Result<()> {
    for (name, value) in [
      ("base_rate", self.base_rate),
      ("minimum_fare", self.minimum_fare),
      ("fee_basis_points", self.fee_basis_points),
    ] {
      if value < 0 {
        return Err(Error::Validation(format!("tariff {name} must not be negative, got {value}")));
      }
    }
    if self.fee_basis_points > 10_000 {
      return Err(Error::Validation(format!(
        "tariff fee_basis_points must be at most 10000, got {}",
        self.fee_basis_points
      )));
    }
    Ok(())
  }

  /// `price = max(distance × base_rate, minimum_fare)`, fee floored.
  pub fn quote(&self, distance_km: f64) -> Result<Fare> {
    if !distance_km.is_finite() || distance_km <= 0.0 {
      return Err(Error::Validation(format!(
        "distance must be a positive number of kilometres, got {distance_km}"
      )));
    }

    let too_large = || Error::Validation(format!("distance too large: {distance_km}"));
    let metered = (distance_km * self.base_rate as f64).round();
    if metered >= i64::MAX as f64 {
      return Err(too_large());
    }

    let price = (metered as i64).max(self.minimum_fare);
    let app_fee = price
      .checked_mul(self.fee_basis_points)
      .map(|scaled| scaled / 10_000)
      .ok_or_else(too_large)?;
    Ok(Fare { price, app_fee })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn short_trip_pays_minimum_fare() {
    let fare = Tariff::default().quote(3.0).unwrap();
    assert_eq!(fare, Fare { price: 7000, app_fee: 700 });
  }

  #[test]
  fn long_trip_is_metered() {
    let fare = Tariff::default().quote(10.0).unwrap();
    assert_eq!(fare, Fare { price: 20000, app_fee: 2000 });
  }

  #[test]
  fn fee_is_floored() {
    let tariff = Tariff { base_rate: 1, minimum_fare: 0, fee_basis_points: 1000 };
    assert_eq!(tariff.quote(19.0).unwrap().app_fee, 1);
  }

  #[test]
  fn non_positive_or_non_finite_distance_is_rejected() {
    let tariff = Tariff::default();
    for bad in [0.0, -2.0, f64::NAN, f64::INFINITY] {
      assert!(matches!(tariff.quote(bad), Err(Error::Validation(_))), "{bad}");
    }
  }

  #[test]
  fn huge_distance_is_rejected_not_overflowed() {
    let tariff = Tariff::default();
    for huge in [1.0e13, 1.0e15, 4.0e15] {
      assert!(matches!(tariff.quote(huge), Err(Error::Validation(_))), "{huge}");
    }
    assert!(matches!(tariff.quote(1.0e30), Err(Error::Validation(_))));
  }

  #[test]
  fn large_but_representable_distance_is_quoted() {
    let fare = Tariff::default().quote(1.0e9).unwrap();
    assert_eq!(fare, Fare { price: 2_000_000_000_000, app_fee: 200_000_000_000 });
  }

  #[test]
  fn negative_tariff_fields_are_rejected() {
    assert!(Tariff::default().validate().is_ok());
    for bad in [
      Tariff { base_rate: -1, ..Tariff::default() },
      Tariff { minimum_fare: -7000, ..Tariff::default() },
      Tariff { fee_basis_points: -10, ..Tariff::default() },
      Tariff { fee_basis_points: 10_001, ..Tariff::default() },
    ] {
      assert!(matches!(bad.validate(), Err(Error::Validation(_))), "{bad:?}");
    }
  }
}
