use crate::error::{Error, ValidationErrors};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// A positive monetary amount, in major currency units.
///
/// Payouts, deposits and credits are always strictly positive; zero and
/// negative values are rejected at construction.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, Error> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(ValidationErrors::field("amount", "must be positive"))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Minor currency units (kobo/cents) for the gateway wire format.
    pub fn to_minor_units(&self) -> Result<u64, Error> {
        (self.0 * Decimal::from(100))
            .round()
            .to_u64()
            .ok_or_else(|| Error::internal(format!("amount {} out of range", self.0)))
    }

    /// Converts a gateway-reported minor-unit figure back to major units.
    pub fn from_minor_units(minor: u64) -> Result<Self, Error> {
        Self::new(Decimal::from(minor) / Decimal::from(100))
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = Error;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl From<Amount> for Balance {
    fn from(amount: Amount) -> Self {
        Self(amount.0)
    }
}

/// A wallet or ledger balance. Never negative in this crate: the core only
/// credits wallets, spending lives elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Balance(pub Decimal);

impl Balance {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Self {
        Self(value)
    }
}

impl Add for Balance {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Balance {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for Balance {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Balance {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amount_validation() {
        assert!(Amount::new(dec!(1.0)).is_ok());
        assert!(matches!(
            Amount::new(dec!(0.0)),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            Amount::new(dec!(-1.0)),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_minor_unit_round_trip() {
        let amount = Amount::new(dec!(150.50)).unwrap();
        assert_eq!(amount.to_minor_units().unwrap(), 15050);
        assert_eq!(Amount::from_minor_units(15050).unwrap(), amount);
    }

    #[test]
    fn test_balance_arithmetic() {
        let b1 = Balance::new(dec!(10.0));
        let b2 = Balance::new(dec!(5.0));
        assert_eq!(b1 + b2, Balance::new(dec!(15.0)));
        assert_eq!(b1 - b2, Balance::new(dec!(5.0)));

        let mut b = Balance::ZERO;
        b += Amount::new(dec!(2.5)).unwrap().into();
        assert_eq!(b, Balance::new(dec!(2.5)));
    }
}
