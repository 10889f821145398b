use crate::types::errors::MonetaryError;
use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::ops::Neg;
use std::str::FromStr;

/// Precision of the currency minor unit.
pub const DECIMAL_PLACES: u32 = 2;

/// A signed amount of the single platform currency.
///
/// Every value is held at exactly [`DECIMAL_PLACES`] of scale so equal amounts compare
/// and print identically no matter how they were produced.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Monetary(Decimal);

impl Monetary {
    pub const ZERO: Monetary = Monetary(Decimal::ZERO);

    pub fn new() -> Self {
        Self::ZERO
    }

    /// Wraps a decimal, rejecting values finer than the minor unit.
    pub fn from_decimal(value: Decimal) -> Result<Self, MonetaryError> {
        if value.normalize().scale() > DECIMAL_PLACES {
            return Err(MonetaryError::TooPrecise(value.to_string()))
        }

        let mut scaled = value;
        scaled.rescale(DECIMAL_PLACES);

        Ok(Monetary(scaled))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn abs(&self) -> Monetary {
        Monetary(self.0.abs())
    }

    /// Negative values collapse to zero.
    pub fn clamp_non_negative(self) -> Monetary {
        if self.is_negative() { Self::ZERO } else { self }
    }

    pub fn checked_add(self, rhs: Monetary) -> Option<Monetary> {
        self.0.checked_add(rhs.0).map(Monetary)
    }

    pub fn checked_sub(self, rhs: Monetary) -> Option<Monetary> {
        self.0.checked_sub(rhs.0).map(Monetary)
    }

    /// Sums amounts, returning `None` on overflow.
    pub fn checked_sum<I>(values: I) -> Option<Monetary>
    where
        I: IntoIterator<Item = Monetary>,
    {
        values.into_iter().try_fold(Self::ZERO, Monetary::checked_add)
    }
}

impl From<i64> for Monetary {
    fn from(value: i64) -> Self {
        let mut scaled = Decimal::from(value);
        scaled.rescale(DECIMAL_PLACES);
        Monetary(scaled)
    }
}

impl Neg for Monetary {
    type Output = Monetary;

    fn neg(self) -> Self::Output {
        Monetary(-self.0)
    }
}

impl Display for Monetary {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{:.width$}", self.0, width = DECIMAL_PLACES as usize)
    }
}

impl FromStr for Monetary {
    type Err = MonetaryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();

        if value.is_empty() {
            return Err(MonetaryError::InvalidFormat("Value is an empty string".to_string()));
        }

        let decimal = Decimal::from_str(value).map_err(|error| {
            MonetaryError::InvalidFormat(format!("Value [{value}] is not a decimal: {error}"))
        })?;

        Monetary::from_decimal(decimal)
    }
}

impl Serialize for Monetary {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Monetary {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Monetary::from_str(&value).map_err(de::Error::custom)
    }
}
