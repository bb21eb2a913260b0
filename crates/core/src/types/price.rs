//! Fixed-point book price.
//!
//! Prices are stored as `NUMERIC(6, 2)`: at most six digits in total, exactly
//! two of them after the decimal point.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input is not a decimal number.
    #[error("enter a number")]
    Invalid,
    /// The price is below zero.
    #[error("price cannot be negative")]
    Negative,
    /// More than two digits after the decimal point.
    #[error("ensure that there are no more than {max} decimal places")]
    TooManyDecimalPlaces {
        /// Maximum allowed fraction digits.
        max: u32,
    },
    /// More digits before the decimal point than the column can hold.
    #[error("ensure that there are no more than {max} digits before the decimal point")]
    TooLarge {
        /// Maximum allowed integer digits.
        max: u32,
    },
}

/// A non-negative price with exactly two fraction digits.
///
/// ## Examples
///
/// ```
/// use bookshelf_core::Price;
///
/// assert_eq!(Price::parse("100").unwrap().to_string(), "100.00");
/// assert_eq!(Price::parse("19.5").unwrap().to_string(), "19.50");
/// assert!(Price::parse("1.999").is_err());
/// assert!(Price::parse("10000").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Number of digits after the decimal point.
    pub const SCALE: u32 = 2;

    /// Total number of digits.
    pub const MAX_DIGITS: u32 = 6;

    /// Validate a decimal amount and normalise it to two fraction digits.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is negative, has more than two
    /// significant fraction digits, or does not fit in six digits.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }

        let normalized = amount.normalize();
        if normalized.scale() > Self::SCALE {
            return Err(PriceError::TooManyDecimalPlaces { max: Self::SCALE });
        }

        let integer_digits = normalized.trunc().abs().to_string().trim_start_matches('0').len();
        let max_integer_digits = Self::MAX_DIGITS - Self::SCALE;
        if integer_digits > max_integer_digits as usize {
            return Err(PriceError::TooLarge {
                max: max_integer_digits,
            });
        }

        let mut amount = normalized.abs();
        amount.rescale(Self::SCALE);
        Ok(Self(amount))
    }

    /// Parse a price from user input such as `"12"`, `"12.5"` or `"12.50"`.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Invalid` if the input is not a number, or any
    /// error from [`Price::new`].
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let amount = Decimal::from_str(s.trim()).map_err(|_| PriceError::Invalid)?;
        Self::new(amount)
    }

    /// The amount, always with a scale of two.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
