//! Type-safe price representation using decimal arithmetic.
//!
//! The catalog is single-currency, so a [`Price`] is just a non-negative
//! [`Decimal`]. Order totals are computed once at creation with
//! [`Price::total_for`] and never recomputed.
//!
//! Amounts are held at exactly two decimal places and capped at
//! [`Price::max`], matching the `NUMERIC(14, 2)` columns they are stored in,
//! so every backend computes the same totals.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// Prices cannot be negative.
    #[error("price cannot be negative (got {0})")]
    Negative(Decimal),
    /// More precision than a cent.
    #[error("price cannot have more than 2 decimal places (got {0})")]
    TooPrecise(Decimal),
    /// Above the largest storable amount.
    #[error("price cannot exceed 999999999999.99 (got {0})")]
    TooLarge(Decimal),
    /// Quantity times price exceeds the largest storable amount.
    #[error("total price exceeds 999999999999.99")]
    Overflow,
}

/// Decimal places kept for every amount.
const SCALE: u32 = 2;

/// Largest storable amount in cents: 12 integer digits and 2 decimals.
const MAX_CENTS: i64 = 99_999_999_999_999;

/// A non-negative unit or total price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// A zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price. The amount is normalised to two decimal places.
    ///
    /// # Errors
    ///
    /// - [`PriceError::Negative`] if `amount` is below zero
    /// - [`PriceError::TooPrecise`] if `amount` has fractions of a cent
    /// - [`PriceError::TooLarge`] if `amount` exceeds [`Price::max`]
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        if amount.normalize().scale() > SCALE {
            return Err(PriceError::TooPrecise(amount));
        }
        if amount > Self::max().0 {
            return Err(PriceError::TooLarge(amount));
        }

        let mut amount = amount.abs();
        amount.rescale(SCALE);
        Ok(Self(amount))
    }

    /// The largest storable amount, `999999999999.99`.
    #[must_use]
    pub fn max() -> Self {
        Self(Decimal::new(MAX_CENTS, SCALE))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Total for `quantity` units at this unit price.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Overflow`] if the total exceeds [`Price::max`].
    pub fn total_for(&self, quantity: u32) -> Result<Self, PriceError> {
        let total = self
            .0
            .checked_mul(Decimal::from(quantity))
            .ok_or(PriceError::Overflow)?;
        if total > Self::max().0 {
            return Err(PriceError::Overflow);
        }
        Self::new(total).map_err(|_| PriceError::Overflow)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
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
