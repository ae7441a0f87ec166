//! Decimal money helpers.
//!
//! Amounts are `BigDecimal` with two fractional digits. Rounding is always
//! round-half-up, so `0.125` becomes `0.13`.

use std::borrow::Cow;
use std::str::FromStr;

use bigdecimal::{BigDecimal, RoundingMode};
use serde::{Deserialize, Deserializer};
use validator::ValidationError;

pub const SCALE: i64 = 2;
const MAX_UNIT_PRICE: i64 = 10_000;
/// Exclusive bound of a `NUMERIC(12,2)` amount column.
const MAX_AMOUNT: i64 = 10_000_000_000;

pub fn round(amount: &BigDecimal) -> BigDecimal {
    amount.with_scale_round(SCALE, RoundingMode::HalfUp)
}

/// `unit_price × quantity`, rounded to cents.
pub fn line_price(unit_price: &BigDecimal, quantity: i32) -> BigDecimal {
    round(&(unit_price.clone() * BigDecimal::from(quantity)))
}

pub fn total<'a, I>(prices: I) -> BigDecimal
where
    I: IntoIterator<Item = &'a BigDecimal>,
{
    let sum = prices
        .into_iter()
        .fold(BigDecimal::from(0), |acc, price| acc + price);
    round(&sum)
}

/// Whether `amount` fits the line price and order total columns.
pub fn fits_amount_column(amount: &BigDecimal) -> bool {
    *amount < BigDecimal::from(MAX_AMOUNT)
}

/// Menu prices: at least 0.1, at most two decimal places, at most six digits.
pub fn validate_price(price: &BigDecimal) -> Result<(), ValidationError> {
    let min = BigDecimal::from(1) / BigDecimal::from(10);
    if *price < min {
        return Err(ValidationError::new("min_value").with_message(Cow::Borrowed(
            "Ensure this value is greater than or equal to 0.1.",
        )));
    }
    if price.with_scale(SCALE) != *price {
        return Err(ValidationError::new("decimal_places").with_message(Cow::Borrowed(
            "Ensure that there are no more than 2 decimal places.",
        )));
    }
    if *price >= BigDecimal::from(MAX_UNIT_PRICE) {
        return Err(ValidationError::new("max_digits").with_message(Cow::Borrowed(
            "Ensure that there are no more than 6 digits in total.",
        )));
    }
    Ok(())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DecimalInput {
    Number(serde_json::Number),
    Text(String),
}

fn parse_decimal<E: serde::de::Error>(input: DecimalInput) -> Result<BigDecimal, E> {
    // Numbers go through their shortest decimal text so 9.99 stays 9.99.
    let raw = match input {
        DecimalInput::Number(n) => n.to_string(),
        DecimalInput::Text(s) => s,
    };
    BigDecimal::from_str(raw.trim()).map_err(|_| E::custom("A valid number is required."))
}

/// Accepts a JSON number or a numeric string.
pub fn deserialize_decimal<'de, D>(deserializer: D) -> Result<BigDecimal, D::Error>
where
    D: Deserializer<'de>,
{
    parse_decimal(DecimalInput::deserialize(deserializer)?)
}

pub fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<BigDecimal>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<DecimalInput>::deserialize(deserializer)?
        .map(parse_decimal)
        .transpose()
}
