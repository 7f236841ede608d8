//! Ingredient Fixtures

use decimal_percentage::Percentage;
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use rusty_money::iso::{Currency, EUR, GBP, USD};
use serde::Deserialize;
use slotmap::new_key_type;

use crate::fixtures::FixtureError;

new_key_type! {
    /// Catalogue Key
    pub struct IngredientKey;
}

/// Wrapper for the ingredient catalogue in YAML
#[derive(Debug, Deserialize)]
pub struct IngredientsFixture {
    /// Map of ingredient key -> ingredient fixture
    pub ingredients: FxHashMap<String, IngredientFixture>,
}

/// Ingredient Fixture
#[derive(Debug, Deserialize)]
pub struct IngredientFixture {
    /// Ingredient name as printed on recipes
    pub name: String,

    /// Purchase price per kilogram (e.g., "6.00 EUR")
    pub price_per_kg: String,
}

/// Priced catalogue ingredient
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogueEntry {
    /// Ingredient name
    pub name: String,

    /// Price per kilogram, in major units
    pub unit_price_per_kg: f64,

    /// Currency of the price
    pub currency: &'static Currency,
}

impl TryFrom<IngredientFixture> for CatalogueEntry {
    type Error = FixtureError;

    fn try_from(fixture: IngredientFixture) -> Result<Self, Self::Error> {
        let (minor_units, currency) = parse_price(&fixture.price_per_kg)?;

        if minor_units < 0 {
            return Err(FixtureError::InvalidPrice(fixture.price_per_kg));
        }

        let unit_price_per_kg = minor_to_major(minor_units)
            .ok_or_else(|| FixtureError::InvalidPrice(fixture.price_per_kg.clone()))?;

        Ok(CatalogueEntry {
            name: fixture.name,
            unit_price_per_kg,
            currency,
        })
    }
}

/// Parse price string (e.g., "2.99 EUR") into minor units and currency
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY",
/// if the amount cannot be parsed as a decimal, or if the currency code
/// is not recognized.
pub fn parse_price(s: &str) -> Result<(i64, &'static Currency), FixtureError> {
    let parts: Vec<&str> = s.split_whitespace().collect();

    if parts.len() != 2 {
        return Err(FixtureError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    }

    let amount = parts
        .first()
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?
        .parse::<Decimal>()
        .map_err(|_err| FixtureError::InvalidPrice(s.to_string()))?;

    let minor_units = amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|value| value.round_dp(0).to_i64())
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?;

    let currency_code = parts
        .get(1)
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?;

    let currency = match *currency_code {
        "GBP" => GBP,
        "USD" => USD,
        "EUR" => EUR,
        other => return Err(FixtureError::UnknownCurrency(other.to_string())),
    };

    Ok((minor_units, currency))
}

/// Converts minor units (cents) to a major-unit amount.
pub fn minor_to_major(minor_units: i64) -> Option<f64> {
    Decimal::new(minor_units, 2).to_f64()
}

/// Parse percentage string (e.g., "70%" or "0.70") into a `Percentage`
///
/// # Errors
///
/// Returns an error if the string cannot be parsed as a number.
pub fn parse_percentage(s: &str) -> Result<Percentage, FixtureError> {
    let trimmed = s.trim();

    if let Some(percent_str) = trimmed.strip_suffix('%') {
        let value = percent_str
            .trim()
            .parse::<f64>()
            .map_err(|_err| FixtureError::InvalidPercentage(s.to_string()))?;

        Ok(Percentage::from(value / 100.0))
    } else {
        let value = trimmed
            .parse::<f64>()
            .map_err(|_err| FixtureError::InvalidPercentage(s.to_string()))?;

        Ok(Percentage::from(value))
    }
}

/// Converts a fractional `Percentage` (0.70) to percent points (70.0).
pub fn percent_points(percentage: Percentage) -> Option<f64> {
    (percentage * Decimal::ONE)
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|points| points.to_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_price_rejects_invalid_format() {
        let result = parse_price("6.00EUR");

        assert!(matches!(result, Err(FixtureError::InvalidPrice(_))));
    }

    #[test]
    fn parse_price_rejects_unknown_currency() {
        let result = parse_price("6.00 CHF");

        assert!(matches!(result, Err(FixtureError::UnknownCurrency(code)) if code == "CHF"));
    }

    #[test]
    fn parse_price_accepts_known_currencies() -> Result<(), FixtureError> {
        let (eur_minor, eur) = parse_price("6.00 EUR")?;
        let (gbp_minor, gbp) = parse_price("0.80 GBP")?;

        assert_eq!(eur_minor, 600);
        assert_eq!(eur, EUR);
        assert_eq!(gbp_minor, 80);
        assert_eq!(gbp, GBP);

        Ok(())
    }

    #[test]
    fn catalogue_entry_converts_minor_units() -> Result<(), FixtureError> {
        let entry = CatalogueEntry::try_from(IngredientFixture {
            name: "Mozzarella".to_string(),
            price_per_kg: "6.50 EUR".to_string(),
        })?;

        assert!((entry.unit_price_per_kg - 6.5).abs() < 1e-12);
        assert_eq!(entry.currency, EUR);

        Ok(())
    }

    #[test]
    fn negative_price_is_rejected() {
        let result = CatalogueEntry::try_from(IngredientFixture {
            name: "Mozzarella".to_string(),
            price_per_kg: "-1.00 EUR".to_string(),
        });

        assert!(matches!(result, Err(FixtureError::InvalidPrice(_))));
    }

    #[test]
    fn parse_percentage_accepts_both_formats() -> Result<(), FixtureError> {
        let percent = parse_percentage("70%")?;
        let fraction = parse_percentage("0.7")?;

        assert!(percent_points(percent).is_some_and(|p| (p - 70.0).abs() < 1e-9));
        assert!(percent_points(fraction).is_some_and(|p| (p - 70.0).abs() < 1e-9));

        Ok(())
    }

    #[test]
    fn parse_percentage_rejects_garbage() {
        let result = parse_percentage("seventy");

        assert!(matches!(result, Err(FixtureError::InvalidPercentage(_))));
    }
}
