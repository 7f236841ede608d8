//! Recipe Fixtures

use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::{optimiser::StrategyKind, recipes::Recipe};

/// Wrapper for recipes in YAML
#[derive(Debug, Deserialize)]
pub struct RecipesFixture {
    /// Map of recipe key -> recipe fixture
    pub recipes: FxHashMap<String, RecipeFixture>,
}

/// Recipe Fixture
#[derive(Debug, Deserialize)]
pub struct RecipeFixture {
    /// Dish name
    pub name: String,

    /// Displayed menu price (e.g., "10.00 EUR")
    pub price: String,

    /// Target margin (e.g., "70%" or "0.70")
    #[serde(default)]
    pub target_margin: Option<String>,

    /// Preferred strategy for this dish
    #[serde(default)]
    pub strategy: Option<StrategyKind>,

    /// Units sold over the reporting period
    #[serde(default)]
    pub units_sold: Option<u32>,

    /// Ingredient lines, in recipe order
    pub ingredients: Vec<RecipeLineFixture>,
}

/// One ingredient line of a recipe fixture
#[derive(Debug, Deserialize)]
pub struct RecipeLineFixture {
    /// Catalogue key of the ingredient
    pub ingredient: String,

    /// Quantity in grams
    pub grams: f64,
}

/// Dish loaded from a fixture set, with its menu settings.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuEntry {
    /// Fixture key
    pub key: String,

    /// Priced recipe
    pub recipe: Recipe,

    /// Target margin in percent points, if the fixture sets one
    pub target_margin_pct: Option<f64>,

    /// Preferred strategy, if the fixture sets one
    pub strategy: Option<StrategyKind>,

    /// Units sold, if the fixture records sales
    pub units_sold: Option<u32>,
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn optional_fields_default_to_none() -> TestResult {
        let yaml = "recipes:\n  plain:\n    name: Plain\n    price: 8.00 EUR\n    ingredients:\n      - ingredient: tomate\n        grams: 100\n";

        let fixture: RecipesFixture = serde_norway::from_str(yaml)?;
        let plain = fixture.recipes.get("plain").ok_or("missing recipe")?;

        assert_eq!(plain.target_margin, None);
        assert_eq!(plain.strategy, None);
        assert_eq!(plain.units_sold, None);
        assert_eq!(plain.ingredients.len(), 1);

        Ok(())
    }

    #[test]
    fn strategy_uses_snake_case_names() -> TestResult {
        let yaml = "recipes:\n  regina:\n    name: Regina\n    price: 12.00 EUR\n    strategy: top_two\n    ingredients: []\n";

        let fixture: RecipesFixture = serde_norway::from_str(yaml)?;
        let regina = fixture.recipes.get("regina").ok_or("missing recipe")?;

        assert_eq!(regina.strategy, Some(StrategyKind::TopTwo));

        Ok(())
    }
}
