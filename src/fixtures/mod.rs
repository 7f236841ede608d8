//! Fixtures

use std::{fs, path::PathBuf};

use rusty_money::iso::Currency;
use rustc_hash::FxHashMap;
use slotmap::SlotMap;
use thiserror::Error;

use crate::{
    fixtures::{
        ingredients::{CatalogueEntry, IngredientKey, IngredientsFixture},
        recipes::{MenuEntry, RecipeFixture, RecipesFixture},
    },
    ingredients::Ingredient,
    recipes::Recipe,
};

pub mod ingredients;
pub mod recipes;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Invalid percentage format
    #[error("Invalid percentage format: {0}")]
    InvalidPercentage(String),

    /// Invalid quantity on a recipe line
    #[error("Invalid quantity for {ingredient} in {recipe}: {grams} g")]
    InvalidQuantity {
        /// Recipe key
        recipe: String,

        /// Ingredient key
        ingredient: String,

        /// Quantity found
        grams: f64,
    },

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Ingredient not found in the catalogue
    #[error("Ingredient not found: {0}")]
    IngredientNotFound(String),

    /// Recipe not found
    #[error("Recipe not found: {0}")]
    RecipeNotFound(String),

    /// Currency mismatch between ingredients and recipes
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// No ingredients loaded yet
    #[error("No ingredients loaded yet; currency unknown")]
    NoCurrency,
}

/// Fixture
#[derive(Debug)]
pub struct Fixture {
    /// Base path for fixture files
    base_path: PathBuf,

    /// Priced ingredient catalogue
    catalogue: SlotMap<IngredientKey, CatalogueEntry>,

    /// String key -> `SlotMap` key mappings for lookups
    ingredient_keys: FxHashMap<String, IngredientKey>,

    /// Dishes, sorted by fixture key
    menu: Vec<MenuEntry>,

    /// Currency for the fixture set
    currency: Option<&'static Currency>,
}

impl Fixture {
    /// Create a new empty fixture with default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a new empty fixture with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            catalogue: SlotMap::with_key(),
            ingredient_keys: FxHashMap::default(),
            menu: Vec::new(),
            currency: None,
        }
    }

    /// Load the ingredient catalogue from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if currencies differ.
    pub fn load_ingredients(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self
            .base_path
            .join("ingredients")
            .join(format!("{name}.yml"));

        let contents = fs::read_to_string(&file_path)?;
        let fixture: IngredientsFixture = serde_norway::from_str(&contents)?;

        for (key, ingredient_fixture) in fixture.ingredients {
            let entry = CatalogueEntry::try_from(ingredient_fixture)?;

            self.check_currency(entry.currency)?;

            let ingredient_key = self.catalogue.insert(entry);

            self.ingredient_keys.insert(key, ingredient_key);
        }

        tracing::debug!(
            set = name,
            ingredients = self.catalogue.len(),
            "ingredient catalogue loaded"
        );

        Ok(self)
    }

    /// Load recipes from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, if a recipe references an
    /// ingredient missing from the catalogue, or if currencies differ.
    pub fn load_recipes(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self.base_path.join("recipes").join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;
        let fixture: RecipesFixture = serde_norway::from_str(&contents)?;

        for (key, recipe_fixture) in fixture.recipes {
            let entry = self.menu_entry(key, recipe_fixture)?;

            self.menu.push(entry);
        }

        self.menu.sort_by(|a, b| a.key.cmp(&b.key));

        tracing::debug!(set = name, dishes = self.menu.len(), "recipes loaded");

        Ok(self)
    }

    /// Load a complete fixture set (ingredients and recipes with the same name)
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::new();

        fixture.load_ingredients(name)?.load_recipes(name)?;

        Ok(fixture)
    }

    /// Get a catalogue entry by its string key
    ///
    /// # Errors
    ///
    /// Returns an error if the ingredient is not found.
    pub fn ingredient(&self, key: &str) -> Result<&CatalogueEntry, FixtureError> {
        let ingredient_key = self.ingredient_key(key)?;

        self.catalogue
            .get(ingredient_key)
            .ok_or_else(|| FixtureError::IngredientNotFound(key.to_string()))
    }

    /// Get a catalogue key by its string key
    ///
    /// # Errors
    ///
    /// Returns an error if the ingredient is not found.
    pub fn ingredient_key(&self, key: &str) -> Result<IngredientKey, FixtureError> {
        self.ingredient_keys
            .get(key)
            .copied()
            .ok_or_else(|| FixtureError::IngredientNotFound(key.to_string()))
    }

    /// Get a dish by its fixture key
    ///
    /// # Errors
    ///
    /// Returns an error if the recipe is not found.
    pub fn recipe(&self, key: &str) -> Result<&MenuEntry, FixtureError> {
        self.menu
            .iter()
            .find(|entry| entry.key == key)
            .ok_or_else(|| FixtureError::RecipeNotFound(key.to_string()))
    }

    /// Every dish, sorted by fixture key
    pub fn menu(&self) -> &[MenuEntry] {
        &self.menu
    }

    /// Get the currency
    ///
    /// # Errors
    ///
    /// Returns an error if no ingredients have been loaded yet.
    pub fn currency(&self) -> Result<&'static Currency, FixtureError> {
        self.currency.ok_or(FixtureError::NoCurrency)
    }

    /// Get the catalogue `SlotMap`
    pub fn catalogue(&self) -> &SlotMap<IngredientKey, CatalogueEntry> {
        &self.catalogue
    }

    fn check_currency(&mut self, currency: &'static Currency) -> Result<(), FixtureError> {
        if let Some(existing_currency) = self.currency {
            if existing_currency != currency {
                return Err(FixtureError::CurrencyMismatch(
                    existing_currency.iso_alpha_code.to_string(),
                    currency.iso_alpha_code.to_string(),
                ));
            }
        } else {
            self.currency = Some(currency);
        }

        Ok(())
    }

    fn menu_entry(
        &mut self,
        key: String,
        fixture: RecipeFixture,
    ) -> Result<MenuEntry, FixtureError> {
        let (minor_units, currency) = ingredients::parse_price(&fixture.price)?;

        self.check_currency(currency)?;

        let displayed_price = ingredients::minor_to_major(minor_units)
            .ok_or_else(|| FixtureError::InvalidPrice(fixture.price.clone()))?;

        let target_margin_pct = fixture
            .target_margin
            .as_deref()
            .map(|margin| {
                ingredients::parse_percentage(margin).and_then(|percentage| {
                    ingredients::percent_points(percentage)
                        .ok_or_else(|| FixtureError::InvalidPercentage(margin.to_string()))
                })
            })
            .transpose()?;

        let lines = fixture
            .ingredients
            .into_iter()
            .map(|line| {
                if !line.grams.is_finite() || line.grams < 0.0 {
                    return Err(FixtureError::InvalidQuantity {
                        recipe: key.clone(),
                        ingredient: line.ingredient,
                        grams: line.grams,
                    });
                }

                let entry = self.ingredient(&line.ingredient)?;

                Ok(Ingredient::new(
                    entry.name.clone(),
                    line.grams,
                    entry.unit_price_per_kg,
                ))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(MenuEntry {
            recipe: Recipe::new(fixture.name, displayed_price, lines),
            key,
            target_margin_pct,
            strategy: fixture.strategy,
            units_sold: fixture.units_sold,
        })
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, path::Path};

    use rusty_money::iso::EUR;
    use testresult::TestResult;

    use super::*;

    fn write_fixture(base: &Path, category: &str, name: &str, contents: &str) -> TestResult {
        let dir = base.join(category);

        fs::create_dir_all(&dir)?;
        fs::write(dir.join(format!("{name}.yml")), contents)?;

        Ok(())
    }

    #[test]
    fn fixture_loads_ingredients_and_recipes() -> TestResult {
        let mut fixture = Fixture::new();

        fixture
            .load_ingredients("pizzeria")?
            .load_recipes("pizzeria")?;

        let mozzarella = fixture.ingredient("mozzarella")?;

        assert_eq!(mozzarella.name, "Mozzarella");
        assert!((mozzarella.unit_price_per_kg - 6.0).abs() < 1e-12);
        assert_eq!(fixture.currency()?, EUR);

        let margherita = fixture.recipe("margherita")?;

        assert_eq!(margherita.recipe.name(), "Margherita");
        assert!((margherita.recipe.displayed_price() - 10.0).abs() < 1e-12);
        assert!(
            margherita
                .target_margin_pct
                .is_some_and(|pct| (pct - 70.0).abs() < 1e-9)
        );

        Ok(())
    }

    #[test]
    fn menu_is_sorted_by_key() -> TestResult {
        let fixture = Fixture::from_set("pizzeria")?;
        let keys: Vec<&str> = fixture.menu().iter().map(|e| e.key.as_str()).collect();

        let mut sorted = keys.clone();
        sorted.sort_unstable();

        assert_eq!(keys, sorted);
        assert!(!keys.is_empty());

        Ok(())
    }

    #[test]
    fn fixture_ingredient_not_found_returns_error() {
        let fixture = Fixture::new();
        let result = fixture.ingredient("truffe");

        assert!(matches!(result, Err(FixtureError::IngredientNotFound(_))));
    }

    #[test]
    fn fixture_recipe_not_found_returns_error() {
        let fixture = Fixture::new();
        let result = fixture.recipe("calzone");

        assert!(matches!(result, Err(FixtureError::RecipeNotFound(_))));
    }

    #[test]
    fn fixture_no_currency_returns_error() {
        let fixture = Fixture::new();
        let result = fixture.currency();

        assert!(matches!(result, Err(FixtureError::NoCurrency)));
    }

    #[test]
    fn recipe_referencing_unknown_ingredient_is_rejected() -> TestResult {
        let dir = tempfile::tempdir()?;

        write_fixture(
            dir.path(),
            "ingredients",
            "tiny",
            "ingredients:\n  tomate:\n    name: Tomate\n    price_per_kg: 2.00 EUR\n",
        )?;
        write_fixture(
            dir.path(),
            "recipes",
            "tiny",
            "recipes:\n  marinara:\n    name: Marinara\n    price: 8.00 EUR\n    ingredients:\n      - ingredient: ail\n        grams: 5\n",
        )?;

        let mut fixture = Fixture::with_base_path(dir.path());

        fixture.load_ingredients("tiny")?;

        let result = fixture.load_recipes("tiny");

        assert!(matches!(result, Err(FixtureError::IngredientNotFound(key)) if key == "ail"));

        Ok(())
    }

    #[test]
    fn negative_grams_are_rejected() -> TestResult {
        let dir = tempfile::tempdir()?;

        write_fixture(
            dir.path(),
            "ingredients",
            "tiny",
            "ingredients:\n  tomate:\n    name: Tomate\n    price_per_kg: 2.00 EUR\n",
        )?;
        write_fixture(
            dir.path(),
            "recipes",
            "tiny",
            "recipes:\n  marinara:\n    name: Marinara\n    price: 8.00 EUR\n    ingredients:\n      - ingredient: tomate\n        grams: -5\n",
        )?;

        let result = Fixture::with_base_path(dir.path())
            .load_ingredients("tiny")?
            .load_recipes("tiny")
            .map(|_| ());

        assert!(matches!(result, Err(FixtureError::InvalidQuantity { .. })));

        Ok(())
    }

    #[test]
    fn load_ingredients_rejects_currency_mismatch() -> TestResult {
        let dir = tempfile::tempdir()?;

        write_fixture(
            dir.path(),
            "ingredients",
            "eur_set",
            "ingredients:\n  tomate:\n    name: Tomate\n    price_per_kg: 2.00 EUR\n",
        )?;
        write_fixture(
            dir.path(),
            "ingredients",
            "gbp_set",
            "ingredients:\n  cheddar:\n    name: Cheddar\n    price_per_kg: 9.00 GBP\n",
        )?;

        let mut fixture = Fixture::with_base_path(dir.path());

        fixture.load_ingredients("eur_set")?;

        let result = fixture.load_ingredients("gbp_set");

        assert!(matches!(result, Err(FixtureError::CurrencyMismatch(_, _))));

        Ok(())
    }
}
