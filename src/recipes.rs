//! Recipes

use crate::{
    costing::{self, CostSheet},
    ingredients::Ingredient,
    margins,
    optimiser::{OptimisationRequest, OptimisationResult, StrategyKind},
};

/// Ordered ingredient lines for one dish, with its menu price.
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    name: String,
    displayed_price: f64,
    ingredients: Vec<Ingredient>,
}

impl Recipe {
    /// Creates a new recipe.
    pub fn new(
        name: impl Into<String>,
        displayed_price: f64,
        ingredients: impl IntoIterator<Item = Ingredient>,
    ) -> Self {
        Self {
            name: name.into(),
            displayed_price,
            ingredients: ingredients.into_iter().collect(),
        }
    }

    /// Dish name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Menu price used as the revenue baseline
    pub fn displayed_price(&self) -> f64 {
        self.displayed_price
    }

    /// Ingredient lines in recipe order
    pub fn ingredients(&self) -> &[Ingredient] {
        &self.ingredients
    }

    /// Number of ingredient lines
    pub fn len(&self) -> usize {
        self.ingredients.len()
    }

    /// Returns true if the recipe has no ingredient lines
    pub fn is_empty(&self) -> bool {
        self.ingredients.is_empty()
    }

    /// Looks up an ingredient by name, ignoring case.
    pub fn ingredient(&self, name: &str) -> Option<&Ingredient> {
        self.ingredients
            .iter()
            .find(|ingredient| ingredient.is_named(name))
    }

    /// Total ingredient cost
    pub fn total_cost(&self) -> f64 {
        costing::total_cost(&self.ingredients)
    }

    /// Prices every line.
    pub fn cost_sheet(&self) -> CostSheet {
        costing::price(&self.ingredients)
    }

    /// Current margin at the displayed price, in percent points.
    pub fn margin_pct(&self) -> Option<f64> {
        margins::margin_pct(self.displayed_price, self.total_cost())
    }

    /// Runs `strategy` at the displayed price with the default quantity floor.
    pub fn optimise(&self, strategy: StrategyKind, target_margin_pct: f64) -> OptimisationResult {
        let request = OptimisationRequest::new(self.displayed_price, target_margin_pct);

        strategy.optimise(&self.ingredients, &request)
    }

    /// Runs `strategy` with an explicit request.
    pub fn optimise_with(
        &self,
        strategy: StrategyKind,
        request: &OptimisationRequest,
    ) -> OptimisationResult {
        strategy.optimise(&self.ingredients, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn margherita() -> Recipe {
        Recipe::new(
            "Margherita",
            10.0,
            [
                Ingredient::new("Mozzarella", 200.0, 6.0),
                Ingredient::new("Tomate", 150.0, 2.0),
                Ingredient::new("Pâte à pizza", 250.0, 0.0),
            ],
        )
    }

    #[test]
    fn total_cost_sums_lines() {
        let recipe = margherita();

        assert_eq!(recipe.len(), 3);
        assert!((recipe.total_cost() - 1.5).abs() < 1e-9);
        assert!((recipe.cost_sheet().total() - recipe.total_cost()).abs() < 1e-12);
        assert!(
            recipe
                .margin_pct()
                .is_some_and(|margin| (margin - 85.0).abs() < 1e-9)
        );
    }

    #[test]
    fn ingredient_lookup_is_case_insensitive() {
        let recipe = margherita();

        assert!(recipe.ingredient("MOZZARELLA").is_some());
        assert!(recipe.ingredient("Basilic").is_none());
    }

    #[test]
    fn optimise_leaves_the_recipe_untouched() {
        let recipe = margherita();
        let before = recipe.clone();

        let result = recipe.optimise(StrategyKind::LinearDistance, 95.0);

        assert_eq!(recipe, before);
        assert_eq!(result.rows().len(), recipe.len());
    }
}
