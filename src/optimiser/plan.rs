//! Optimisation Plan
//!
//! Splits a recipe into rows the strategies may move and rows whose cost is fixed,
//! and keeps the budget bookkeeping shared by every strategy.

use smallvec::SmallVec;

use crate::{
    costing::{ingredient_cost, total_cost},
    ingredients::Ingredient,
    optimiser::{COST_TOLERANCE, OptimisationRequest, OptimiserError},
};

/// How a strategy may treat a recipe row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowRole {
    /// Dough base: never touched.
    Protected,

    /// Already at or below the quantity floor: carried through, cost counted as fixed.
    Held,

    /// Free for the strategy to adjust.
    Optimisable,
}

/// Partitioned recipe with its budget.
#[derive(Debug, Clone)]
pub struct Plan<'a> {
    ingredients: &'a [Ingredient],
    roles: SmallVec<[RowRole; 16]>,
    budget: f64,
    min_quantity_g: f64,
    fixed_cost: f64,
}

impl<'a> Plan<'a> {
    /// Builds the plan for `ingredients` under `request`.
    ///
    /// # Errors
    ///
    /// - [`OptimiserError::InvalidRequest`]: the request has no finite budget or floor.
    /// - [`OptimiserError::NoOptimisableIngredients`]: every row is protected or held.
    /// - [`OptimiserError::BudgetUnreachable`]: the budget is below the cost of the
    ///   fixed rows plus every optimisable row at the floor.
    pub fn new(
        ingredients: &'a [Ingredient],
        request: &OptimisationRequest,
    ) -> Result<Self, OptimiserError> {
        request.validate()?;

        let min_quantity_g = request.min_quantity_g();

        let roles: SmallVec<[RowRole; 16]> = ingredients
            .iter()
            .map(|ingredient| classify(ingredient, min_quantity_g))
            .collect();

        let fixed_cost: f64 = ingredients
            .iter()
            .zip(roles.iter())
            .filter(|(_, role)| **role != RowRole::Optimisable)
            .map(|(ingredient, _)| ingredient.cost())
            .sum();

        let plan = Self {
            ingredients,
            roles,
            budget: request.budget(),
            min_quantity_g,
            fixed_cost,
        };

        if plan.optimisable_count() == 0 {
            return Err(OptimiserError::NoOptimisableIngredients);
        }

        let minimum = plan.minimum_cost();

        if minimum > plan.budget + COST_TOLERANCE {
            return Err(OptimiserError::BudgetUnreachable {
                budget: plan.budget,
                minimum,
            });
        }

        Ok(plan)
    }

    /// All recipe rows
    pub fn ingredients(&self) -> &'a [Ingredient] {
        self.ingredients
    }

    /// Returns the row at `idx`.
    ///
    /// # Errors
    ///
    /// Returns [`OptimiserError::InvariantViolation`] if `idx` is out of range.
    pub fn ingredient(&self, idx: usize) -> Result<&'a Ingredient, OptimiserError> {
        self.ingredients
            .get(idx)
            .ok_or(OptimiserError::InvariantViolation {
                message: "row index outside the recipe",
            })
    }

    /// Role of the row at `idx`, if it exists.
    pub fn role(&self, idx: usize) -> Option<RowRole> {
        self.roles.get(idx).copied()
    }

    /// Maximum total ingredient cost
    pub fn budget(&self) -> f64 {
        self.budget
    }

    /// Per-ingredient quantity floor in grams
    pub fn min_quantity_g(&self) -> f64 {
        self.min_quantity_g
    }

    /// Cost of protected and held rows
    pub fn fixed_cost(&self) -> f64 {
        self.fixed_cost
    }

    /// Budget left for optimisable rows once fixed rows are paid for.
    pub fn variable_budget(&self) -> f64 {
        self.budget - self.fixed_cost
    }

    /// Current cost of the whole recipe
    pub fn current_cost(&self) -> f64 {
        total_cost(self.ingredients)
    }

    /// Current cost of the optimisable rows
    pub fn optimisable_cost(&self) -> f64 {
        self.optimisable().map(|(_, ingredient)| ingredient.cost()).sum()
    }

    /// Lowest achievable total: fixed rows plus every optimisable row at the floor.
    pub fn minimum_cost(&self) -> f64 {
        self.fixed_cost
            + self
                .optimisable()
                .map(|(_, ingredient)| {
                    ingredient_cost(self.min_quantity_g, ingredient.unit_price_per_kg())
                })
                .sum::<f64>()
    }

    /// Returns true if the recipe already fits the budget.
    pub fn is_within_budget(&self) -> bool {
        self.current_cost() <= self.budget + COST_TOLERANCE
    }

    /// Optimisable rows with their index in the recipe.
    pub fn optimisable(&self) -> impl Iterator<Item = (usize, &'a Ingredient)> + '_ {
        self.ingredients
            .iter()
            .enumerate()
            .zip(self.roles.iter())
            .filter(|(_, role)| **role == RowRole::Optimisable)
            .map(|(row, _)| row)
    }

    /// Number of optimisable rows
    pub fn optimisable_count(&self) -> usize {
        self.roles
            .iter()
            .filter(|role| **role == RowRole::Optimisable)
            .count()
    }
}

fn classify(ingredient: &Ingredient, min_quantity_g: f64) -> RowRole {
    if ingredient.is_protected() {
        RowRole::Protected
    } else if ingredient.quantity_g() <= min_quantity_g {
        RowRole::Held
    } else {
        RowRole::Optimisable
    }
}
