//! Grammage prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    costing::{CostLine, CostSheet, ingredient_cost, price, total_cost},
    fixtures::{
        Fixture, FixtureError,
        ingredients::{CatalogueEntry, IngredientKey},
        recipes::MenuEntry,
    },
    ingredients::{Ingredient, PROTECTED_MARKERS},
    margins::{MarginAnalysis, MenuSummary, budget, margin_pct, recommended_price},
    optimiser::{
        AdjustedIngredient, BalancedReduction, ExactTarget, LinearDistance, OptimisationRequest,
        OptimisationResult, OptimiserError, Outcome, Strategy, StrategyKind, TopTwoReduction,
        UnchangedReason,
        observer::{FormulationObserver, FormulationStats, NoopObserver, VariableRole},
    },
    recipes::Recipe,
    report::{Report, ReportError},
};
