//! Grammage Optimiser
//!
//! Rebalances ingredient quantities so a dish fits the ingredient budget implied by a
//! target margin, while disturbing the recipe as little as possible.
//!
//! Four strategies share one contract ([`Strategy`]):
//!
//! - [`LinearDistance`]: minimise total absolute deviation in grams (LP).
//! - [`BalancedReduction`]: minimise the worst proportional cut (minimax LP), rounded to 5 g.
//! - [`ExactTarget`]: balanced cut, then scaled back up to land on the budget.
//! - [`TopTwoReduction`]: shrink only the two most expensive ingredients.
//!
//! Optimisation failure is never an error for the caller. When a strategy cannot
//! produce a solution the original quantities are returned unchanged and the reason is
//! available from [`OptimisationResult::outcome`].

use std::fmt;

use good_lp::ResolutionError;
use serde::Deserialize;
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    costing::{ingredient_cost, total_cost},
    ingredients::Ingredient,
    margins,
    optimiser::{
        observer::{FormulationObserver, NoopObserver},
        plan::Plan,
    },
};

pub mod balanced;
pub mod exact;
pub mod formulation;
pub mod linear;
pub mod observer;
pub mod plan;
pub mod rounding;
pub mod top_two;

pub use balanced::BalancedReduction;
pub use exact::ExactTarget;
pub use linear::LinearDistance;
pub use top_two::TopTwoReduction;

/// Default per-ingredient quantity floor, in grams.
pub const DEFAULT_MIN_QUANTITY_G: f64 = 5.0;

/// Kitchen measurement granularity used by the rounded strategies, in grams.
pub const ROUNDING_STEP_G: f64 = 5.0;

/// Smallest factor the top-two strategy applies (never cut more than 95%).
pub const TOP_TWO_MIN_FACTOR: f64 = 0.05;

/// Slack allowed when comparing a cost against the budget.
pub const COST_TOLERANCE: f64 = 1e-9;

/// New quantities for optimisable rows, as `(row index, grams)`.
pub type Adjustments = SmallVec<[(usize, f64); 16]>;

/// Optimiser Errors
///
/// These never reach callers of [`Strategy::optimise`]; they are converted into an
/// unchanged result carrying an [`UnchangedReason`].
#[derive(Debug, Error)]
pub enum OptimiserError {
    /// Every row is protected or already at the quantity floor.
    #[error("recipe has no ingredient that can be optimised")]
    NoOptimisableIngredients,

    /// The strategy needs more optimisable rows than the recipe has.
    #[error("strategy needs {required} optimisable ingredients, recipe has {found}")]
    NotEnoughCostDrivers {
        /// Rows the strategy needs
        required: usize,

        /// Rows available
        found: usize,
    },

    /// The recipe already fits the budget.
    #[error("recipe already costs {cost:.4}, within budget {budget:.4}")]
    AlreadyWithinBudget {
        /// Current total cost
        cost: f64,

        /// Ingredient budget
        budget: f64,
    },

    /// Even with every optimisable row at the floor the budget cannot be met.
    #[error("budget {budget:.4} is below the lowest achievable cost {minimum:.4}")]
    BudgetUnreachable {
        /// Ingredient budget
        budget: f64,

        /// Lowest achievable total cost
        minimum: f64,
    },

    /// The request cannot produce a meaningful budget or floor.
    #[error("invalid optimisation request: {0}")]
    InvalidRequest(&'static str),

    /// Wrapped solver resolution error
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// Internal optimiser invariant was violated (this is a bug).
    #[error("optimiser invariant violated: {message}")]
    InvariantViolation {
        /// What invariant was violated
        message: &'static str,
    },
}

/// Why a result carries the original quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnchangedReason {
    /// The recipe already fits the budget.
    AlreadyWithinBudget,

    /// Every row is protected or already at the quantity floor.
    NoOptimisableIngredients,

    /// The strategy needs more optimisable rows than the recipe has.
    NotEnoughCostDrivers,

    /// The target margin cannot be reached by changing quantities.
    BudgetUnreachable,

    /// The request was not usable (non-finite budget, bad floor).
    InvalidRequest,

    /// The LP solver failed or reported infeasibility.
    SolverFailed,
}

impl From<&OptimiserError> for UnchangedReason {
    fn from(err: &OptimiserError) -> Self {
        match err {
            OptimiserError::NoOptimisableIngredients => Self::NoOptimisableIngredients,
            OptimiserError::NotEnoughCostDrivers { .. } => Self::NotEnoughCostDrivers,
            OptimiserError::AlreadyWithinBudget { .. } => Self::AlreadyWithinBudget,
            OptimiserError::BudgetUnreachable { .. }
            | OptimiserError::Resolution(ResolutionError::Infeasible) => Self::BudgetUnreachable,
            OptimiserError::InvalidRequest(_) => Self::InvalidRequest,
            OptimiserError::Resolution(_) | OptimiserError::InvariantViolation { .. } => {
                Self::SolverFailed
            }
        }
    }
}

/// Outcome of a strategy run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The strategy produced new quantities.
    Optimised,

    /// Original quantities were carried through.
    Unchanged(UnchangedReason),
}

/// Target constraints for one optimisation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimisationRequest {
    displayed_price: f64,
    target_margin_pct: f64,
    min_quantity_g: f64,
}

impl OptimisationRequest {
    /// Creates a request with the default quantity floor.
    pub fn new(displayed_price: f64, target_margin_pct: f64) -> Self {
        Self {
            displayed_price,
            target_margin_pct,
            min_quantity_g: DEFAULT_MIN_QUANTITY_G,
        }
    }

    /// Overrides the per-ingredient quantity floor.
    #[must_use]
    pub fn with_min_quantity(mut self, min_quantity_g: f64) -> Self {
        self.min_quantity_g = min_quantity_g;
        self
    }

    /// Menu price used as the revenue baseline
    pub fn displayed_price(&self) -> f64 {
        self.displayed_price
    }

    /// Desired margin in percent points
    pub fn target_margin_pct(&self) -> f64 {
        self.target_margin_pct
    }

    /// Per-ingredient quantity floor in grams
    pub fn min_quantity_g(&self) -> f64 {
        self.min_quantity_g
    }

    /// Maximum total ingredient cost compatible with the target margin.
    pub fn budget(&self) -> f64 {
        margins::budget(self.displayed_price, self.target_margin_pct)
    }

    /// Rejects requests that cannot produce a finite budget or a usable floor.
    ///
    /// Targets above 100% are accepted: they yield a negative budget and end up
    /// unreachable.
    ///
    /// # Errors
    ///
    /// Returns [`OptimiserError::InvalidRequest`] for non-finite budgets and for
    /// negative or non-finite floors.
    pub fn validate(&self) -> Result<(), OptimiserError> {
        if !self.budget().is_finite() {
            return Err(OptimiserError::InvalidRequest("budget is not finite"));
        }

        if !self.min_quantity_g.is_finite() || self.min_quantity_g < 0.0 {
            return Err(OptimiserError::InvalidRequest(
                "minimum quantity must be a non-negative number of grams",
            ));
        }

        Ok(())
    }
}

/// An ingredient line paired with its adjusted quantity.
///
/// The new cost is always computed from the new quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjustedIngredient {
    ingredient: Ingredient,
    new_quantity_g: f64,
}

impl AdjustedIngredient {
    /// Pairs `ingredient` with a new quantity.
    pub fn new(ingredient: Ingredient, new_quantity_g: f64) -> Self {
        Self {
            ingredient,
            new_quantity_g,
        }
    }

    /// Carries `ingredient` through with its current quantity.
    pub fn unchanged(ingredient: Ingredient) -> Self {
        let new_quantity_g = ingredient.quantity_g();

        Self::new(ingredient, new_quantity_g)
    }

    /// Original ingredient line
    pub fn ingredient(&self) -> &Ingredient {
        &self.ingredient
    }

    /// Ingredient name
    pub fn name(&self) -> &str {
        self.ingredient.name()
    }

    /// Original quantity in grams
    pub fn quantity_g(&self) -> f64 {
        self.ingredient.quantity_g()
    }

    /// Original cost
    pub fn cost(&self) -> f64 {
        self.ingredient.cost()
    }

    /// Adjusted quantity in grams
    pub fn new_quantity_g(&self) -> f64 {
        self.new_quantity_g
    }

    /// Adjusted cost (`new_quantity_g * unit_price_per_kg / 1000`)
    pub fn new_cost(&self) -> f64 {
        ingredient_cost(self.new_quantity_g, self.ingredient.unit_price_per_kg())
    }

    /// Change in grams (negative for a cut)
    pub fn quantity_delta_g(&self) -> f64 {
        self.new_quantity_g - self.ingredient.quantity_g()
    }

    /// Change in cost (negative for a saving)
    pub fn cost_delta(&self) -> f64 {
        self.new_cost() - self.cost()
    }

    /// Returns true if the quantity moved.
    pub fn is_changed(&self) -> bool {
        self.quantity_delta_g().abs() > COST_TOLERANCE
    }
}

/// Output of a strategy: every input row with its adjusted quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimisationResult {
    strategy: StrategyKind,
    rows: Vec<AdjustedIngredient>,
    budget: f64,
    outcome: Outcome,
}

impl OptimisationResult {
    /// Builds a result applying `adjustments` on top of the original quantities.
    ///
    /// Rows without an adjustment are carried through unchanged.
    pub(crate) fn optimised(
        strategy: StrategyKind,
        ingredients: &[Ingredient],
        adjustments: &Adjustments,
        budget: f64,
    ) -> Self {
        let mut rows: Vec<AdjustedIngredient> = ingredients
            .iter()
            .cloned()
            .map(AdjustedIngredient::unchanged)
            .collect();

        for &(idx, quantity) in adjustments {
            if let Some(row) = rows.get_mut(idx) {
                row.new_quantity_g = quantity;
            }
        }

        Self {
            strategy,
            rows,
            budget,
            outcome: Outcome::Optimised,
        }
    }

    /// Builds a result carrying every row through unchanged.
    pub(crate) fn unchanged(
        strategy: StrategyKind,
        ingredients: &[Ingredient],
        budget: f64,
        reason: UnchangedReason,
    ) -> Self {
        Self {
            strategy,
            rows: ingredients
                .iter()
                .cloned()
                .map(AdjustedIngredient::unchanged)
                .collect(),
            budget,
            outcome: Outcome::Unchanged(reason),
        }
    }

    /// Strategy that produced this result
    pub fn strategy(&self) -> StrategyKind {
        self.strategy
    }

    /// Rows in recipe order
    pub fn rows(&self) -> &[AdjustedIngredient] {
        &self.rows
    }

    /// Looks up a row by ingredient name, ignoring case.
    pub fn row(&self, name: &str) -> Option<&AdjustedIngredient> {
        self.rows.iter().find(|row| row.ingredient.is_named(name))
    }

    /// Ingredient budget the strategy worked against
    pub fn budget(&self) -> f64 {
        self.budget
    }

    /// Whether new quantities were produced
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Returns true if the original quantities were carried through.
    pub fn is_unchanged(&self) -> bool {
        matches!(self.outcome, Outcome::Unchanged(_))
    }

    /// Total cost before optimisation
    pub fn original_total(&self) -> f64 {
        self.rows.iter().map(AdjustedIngredient::cost).sum()
    }

    /// Total cost after optimisation
    pub fn new_total(&self) -> f64 {
        self.rows.iter().map(AdjustedIngredient::new_cost).sum()
    }

    /// Margin reached at `displayed_price` with the adjusted quantities.
    pub fn realised_margin_pct(&self, displayed_price: f64) -> Option<f64> {
        margins::margin_pct(displayed_price, self.new_total())
    }
}

/// Optimisation strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Minimise total absolute deviation in grams
    LinearDistance,

    /// Minimise the worst proportional cut, rounded to 5 g
    Balanced,

    /// Balanced cut scaled to land exactly on the budget
    ExactTarget,

    /// Cut only the two most expensive ingredients
    TopTwo,
}

impl StrategyKind {
    /// Every strategy, in presentation order.
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::LinearDistance,
        StrategyKind::Balanced,
        StrategyKind::ExactTarget,
        StrategyKind::TopTwo,
    ];

    /// Short machine-friendly name.
    pub fn name(self) -> &'static str {
        match self {
            StrategyKind::LinearDistance => "linear_distance",
            StrategyKind::Balanced => "balanced",
            StrategyKind::ExactTarget => "exact_target",
            StrategyKind::TopTwo => "top_two",
        }
    }

    /// Business policy encoded by the strategy.
    pub fn policy(self) -> &'static str {
        match self {
            StrategyKind::LinearDistance => "cheapest possible change",
            StrategyKind::Balanced => "fair, proportional change",
            StrategyKind::ExactTarget => "exact target, balance secondary",
            StrategyKind::TopTwo => "renegotiate the two biggest cost drivers only",
        }
    }

    /// Runs the selected strategy.
    pub fn optimise(
        self,
        ingredients: &[Ingredient],
        request: &OptimisationRequest,
    ) -> OptimisationResult {
        self.optimise_with_observer(ingredients, request, &mut NoopObserver)
    }

    /// Runs the selected strategy, reporting LP construction to `observer`.
    pub fn optimise_with_observer<O: FormulationObserver + ?Sized>(
        self,
        ingredients: &[Ingredient],
        request: &OptimisationRequest,
        observer: &mut O,
    ) -> OptimisationResult {
        match self {
            StrategyKind::LinearDistance => {
                LinearDistance::optimise_with_observer(ingredients, request, observer)
            }
            StrategyKind::Balanced => {
                BalancedReduction::optimise_with_observer(ingredients, request, observer)
            }
            StrategyKind::ExactTarget => {
                ExactTarget::optimise_with_observer(ingredients, request, observer)
            }
            StrategyKind::TopTwo => {
                TopTwoReduction::optimise_with_observer(ingredients, request, observer)
            }
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Trait for grammage optimisation strategies
pub trait Strategy {
    /// Selector matching this strategy
    const KIND: StrategyKind;

    /// Computes new quantities for the optimisable rows of `plan`.
    ///
    /// # Errors
    ///
    /// Returns an [`OptimiserError`] when no acceptable adjustment exists; the caller
    /// turns it into an unchanged result.
    fn adjust<O: FormulationObserver + ?Sized>(
        plan: &Plan<'_>,
        observer: &mut O,
    ) -> Result<Adjustments, OptimiserError>;

    /// Optimises `ingredients` against `request`.
    ///
    /// Never fails: on any error the original quantities are returned.
    fn optimise(ingredients: &[Ingredient], request: &OptimisationRequest) -> OptimisationResult {
        Self::optimise_with_observer(ingredients, request, &mut NoopObserver)
    }

    /// Optimises `ingredients` against `request`, reporting LP construction to
    /// `observer`.
    fn optimise_with_observer<O: FormulationObserver + ?Sized>(
        ingredients: &[Ingredient],
        request: &OptimisationRequest,
        observer: &mut O,
    ) -> OptimisationResult {
        let budget = request.budget();
        let _span = tracing::debug_span!("optimise", strategy = %Self::KIND, budget).entered();

        let adjusted =
            Plan::new(ingredients, request).and_then(|plan| Self::adjust(&plan, observer));

        match adjusted {
            Ok(adjustments) => {
                let result =
                    OptimisationResult::optimised(Self::KIND, ingredients, &adjustments, budget);

                tracing::debug!(
                    original_total = total_cost(ingredients),
                    new_total = result.new_total(),
                    adjusted_rows = adjustments.len(),
                    "grammage optimised"
                );

                result
            }
            Err(err) => {
                let reason = UnchangedReason::from(&err);

                match reason {
                    UnchangedReason::AlreadyWithinBudget
                    | UnchangedReason::NoOptimisableIngredients
                    | UnchangedReason::NotEnoughCostDrivers => {
                        tracing::debug!(?reason, "recipe left unchanged: {err}");
                    }
                    UnchangedReason::BudgetUnreachable
                    | UnchangedReason::InvalidRequest
                    | UnchangedReason::SolverFailed => {
                        tracing::warn!(?reason, "recipe left unchanged: {err}");
                    }
                }

                OptimisationResult::unchanged(Self::KIND, ingredients, budget, reason)
            }
        }
    }
}
