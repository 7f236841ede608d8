//! Top-Two Reduction Strategy
//!
//! Leaves the recipe alone except for its two most expensive optimisable ingredients,
//! which share one reduction factor:
//!
//! ```text
//! f = (budget - cost of every other row) / cost of the top two, clamped to [0.05, 1]
//! ```
//!
//! Scaled quantities are rounded down to 5 g so a driver never grows past its share.

use crate::{
    costing::rank_by_cost,
    optimiser::{
        Adjustments, OptimiserError, Strategy, StrategyKind, TOP_TWO_MIN_FACTOR,
        observer::FormulationObserver, plan::Plan, rounding::kitchen_quantity_down,
    },
};

/// Number of cost drivers the strategy renegotiates.
const DRIVERS: usize = 2;

/// Strategy D: renegotiate the two biggest cost drivers only
#[derive(Debug, Clone, Copy, Default)]
pub struct TopTwoReduction;

impl Strategy for TopTwoReduction {
    const KIND: StrategyKind = StrategyKind::TopTwo;

    fn adjust<O: FormulationObserver + ?Sized>(
        plan: &Plan<'_>,
        _observer: &mut O,
    ) -> Result<Adjustments, OptimiserError> {
        if plan.is_within_budget() {
            return Err(OptimiserError::AlreadyWithinBudget {
                cost: plan.current_cost(),
                budget: plan.budget(),
            });
        }

        let found = plan.optimisable_count();

        if found < DRIVERS {
            return Err(OptimiserError::NotEnoughCostDrivers {
                required: DRIVERS,
                found,
            });
        }

        let mut drivers = rank_by_cost(plan.optimisable());
        drivers.truncate(DRIVERS);

        let top_cost: f64 = drivers.iter().map(|(_, ingredient)| ingredient.cost()).sum();

        if top_cost <= 0.0 {
            return Err(OptimiserError::InvariantViolation {
                message: "cost drivers over budget with no cost",
            });
        }

        let remaining = plan.budget() - (plan.current_cost() - top_cost);
        let factor = (remaining / top_cost).clamp(TOP_TWO_MIN_FACTOR, 1.0);

        tracing::trace!(top_cost, remaining, factor, "top-two factor");

        Ok(drivers
            .into_iter()
            .map(|(row, ingredient)| {
                (
                    row,
                    kitchen_quantity_down(ingredient.quantity_g() * factor, plan.min_quantity_g()),
                )
            })
            .collect())
    }
}
