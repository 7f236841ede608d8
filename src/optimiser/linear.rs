//! Linear-Distance Strategy
//!
//! Minimises total absolute deviation in grams:
//!
//! ```text
//! minimise    Σ dᵢ
//! subject to  qᵢ - dᵢ ≤ q0ᵢ
//!            -qᵢ - dᵢ ≤ -q0ᵢ
//!             Σ qᵢ · pᵢ / 1000 ≤ budget - fixed cost
//!             qᵢ ≥ floor, dᵢ ≥ 0
//! ```
//!
//! Solutions are typically sparse: the grams are taken where each gram saves the most,
//! often crushing one ingredient to the floor while leaving the others alone.

use good_lp::{Expression, Solution, Variable, variable};
use smallvec::SmallVec;

use crate::{
    costing::GRAMS_PER_KG,
    optimiser::{
        Adjustments, OptimiserError, Strategy, StrategyKind,
        formulation::Formulation,
        observer::{FormulationObserver, VariableRole},
        plan::Plan,
    },
};

/// Deviations below this are solver noise and snap back to the original quantity.
const SNAP_TOLERANCE_G: f64 = 1e-7;

/// Strategy A: cheapest possible change, in grams
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearDistance;

impl Strategy for LinearDistance {
    const KIND: StrategyKind = StrategyKind::LinearDistance;

    fn adjust<O: FormulationObserver + ?Sized>(
        plan: &Plan<'_>,
        observer: &mut O,
    ) -> Result<Adjustments, OptimiserError> {
        let min_quantity_g = plan.min_quantity_g();

        let mut formulation = Formulation::new();
        let mut budget_lhs = Expression::default();
        let mut quantities: SmallVec<[(usize, f64, Variable); 16]> = SmallVec::new();

        for (row, ingredient) in plan.optimisable() {
            let q0 = ingredient.quantity_g();

            let q = formulation.add_variable(
                variable().min(min_quantity_g),
                VariableRole::Quantity,
                Some(row),
                observer,
            );
            let d = formulation.add_variable(
                variable().min(0.0),
                VariableRole::Deviation,
                Some(row),
                observer,
            );

            formulation.add_to_objective(d, 1.0, observer);

            // |q - q0| <= d
            formulation.add_leq_constraint(
                "deviation_above",
                Expression::from(q) - d,
                q0,
                observer,
            );
            formulation.add_leq_constraint(
                "deviation_below",
                q * -1.0 - d,
                -q0,
                observer,
            );

            budget_lhs += q * (ingredient.unit_price_per_kg() / GRAMS_PER_KG);
            quantities.push((row, q0, q));
        }

        formulation.add_leq_constraint("budget", budget_lhs, plan.variable_budget(), observer);

        let solution = formulation.solve()?;

        Ok(quantities
            .into_iter()
            .map(|(row, q0, q)| {
                let solved = solution.value(q);

                let quantity = if (solved - q0).abs() < SNAP_TOLERANCE_G {
                    q0
                } else {
                    solved.max(min_quantity_g)
                };

                (row, quantity)
            })
            .collect())
    }
}
