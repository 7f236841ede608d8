//! Balanced Reduction Strategy
//!
//! Minimises the worst proportional cut (minimax):
//!
//! ```text
//! minimise    r
//! subject to  q0ᵢ - qᵢ ≤ r · q0ᵢ
//!             Σ qᵢ · pᵢ / 1000 ≤ budget - fixed cost
//!             floor ≤ qᵢ ≤ q0ᵢ, 0 ≤ r ≤ 1
//! ```
//!
//! Solved quantities are rounded to the nearest 5 g, capped at the original quantity.
//! The rounded cost may land a little either side of the budget; that drift is accepted
//! here.

use good_lp::{Expression, Solution, Variable, variable};
use smallvec::SmallVec;

use crate::{
    costing::GRAMS_PER_KG,
    optimiser::{
        Adjustments, OptimiserError, Strategy, StrategyKind,
        formulation::Formulation,
        observer::{FormulationObserver, VariableRole},
        plan::Plan,
        rounding::kitchen_quantity,
    },
};

/// Strategy B: fair, proportional change
#[derive(Debug, Clone, Copy, Default)]
pub struct BalancedReduction;

impl BalancedReduction {
    /// Solves the minimax LP and returns unrounded quantities with the worst cut `r`.
    pub(crate) fn solve<O: FormulationObserver + ?Sized>(
        plan: &Plan<'_>,
        observer: &mut O,
    ) -> Result<(Adjustments, f64), OptimiserError> {
        let min_quantity_g = plan.min_quantity_g();

        let mut formulation = Formulation::new();
        let mut budget_lhs = Expression::default();
        let mut quantities: SmallVec<[(usize, Variable); 16]> = SmallVec::new();

        let r = formulation.add_variable(
            variable().min(0.0).max(1.0),
            VariableRole::Reduction,
            None,
            observer,
        );

        formulation.add_to_objective(r, 1.0, observer);

        for (row, ingredient) in plan.optimisable() {
            let q0 = ingredient.quantity_g();

            // Optimisable rows sit above the floor, so the box is never empty
            let q = formulation.add_variable(
                variable().min(min_quantity_g).max(q0),
                VariableRole::Quantity,
                Some(row),
                observer,
            );

            // q0 - q <= r * q0
            formulation.add_leq_constraint("proportional_cut", q * -1.0 - r * q0, -q0, observer);

            budget_lhs += q * (ingredient.unit_price_per_kg() / GRAMS_PER_KG);
            quantities.push((row, q));
        }

        formulation.add_leq_constraint("budget", budget_lhs, plan.variable_budget(), observer);

        let solution = formulation.solve()?;
        let reduction = solution.value(r);

        tracing::trace!(reduction, "balanced cut solved");

        let adjustments = quantities
            .into_iter()
            .map(|(row, q)| (row, solution.value(q)))
            .collect();

        Ok((adjustments, reduction))
    }

    /// Rounds solved quantities to the kitchen grid without exceeding the original.
    ///
    /// An off-grid original that needed no cut stays as it is.
    pub(crate) fn round(
        plan: &Plan<'_>,
        solved: &Adjustments,
    ) -> Result<Adjustments, OptimiserError> {
        solved
            .iter()
            .map(|&(row, quantity)| {
                let q0 = plan.ingredient(row)?.quantity_g();

                Ok((row, kitchen_quantity(quantity, plan.min_quantity_g()).min(q0)))
            })
            .collect()
    }
}

impl Strategy for BalancedReduction {
    const KIND: StrategyKind = StrategyKind::Balanced;

    fn adjust<O: FormulationObserver + ?Sized>(
        plan: &Plan<'_>,
        observer: &mut O,
    ) -> Result<Adjustments, OptimiserError> {
        let (solved, _) = Self::solve(plan, observer)?;

        Self::round(plan, &solved)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{
        ingredients::Ingredient,
        optimiser::{OptimisationRequest, Outcome, observer::FormulationStats},
    };

    use super::*;

    fn margherita() -> [Ingredient; 3] {
        [
            Ingredient::new("Mozzarella", 200.0, 6.0),
            Ingredient::new("Tomate", 150.0, 2.0),
            Ingredient::new("Pâte à pizza", 250.0, 0.0),
        ]
    }

    #[test]
    fn worst_cut_is_shared_by_every_ingredient() -> TestResult {
        let ingredients = margherita();
        let request = OptimisationRequest::new(10.0, 95.0);
        let plan = Plan::new(&ingredients, &request)?;

        let (adjustments, reduction) =
            BalancedReduction::solve(&plan, &mut FormulationStats::default())?;

        // 1.5 * (1 - r) = 0.5
        assert!((reduction - 2.0 / 3.0).abs() < 1e-6);

        for (row, quantity) in adjustments {
            let q0 = ingredients.get(row).ok_or("row out of range")?.quantity_g();

            assert!((q0 - quantity) / q0 <= reduction + 1e-6);
        }

        Ok(())
    }

    #[test]
    fn quantities_are_rounded_to_five_grams() -> TestResult {
        let ingredients = margherita();
        let result =
            BalancedReduction::optimise(&ingredients, &OptimisationRequest::new(10.0, 95.0));

        assert_eq!(result.outcome(), Outcome::Optimised);

        let mozzarella = result.row("Mozzarella").ok_or("missing mozzarella")?;
        let tomate = result.row("Tomate").ok_or("missing tomate")?;

        // 66.67 g and 50 g before rounding
        assert!((mozzarella.new_quantity_g() - 65.0).abs() < 1e-9);
        assert!((tomate.new_quantity_g() - 50.0).abs() < 1e-9);

        Ok(())
    }

    #[test]
    fn compliant_recipe_needs_no_cut() -> TestResult {
        let ingredients = margherita();
        let request = OptimisationRequest::new(10.0, 70.0);
        let plan = Plan::new(&ingredients, &request)?;

        let (_, reduction) = BalancedReduction::solve(&plan, &mut FormulationStats::default())?;

        assert!(reduction.abs() < 1e-6);

        let result = BalancedReduction::optimise(&ingredients, &request);

        assert!(result.rows().iter().all(|row| !row.is_changed()));

        Ok(())
    }

    #[test]
    fn off_grid_compliant_rows_are_not_rounded_up() -> TestResult {
        let ingredients = [
            Ingredient::new("Jambon", 149.0, 12.0),
            Ingredient::new("Mozzarella", 149.0, 6.0),
            Ingredient::new("Tomate", 80.0, 2.0),
        ];
        let result =
            BalancedReduction::optimise(&ingredients, &OptimisationRequest::new(10.0, 70.0));

        assert_eq!(result.outcome(), Outcome::Optimised);

        for row in result.rows() {
            assert!(!row.is_changed(), "{} moved to {}", row.name(), row.new_quantity_g());
        }

        assert!((result.new_total() - result.original_total()).abs() < 1e-12);

        Ok(())
    }

    #[test]
    fn rounded_quantities_never_exceed_the_original() -> TestResult {
        let ingredients = [
            Ingredient::new("Jambon", 149.0, 12.0),
            Ingredient::new("Mozzarella", 149.0, 6.0),
            Ingredient::new("Tomate", 80.0, 2.0),
        ];
        let request = OptimisationRequest::new(10.0, 71.8);
        let plan = Plan::new(&ingredients, &request)?;

        // r is well under 1%, so 148.x g would round to 150 g without the cap
        let solved: Adjustments = smallvec::smallvec![(0, 148.2), (1, 148.2), (2, 79.5)];
        let rounded = BalancedReduction::round(&plan, &solved)?;

        assert_eq!(rounded.as_slice(), &[(0, 149.0), (1, 149.0), (2, 80.0)]);

        Ok(())
    }

    #[test]
    fn formulation_shares_one_reduction_variable() -> TestResult {
        let ingredients = margherita();
        let request = OptimisationRequest::new(10.0, 95.0);
        let plan = Plan::new(&ingredients, &request)?;
        let mut stats = FormulationStats::default();

        BalancedReduction::adjust(&plan, &mut stats)?;

        assert_eq!(stats.count(VariableRole::Reduction), 1);
        assert_eq!(stats.count(VariableRole::Quantity), 2);
        assert_eq!(stats.objective_terms, 1);
        assert_eq!(stats.constraint_count("proportional_cut"), 2);
        assert_eq!(stats.constraint_count("budget"), 1);

        Ok(())
    }
}
