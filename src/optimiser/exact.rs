//! Exact-Target Strategy
//!
//! Two phases. The balanced cut comes first. If the recipe started over budget and the
//! rounded balanced cut misses it, the cut is refitted onto the budget:
//!
//! - undershoot: every adjusted quantity is scaled up by one factor (never past the
//!   original quantity);
//! - overshoot: the unrounded balanced quantities are used, which sit on the budget.
//!
//! The refitted quantities are rounded down to 5 g, then rows are stepped back up, those
//! closest to their next step first, while the cost stays within budget. The result never
//! exceeds the budget and falls short of it by less than one step of the dearest row.

use smallvec::SmallVec;

use crate::{
    costing::ingredient_cost,
    optimiser::{
        Adjustments, COST_TOLERANCE, OptimiserError, ROUNDING_STEP_G, Strategy, StrategyKind,
        balanced::BalancedReduction,
        observer::FormulationObserver,
        plan::Plan,
        rounding::{floor_to_step, kitchen_quantity_down},
    },
};

/// Strategy C: exact target, balance secondary
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactTarget;

impl Strategy for ExactTarget {
    const KIND: StrategyKind = StrategyKind::ExactTarget;

    fn adjust<O: FormulationObserver + ?Sized>(
        plan: &Plan<'_>,
        observer: &mut O,
    ) -> Result<Adjustments, OptimiserError> {
        let (solved, _) = BalancedReduction::solve(plan, observer)?;
        let candidate = BalancedReduction::round(plan, &solved)?;

        if plan.is_within_budget() {
            return Ok(candidate);
        }

        let candidate_cost = variable_cost(plan, &candidate)?;
        let target = plan.variable_budget();

        if candidate_cost <= 0.0 || (candidate_cost - target).abs() <= COST_TOLERANCE {
            return Ok(candidate);
        }

        let ideal = if candidate_cost < target {
            let factor = target / candidate_cost;

            tracing::trace!(candidate_cost, target, factor, "scaling balanced cut up");

            candidate
                .iter()
                .map(|&(row, quantity)| {
                    let q0 = plan.ingredient(row)?.quantity_g();

                    Ok((row, (quantity * factor).min(q0)))
                })
                .collect::<Result<Adjustments, OptimiserError>>()?
        } else {
            tracing::trace!(candidate_cost, target, "balanced rounding overshot");

            solved
        };

        fit_to_budget(plan, &ideal, target)
    }
}

/// Rounds `ideal` onto the 5 g grid without letting the cost exceed `target`.
///
/// Every row starts rounded down. Rows are then raised by one step, largest rounding
/// loss first, whenever the step still fits.
fn fit_to_budget(
    plan: &Plan<'_>,
    ideal: &Adjustments,
    target: f64,
) -> Result<Adjustments, OptimiserError> {
    let min_quantity_g = plan.min_quantity_g();

    let mut fitted: Adjustments = ideal
        .iter()
        .map(|&(row, quantity)| (row, kitchen_quantity_down(quantity, min_quantity_g)))
        .collect();

    let mut cost = variable_cost(plan, &fitted)?;

    // Fraction of a step lost to rounding down, per entry
    let mut order: SmallVec<[(usize, f64); 16]> = ideal
        .iter()
        .zip(fitted.iter())
        .enumerate()
        .map(|(idx, (&(_, wanted), &(_, kept)))| (idx, (wanted - kept) / ROUNDING_STEP_G))
        .collect();

    order.sort_by(|(_, a), (_, b)| b.total_cmp(a));

    for (idx, _) in order {
        let Some((row, quantity)) = fitted.get_mut(idx) else {
            continue;
        };

        let ingredient = plan.ingredient(*row)?;
        let raised = floor_to_step(*quantity + ROUNDING_STEP_G, ROUNDING_STEP_G)
            .min(ingredient.quantity_g());
        let extra = ingredient_cost(raised - *quantity, ingredient.unit_price_per_kg());

        if raised > *quantity && cost + extra <= target + COST_TOLERANCE {
            *quantity = raised;
            cost += extra;
        }
    }

    tracing::trace!(cost, target, "exact cut fitted");

    Ok(fitted)
}

/// Cost of the adjusted rows at their adjusted quantities.
fn variable_cost(plan: &Plan<'_>, adjustments: &Adjustments) -> Result<f64, OptimiserError> {
    adjustments
        .iter()
        .map(|&(row, quantity)| {
            plan.ingredient(row)
                .map(|ingredient| ingredient_cost(quantity, ingredient.unit_price_per_kg()))
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{
        ingredients::Ingredient,
        optimiser::{OptimisationRequest, Outcome, ROUNDING_STEP_G, observer::NoopObserver},
    };

    use super::*;

    #[test]
    fn undershoot_lands_within_one_step_of_budget() -> TestResult {
        // Balanced cut gives 142.86 g / 35.71 g, rounded to 145 g / 35 g for 0.495
        let ingredients = [
            Ingredient::new("Jambon", 400.0, 1.0),
            Ingredient::new("Parmesan", 100.0, 10.0),
        ];
        let request = OptimisationRequest::new(10.0, 95.0);

        let balanced = BalancedReduction::optimise(&ingredients, &request);
        let exact = ExactTarget::optimise(&ingredients, &request);

        assert_eq!(exact.outcome(), Outcome::Optimised);
        assert!(balanced.new_total() < request.budget());
        assert!(exact.new_total() >= balanced.new_total() - 1e-9);

        let step_cost = exact
            .rows()
            .iter()
            .map(|row| ingredient_cost(ROUNDING_STEP_G, row.ingredient().unit_price_per_kg()))
            .fold(0.0, f64::max);

        assert!(exact.new_total() <= request.budget() + 1e-9);
        assert!(request.budget() - exact.new_total() < step_cost);

        // 146.46 g / 35.35 g after scaling; only the jambon step still fits
        let jambon = exact.row("Jambon").ok_or("missing jambon")?;
        let parmesan = exact.row("Parmesan").ok_or("missing parmesan")?;

        assert!((jambon.new_quantity_g() - 150.0).abs() < 1e-9);
        assert!((parmesan.new_quantity_g() - 35.0).abs() < 1e-9);

        Ok(())
    }

    #[test]
    fn overshooting_rounding_is_pulled_back_under_budget() -> TestResult {
        let ingredients = [
            Ingredient::new("Tomate", 120.0, 2.0),
            Ingredient::new("Mozzarella", 150.0, 6.0),
            Ingredient::new("Jambon", 100.0, 12.0),
            Ingredient::new("Champignons", 60.0, 4.0),
        ];

        // Balanced rounds 46.5 / 58.1 / 38.8 / 23.3 g to 45 / 60 / 40 / 25 g, costing 1.03
        let request = OptimisationRequest::new(10.0, 90.0);

        let balanced = BalancedReduction::optimise(&ingredients, &request);
        let exact = ExactTarget::optimise(&ingredients, &request);

        assert!(balanced.new_total() > request.budget() + 1e-9);
        assert_eq!(exact.outcome(), Outcome::Optimised);
        assert!(exact.new_total() <= request.budget() + 1e-9);
        assert!(request.budget() - exact.new_total() < ingredient_cost(ROUNDING_STEP_G, 12.0));

        for row in exact.rows() {
            assert!(row.new_quantity_g() <= row.quantity_g(), "{} grew", row.name());
        }

        Ok(())
    }

    #[test]
    fn fitting_stops_at_the_original_quantity() -> TestResult {
        let ingredients = [
            Ingredient::new("Jambon", 149.0, 12.0),
            Ingredient::new("Mozzarella", 149.0, 6.0),
        ];
        let request = OptimisationRequest::new(10.0, 70.0);
        let plan = Plan::new(&ingredients, &request)?;

        let ideal: Adjustments = smallvec::smallvec![(0, 149.0), (1, 147.0)];
        let fitted = fit_to_budget(&plan, &ideal, 10.0)?;

        assert_eq!(fitted.as_slice(), &[(0, 149.0), (1, 149.0)]);

        Ok(())
    }

    #[test]
    fn candidate_is_costed_at_rounded_quantities() -> TestResult {
        let ingredients = [
            Ingredient::new("Jambon", 400.0, 1.0),
            Ingredient::new("Parmesan", 100.0, 10.0),
        ];
        let request = OptimisationRequest::new(10.0, 95.0);
        let plan = Plan::new(&ingredients, &request)?;

        let balanced = BalancedReduction::adjust(&plan, &mut NoopObserver)?;
        let cost = variable_cost(&plan, &balanced)?;

        assert!((cost - 0.495).abs() < 1e-9);

        Ok(())
    }

    #[test]
    fn compliant_recipe_is_not_scaled_up() -> TestResult {
        let ingredients = [
            Ingredient::new("Mozzarella", 200.0, 6.0),
            Ingredient::new("Tomate", 150.0, 2.0),
        ];
        let result = ExactTarget::optimise(&ingredients, &OptimisationRequest::new(10.0, 70.0));

        assert!(result.rows().iter().all(|row| !row.is_changed()));
        assert!((result.new_total() - 1.5).abs() < 1e-9);

        Ok(())
    }

    #[test]
    fn quantities_stay_on_the_five_gram_grid() {
        let ingredients = [
            Ingredient::new("Mozzarella", 200.0, 6.0),
            Ingredient::new("Tomate", 150.0, 2.0),
            Ingredient::new("Pâte à pizza", 250.0, 0.0),
        ];
        let result = ExactTarget::optimise(&ingredients, &OptimisationRequest::new(10.0, 95.0));

        for row in result.rows() {
            let steps = row.new_quantity_g() / ROUNDING_STEP_G;

            assert!((steps - steps.round()).abs() < 1e-9, "{}", row.name());
        }
    }
}
