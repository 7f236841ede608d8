//! Margins
//!
//! Budget derivation, margin percentages and price recommendations.
//!
//! Margins are expressed in percent points (`70.0` means 70%) to match how menu
//! targets are quoted.

use crate::recipes::Recipe;

/// Maximum ingredient cost compatible with `target_margin_pct` at `displayed_price`.
///
/// Targets at or above 100% yield a zero or negative budget; nothing is validated here.
pub fn budget(displayed_price: f64, target_margin_pct: f64) -> f64 {
    displayed_price * (1.0 - target_margin_pct / 100.0)
}

/// Margin `(price - cost) / price` in percent points.
///
/// Returns `None` when the price is not strictly positive.
pub fn margin_pct(price: f64, cost: f64) -> Option<f64> {
    (price > 0.0 && price.is_finite()).then(|| (price - cost) / price * 100.0)
}

/// Sale price at which `cost` yields exactly `target_margin_pct`.
///
/// Returns `None` for targets at or above 100% or non-finite inputs.
pub fn recommended_price(cost: f64, target_margin_pct: f64) -> Option<f64> {
    let cost_share = 1.0 - target_margin_pct / 100.0;

    (cost_share > 0.0 && cost.is_finite() && cost_share.is_finite()).then(|| cost / cost_share)
}

/// Margin breakdown for one dish.
#[derive(Debug, Clone, PartialEq)]
pub struct MarginAnalysis {
    /// Dish name
    pub dish: String,

    /// Menu price
    pub displayed_price: f64,

    /// Total ingredient cost
    pub cost: f64,

    /// Price minus cost
    pub margin_amount: f64,

    /// Margin in percent points, if the price is positive
    pub margin_pct: Option<f64>,
}

impl MarginAnalysis {
    /// Analyses a recipe at its displayed price.
    pub fn of(recipe: &Recipe) -> Self {
        let cost = recipe.total_cost();
        let displayed_price = recipe.displayed_price();

        Self {
            dish: recipe.name().to_string(),
            displayed_price,
            cost,
            margin_amount: displayed_price - cost,
            margin_pct: margin_pct(displayed_price, cost),
        }
    }

    /// Returns true if the dish reaches `target_margin_pct` at its current price.
    pub fn meets_target(&self, target_margin_pct: f64) -> bool {
        self.margin_pct
            .is_some_and(|margin| margin >= target_margin_pct)
    }

    /// Ingredient budget for `target_margin_pct` at the current price.
    pub fn budget(&self, target_margin_pct: f64) -> f64 {
        budget(self.displayed_price, target_margin_pct)
    }

    /// Cost that must be removed to reach `target_margin_pct`, zero if already met.
    pub fn cost_gap(&self, target_margin_pct: f64) -> f64 {
        (self.cost - self.budget(target_margin_pct)).max(0.0)
    }

    /// Price that would reach `target_margin_pct` without touching the recipe.
    pub fn recommended_price(&self, target_margin_pct: f64) -> Option<f64> {
        recommended_price(self.cost, target_margin_pct)
    }
}

/// Sales-weighted margin across a menu.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MenuSummary {
    /// Number of dishes sold
    pub units: u64,

    /// Revenue at displayed prices
    pub revenue: f64,

    /// Ingredient cost of everything sold
    pub cost: f64,
}

impl MenuSummary {
    /// Aggregates `(recipe, units sold)` pairs.
    pub fn from_sales<'a>(sales: impl IntoIterator<Item = (&'a Recipe, u32)>) -> Self {
        sales
            .into_iter()
            .fold(Self::default(), |mut summary, (recipe, units)| {
                let units_f = f64::from(units);

                summary.units += u64::from(units);
                summary.revenue += recipe.displayed_price() * units_f;
                summary.cost += recipe.total_cost() * units_f;

                summary
            })
    }

    /// Revenue minus ingredient cost.
    pub fn margin_amount(&self) -> f64 {
        self.revenue - self.cost
    }

    /// Weighted margin in percent points, if anything was sold.
    pub fn margin_pct(&self) -> Option<f64> {
        margin_pct(self.revenue, self.cost)
    }
}
