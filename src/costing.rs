//! Costing
//!
//! The cost engine: prices each recipe line from its grammage and its price per
//! kilogram. Pure and infallible; zero or negative inputs simply flow through the
//! arithmetic.

use smallvec::SmallVec;

use crate::ingredients::Ingredient;

/// Grams in a kilogram.
pub const GRAMS_PER_KG: f64 = 1000.0;

/// Cost of `quantity_g` grams bought at `unit_price_per_kg`.
pub fn ingredient_cost(quantity_g: f64, unit_price_per_kg: f64) -> f64 {
    quantity_g * unit_price_per_kg / GRAMS_PER_KG
}

/// A priced recipe line.
#[derive(Debug, Clone, PartialEq)]
pub struct CostLine {
    /// Ingredient name
    pub name: String,

    /// Quantity in grams
    pub quantity_g: f64,

    /// Price per kilogram
    pub unit_price_per_kg: f64,

    /// Line cost
    pub cost: f64,

    /// Whether the line is a protected dough base
    pub protected: bool,
}

/// Priced recipe: one [`CostLine`] per ingredient plus the total.
#[derive(Debug, Clone, PartialEq)]
pub struct CostSheet {
    lines: Vec<CostLine>,
    total: f64,
}

impl CostSheet {
    /// Priced lines, in recipe order.
    pub fn lines(&self) -> &[CostLine] {
        &self.lines
    }

    /// Total ingredient cost.
    pub fn total(&self) -> f64 {
        self.total
    }
}

/// Prices every ingredient line.
pub fn price(ingredients: &[Ingredient]) -> CostSheet {
    let lines: Vec<CostLine> = ingredients
        .iter()
        .map(|ingredient| CostLine {
            name: ingredient.name().to_string(),
            quantity_g: ingredient.quantity_g(),
            unit_price_per_kg: ingredient.unit_price_per_kg(),
            cost: ingredient.cost(),
            protected: ingredient.is_protected(),
        })
        .collect();

    let total = lines.iter().map(|line| line.cost).sum();

    CostSheet { lines, total }
}

/// Orders indexed rows by descending cost.
///
/// Ties keep their input order.
pub fn rank_by_cost<'a>(
    rows: impl IntoIterator<Item = (usize, &'a Ingredient)>,
) -> SmallVec<[(usize, &'a Ingredient); 16]> {
    let mut ranked: SmallVec<[(usize, &'a Ingredient); 16]> = rows.into_iter().collect();

    ranked.sort_by(|(_, a), (_, b)| b.cost().total_cmp(&a.cost()));

    ranked
}

/// Total cost of a set of ingredient lines.
pub fn total_cost(ingredients: &[Ingredient]) -> f64 {
    ingredients.iter().map(Ingredient::cost).sum()
}
