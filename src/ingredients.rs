//! Ingredients

use crate::costing::ingredient_cost;

/// Name fragments that mark dough bases.
///
/// Any ingredient whose lowercased name contains one of these is carried through
/// every optimisation strategy untouched.
pub const PROTECTED_MARKERS: [&str; 2] = ["pâte à pizza", "pâte à panini"];

/// One line of a recipe: an ingredient, its grammage and its purchase price.
///
/// The cost of the line is never stored; it is always derived from the quantity
/// and the price per kilogram, so the two can never drift apart.
#[derive(Debug, Clone, PartialEq)]
pub struct Ingredient {
    name: String,
    quantity_g: f64,
    unit_price_per_kg: f64,
}

impl Ingredient {
    /// Creates a new ingredient line.
    pub fn new(name: impl Into<String>, quantity_g: f64, unit_price_per_kg: f64) -> Self {
        Self {
            name: name.into(),
            quantity_g,
            unit_price_per_kg,
        }
    }

    /// Ingredient name, as supplied by the recipe source.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current quantity in grams.
    pub fn quantity_g(&self) -> f64 {
        self.quantity_g
    }

    /// Purchase price per kilogram.
    pub fn unit_price_per_kg(&self) -> f64 {
        self.unit_price_per_kg
    }

    /// Cost of this line (`quantity_g * unit_price_per_kg / 1000`).
    pub fn cost(&self) -> f64 {
        ingredient_cost(self.quantity_g, self.unit_price_per_kg)
    }

    /// Returns true if this ingredient is a dough base excluded from optimisation.
    pub fn is_protected(&self) -> bool {
        is_protected_name(&self.name)
    }

    /// Case-insensitive name comparison.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }
}

/// Returns true if `name` contains one of the [`PROTECTED_MARKERS`], ignoring case.
pub fn is_protected_name(name: &str) -> bool {
    let lowered = name.to_lowercase();

    PROTECTED_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}
