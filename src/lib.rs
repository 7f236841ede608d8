//! Grammage
//!
//! Ingredient costing, menu margins and margin-driven grammage optimisation for a
//! restaurant menu. Given a priced recipe, a menu price and a target margin, the optimiser
//! rebalances ingredient quantities so the dish fits its ingredient budget.

pub mod costing;
pub mod fixtures;
pub mod ingredients;
pub mod margins;
pub mod optimiser;
pub mod prelude;
pub mod recipes;
pub mod report;
pub mod utils;
