//! Utils

use clap::Parser;

use crate::optimiser::{DEFAULT_MIN_QUANTITY_G, StrategyKind};

/// Arguments for the recipe demos
#[derive(Debug, Parser)]
pub struct ExampleRecipeArgs {
    /// Fixture set to load ingredients & recipes from
    #[clap(short, long, default_value = "pizzeria")]
    pub fixture: String,

    /// Dish to work on (fixture key); defaults to every dish where that makes sense
    #[clap(short, long)]
    pub dish: Option<String>,

    /// Strategy to run; falls back to the dish's own, then `balanced`
    #[clap(short, long, value_enum)]
    pub strategy: Option<StrategyKind>,

    /// Target margin in percent points; falls back to the dish's own, then 70
    #[clap(short, long)]
    pub margin: Option<f64>,

    /// Per-ingredient quantity floor in grams
    #[clap(long, default_value_t = DEFAULT_MIN_QUANTITY_G)]
    pub min_quantity: f64,
}
