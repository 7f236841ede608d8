//! Grammage Optimisation Example
//!
//! Runs one strategy on one dish and prints the original and adjusted recipe.
//!
//! Use `-f` to load a fixture set by name
//! Use `-d` to pick the dish (defaults to the first one in the set)
//! Use `-s` to pick the strategy and `-m` to override the target margin
//! Set `RUST_LOG=grammage=debug` to see why a recipe was left unchanged

use std::{io, io::Write, time::Instant};

use anyhow::{Result, anyhow};
use clap::Parser;
use humanize_duration::{Truncate, prelude::DurationExt};
use tracing_subscriber::EnvFilter;

use grammage::{
    fixtures::Fixture,
    optimiser::{OptimisationRequest, StrategyKind},
    report::Report,
    utils::ExampleRecipeArgs,
};

/// Default target margin, in percent points
const DEFAULT_MARGIN_PCT: f64 = 70.0;

/// Grammage Optimisation Example
pub fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = ExampleRecipeArgs::parse();
    let fixture = Fixture::from_set(&args.fixture)?;

    let entry = match args.dish.as_deref() {
        Some(dish) => fixture.recipe(dish)?,
        None => fixture
            .menu()
            .first()
            .ok_or_else(|| anyhow!("fixture set {} has no recipes", args.fixture))?,
    };

    let strategy = args
        .strategy
        .or(entry.strategy)
        .unwrap_or(StrategyKind::Balanced);

    let margin = args
        .margin
        .or(entry.target_margin_pct)
        .unwrap_or(DEFAULT_MARGIN_PCT);

    let request = OptimisationRequest::new(entry.recipe.displayed_price(), margin)
        .with_min_quantity(args.min_quantity);

    let start = Instant::now();
    let result = entry.recipe.optimise_with(strategy, &request);
    let elapsed = start.elapsed();

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    Report::new(&entry.recipe, &result, fixture.currency()?).write_to(&mut handle)?;

    writeln!(
        handle,
        " target {margin:.2}% | {} ({}s)",
        elapsed.human(Truncate::Nano),
        elapsed.as_secs_f32()
    )?;

    Ok(())
}
