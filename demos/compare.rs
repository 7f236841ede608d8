//! Strategy Comparison Example
//!
//! Runs every strategy on one dish and prints the resulting quantities side by side.
//!
//! Use `-f` to load a fixture set by name
//! Use `-d` to pick the dish (defaults to the first one in the set)
//! Use `-m` to override the target margin

use std::{io, io::Write, time::Instant};

use anyhow::{Result, anyhow};
use clap::Parser;
use humanize_duration::{Truncate, prelude::DurationExt};
use tabled::{builder::Builder, settings::Style};
use tracing_subscriber::EnvFilter;

use grammage::{
    fixtures::Fixture,
    optimiser::{OptimisationRequest, OptimisationResult, Outcome, StrategyKind},
    utils::ExampleRecipeArgs,
};

/// Default target margin, in percent points
const DEFAULT_MARGIN_PCT: f64 = 70.0;

/// Strategy Comparison Example
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

    let recipe = &entry.recipe;
    let margin = args
        .margin
        .or(entry.target_margin_pct)
        .unwrap_or(DEFAULT_MARGIN_PCT);

    let request = OptimisationRequest::new(recipe.displayed_price(), margin)
        .with_min_quantity(args.min_quantity);

    let start = Instant::now();

    let results: Vec<OptimisationResult> = StrategyKind::ALL
        .iter()
        .map(|strategy| recipe.optimise_with(*strategy, &request))
        .collect();

    let elapsed = start.elapsed();

    let mut builder = Builder::default();

    let mut header = vec!["Ingredient".to_string(), "Grams".to_string()];
    header.extend(StrategyKind::ALL.iter().map(ToString::to_string));
    builder.push_record(header);

    for (idx, ingredient) in recipe.ingredients().iter().enumerate() {
        let mut record = vec![
            ingredient.name().to_string(),
            format!("{:.0}", ingredient.quantity_g()),
        ];

        record.extend(results.iter().map(|result| {
            result
                .rows()
                .get(idx)
                .map_or_else(String::new, |row| format!("{:.1}", row.new_quantity_g()))
        }));

        builder.push_record(record);
    }

    let mut cost_row = vec!["Cost".to_string(), format!("{:.2}", recipe.total_cost())];
    cost_row.extend(results.iter().map(|r| format!("{:.2}", r.new_total())));
    builder.push_record(cost_row);

    let mut margin_row = vec![
        "Margin %".to_string(),
        recipe
            .margin_pct()
            .map_or_else(|| "n/a".to_string(), |m| format!("{m:.2}")),
    ];
    margin_row.extend(results.iter().map(|r| {
        r.realised_margin_pct(recipe.displayed_price())
            .map_or_else(|| "n/a".to_string(), |m| format!("{m:.2}"))
    }));
    builder.push_record(margin_row);

    let mut outcome_row = vec!["Outcome".to_string(), String::new()];
    outcome_row.extend(results.iter().map(|r| match r.outcome() {
        Outcome::Optimised => "optimised".to_string(),
        Outcome::Unchanged(reason) => format!("{reason:?}"),
    }));
    builder.push_record(outcome_row);

    let mut table = builder.build();
    table.with(Style::modern_rounded());

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    writeln!(
        handle,
        "\n {} at {:.2} for a {margin:.2}% target (budget {:.2})\n{table}",
        recipe.name(),
        recipe.displayed_price(),
        request.budget()
    )?;

    writeln!(
        handle,
        " {} ({}s)",
        elapsed.human(Truncate::Nano),
        elapsed.as_secs_f32()
    )?;

    Ok(())
}
