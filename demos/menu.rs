//! Menu Margins Example
//!
//! Prints cost, margin and recommended price for every dish of a fixture set, then the
//! sales-weighted margin of the whole menu.
//!
//! Use `-f` to load a fixture set by name
//! Use `-m` to override every dish's target margin

use std::{io, io::Write};

use anyhow::Result;
use clap::Parser;
use tabled::{builder::Builder, settings::Style};
use tracing_subscriber::EnvFilter;

use grammage::{
    fixtures::Fixture,
    margins::{MarginAnalysis, MenuSummary},
    utils::ExampleRecipeArgs,
};

/// Default target margin, in percent points
const DEFAULT_MARGIN_PCT: f64 = 70.0;

/// Menu Margins Example
pub fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = ExampleRecipeArgs::parse();
    let fixture = Fixture::from_set(&args.fixture)?;
    let currency = fixture.currency()?;

    let mut builder = Builder::default();

    builder.push_record([
        "Dish", "Price", "Cost", "Margin %", "Target %", "Gap", "Rec. price",
    ]);

    for entry in fixture.menu() {
        let analysis = MarginAnalysis::of(&entry.recipe);
        let target = args
            .margin
            .or(entry.target_margin_pct)
            .unwrap_or(DEFAULT_MARGIN_PCT);

        let flag = if analysis.meets_target(target) { "" } else { " !" };

        builder.push_record([
            analysis.dish.clone(),
            format!("{:.2}", analysis.displayed_price),
            format!("{:.2}", analysis.cost),
            analysis
                .margin_pct
                .map_or_else(|| "n/a".to_string(), |m| format!("{m:.2}{flag}")),
            format!("{target:.2}"),
            format!("{:.2}", analysis.cost_gap(target)),
            analysis
                .recommended_price(target)
                .map_or_else(|| "n/a".to_string(), |p| format!("{p:.2}")),
        ]);
    }

    let mut table = builder.build();
    table.with(Style::modern_rounded());

    let summary = MenuSummary::from_sales(
        fixture
            .menu()
            .iter()
            .map(|entry| (&entry.recipe, entry.units_sold.unwrap_or_default())),
    );

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    writeln!(handle, "\n{table}")?;
    writeln!(
        handle,
        " {} dishes sold | revenue {:.2} {} | cost {:.2} | margin {}",
        summary.units,
        summary.revenue,
        currency.iso_alpha_code,
        summary.cost,
        summary
            .margin_pct()
            .map_or_else(|| "n/a".to_string(), |m| format!("{m:.2}%"))
    )?;

    Ok(())
}
