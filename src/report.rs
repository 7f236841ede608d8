//! Report
//!
//! Terminal rendering of an optimisation result: one table row per ingredient with its
//! original and adjusted grams and costs, followed by a margin summary.

use std::{fmt::Write, io};

use decimal_percentage::Percentage;
use num_traits::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    margins,
    optimiser::{AdjustedIngredient, OptimisationResult, Outcome},
    recipes::Recipe,
};

/// Errors that can occur when rendering a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Writing to the output failed.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// An amount cannot be shown as money (non-finite or out of range).
    #[error("amount {0} cannot be represented in minor units")]
    AmountNotRepresentable(f64),
}

/// Original vs adjusted recipe for one dish.
#[derive(Debug, Clone, Copy)]
pub struct Report<'a> {
    recipe: &'a Recipe,
    result: &'a OptimisationResult,
    currency: &'static Currency,
}

impl<'a> Report<'a> {
    /// Creates a report for `recipe` optimised into `result`, with amounts in `currency`.
    pub fn new(
        recipe: &'a Recipe,
        result: &'a OptimisationResult,
        currency: &'static Currency,
    ) -> Self {
        Self {
            recipe,
            result,
            currency,
        }
    }

    /// Writes the table and summary to `out`.
    ///
    /// # Errors
    ///
    /// Returns a [`ReportError`] if an amount cannot be formatted or the output fails.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), ReportError> {
        writeln!(
            out,
            "\n \x1b[1m{}\x1b[0m ({}: {})",
            self.recipe.name(),
            self.result.strategy(),
            self.result.strategy().policy()
        )?;

        let mut builder = Builder::default();
        let mut color_ops: SmallVec<[(usize, usize, Color); 32]> = SmallVec::new();

        push_header(&mut builder);

        for (idx, row) in self.result.rows().iter().enumerate() {
            builder.push_record(self.row_cells(row)?);

            if row.is_changed() {
                color_ops.push((idx + 1, 3, color_for_delta(row.quantity_delta_g())));
                color_ops.push((idx + 1, 5, color_for_delta(row.cost_delta())));
            }
        }

        write_table(&mut out, builder, color_ops)?;

        self.write_summary(&mut out)
    }

    fn row_cells(&self, row: &AdjustedIngredient) -> Result<[String; 6], ReportError> {
        let name = if row.ingredient().is_protected() {
            format!("{} (protected)", row.name())
        } else {
            row.name().to_string()
        };

        Ok([
            name,
            self.money(row.ingredient().unit_price_per_kg())?.to_string(),
            format_grams(row.quantity_g()),
            format_grams(row.new_quantity_g()),
            self.money(row.cost())?.to_string(),
            self.money(row.new_cost())?.to_string(),
        ])
    }

    fn write_summary(&self, out: &mut impl io::Write) -> Result<(), ReportError> {
        let price = self.recipe.displayed_price();
        let original = self.result.original_total();
        let adjusted = self.result.new_total();

        let lines = [
            (" Price:", self.money(price)?.to_string()),
            (" Budget:", self.money(self.result.budget())?.to_string()),
            (
                " Cost:",
                format!("{} -> {}", self.money(original)?, self.money(adjusted)?),
            ),
            (
                " Margin:",
                format!(
                    "{} -> {}",
                    format_margin(margins::margin_pct(price, original)),
                    format_margin(self.result.realised_margin_pct(price))
                ),
            ),
            (" Outcome:", format_outcome(self.result.outcome())),
        ];

        let label_width = lines
            .iter()
            .map(|(label, _)| label.chars().count())
            .max()
            .unwrap_or_default();

        for (label, value) in lines {
            writeln!(out, "{label:>label_width$}  {value}")?;
        }

        writeln!(out)?;

        Ok(())
    }

    fn money(&self, amount: f64) -> Result<Money<'static, Currency>, ReportError> {
        let minor = Decimal::from_f64(amount)
            .and_then(|value| value.checked_mul(Decimal::ONE_HUNDRED))
            .and_then(|value| value.round_dp(0).to_i64())
            .ok_or(ReportError::AmountNotRepresentable(amount))?;

        Ok(Money::from_minor(minor, self.currency))
    }
}

fn push_header(builder: &mut Builder) {
    builder.push_record([
        "Ingredient",
        "Price/kg",
        "Grams",
        "New grams",
        "Cost",
        "New cost",
    ]);
}

fn write_table(
    out: &mut impl io::Write,
    builder: Builder,
    color_ops: SmallVec<[(usize, usize, Color); 32]>,
) -> Result<(), ReportError> {
    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());
    let separator = HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤'));

    theme.remove_horizontal_lines();
    theme.insert_horizontal_line(1, separator);

    table.with(theme);
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(1..6), Alignment::right());

    for (row, col, color) in color_ops {
        table.modify((row, col), color);
    }

    let table_str = colorize_borders(&table.to_string());

    writeln!(out, "{table_str}")?;

    Ok(())
}

fn format_grams(grams: f64) -> String {
    if (grams - grams.round()).abs() < 1e-6 {
        format!("{grams:.0} g")
    } else {
        format!("{grams:.1} g")
    }
}

/// Formats a margin given in percent points.
fn format_margin(margin_pct: Option<f64>) -> String {
    margin_pct
        .and_then(|pct| percent_points(Percentage::from(pct / 100.0)))
        .map_or_else(|| "n/a".to_string(), |points| format!("{points:.2}%"))
}

/// Converts a fractional percentage to percent points for display.
fn percent_points(percentage: Percentage) -> Option<Decimal> {
    (percentage * Decimal::ONE)
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|points| points.round_dp(2))
}

fn format_outcome(outcome: Outcome) -> String {
    match outcome {
        Outcome::Optimised => "optimised".to_string(),
        Outcome::Unchanged(reason) => format!("unchanged ({reason:?})"),
    }
}

/// Cuts are green, increases yellow.
fn color_for_delta(delta: f64) -> Color {
    if delta < 0.0 {
        Color::new("\x1b[32m", "\x1b[0m")
    } else {
        Color::new("\x1b[33m", "\x1b[0m")
    }
}

/// Wraps runs of box-drawing characters (U+2500..U+257F) in ANSI dark grey.
fn colorize_borders(table: &str) -> String {
    let mut out = String::with_capacity(table.len() + 256);
    let mut in_run = false;

    for ch in table.chars() {
        let box_char = ('\u{2500}'..='\u{257F}').contains(&ch);

        if box_char && !in_run {
            _ = out.write_str("\x1b[90m");
            in_run = true;
        } else if !box_char && in_run {
            _ = out.write_str("\x1b[0m");
            in_run = false;
        }

        out.push(ch);
    }

    if in_run {
        _ = out.write_str("\x1b[0m");
    }

    out
}
