use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use appetit_core::models::Food;
use appetit_core::nutrition::Nutrient;

/// Parse a `name=quantity` grocery row.
pub(crate) fn parse_item_pair(s: &str) -> Result<(String, String)> {
    let Some((name, quantity)) = s.split_once('=') else {
        bail!("Invalid item '{s}'. Use the form 'name=quantity' (e.g. 'flour=1 kg')");
    };
    Ok((name.trim().to_string(), quantity.trim().to_string()))
}

pub(crate) fn prompt_choice(label: &str, count: usize) -> Result<usize> {
    eprint!("\n{label} (1-{count}): ");
    io::stderr().flush()?;
    let stdin = io::stdin();
    let line = stdin.lock().lines().next().context("No input")??;
    let n: usize = line.trim().parse().context("Invalid number")?;
    if n < 1 || n > count {
        bail!("Selection out of range");
    }
    Ok(n - 1)
}

pub(crate) fn format_serving(serving: Option<f64>) -> String {
    serving.map_or_else(|| "-".to_string(), |s| format!("{}", no_neg_zero(s)))
}

fn nutrient_cell(nutrient: Option<&Nutrient>) -> String {
    nutrient.map_or_else(|| "-".to_string(), ToString::to_string)
}

pub(crate) fn print_food_table(foods: &[&Food]) {
    #[derive(Tabled)]
    struct FoodRow {
        #[tabled(rename = "#")]
        idx: usize,
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Meal")]
        meal: String,
        #[tabled(rename = "Serving")]
        serving: String,
        #[tabled(rename = "Calories")]
        calories: String,
        #[tabled(rename = "Protein")]
        protein: String,
        #[tabled(rename = "Carbs")]
        carbs: String,
        #[tabled(rename = "Fat")]
        fat: String,
        #[tabled(rename = "Fiber")]
        fiber: String,
    }

    let rows: Vec<FoodRow> = foods
        .iter()
        .enumerate()
        .map(|(i, f)| FoodRow {
            idx: i + 1,
            id: f.id,
            name: truncate(&f.name, 35),
            meal: f.meal_type.clone().unwrap_or_else(|| "catalog".to_string()),
            serving: format_serving(f.serving),
            calories: nutrient_cell(f.nutrients.calories.as_ref()),
            protein: nutrient_cell(f.nutrients.protein.as_ref()),
            carbs: nutrient_cell(f.nutrients.carbs.as_ref()),
            fat: nutrient_cell(f.nutrients.fat.as_ref()),
            fiber: nutrient_cell(f.nutrients.fiber.as_ref()),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(4..10)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

/// Print a not-found message (or JSON error) and exit with status 2.
pub(crate) fn exit_not_found(message: &str, json: bool) -> ! {
    if json {
        println!("{}", json_error(message));
    } else {
        eprintln!("{message}");
    }
    std::process::exit(2);
}

pub(crate) fn no_neg_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}
