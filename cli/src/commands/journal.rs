use anyhow::Result;

use appetit_core::db::Database;
use appetit_core::service::AppetitService;

use super::helpers::{format_serving, no_neg_zero};

pub(crate) fn cmd_journal(db: &Database, json: bool) -> Result<()> {
    let svc = AppetitService::new(db);
    let summary = svc.journal_summary()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("=== Journal ===\n");
    for meal in &summary.meals {
        let label = meal.meal_type.to_uppercase();
        let cal = no_neg_zero(meal.calories);
        let protein = no_neg_zero(meal.protein);
        println!("  {label}  {cal:.2} cal | {protein:.0}g protein");
        if meal.foods.is_empty() {
            println!("    (nothing logged)");
        }
        for f in &meal.foods {
            let id = f.id;
            let name = &f.name;
            let serving = format_serving(f.serving);
            println!("    [{id}] {name} x{serving}");
        }
        println!();
    }

    let goal = summary.goal_calories;
    let consumed = no_neg_zero(summary.consumed_calories);
    println!("  GOAL: {goal:.0} cal | EATEN: {consumed:.0} cal");
    println!("  {}", summary.remaining_label());

    Ok(())
}
