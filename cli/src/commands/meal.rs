use anyhow::{Result, bail};

use appetit_core::db::Database;
use appetit_core::models::InsertOutcome;
use appetit_core::service::AppetitService;

use super::helpers::{exit_not_found, format_serving, json_error, print_food_table};
use super::resolve_catalog_food;

pub(crate) fn cmd_meal_show(db: &Database, meal: &str, json: bool) -> Result<()> {
    let svc = AppetitService::new(db);
    let foods = svc.meal_foods(meal)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&foods)?);
        return Ok(());
    }

    if foods.is_empty() {
        eprintln!("Nothing logged to {meal}");
        std::process::exit(2);
    }

    let refs: Vec<_> = foods.iter().collect();
    print_food_table(&refs);
    Ok(())
}

pub(crate) fn cmd_meal_add(
    db: &Database,
    meal: &str,
    query: Option<&str>,
    serving: Option<f64>,
    food_id: Option<i64>,
    json: bool,
) -> Result<()> {
    let svc = AppetitService::new(db);
    let source = match (food_id, query) {
        (Some(id), _) => match svc.food(id)? {
            Some(f) => f,
            None => exit_not_found(&format!("Food {id} not found"), json),
        },
        (None, Some(q)) => resolve_catalog_food(&svc, q)?,
        (None, None) => bail!("Provide a food name to search for, or --food-id"),
    };
    let serving = serving.or(source.serving).unwrap_or(1.0);

    match svc.log_catalog_food(source.id, meal, serving)? {
        InsertOutcome::Inserted(food) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&food)?);
            } else {
                let detail = AppetitService::food_detail(&food, None)?;
                let name = &food.name;
                let meal = food.meal_type.as_deref().unwrap_or(meal);
                let serving = format_serving(food.serving);
                let cal = &detail.calories;
                println!("Logged {name} x{serving} to {meal} ({cal} cal) [id {}]", food.id);
            }
        }
        InsertOutcome::AlreadyExists => {
            let message = format!("{} is already logged to {meal}", source.name);
            if json {
                println!("{}", json_error(&message));
            } else {
                eprintln!("{message}");
            }
        }
    }
    Ok(())
}

pub(crate) fn cmd_meal_remove(db: &Database, meal: &str, name: &str, json: bool) -> Result<()> {
    let svc = AppetitService::new(db);
    let removed = svc.remove_food_from_meal(name, meal)?;
    if removed == 0 {
        exit_not_found(&format!("No '{name}' logged to {meal}"), json);
    }

    if json {
        println!(
            "{}",
            serde_json::json!({ "removed": removed, "name": name, "meal": meal })
        );
    } else {
        println!("Removed {name} from {meal}");
    }
    Ok(())
}

pub(crate) fn cmd_meal_serving(db: &Database, id: i64, serving: &str, json: bool) -> Result<()> {
    let svc = AppetitService::new(db);
    if svc.food(id)?.is_none() {
        exit_not_found(&format!("Food {id} not found"), json);
    }
    let food = svc.set_serving(id, serving)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&food)?);
    } else {
        let detail = AppetitService::food_detail(&food, None)?;
        let name = &food.name;
        let serving = format_serving(food.serving);
        println!(
            "{name} x{serving}: {} cal, {} protein, {} carbs, {} fat, {} fiber",
            detail.calories, detail.protein, detail.carbs, detail.fat, detail.fiber
        );
    }
    Ok(())
}
