use anyhow::{Result, bail};

use appetit_core::db::Database;
use appetit_core::models::{FoodForm, InsertOutcome, Nutrients, UpdateFood};
use appetit_core::nutrition::Nutrient;
use appetit_core::service::AppetitService;

use super::helpers::{exit_not_found, format_serving, json_error, print_food_table};

pub(crate) fn cmd_food_add(db: &Database, form: &FoodForm, json: bool) -> Result<()> {
    let svc = AppetitService::new(db);
    match svc.add_food(form)? {
        InsertOutcome::Inserted(food) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&food)?);
            } else {
                let id = food.id;
                let name = &food.name;
                let meal = food.meal_type.as_deref().unwrap_or("-");
                println!("Added {name} to {meal} (ID: {id})");
            }
        }
        InsertOutcome::AlreadyExists => {
            let message = format!("Food with the name {} already exists.", form.name.trim());
            if json {
                println!("{}", json_error(&message));
            } else {
                eprintln!("{message}");
            }
            std::process::exit(1);
        }
    }
    Ok(())
}

pub(crate) fn cmd_food_search(db: &Database, query: &str, json: bool) -> Result<()> {
    let svc = AppetitService::new(db);
    let foods = svc.search_catalog(query)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&foods)?);
        return Ok(());
    }

    if foods.is_empty() {
        if query.is_empty() {
            eprintln!("The catalog is empty. Run `appetit seed foods` to load it.");
        } else {
            eprintln!("No catalog foods match '{query}'");
        }
        std::process::exit(2);
    }

    let refs: Vec<_> = foods.iter().collect();
    print_food_table(&refs);
    Ok(())
}

pub(crate) fn cmd_food_show(db: &Database, id: i64, serving: Option<f64>, json: bool) -> Result<()> {
    let svc = AppetitService::new(db);
    let Some(food) = svc.food(id)? else {
        exit_not_found(&format!("Food {id} not found"), json);
    };
    let detail = AppetitService::food_detail(&food, serving)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&detail)?);
        return Ok(());
    }

    let name = &detail.name;
    let meal = detail.meal_type.as_deref().unwrap_or("catalog");
    println!("{name} ({meal})");
    println!("  Serving:  {}", format_serving(Some(detail.serving)));
    println!("  Calories: {}", detail.calories);
    println!("  Protein:  {}", detail.protein);
    println!("  Carbs:    {}", detail.carbs);
    println!("  Fat:      {}", detail.fat);
    println!("  Fiber:    {}", detail.fiber);
    Ok(())
}

/// Nutrients in the order calories, fat, fiber, carbs, protein.
pub(crate) fn cmd_food_update(
    db: &Database,
    id: i64,
    serving: Option<f64>,
    nutrients: [Option<String>; 5],
    json: bool,
) -> Result<()> {
    let [calories, fat, fiber, carbs, protein] =
        nutrients.map(|n| n.as_deref().map(Nutrient::parse));
    let update = UpdateFood {
        serving,
        nutrients: Nutrients {
            calories,
            fat,
            fiber,
            carbs,
            protein,
        },
    };
    if update.is_empty() {
        bail!(
            "Nothing to update. Provide at least one of --serving, --calories, --fat, --fiber, --carbs or --protein"
        );
    }

    let svc = AppetitService::new(db);
    if svc.food(id)?.is_none() {
        exit_not_found(&format!("Food {id} not found"), json);
    }
    let food = svc.update_food(id, &update)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&food)?);
    } else {
        println!("Updated {} (ID: {id})", food.name);
    }
    Ok(())
}

pub(crate) fn cmd_food_delete(db: &Database, id: i64, json: bool) -> Result<()> {
    let svc = AppetitService::new(db);
    if !svc.remove_food(id)? {
        exit_not_found(&format!("Food {id} not found"), json);
    }

    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted food {id}");
    }
    Ok(())
}
