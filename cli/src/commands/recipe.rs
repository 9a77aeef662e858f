use anyhow::{Result, bail};
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use appetit_core::db::Database;
use appetit_core::models::{NutrientKind, Nutrients, Recipe, UpdateRecipe};
use appetit_core::nutrition::Nutrient;
use appetit_core::service::AppetitService;

use super::helpers::{exit_not_found, truncate};

fn not_found(name: &str, json: bool) -> ! {
    exit_not_found(&format!("Recipe '{name}' not found"), json)
}

fn nutrient_text(recipe: &Recipe, kind: NutrientKind) -> String {
    recipe
        .nutrients
        .get(kind)
        .map_or_else(|| "-".to_string(), ToString::to_string)
}

pub(crate) fn cmd_recipe_list(
    db: &Database,
    bookmarked: bool,
    search: Option<&str>,
    json: bool,
) -> Result<()> {
    #[derive(Tabled)]
    struct RecipeRow {
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Calories")]
        calories: String,
        #[tabled(rename = "Protein")]
        protein: String,
        #[tabled(rename = "Ingredients")]
        ingredients: String,
        #[tabled(rename = "Saved")]
        saved: String,
    }

    let svc = AppetitService::new(db);
    let recipes = if bookmarked {
        svc.bookmarked_recipes(search)?
    } else {
        svc.recipes(search)?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&recipes)?);
        return Ok(());
    }

    if recipes.is_empty() {
        if bookmarked {
            eprintln!("No bookmarked recipes");
        } else {
            eprintln!("No recipes found. Run `appetit seed recipes` to load some.");
        }
        std::process::exit(2);
    }

    let rows: Vec<RecipeRow> = recipes
        .iter()
        .map(|r| RecipeRow {
            name: truncate(&r.name, 30),
            calories: nutrient_text(r, NutrientKind::Calories),
            protein: nutrient_text(r, NutrientKind::Protein),
            ingredients: truncate(&r.ingredients, 40),
            saved: if r.bookmarked { "*".into() } else { String::new() },
        })
        .collect();
    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{table}");
    Ok(())
}

pub(crate) fn cmd_recipe_show(db: &Database, name: &str, json: bool) -> Result<()> {
    #[derive(Serialize)]
    struct RecipeView<'a> {
        #[serde(flatten)]
        recipe: &'a Recipe,
        steps: Vec<String>,
    }

    let svc = AppetitService::new(db);
    let Some(recipe) = svc.find_recipe(name)? else {
        not_found(name, json);
    };
    let steps = AppetitService::recipe_steps(&recipe);

    if json {
        let view = RecipeView {
            recipe: &recipe,
            steps,
        };
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    let marker = if recipe.bookmarked { " (bookmarked)" } else { "" };
    println!("=== {}{marker} ===\n", recipe.name);
    if let Some(url) = &recipe.image_url {
        println!("  Image: {url}");
    }
    let facts: Vec<String> = NutrientKind::ALL
        .iter()
        .map(|k| format!("{} {}", k.label(), nutrient_text(&recipe, *k)))
        .collect();
    println!("  {}\n", facts.join(" | "));

    println!("  Ingredients: {}\n", recipe.ingredients);
    println!("  Steps:");
    for (i, step) in steps.iter().enumerate() {
        println!("    {}. {step}", i + 1);
    }
    Ok(())
}

pub(crate) fn cmd_recipe_bookmark(db: &Database, name: &str, json: bool) -> Result<()> {
    let svc = AppetitService::new(db);
    if svc.find_recipe(name)?.is_none() {
        not_found(name, json);
    }
    let recipe = svc.bookmark_recipe(name)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&recipe)?);
    } else {
        println!("Bookmarked {}", recipe.name);
    }
    Ok(())
}

/// Nutrients in the order calories, fat, fiber, carbs, protein.
pub(crate) fn cmd_recipe_update(
    db: &Database,
    name: &str,
    ingredients: Option<String>,
    instructions: Option<String>,
    nutrients: [Option<String>; 5],
    json: bool,
) -> Result<()> {
    let [calories, fat, fiber, carbs, protein] =
        nutrients.map(|n| n.as_deref().map(Nutrient::parse));
    let update = UpdateRecipe {
        ingredients,
        instructions,
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
            "Nothing to update. Provide at least one of --ingredients, --instructions, --calories, --fat, --fiber, --carbs or --protein"
        );
    }

    let svc = AppetitService::new(db);
    if svc.find_recipe(name)?.is_none() {
        not_found(name, json);
    }
    let recipe = svc.update_recipe(name, &update)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&recipe)?);
    } else {
        println!("Updated {}", recipe.name);
    }
    Ok(())
}

pub(crate) fn cmd_recipe_delete(db: &Database, name: &str, json: bool) -> Result<()> {
    let svc = AppetitService::new(db);
    if !svc.delete_recipe(name)? {
        not_found(name, json);
    }

    if json {
        println!("{}", serde_json::json!({ "deleted": name }));
    } else {
        println!("Deleted recipe {name}");
    }
    Ok(())
}

pub(crate) fn cmd_recipe_unbookmark(db: &Database, names: &[String], json: bool) -> Result<()> {
    let svc = AppetitService::new(db);
    let removed = svc.remove_bookmarks(names)?;

    if json {
        println!("{}", serde_json::json!({ "removed": removed }));
    } else {
        println!("Removed {removed} recipe(s) from bookmarks");
    }
    Ok(())
}

pub(crate) fn cmd_recipe_groceries(
    db: &Database,
    names: &[String],
    category: &str,
    json: bool,
) -> Result<()> {
    let svc = AppetitService::new(db);
    let added = svc.ingredients_to_groceries(names, category)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&added)?);
        return Ok(());
    }

    let count = added.len();
    println!("Added {count} item(s) to the grocery list");
    for item in &added {
        println!("  [{}] {}", item.id, item.name);
    }
    Ok(())
}
