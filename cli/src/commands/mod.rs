mod food;
mod grocery;
mod helpers;
mod journal;
mod meal;
mod profile;
mod recipe;
mod seed;

use anyhow::{Result, bail};

use appetit_core::models::Food;
use appetit_core::service::AppetitService;

use helpers::{print_food_table, prompt_choice};

pub(crate) use food::{cmd_food_add, cmd_food_delete, cmd_food_search, cmd_food_show, cmd_food_update};
pub(crate) use grocery::{
    cmd_grocery_add, cmd_grocery_add_category, cmd_grocery_categories, cmd_grocery_check,
    cmd_grocery_delete, cmd_grocery_edit, cmd_grocery_list,
};
pub(crate) use journal::cmd_journal;
pub(crate) use meal::{cmd_meal_add, cmd_meal_remove, cmd_meal_serving, cmd_meal_show};
pub(crate) use profile::{cmd_profile_image, cmd_profile_reset, cmd_profile_set, cmd_profile_show};
pub(crate) use recipe::{
    cmd_recipe_bookmark, cmd_recipe_delete, cmd_recipe_groceries, cmd_recipe_list,
    cmd_recipe_show, cmd_recipe_unbookmark, cmd_recipe_update,
};
pub(crate) use seed::{cmd_seed_foods, cmd_seed_recipes};

/// Resolve a catalog food by name. An exact (case-insensitive) match wins;
/// otherwise the user picks from the search results.
pub(super) fn resolve_catalog_food(svc: &AppetitService<'_>, query: &str) -> Result<Food> {
    let mut matches = svc.search_catalog(query)?;

    if matches.is_empty() {
        bail!("No catalog food found for '{query}'");
    }

    let wanted = query.trim().to_lowercase();
    if let Some(pos) = matches.iter().position(|f| f.name.to_lowercase() == wanted) {
        return Ok(matches.swap_remove(pos));
    }

    if matches.len() == 1 {
        return Ok(matches.swap_remove(0));
    }

    let refs: Vec<&Food> = matches.iter().collect();
    print_food_table(&refs);
    let idx = prompt_choice("Select a food", matches.len())?;
    Ok(matches.swap_remove(idx))
}
