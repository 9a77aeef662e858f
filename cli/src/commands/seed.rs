use anyhow::Result;
use std::path::Path;

use appetit_core::db::Database;
use appetit_core::seed::{
    SeedSummary, seed_foods, seed_foods_from_path, seed_recipes, seed_recipes_from_path,
};

const BUNDLED_FOODS: &str = include_str!("../../data/foods.json");
const BUNDLED_RECIPES: &str = include_str!("../../data/recipes.json");

fn print_summary(kind: &str, summary: &SeedSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!(
        "Seeded {kind}: {} read, {} added, {} already present",
        summary.decoded, summary.inserted, summary.already_present
    );
    if summary.skipped > 0 {
        eprintln!("Skipped {} {kind} without a name", summary.skipped);
    }
    Ok(())
}

pub(crate) fn cmd_seed_foods(db: &Database, file: Option<&Path>, json: bool) -> Result<()> {
    let summary = match file {
        Some(path) => seed_foods_from_path(db, path)?,
        None => seed_foods(db, BUNDLED_FOODS.as_bytes())?,
    };
    print_summary("foods", &summary, json)
}

pub(crate) fn cmd_seed_recipes(db: &Database, file: Option<&Path>, json: bool) -> Result<()> {
    let summary = match file {
        Some(path) => seed_recipes_from_path(db, path)?,
        None => seed_recipes(db, BUNDLED_RECIPES.as_bytes())?,
    };
    print_summary("recipes", &summary, json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_data_seeds_cleanly() {
        let db = Database::open_in_memory().unwrap();

        let foods = seed_foods(&db, BUNDLED_FOODS.as_bytes()).unwrap();
        assert!(foods.inserted > 0);
        assert_eq!(foods.skipped, 0);
        assert_eq!(foods.inserted, foods.decoded);

        let recipes = seed_recipes(&db, BUNDLED_RECIPES.as_bytes()).unwrap();
        assert!(recipes.inserted > 0);
        assert_eq!(recipes.inserted, recipes.decoded);
        assert!(db.list_recipes().unwrap().iter().all(|r| r.image_url.is_some()));
    }

    #[test]
    fn test_bundled_foods_are_catalog_entries() {
        let db = Database::open_in_memory().unwrap();
        seed_foods(&db, BUNDLED_FOODS.as_bytes()).unwrap();
        assert!(db.list_all_foods().unwrap().iter().all(|f| f.is_catalog()));
    }
}
