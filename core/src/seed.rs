//! Bulk loading of reference foods and recipes from JSON arrays.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use url::Url;

use crate::db::Database;
use crate::models::{InsertOutcome, NewFood, NewRecipe, Nutrients};
use crate::nutrition::{Nutrient, extract_number};

/// One element of a foods JSON array. Every field may be missing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodSeed {
    pub name: Option<String>,
    pub serving: Option<String>,
    pub calories: Option<String>,
    pub fat: Option<String>,
    pub fiber: Option<String>,
    pub carbs: Option<String>,
    pub protein: Option<String>,
    pub meal_type: Option<String>,
    pub is_in_grocery_list: Option<bool>,
}

/// One element of a recipes JSON array. Every field is required.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeSeed {
    pub name: String,
    pub ingredients: String,
    pub protein: String,
    pub fat: String,
    pub fiber: String,
    pub carbs: String,
    pub calories: String,
    pub instructions: String,
    pub recipe_image_url: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SeedSummary {
    pub decoded: usize,
    pub inserted: usize,
    pub already_present: usize,
    pub skipped: usize,
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

impl FoodSeed {
    fn to_new_food(&self) -> Option<NewFood> {
        let name = non_empty(self.name.as_deref())?;
        Some(NewFood {
            name,
            serving: self.serving.as_deref().and_then(extract_number),
            nutrients: Nutrients {
                calories: self.calories.as_deref().map(Nutrient::parse),
                fat: self.fat.as_deref().map(Nutrient::parse),
                fiber: self.fiber.as_deref().map(Nutrient::parse),
                carbs: self.carbs.as_deref().map(Nutrient::parse),
                protein: self.protein.as_deref().map(Nutrient::parse),
            },
            meal_type: non_empty(self.meal_type.as_deref()),
            is_in_grocery_list: self.is_in_grocery_list.unwrap_or(false),
        })
    }
}

impl RecipeSeed {
    fn to_new_recipe(&self) -> NewRecipe {
        NewRecipe {
            name: self.name.trim().to_string(),
            ingredients: self.ingredients.clone(),
            nutrients: Nutrients {
                calories: Some(Nutrient::parse(&self.calories)),
                fat: Some(Nutrient::parse(&self.fat)),
                fiber: Some(Nutrient::parse(&self.fiber)),
                carbs: Some(Nutrient::parse(&self.carbs)),
                protein: Some(Nutrient::parse(&self.protein)),
            },
            instructions: self.instructions.clone(),
            image_url: resolve_image_url(&self.name, &self.recipe_image_url),
            bookmarked: false,
        }
    }
}

/// Parse an image URL, dropping it with a warning when it is not valid.
fn resolve_image_url(recipe: &str, raw: &str) -> Option<String> {
    match Url::parse(raw.trim()) {
        Ok(url) => Some(url.to_string()),
        Err(err) => {
            warn!(recipe, url = raw, %err, "invalid recipe image URL, storing none");
            None
        }
    }
}

/// Decode a foods array and insert the foods not already present.
///
/// A decode failure stores nothing. A store failure part way through is
/// returned; rows written before it stay.
pub fn seed_foods<R: Read>(db: &Database, reader: R) -> Result<SeedSummary> {
    let seeds: Vec<FoodSeed> =
        serde_json::from_reader(reader).context("Failed to decode foods JSON")?;
    seed_food_records(db, &seeds)
}

pub fn seed_food_records(db: &Database, seeds: &[FoodSeed]) -> Result<SeedSummary> {
    let mut summary = SeedSummary {
        decoded: seeds.len(),
        ..SeedSummary::default()
    };

    for (index, seed) in seeds.iter().enumerate() {
        let Some(food) = seed.to_new_food() else {
            warn!(index, "food seed has no name, skipping");
            summary.skipped += 1;
            continue;
        };
        match db.insert_food(&food) {
            Ok(InsertOutcome::Inserted(_)) => summary.inserted += 1,
            Ok(InsertOutcome::AlreadyExists) => summary.already_present += 1,
            Err(e) => {
                error!(name = %food.name, error = %e, "failed to store seeded food");
                return Err(e.context(format!("Failed to store food '{}'", food.name)));
            }
        }
    }

    info!(
        decoded = summary.decoded,
        inserted = summary.inserted,
        already_present = summary.already_present,
        skipped = summary.skipped,
        "seeded foods"
    );
    Ok(summary)
}

/// Decode a recipes array and insert the recipes not already present.
///
/// One malformed element fails the whole batch before anything is stored.
pub fn seed_recipes<R: Read>(db: &Database, reader: R) -> Result<SeedSummary> {
    let seeds: Vec<RecipeSeed> =
        serde_json::from_reader(reader).context("Failed to decode recipes JSON")?;
    seed_recipe_records(db, &seeds)
}

pub fn seed_recipe_records(db: &Database, seeds: &[RecipeSeed]) -> Result<SeedSummary> {
    let mut summary = SeedSummary {
        decoded: seeds.len(),
        ..SeedSummary::default()
    };

    for seed in seeds {
        let recipe = seed.to_new_recipe();
        if recipe.name.is_empty() {
            warn!("recipe seed has an empty name, skipping");
            summary.skipped += 1;
            continue;
        }
        match db.insert_recipe(&recipe) {
            Ok(InsertOutcome::Inserted(_)) => summary.inserted += 1,
            Ok(InsertOutcome::AlreadyExists) => summary.already_present += 1,
            Err(e) => {
                error!(name = %recipe.name, error = %e, "failed to store seeded recipe");
                return Err(e.context(format!("Failed to store recipe '{}'", recipe.name)));
            }
        }
    }

    info!(
        decoded = summary.decoded,
        inserted = summary.inserted,
        already_present = summary.already_present,
        skipped = summary.skipped,
        "seeded recipes"
    );
    Ok(summary)
}

pub fn seed_foods_from_path(db: &Database, path: &Path) -> Result<SeedSummary> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open foods file: {}", path.display()))?;
    seed_foods(db, BufReader::new(file))
}

pub fn seed_recipes_from_path(db: &Database, path: &Path) -> Result<SeedSummary> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open recipes file: {}", path.display()))?;
    seed_recipes(db, BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const FOODS: &str = r#"[
        {"name": "Banana", "serving": "1", "calories": "105", "fat": "0.4g",
         "fiber": "3.1g", "carbs": "27g", "protein": "1.3g"},
        {"name": "Almonds", "calories": "164", "isInGroceryList": true},
        {"serving": "2"},
        {"name": "Oatmeal", "calories": "150", "mealType": "Breakfast", "isInGroceryList": null}
    ]"#;

    const RECIPES: &str = r#"[
        {"name": "Omelette", "ingredients": "eggs, butter, salt", "protein": "13g",
         "fat": "15g", "fiber": "0g", "carbs": "1g", "calories": "200",
         "instructions": "1 Whisk eggs. 2 Cook in butter.",
         "recipeImageUrl": "https://example.com/omelette.jpg"},
        {"name": "Porridge", "ingredients": "oats, milk", "protein": "6g",
         "fat": "4g", "fiber": "4g", "carbs": "30g", "calories": "180",
         "instructions": "Simmer oats in milk.", "recipeImageUrl": "not a url"}
    ]"#;

    #[test]
    fn test_seed_foods() {
        let db = Database::open_in_memory().unwrap();
        let summary = seed_foods(&db, FOODS.as_bytes()).unwrap();

        assert_eq!(summary.decoded, 4);
        assert_eq!(summary.inserted, 3);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.already_present, 0);

        let banana = db.find_food("Banana", None).unwrap().unwrap();
        assert_eq!(banana.serving, Some(1.0));
        assert_eq!(banana.nutrients.carbs, Some(Nutrient::parse("27g")));
        assert!(!banana.is_in_grocery_list);

        let almonds = db.find_food("Almonds", None).unwrap().unwrap();
        assert!(almonds.is_in_grocery_list);
        assert!(almonds.serving.is_none());
        assert!(almonds.nutrients.protein.is_none());

        let oatmeal = db.find_food("Oatmeal", Some("Breakfast")).unwrap().unwrap();
        assert!(!oatmeal.is_in_grocery_list);
    }

    #[test]
    fn test_seed_foods_twice_inserts_nothing_new() {
        let db = Database::open_in_memory().unwrap();
        seed_foods(&db, FOODS.as_bytes()).unwrap();
        let before = db.list_all_foods().unwrap().len();

        let summary = seed_foods(&db, FOODS.as_bytes()).unwrap();
        assert_eq!(summary.inserted, 0);
        assert_eq!(summary.already_present, 3);
        assert_eq!(db.list_all_foods().unwrap().len(), before);
    }

    #[test]
    fn test_seed_foods_decode_error_writes_nothing() {
        let db = Database::open_in_memory().unwrap();
        let err = seed_foods(&db, r#"[{"name": "Kiwi"}, {"name": 5}]"#.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Failed to decode foods JSON"));
        assert!(db.list_all_foods().unwrap().is_empty());
    }

    #[test]
    fn test_seed_recipes() {
        let db = Database::open_in_memory().unwrap();
        let summary = seed_recipes(&db, RECIPES.as_bytes()).unwrap();
        assert_eq!(summary.decoded, 2);
        assert_eq!(summary.inserted, 2);

        let omelette = db.find_recipe("Omelette").unwrap().unwrap();
        assert_eq!(
            omelette.image_url.as_deref(),
            Some("https://example.com/omelette.jpg")
        );
        assert_eq!(omelette.nutrients.protein, Some(Nutrient::parse("13g")));
        assert!(!omelette.bookmarked);

        let porridge = db.find_recipe("Porridge").unwrap().unwrap();
        assert!(porridge.image_url.is_none());

        let again = seed_recipes(&db, RECIPES.as_bytes()).unwrap();
        assert_eq!(again.inserted, 0);
        assert_eq!(again.already_present, 2);
    }

    #[test]
    fn test_seed_recipes_missing_field_fails_whole_batch() {
        let db = Database::open_in_memory().unwrap();
        let bad = r#"[
            {"name": "Toast", "ingredients": "bread", "protein": "3g", "fat": "1g",
             "fiber": "1g", "carbs": "15g", "calories": "80",
             "instructions": "Toast bread.", "recipeImageUrl": "https://example.com/t.jpg"},
            {"name": "Tea", "ingredients": "tea, water"}
        ]"#;
        assert!(seed_recipes(&db, bad.as_bytes()).is_err());
        assert!(db.list_recipes().unwrap().is_empty());
    }

    fn reject_inserts_named(db: &Database, table: &str, name: &str) {
        db.conn()
            .execute_batch(&format!(
                "CREATE TRIGGER reject_{table} BEFORE INSERT ON {table}
                 WHEN NEW.name = '{name}'
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;"
            ))
            .unwrap();
    }

    #[test]
    fn test_seed_foods_store_error_keeps_earlier_rows() {
        let db = Database::open_in_memory().unwrap();
        reject_inserts_named(&db, "foods", "Boom");
        let foods = r#"[{"name": "Apple"}, {"name": "Boom"}, {"name": "Cherry"}]"#;

        let err = seed_foods(&db, foods.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("'Boom'"));
        assert!(db.find_food("Apple", None).unwrap().is_some());
        assert!(db.find_food("Cherry", None).unwrap().is_none());
    }

    #[test]
    fn test_seed_recipes_store_error_keeps_earlier_rows() {
        let db = Database::open_in_memory().unwrap();
        reject_inserts_named(&db, "recipes", "Porridge");

        let err = seed_recipes(&db, RECIPES.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("'Porridge'"));
        assert!(db.find_recipe("Omelette").unwrap().is_some());
        assert_eq!(db.list_recipes().unwrap().len(), 1);
    }

    #[test]
    fn test_seed_foods_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FOODS.as_bytes()).unwrap();

        let db = Database::open_in_memory().unwrap();
        let summary = seed_foods_from_path(&db, file.path()).unwrap();
        assert_eq!(summary.inserted, 3);
    }

    #[test]
    fn test_seed_from_missing_path() {
        let db = Database::open_in_memory().unwrap();
        let err = seed_recipes_from_path(&db, Path::new("/nonexistent/recipes.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to open recipes file"));
    }
}
