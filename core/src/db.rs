use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;
use uuid::Uuid;

use crate::models::{
    Food, Grocery, InsertOutcome, NewFood, NewGrocery, NewRecipe, NutrientKind, Nutrients, Recipe,
    UpdateFood, UpdateRecipe, User, name_matches,
};
use crate::nutrition::Nutrient;

const FOOD_COLUMNS: &str = "id, uuid, name, serving,
    calories_amount, calories_unit, fat_amount, fat_unit, fiber_amount, fiber_unit,
    carbs_amount, carbs_unit, protein_amount, protein_unit,
    meal_type, is_in_grocery_list, created_at, updated_at";

const RECIPE_COLUMNS: &str = "id, uuid, name, ingredients,
    calories_amount, calories_unit, fat_amount, fat_unit, fiber_amount, fiber_unit,
    carbs_amount, carbs_unit, protein_amount, protein_unit,
    instructions, image_url, bookmarked, created_at, updated_at";

const GROCERY_COLUMNS: &str =
    "id, uuid, name, quantity, category, is_checked, created_at, updated_at";

const USER_COLUMNS: &str = "uuid, name, age, weight, profile_image_path, nutrition_goal, created_at, updated_at";

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Flush and release the connection.
    pub fn close(self) -> Result<()> {
        self.conn
            .close()
            .map_err(|(_, e)| e)
            .context("Failed to close database")
    }

    /// Run `f` inside one transaction. Any error rolls back every write `f`
    /// made.
    pub fn in_transaction<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let tx = self.conn.unchecked_transaction()?;
        let value = f()?;
        tx.commit().context("Failed to commit transaction")?;
        Ok(value)
    }

    #[cfg(test)]
    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS foods (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT NOT NULL UNIQUE,
                    name TEXT NOT NULL,
                    serving REAL,
                    calories_amount REAL,
                    calories_unit TEXT,
                    fat_amount REAL,
                    fat_unit TEXT,
                    fiber_amount REAL,
                    fiber_unit TEXT,
                    carbs_amount REAL,
                    carbs_unit TEXT,
                    protein_amount REAL,
                    protein_unit TEXT,
                    meal_type TEXT,
                    is_in_grocery_list INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS recipes (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT NOT NULL UNIQUE,
                    name TEXT NOT NULL UNIQUE,
                    ingredients TEXT NOT NULL DEFAULT '',
                    calories_amount REAL,
                    calories_unit TEXT,
                    fat_amount REAL,
                    fat_unit TEXT,
                    fiber_amount REAL,
                    fiber_unit TEXT,
                    carbs_amount REAL,
                    carbs_unit TEXT,
                    protein_amount REAL,
                    protein_unit TEXT,
                    instructions TEXT NOT NULL DEFAULT '',
                    image_url TEXT,
                    bookmarked INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS groceries (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT NOT NULL UNIQUE,
                    name TEXT NOT NULL,
                    quantity TEXT NOT NULL,
                    category TEXT NOT NULL DEFAULT '',
                    is_checked INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS users (
                    id INTEGER PRIMARY KEY CHECK (id = 1),
                    uuid TEXT NOT NULL,
                    name TEXT,
                    age INTEGER NOT NULL DEFAULT 0,
                    weight REAL NOT NULL DEFAULT 0,
                    profile_image_path TEXT,
                    nutrition_goal TEXT,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                -- catalog rows have no meal; a name may appear once per meal slot
                CREATE UNIQUE INDEX IF NOT EXISTS idx_foods_name_meal
                    ON foods(name, IFNULL(meal_type, ''));
                CREATE INDEX IF NOT EXISTS idx_foods_meal_type ON foods(meal_type);
                CREATE INDEX IF NOT EXISTS idx_recipes_bookmarked ON recipes(bookmarked);
                CREATE INDEX IF NOT EXISTS idx_groceries_category ON groceries(category);

                PRAGMA user_version = 1;",
            )?;
        }

        Ok(())
    }

    // --- Row mapping helpers ---

    fn food_from_row(row: &rusqlite::Row) -> rusqlite::Result<Food> {
        Ok(Food {
            id: row.get(0)?,
            uuid: row.get(1)?,
            name: row.get(2)?,
            serving: row.get(3)?,
            nutrients: nutrients_from_row(row, 4)?,
            meal_type: row.get(14)?,
            is_in_grocery_list: row.get(15)?,
            created_at: row.get(16)?,
            updated_at: row.get(17)?,
        })
    }

    fn recipe_from_row(row: &rusqlite::Row) -> rusqlite::Result<Recipe> {
        Ok(Recipe {
            id: row.get(0)?,
            uuid: row.get(1)?,
            name: row.get(2)?,
            ingredients: row.get(3)?,
            nutrients: nutrients_from_row(row, 4)?,
            instructions: row.get(14)?,
            image_url: row.get(15)?,
            bookmarked: row.get(16)?,
            created_at: row.get(17)?,
            updated_at: row.get(18)?,
        })
    }

    fn grocery_from_row(row: &rusqlite::Row) -> rusqlite::Result<Grocery> {
        Ok(Grocery {
            id: row.get(0)?,
            uuid: row.get(1)?,
            name: row.get(2)?,
            quantity: row.get(3)?,
            category: row.get(4)?,
            is_checked: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }

    fn user_from_row(row: &rusqlite::Row) -> rusqlite::Result<User> {
        Ok(User {
            uuid: row.get(0)?,
            name: row.get(1)?,
            age: row.get(2)?,
            weight: row.get(3)?,
            profile_image_path: row.get(4)?,
            nutrition_goal: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }

    // --- Foods ---

    /// Insert a food unless one with the same name already sits in the same
    /// meal slot (or in the catalog, for `meal_type = None`).
    pub fn insert_food(&self, food: &NewFood) -> Result<InsertOutcome<Food>> {
        let now = Local::now().to_rfc3339();
        let uuid = Uuid::new_v4().to_string();
        let calories = nutrient_params(food.nutrients.get(NutrientKind::Calories));
        let fat = nutrient_params(food.nutrients.get(NutrientKind::Fat));
        let fiber = nutrient_params(food.nutrients.get(NutrientKind::Fiber));
        let carbs = nutrient_params(food.nutrients.get(NutrientKind::Carbs));
        let protein = nutrient_params(food.nutrients.get(NutrientKind::Protein));
        let rows = self.conn.execute(
            "INSERT INTO foods (uuid, name, serving,
                calories_amount, calories_unit, fat_amount, fat_unit, fiber_amount, fiber_unit,
                carbs_amount, carbs_unit, protein_amount, protein_unit,
                meal_type, is_in_grocery_list, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
             ON CONFLICT DO NOTHING",
            params![
                uuid,
                food.name,
                food.serving,
                calories.0,
                calories.1,
                fat.0,
                fat.1,
                fiber.0,
                fiber.1,
                carbs.0,
                carbs.1,
                protein.0,
                protein.1,
                food.meal_type,
                food.is_in_grocery_list,
                now,
                now,
            ],
        )?;
        if rows == 0 {
            debug!(name = %food.name, meal = ?food.meal_type, "food already exists");
            return Ok(InsertOutcome::AlreadyExists);
        }
        let id = self.conn.last_insert_rowid();
        Ok(InsertOutcome::Inserted(self.get_food(id)?))
    }

    pub fn get_food(&self, id: i64) -> Result<Food> {
        self.conn
            .query_row(
                &format!("SELECT {FOOD_COLUMNS} FROM foods WHERE id = ?1"),
                params![id],
                Self::food_from_row,
            )
            .context("Food not found")
    }

    /// `None` only when no food has this id; store errors are returned.
    pub fn find_food_by_id(&self, id: i64) -> Result<Option<Food>> {
        let food = self
            .conn
            .query_row(
                &format!("SELECT {FOOD_COLUMNS} FROM foods WHERE id = ?1"),
                params![id],
                Self::food_from_row,
            )
            .optional()?;
        Ok(food)
    }

    /// Exact name lookup within one meal slot; `None` means the catalog.
    pub fn find_food(&self, name: &str, meal_type: Option<&str>) -> Result<Option<Food>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {FOOD_COLUMNS} FROM foods
             WHERE name = ?1 AND IFNULL(meal_type, '') = IFNULL(?2, '')"
        ))?;
        let mut rows = stmt.query(params![name, meal_type])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::food_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn list_all_foods(&self) -> Result<Vec<Food>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {FOOD_COLUMNS} FROM foods ORDER BY id"))?;
        let foods = stmt
            .query_map([], Self::food_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(foods)
    }

    pub fn list_foods_for_meal(&self, meal_type: &str) -> Result<Vec<Food>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {FOOD_COLUMNS} FROM foods WHERE meal_type = ?1 ORDER BY id"
        ))?;
        let foods = stmt
            .query_map(params![meal_type], Self::food_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(foods)
    }

    /// Case-insensitive substring search over catalog foods. An empty query
    /// lists the whole catalog.
    pub fn search_catalog(&self, query: &str) -> Result<Vec<Food>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {FOOD_COLUMNS} FROM foods WHERE meal_type IS NULL ORDER BY name"
        ))?;
        let mut foods = stmt
            .query_map([], Self::food_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        foods.retain(|f| name_matches(&f.name, query));
        Ok(foods)
    }

    pub fn update_food(&self, id: i64, update: &UpdateFood) -> Result<Food> {
        // Verify existence
        self.get_food(id)?;

        let now = Local::now().to_rfc3339();
        if let Some(serving) = update.serving {
            self.conn.execute(
                "UPDATE foods SET serving = ?1, updated_at = ?2 WHERE id = ?3",
                params![serving, now, id],
            )?;
        }
        for kind in NutrientKind::ALL {
            if let Some(nutrient) = update.nutrients.get(kind) {
                self.set_nutrient("foods", id, kind, nutrient, &now)?;
            }
        }

        self.get_food(id)
    }

    pub fn set_food_serving(&self, id: i64, serving: Option<f64>) -> Result<Food> {
        let now = Local::now().to_rfc3339();
        let rows = self.conn.execute(
            "UPDATE foods SET serving = ?1, updated_at = ?2 WHERE id = ?3",
            params![serving, now, id],
        )?;
        if rows == 0 {
            anyhow::bail!("Food not found");
        }
        self.get_food(id)
    }

    pub fn delete_food(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM foods WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    /// Delete every food with this name logged to this meal.
    pub fn delete_food_from_meal(&self, name: &str, meal_type: &str) -> Result<usize> {
        let rows = self.conn.execute(
            "DELETE FROM foods WHERE name = ?1 AND meal_type = ?2",
            params![name, meal_type],
        )?;
        Ok(rows)
    }

    fn set_nutrient(
        &self,
        table: &str,
        id: i64,
        kind: NutrientKind,
        nutrient: &Nutrient,
        now: &str,
    ) -> Result<()> {
        let column = kind.column();
        self.conn.execute(
            &format!(
                "UPDATE {table} SET {column}_amount = ?1, {column}_unit = ?2, updated_at = ?3 WHERE id = ?4"
            ),
            params![nutrient.amount, nutrient.unit, now, id],
        )?;
        Ok(())
    }

    // --- Recipes ---

    pub fn insert_recipe(&self, recipe: &NewRecipe) -> Result<InsertOutcome<Recipe>> {
        let now = Local::now().to_rfc3339();
        let uuid = Uuid::new_v4().to_string();
        let calories = nutrient_params(recipe.nutrients.get(NutrientKind::Calories));
        let fat = nutrient_params(recipe.nutrients.get(NutrientKind::Fat));
        let fiber = nutrient_params(recipe.nutrients.get(NutrientKind::Fiber));
        let carbs = nutrient_params(recipe.nutrients.get(NutrientKind::Carbs));
        let protein = nutrient_params(recipe.nutrients.get(NutrientKind::Protein));
        let rows = self.conn.execute(
            "INSERT INTO recipes (uuid, name, ingredients,
                calories_amount, calories_unit, fat_amount, fat_unit, fiber_amount, fiber_unit,
                carbs_amount, carbs_unit, protein_amount, protein_unit,
                instructions, image_url, bookmarked, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
             ON CONFLICT DO NOTHING",
            params![
                uuid,
                recipe.name,
                recipe.ingredients,
                calories.0,
                calories.1,
                fat.0,
                fat.1,
                fiber.0,
                fiber.1,
                carbs.0,
                carbs.1,
                protein.0,
                protein.1,
                recipe.instructions,
                recipe.image_url,
                recipe.bookmarked,
                now,
                now,
            ],
        )?;
        if rows == 0 {
            debug!(name = %recipe.name, "recipe already exists");
            return Ok(InsertOutcome::AlreadyExists);
        }
        let id = self.conn.last_insert_rowid();
        Ok(InsertOutcome::Inserted(self.get_recipe(id)?))
    }

    pub fn get_recipe(&self, id: i64) -> Result<Recipe> {
        self.conn
            .query_row(
                &format!("SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = ?1"),
                params![id],
                Self::recipe_from_row,
            )
            .context("Recipe not found")
    }

    pub fn find_recipe(&self, name: &str) -> Result<Option<Recipe>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes WHERE name = ?1"
        ))?;
        let mut rows = stmt.query(params![name])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::recipe_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn list_recipes(&self) -> Result<Vec<Recipe>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes ORDER BY name"
        ))?;
        let recipes = stmt
            .query_map([], Self::recipe_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(recipes)
    }

    pub fn list_bookmarked_recipes(&self) -> Result<Vec<Recipe>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes WHERE bookmarked = 1 ORDER BY name"
        ))?;
        let recipes = stmt
            .query_map([], Self::recipe_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(recipes)
    }

    /// Case-insensitive substring search over recipe names.
    pub fn search_recipes(&self, query: &str) -> Result<Vec<Recipe>> {
        let mut recipes = self.list_recipes()?;
        recipes.retain(|r| name_matches(&r.name, query));
        Ok(recipes)
    }

    pub fn update_recipe(&self, name: &str, update: &UpdateRecipe) -> Result<Recipe> {
        let recipe = self.find_recipe(name)?.context("Recipe not found")?;

        let now = Local::now().to_rfc3339();
        if let Some(ref ingredients) = update.ingredients {
            self.conn.execute(
                "UPDATE recipes SET ingredients = ?1, updated_at = ?2 WHERE id = ?3",
                params![ingredients, now, recipe.id],
            )?;
        }
        if let Some(ref instructions) = update.instructions {
            self.conn.execute(
                "UPDATE recipes SET instructions = ?1, updated_at = ?2 WHERE id = ?3",
                params![instructions, now, recipe.id],
            )?;
        }
        for kind in NutrientKind::ALL {
            if let Some(nutrient) = update.nutrients.get(kind) {
                self.set_nutrient("recipes", recipe.id, kind, nutrient, &now)?;
            }
        }

        self.get_recipe(recipe.id)
    }

    pub fn set_recipe_bookmarked(&self, id: i64, bookmarked: bool) -> Result<Recipe> {
        let now = Local::now().to_rfc3339();
        let rows = self.conn.execute(
            "UPDATE recipes SET bookmarked = ?1, updated_at = ?2 WHERE id = ?3",
            params![bookmarked, now, id],
        )?;
        if rows == 0 {
            anyhow::bail!("Recipe not found");
        }
        self.get_recipe(id)
    }

    /// Clear the bookmark flag on each recipe; returns how many were bookmarked.
    pub fn clear_bookmarks(&self, ids: &[i64]) -> Result<usize> {
        let now = Local::now().to_rfc3339();
        let mut cleared = 0;
        for id in ids {
            cleared += self.conn.execute(
                "UPDATE recipes SET bookmarked = 0, updated_at = ?1 WHERE id = ?2 AND bookmarked = 1",
                params![now, id],
            )?;
        }
        Ok(cleared)
    }

    pub fn delete_recipe(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM recipes WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // --- Groceries ---

    pub fn insert_grocery(&self, item: &NewGrocery) -> Result<Grocery> {
        let now = Local::now().to_rfc3339();
        let uuid = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO groceries (uuid, name, quantity, category, is_checked, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6)",
            params![uuid, item.name, item.quantity, item.category, now, now],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_grocery(id)
    }

    pub fn get_grocery(&self, id: i64) -> Result<Grocery> {
        self.conn
            .query_row(
                &format!("SELECT {GROCERY_COLUMNS} FROM groceries WHERE id = ?1"),
                params![id],
                Self::grocery_from_row,
            )
            .context("Grocery item not found")
    }

    /// `None` only when no item has this id; store errors are returned.
    pub fn find_grocery(&self, id: i64) -> Result<Option<Grocery>> {
        let item = self
            .conn
            .query_row(
                &format!("SELECT {GROCERY_COLUMNS} FROM groceries WHERE id = ?1"),
                params![id],
                Self::grocery_from_row,
            )
            .optional()?;
        Ok(item)
    }

    pub fn list_groceries(&self) -> Result<Vec<Grocery>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {GROCERY_COLUMNS} FROM groceries ORDER BY category, name, id"
        ))?;
        let items = stmt
            .query_map([], Self::grocery_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    pub fn update_grocery(&self, id: i64, name: &str, quantity: &str) -> Result<Grocery> {
        let now = Local::now().to_rfc3339();
        let rows = self.conn.execute(
            "UPDATE groceries SET name = ?1, quantity = ?2, updated_at = ?3 WHERE id = ?4",
            params![name, quantity, now, id],
        )?;
        if rows == 0 {
            anyhow::bail!("Grocery item not found");
        }
        self.get_grocery(id)
    }

    pub fn toggle_grocery_checked(&self, id: i64) -> Result<Grocery> {
        let now = Local::now().to_rfc3339();
        let rows = self.conn.execute(
            "UPDATE groceries SET is_checked = NOT is_checked, updated_at = ?1 WHERE id = ?2",
            params![now, id],
        )?;
        if rows == 0 {
            anyhow::bail!("Grocery item not found");
        }
        self.get_grocery(id)
    }

    pub fn delete_grocery(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM groceries WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    pub fn grocery_categories(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT category FROM groceries WHERE category != '' ORDER BY category",
        )?;
        let categories = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(categories)
    }

    // --- User ---

    pub fn get_user(&self) -> Result<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = 1"))?;
        let mut rows = stmt.query([])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::user_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn get_or_create_user(&self) -> Result<User> {
        let now = Local::now().to_rfc3339();
        let uuid = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO users (id, uuid, age, weight, created_at, updated_at)
             VALUES (1, ?1, 0, 0, ?2, ?3)
             ON CONFLICT(id) DO NOTHING",
            params![uuid, now, now],
        )?;
        self.get_user()?.context("User not found")
    }

    /// Write the profile fields of `user` to the single user row, creating it
    /// if needed.
    pub fn save_user(&self, user: &User) -> Result<User> {
        let now = Local::now().to_rfc3339();
        let uuid = if user.uuid.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            user.uuid.clone()
        };
        self.conn.execute(
            "INSERT INTO users (id, uuid, name, age, weight, profile_image_path, nutrition_goal, created_at, updated_at)
             VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                age = excluded.age,
                weight = excluded.weight,
                profile_image_path = excluded.profile_image_path,
                nutrition_goal = excluded.nutrition_goal,
                updated_at = excluded.updated_at",
            params![
                uuid,
                user.name,
                user.age,
                user.weight,
                user.profile_image_path,
                user.nutrition_goal,
                now,
                now,
            ],
        )?;
        self.get_user()?.context("User not found")
    }

    pub fn delete_user(&self) -> Result<bool> {
        let rows = self.conn.execute("DELETE FROM users", [])?;
        Ok(rows > 0)
    }
}

/// Five `(amount, unit)` column pairs starting at `first`, in
/// [`NutrientKind::ALL`] order.
fn nutrients_from_row(row: &rusqlite::Row, first: usize) -> rusqlite::Result<Nutrients> {
    let pair = |offset: usize| -> rusqlite::Result<_> {
        let at = first + offset * 2;
        Ok(nutrient_from_columns(row.get(at)?, row.get(at + 1)?))
    };
    Ok(Nutrients {
        calories: pair(0)?,
        fat: pair(1)?,
        fiber: pair(2)?,
        carbs: pair(3)?,
        protein: pair(4)?,
    })
}

fn nutrient_from_columns(amount: Option<f64>, unit: Option<String>) -> Option<Nutrient> {
    amount.map(|amount| Nutrient {
        amount,
        unit: unit.unwrap_or_default(),
    })
}

fn nutrient_params(nutrient: Option<&Nutrient>) -> (Option<f64>, Option<&str>) {
    match nutrient {
        Some(n) => (Some(n.amount), Some(n.unit.as_str())),
        None => (None, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_food() -> NewFood {
        NewFood {
            name: "Greek Yogurt".to_string(),
            serving: Some(1.0),
            nutrients: Nutrients {
                calories: Some(Nutrient::parse("100")),
                fat: Some(Nutrient::parse("0.7g")),
                fiber: Some(Nutrient::parse("1g")),
                carbs: Some(Nutrient::parse("3.6g")),
                protein: Some(Nutrient::parse("10g")),
            },
            meal_type: None,
            is_in_grocery_list: false,
        }
    }

    fn sample_recipe() -> NewRecipe {
        NewRecipe {
            name: "Pancakes".to_string(),
            ingredients: "flour, eggs, milk".to_string(),
            nutrients: Nutrients {
                calories: Some(Nutrient::parse("350")),
                protein: Some(Nutrient::parse("9g")),
                ..Nutrients::default()
            },
            instructions: "1 Mix. 2 Fry.".to_string(),
            image_url: Some("https://example.com/pancakes.jpg".to_string()),
            ..NewRecipe::default()
        }
    }

    fn new_grocery(name: &str, quantity: &str, category: &str) -> NewGrocery {
        NewGrocery {
            name: name.to_string(),
            quantity: quantity.to_string(),
            category: category.to_string(),
        }
    }

    #[test]
    fn test_insert_and_get_food() {
        let db = Database::open_in_memory().unwrap();
        let food = db.insert_food(&sample_food()).unwrap().inserted().unwrap();

        assert_eq!(food.name, "Greek Yogurt");
        assert_eq!(food.serving, Some(1.0));
        assert_eq!(food.nutrients.fat.as_ref().unwrap().unit, "g");
        assert!(food.is_catalog());
        assert!(!food.uuid.is_empty());

        let fetched = db.get_food(food.id).unwrap();
        assert_eq!(fetched.id, food.id);
        assert_eq!(fetched.nutrients.protein, Some(Nutrient::parse("10g")));
    }

    #[test]
    fn test_get_food_not_found() {
        let db = Database::open_in_memory().unwrap();
        let err = db.get_food(42).unwrap_err();
        assert_eq!(err.to_string(), "Food not found");
    }

    #[test]
    fn test_absent_nutrients_round_trip_as_none() {
        let db = Database::open_in_memory().unwrap();
        let food = db
            .insert_food(&NewFood {
                name: "Water".to_string(),
                ..NewFood::default()
            })
            .unwrap()
            .inserted()
            .unwrap();
        assert!(food.nutrients.is_empty());
        assert!(food.serving.is_none());
    }

    #[test]
    fn test_food_name_unique_per_meal_slot() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.insert_food(&sample_food()).unwrap().is_inserted());
        assert!(matches!(
            db.insert_food(&sample_food()).unwrap(),
            InsertOutcome::AlreadyExists
        ));

        let breakfast = NewFood {
            meal_type: Some("Breakfast".to_string()),
            ..sample_food()
        };
        assert!(db.insert_food(&breakfast).unwrap().is_inserted());
        assert!(!db.insert_food(&breakfast).unwrap().is_inserted());

        let lunch = NewFood {
            meal_type: Some("Lunch".to_string()),
            ..sample_food()
        };
        assert!(db.insert_food(&lunch).unwrap().is_inserted());
        assert_eq!(db.list_all_foods().unwrap().len(), 3);
    }

    #[test]
    fn test_find_food() {
        let db = Database::open_in_memory().unwrap();
        db.insert_food(&sample_food()).unwrap();

        assert!(db.find_food("Greek Yogurt", None).unwrap().is_some());
        assert!(db.find_food("Greek Yogurt", Some("Lunch")).unwrap().is_none());
        assert!(db.find_food("Yogurt", None).unwrap().is_none());
    }

    #[test]
    fn test_search_catalog_only_returns_catalog() {
        let db = Database::open_in_memory().unwrap();
        db.insert_food(&sample_food()).unwrap();
        db.insert_food(&NewFood {
            name: "Plain Yogurt".to_string(),
            meal_type: Some("Snacks".to_string()),
            ..sample_food()
        })
        .unwrap();
        db.insert_food(&NewFood {
            name: "Brown Rice".to_string(),
            ..sample_food()
        })
        .unwrap();

        let results = db.search_catalog("yogurt").unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Greek Yogurt");

        let all = db.search_catalog("").unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "Brown Rice");

        assert!(db.search_catalog("pizza").unwrap().is_empty());
    }

    #[test]
    fn test_search_catalog_matches_wildcards_literally() {
        let db = Database::open_in_memory().unwrap();
        db.insert_food(&NewFood {
            name: "100% Juice".to_string(),
            ..sample_food()
        })
        .unwrap();
        db.insert_food(&NewFood {
            name: "1000 Island".to_string(),
            ..sample_food()
        })
        .unwrap();

        let results = db.search_catalog("100%").unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "100% Juice");
        assert!(db.search_catalog("_").unwrap().is_empty());
    }

    #[test]
    fn test_search_folds_non_ascii_case() {
        let db = Database::open_in_memory().unwrap();
        db.insert_food(&NewFood {
            name: "Éclair".to_string(),
            ..sample_food()
        })
        .unwrap();
        db.insert_recipe(&NewRecipe {
            name: "Ćevapi".to_string(),
            ..sample_recipe()
        })
        .unwrap();

        let foods = db.search_catalog("éclair").unwrap();
        assert_eq!(foods.len(), 1);
        assert_eq!(foods[0].name, "Éclair");

        let recipes = db.search_recipes("ćevapi").unwrap();
        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0].name, "Ćevapi");
    }

    #[test]
    fn test_find_by_id_separates_missing_rows_from_store_errors() {
        let db = Database::open_in_memory().unwrap();
        let food = db.insert_food(&sample_food()).unwrap().inserted().unwrap();
        let item = db.insert_grocery(&new_grocery("Milk", "1", "Dairy")).unwrap();

        assert_eq!(db.find_food_by_id(food.id).unwrap().unwrap().name, "Greek Yogurt");
        assert!(db.find_food_by_id(999).unwrap().is_none());
        assert_eq!(db.find_grocery(item.id).unwrap().unwrap().name, "Milk");
        assert!(db.find_grocery(999).unwrap().is_none());

        db.conn
            .execute_batch("DROP TABLE foods; DROP TABLE groceries;")
            .unwrap();
        assert!(db.find_food_by_id(food.id).is_err());
        assert!(db.find_grocery(item.id).is_err());
    }

    #[test]
    fn test_in_transaction_rolls_back_on_error() {
        let db = Database::open_in_memory().unwrap();
        let result: Result<()> = db.in_transaction(|| {
            db.insert_grocery(&new_grocery("Flour", "1 kg", "Baking"))?;
            anyhow::bail!("second insert failed")
        });
        assert!(result.is_err());
        assert!(db.list_groceries().unwrap().is_empty());

        let added = db
            .in_transaction(|| db.insert_grocery(&new_grocery("Sugar", "500 g", "Baking")))
            .unwrap();
        assert_eq!(db.get_grocery(added.id).unwrap().name, "Sugar");
    }

    #[test]
    fn test_list_foods_for_meal() {
        let db = Database::open_in_memory().unwrap();
        db.insert_food(&sample_food()).unwrap();
        db.insert_food(&NewFood {
            meal_type: Some("Breakfast".to_string()),
            ..sample_food()
        })
        .unwrap();

        let breakfast = db.list_foods_for_meal("Breakfast").unwrap();
        assert_eq!(breakfast.len(), 1);
        assert_eq!(breakfast[0].meal_type.as_deref(), Some("Breakfast"));
        assert!(db.list_foods_for_meal("Dinner").unwrap().is_empty());
    }

    #[test]
    fn test_update_food() {
        let db = Database::open_in_memory().unwrap();
        let food = db.insert_food(&sample_food()).unwrap().inserted().unwrap();

        let updated = db
            .update_food(
                food.id,
                &UpdateFood {
                    serving: Some(2.0),
                    nutrients: Nutrients {
                        protein: Some(Nutrient::parse("12g")),
                        ..Nutrients::default()
                    },
                },
            )
            .unwrap();
        assert_eq!(updated.serving, Some(2.0));
        assert_eq!(updated.nutrients.protein, Some(Nutrient::parse("12g")));
        assert_eq!(updated.nutrients.calories, food.nutrients.calories);
    }

    #[test]
    fn test_update_food_not_found() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.update_food(999, &UpdateFood::default()).is_err());
    }

    #[test]
    fn test_set_food_serving() {
        let db = Database::open_in_memory().unwrap();
        let food = db.insert_food(&sample_food()).unwrap().inserted().unwrap();

        let updated = db.set_food_serving(food.id, Some(1.5)).unwrap();
        assert_eq!(updated.serving, Some(1.5));
        let cleared = db.set_food_serving(food.id, None).unwrap();
        assert!(cleared.serving.is_none());
        assert!(db.set_food_serving(999, Some(1.0)).is_err());
    }

    #[test]
    fn test_delete_food_from_meal_matches_name_and_meal() {
        let db = Database::open_in_memory().unwrap();
        db.insert_food(&sample_food()).unwrap();
        for meal in ["Breakfast", "Snacks"] {
            db.insert_food(&NewFood {
                meal_type: Some(meal.to_string()),
                ..sample_food()
            })
            .unwrap();
        }

        assert_eq!(db.delete_food_from_meal("Greek Yogurt", "Breakfast").unwrap(), 1);
        assert_eq!(db.delete_food_from_meal("Greek Yogurt", "Breakfast").unwrap(), 0);
        assert!(db.find_food("Greek Yogurt", None).unwrap().is_some());
        assert!(db.find_food("Greek Yogurt", Some("Snacks")).unwrap().is_some());
    }

    #[test]
    fn test_delete_food() {
        let db = Database::open_in_memory().unwrap();
        let food = db.insert_food(&sample_food()).unwrap().inserted().unwrap();
        assert!(db.delete_food(food.id).unwrap());
        assert!(!db.delete_food(food.id).unwrap());
    }

    #[test]
    fn test_insert_recipe_unique_name() {
        let db = Database::open_in_memory().unwrap();
        let recipe = db.insert_recipe(&sample_recipe()).unwrap().inserted().unwrap();
        assert_eq!(recipe.name, "Pancakes");
        assert!(!recipe.bookmarked);
        assert_eq!(
            recipe.image_url.as_deref(),
            Some("https://example.com/pancakes.jpg")
        );
        assert!(recipe.nutrients.fat.is_none());

        assert!(!db.insert_recipe(&sample_recipe()).unwrap().is_inserted());
        assert_eq!(db.list_recipes().unwrap().len(), 1);
    }

    #[test]
    fn test_update_recipe_by_name() {
        let db = Database::open_in_memory().unwrap();
        db.insert_recipe(&sample_recipe()).unwrap();

        let updated = db
            .update_recipe(
                "Pancakes",
                &UpdateRecipe {
                    ingredients: Some("flour, eggs, milk, butter".to_string()),
                    instructions: Some("1 Whisk. 2 Fry. 3 Serve.".to_string()),
                    nutrients: Nutrients {
                        calories: Some(Nutrient::parse("420")),
                        ..Nutrients::default()
                    },
                },
            )
            .unwrap();
        assert_eq!(updated.ingredients, "flour, eggs, milk, butter");
        assert_eq!(updated.instructions, "1 Whisk. 2 Fry. 3 Serve.");
        assert_eq!(updated.nutrients.calories, Some(Nutrient::parse("420")));
        assert_eq!(updated.nutrients.protein, Some(Nutrient::parse("9g")));

        let err = db
            .update_recipe("Waffles", &UpdateRecipe::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "Recipe not found");
    }

    #[test]
    fn test_bookmarks() {
        let db = Database::open_in_memory().unwrap();
        let pancakes = db.insert_recipe(&sample_recipe()).unwrap().inserted().unwrap();
        let soup = db
            .insert_recipe(&NewRecipe {
                name: "Soup".to_string(),
                ..sample_recipe()
            })
            .unwrap()
            .inserted()
            .unwrap();

        assert!(db.list_bookmarked_recipes().unwrap().is_empty());
        assert!(db.set_recipe_bookmarked(pancakes.id, true).unwrap().bookmarked);
        db.set_recipe_bookmarked(soup.id, true).unwrap();
        assert_eq!(db.list_bookmarked_recipes().unwrap().len(), 2);

        assert_eq!(db.clear_bookmarks(&[pancakes.id, soup.id]).unwrap(), 2);
        assert_eq!(db.clear_bookmarks(&[pancakes.id]).unwrap(), 0);
        assert!(db.list_bookmarked_recipes().unwrap().is_empty());
    }

    #[test]
    fn test_search_recipes() {
        let db = Database::open_in_memory().unwrap();
        db.insert_recipe(&sample_recipe()).unwrap();
        db.insert_recipe(&NewRecipe {
            name: "Tomato Soup".to_string(),
            ..sample_recipe()
        })
        .unwrap();

        let results = db.search_recipes("soup").unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Tomato Soup");
        assert_eq!(db.search_recipes("").unwrap().len(), 2);
    }

    #[test]
    fn test_delete_recipe() {
        let db = Database::open_in_memory().unwrap();
        let recipe = db.insert_recipe(&sample_recipe()).unwrap().inserted().unwrap();
        assert!(db.delete_recipe(recipe.id).unwrap());
        assert!(db.find_recipe("Pancakes").unwrap().is_none());
    }

    #[test]
    fn test_grocery_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let item = db
            .insert_grocery(&new_grocery("Milk", "2 L", "Dairy"))
            .unwrap();

        let fetched = db.get_grocery(item.id).unwrap();
        assert_eq!(fetched.name, "Milk");
        assert_eq!(fetched.quantity, "2 L");
        assert_eq!(fetched.category, "Dairy");
        assert!(!fetched.is_checked);
    }

    #[test]
    fn test_toggle_grocery_checked() {
        let db = Database::open_in_memory().unwrap();
        let item = db.insert_grocery(&new_grocery("Eggs", "12", "Dairy")).unwrap();

        assert!(db.toggle_grocery_checked(item.id).unwrap().is_checked);
        assert!(!db.toggle_grocery_checked(item.id).unwrap().is_checked);
        assert!(db.toggle_grocery_checked(999).is_err());
    }

    #[test]
    fn test_update_and_delete_grocery() {
        let db = Database::open_in_memory().unwrap();
        let item = db.insert_grocery(&new_grocery("Eggs", "12", "Dairy")).unwrap();

        let updated = db.update_grocery(item.id, "Free-range eggs", "6").unwrap();
        assert_eq!(updated.name, "Free-range eggs");
        assert_eq!(updated.quantity, "6");
        assert_eq!(updated.category, "Dairy");

        assert!(db.delete_grocery(item.id).unwrap());
        assert!(db.get_grocery(item.id).is_err());
    }

    #[test]
    fn test_list_groceries_and_categories() {
        let db = Database::open_in_memory().unwrap();
        db.insert_grocery(&new_grocery("Milk", "1", "Dairy")).unwrap();
        db.insert_grocery(&new_grocery("Apples", "6", "Produce")).unwrap();
        db.insert_grocery(&new_grocery("Butter", "1", "Dairy")).unwrap();
        db.insert_grocery(&new_grocery("Salt", "1", "")).unwrap();

        let names: Vec<String> = db
            .list_groceries()
            .unwrap()
            .into_iter()
            .map(|g| g.name)
            .collect();
        assert_eq!(names, vec!["Salt", "Butter", "Milk", "Apples"]);
        assert_eq!(db.grocery_categories().unwrap(), vec!["Dairy", "Produce"]);
    }

    #[test]
    fn test_get_or_create_user_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_user().unwrap().is_none());

        let first = db.get_or_create_user().unwrap();
        let second = db.get_or_create_user().unwrap();
        assert_eq!(first.uuid, second.uuid);
        assert_eq!(first.age, 0);
        assert!(first.name.is_none());
    }

    #[test]
    fn test_users_table_holds_one_row() {
        let db = Database::open_in_memory().unwrap();
        db.get_or_create_user().unwrap();
        let result = db.conn.execute(
            "INSERT INTO users (id, uuid, created_at, updated_at) VALUES (2, 'x', 'now', 'now')",
            [],
        );
        assert!(result.is_err());
        let count: i64 = db
            .conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_save_and_delete_user() {
        let db = Database::open_in_memory().unwrap();
        let mut user = db.get_or_create_user().unwrap();
        user.name = Some("Sam".to_string());
        user.age = 31;
        user.weight = 72.5;
        user.nutrition_goal = Some("1800 cal/day".to_string());

        let saved = db.save_user(&user).unwrap();
        assert_eq!(saved.uuid, user.uuid);
        assert_eq!(saved.name.as_deref(), Some("Sam"));
        assert_eq!(saved.age, 31);
        assert_eq!(saved.nutrition_goal.as_deref(), Some("1800 cal/day"));

        assert!(db.delete_user().unwrap());
        assert!(db.get_user().unwrap().is_none());
        assert!(!db.delete_user().unwrap());
    }

    #[test]
    fn test_reopen_keeps_data_and_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("appetit.db");

        let db = Database::open(&path).unwrap();
        db.insert_food(&sample_food()).unwrap();
        db.close().unwrap();

        let db = Database::open(&path).unwrap();
        let version: i64 = db
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, 1);
        assert_eq!(db.list_all_foods().unwrap().len(), 1);
    }
}
