use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::{debug, info};

use crate::db::Database;
use crate::instructions::{split_ingredients, split_instructions};
use crate::models::{
    Food, FoodForm, Grocery, GroceryGroup, InsertOutcome, NewFood, NewGrocery, NutrientKind,
    Profile, ProfileForm, Recipe, UpdateFood, UpdateRecipe, User, name_matches,
    validate_food_form, validate_grocery_edit, validate_grocery_item, validate_meal_type,
    validate_picker_serving, validate_profile_form, validate_serving,
};
use crate::nutrition::{JournalSummary, build_journal_summary, scaled_display};

const UNKNOWN_CATEGORY: &str = "Unknown";

/// Scaled nutrient strings for one food at one serving.
#[derive(Debug, Clone, Serialize)]
pub struct FoodDetail {
    pub id: i64,
    pub name: String,
    pub meal_type: Option<String>,
    pub serving: f64,
    pub calories: String,
    pub fat: String,
    pub fiber: String,
    pub carbs: String,
    pub protein: String,
}

/// Application operations over an open [`Database`].
///
/// Validation runs before the first store call, so a rejected request
/// leaves the store untouched.
pub struct AppetitService<'a> {
    db: &'a Database,
}

impl<'a> AppetitService<'a> {
    #[must_use]
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    // --- Journal ---

    pub fn journal_summary(&self) -> Result<JournalSummary> {
        let foods = self.db.list_all_foods()?;
        let goal = self.db.get_user()?.and_then(|u| u.nutrition_goal);
        Ok(build_journal_summary(&foods, goal.as_deref()))
    }

    pub fn meal_foods(&self, meal: &str) -> Result<Vec<Food>> {
        let meal = validate_meal_type(meal)?;
        self.db.list_foods_for_meal(&meal)
    }

    pub fn add_food(&self, form: &FoodForm) -> Result<InsertOutcome<Food>> {
        let food = validate_food_form(form)?;
        let outcome = self.db.insert_food(&food)?;
        if !outcome.is_inserted() {
            info!("Food with the name {} already exists.", food.name);
        }
        Ok(outcome)
    }

    /// Copy a catalog food into a meal at the chosen serving.
    pub fn log_catalog_food(
        &self,
        catalog_id: i64,
        meal: &str,
        serving: f64,
    ) -> Result<InsertOutcome<Food>> {
        let meal = validate_meal_type(meal)?;
        let serving = validate_picker_serving(serving)?;
        let source = self.db.get_food(catalog_id)?;
        if !source.is_catalog() {
            bail!("'{}' is not a catalog food", source.name);
        }

        debug!(food = %source.name, %meal, serving, "logging catalog food");
        self.db.insert_food(&NewFood {
            name: source.name,
            serving: Some(serving),
            nutrients: source.nutrients,
            meal_type: Some(meal),
            is_in_grocery_list: false,
        })
    }

    pub fn set_serving(&self, food_id: i64, serving: &str) -> Result<Food> {
        let serving = validate_serving(serving)?;
        self.db.set_food_serving(food_id, Some(serving))
    }

    pub fn update_food(&self, food_id: i64, update: &UpdateFood) -> Result<Food> {
        if update.serving.is_some_and(|s| s <= 0.0 || !s.is_finite()) {
            bail!("Please enter a valid serving size.");
        }
        self.db.update_food(food_id, update)
    }

    pub fn remove_food(&self, food_id: i64) -> Result<bool> {
        self.db.delete_food(food_id)
    }

    pub fn remove_food_from_meal(&self, name: &str, meal: &str) -> Result<usize> {
        let meal = validate_meal_type(meal)?;
        self.db.delete_food_from_meal(name, &meal)
    }

    /// `Ok(None)` when no food has this id.
    pub fn food(&self, food_id: i64) -> Result<Option<Food>> {
        self.db.find_food_by_id(food_id)
    }

    /// Nutrient values scaled by `serving_override`, or by the food's own
    /// serving (1 when unset). An override must lie in the picker range.
    pub fn food_detail(food: &Food, serving_override: Option<f64>) -> Result<FoodDetail> {
        let serving = match serving_override {
            Some(s) => validate_picker_serving(s)?,
            None => food.serving.unwrap_or(1.0),
        };
        let show = |kind| scaled_display(food.nutrients.get(kind), serving);
        Ok(FoodDetail {
            id: food.id,
            name: food.name.clone(),
            meal_type: food.meal_type.clone(),
            serving,
            calories: show(NutrientKind::Calories),
            fat: show(NutrientKind::Fat),
            fiber: show(NutrientKind::Fiber),
            carbs: show(NutrientKind::Carbs),
            protein: show(NutrientKind::Protein),
        })
    }

    pub fn search_catalog(&self, query: &str) -> Result<Vec<Food>> {
        self.db.search_catalog(query)
    }

    // --- Recipes ---

    pub fn recipes(&self, search: Option<&str>) -> Result<Vec<Recipe>> {
        match search {
            Some(query) => self.db.search_recipes(query),
            None => self.db.list_recipes(),
        }
    }

    pub fn bookmarked_recipes(&self, search: Option<&str>) -> Result<Vec<Recipe>> {
        let mut recipes = self.db.list_bookmarked_recipes()?;
        if let Some(query) = search {
            recipes.retain(|r| name_matches(&r.name, query));
        }
        Ok(recipes)
    }

    /// `Ok(None)` when no recipe has this name.
    pub fn find_recipe(&self, name: &str) -> Result<Option<Recipe>> {
        self.db.find_recipe(name.trim())
    }

    pub fn recipe_by_name(&self, name: &str) -> Result<Recipe> {
        self.find_recipe(name)?
            .with_context(|| format!("Recipe '{name}' not found"))
    }

    pub fn update_recipe(&self, name: &str, update: &UpdateRecipe) -> Result<Recipe> {
        if update.ingredients.as_deref().is_some_and(|i| i.trim().is_empty()) {
            bail!("Ingredients cannot be empty.");
        }
        if update.instructions.as_deref().is_some_and(|i| i.trim().is_empty()) {
            bail!("Instructions cannot be empty.");
        }
        let recipe = self.recipe_by_name(name)?;
        self.db.update_recipe(&recipe.name, update)
    }

    /// Returns `false` when no recipe has this name.
    pub fn delete_recipe(&self, name: &str) -> Result<bool> {
        match self.find_recipe(name)? {
            Some(recipe) => self.db.delete_recipe(recipe.id),
            None => Ok(false),
        }
    }

    #[must_use]
    pub fn recipe_steps(recipe: &Recipe) -> Vec<String> {
        split_instructions(&recipe.instructions)
    }

    pub fn bookmark_recipe(&self, name: &str) -> Result<Recipe> {
        let recipe = self.recipe_by_name(name)?;
        self.db.set_recipe_bookmarked(recipe.id, true)
    }

    /// Remove the named recipes from the bookmarks. Returns how many were
    /// bookmarked before.
    pub fn remove_bookmarks(&self, names: &[String]) -> Result<usize> {
        if names.is_empty() {
            bail!("Please choose a recipe to manage.");
        }
        let ids = names
            .iter()
            .map(|name| self.recipe_by_name(name).map(|r| r.id))
            .collect::<Result<Vec<_>>>()?;
        self.db.clear_bookmarks(&ids)
    }

    /// Add every ingredient of the named recipes to the grocery list.
    pub fn ingredients_to_groceries(&self, names: &[String], category: &str) -> Result<Vec<Grocery>> {
        if names.is_empty() {
            bail!("Please choose a recipe to manage.");
        }
        let recipes = names
            .iter()
            .map(|name| self.recipe_by_name(name))
            .collect::<Result<Vec<_>>>()?;

        self.db.in_transaction(|| {
            let mut added = Vec::new();
            for recipe in &recipes {
                for ingredient in split_ingredients(&recipe.ingredients) {
                    added.push(self.db.insert_grocery(&NewGrocery {
                        name: ingredient,
                        quantity: String::new(),
                        category: category.trim().to_string(),
                    })?);
                }
            }
            Ok(added)
        })
    }

    // --- Groceries ---

    pub fn grocery_list(&self) -> Result<Vec<GroceryGroup>> {
        Ok(group_groceries(self.db.list_groceries()?))
    }

    pub fn add_grocery(&self, name: &str, quantity: &str, category: &str) -> Result<Grocery> {
        validate_grocery_item(name, quantity)?;
        self.db.insert_grocery(&NewGrocery {
            name: name.trim().to_string(),
            quantity: quantity.trim().to_string(),
            category: category.trim().to_string(),
        })
    }

    /// Create a category with its first items. Rows missing a name or a
    /// quantity are skipped.
    pub fn add_category(&self, category: &str, items: &[(String, String)]) -> Result<Vec<Grocery>> {
        let category = category.trim();
        if category.is_empty() {
            bail!("Category name cannot be empty.");
        }
        self.db.in_transaction(|| {
            let mut added = Vec::new();
            for (name, quantity) in items {
                if name.trim().is_empty() || quantity.trim().is_empty() {
                    debug!(%name, %quantity, "skipping incomplete grocery row");
                    continue;
                }
                added.push(self.db.insert_grocery(&NewGrocery {
                    name: name.trim().to_string(),
                    quantity: quantity.trim().to_string(),
                    category: category.to_string(),
                })?);
            }
            Ok(added)
        })
    }

    pub fn edit_grocery(&self, id: i64, name: &str, quantity: &str) -> Result<Grocery> {
        validate_grocery_edit(name, quantity)?;
        self.db.update_grocery(id, name.trim(), quantity.trim())
    }

    /// `Ok(None)` when no item has this id.
    pub fn grocery(&self, id: i64) -> Result<Option<Grocery>> {
        self.db.find_grocery(id)
    }

    pub fn toggle_grocery(&self, id: i64) -> Result<Grocery> {
        self.db.toggle_grocery_checked(id)
    }

    pub fn delete_grocery(&self, id: i64) -> Result<bool> {
        self.db.delete_grocery(id)
    }

    pub fn grocery_categories(&self) -> Result<Vec<String>> {
        self.db.grocery_categories()
    }

    // --- Profile ---

    pub fn profile(&self) -> Result<Profile> {
        Ok(Profile::from_user(self.db.get_user()?.as_ref()))
    }

    pub fn save_profile(&self, form: &ProfileForm) -> Result<User> {
        validate_profile_form(form)?;
        let mut user = self.db.get_or_create_user()?;
        user.name = Some(form.name.trim().to_string());
        user.age = form.age;
        user.weight = form.weight;
        user.nutrition_goal = Some(form.nutrition_goal.trim().to_string());
        self.db.save_user(&user)
    }

    /// Write the image bytes to `target`, replacing any previous file, and
    /// record the path on the profile.
    pub fn set_profile_image(&self, bytes: &[u8], target: &Path) -> Result<User> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        fs::write(target, bytes)
            .with_context(|| format!("Failed to write profile image: {}", target.display()))?;

        let mut user = self.db.get_or_create_user()?;
        user.profile_image_path = Some(target.display().to_string());
        self.db.save_user(&user)
    }

    pub fn reset_profile(&self) -> Result<bool> {
        self.db.delete_user()
    }
}

/// Group items by category, with blank categories under "Unknown". Groups
/// are sorted by name.
#[must_use]
pub fn group_groceries(items: Vec<Grocery>) -> Vec<GroceryGroup> {
    let mut groups: BTreeMap<String, Vec<Grocery>> = BTreeMap::new();
    for item in items {
        let category = if item.category.trim().is_empty() {
            UNKNOWN_CATEGORY.to_string()
        } else {
            item.category.clone()
        };
        groups.entry(category).or_default().push(item);
    }
    groups
        .into_iter()
        .map(|(category, items)| GroceryGroup { category, items })
        .collect()
}
