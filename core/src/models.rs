use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::nutrition::Nutrient;

pub const MEAL_TYPES: &[&str] = &["Breakfast", "Lunch", "Dinner", "Snacks"];

/// Which of the five tracked nutrients a value refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NutrientKind {
    Calories,
    Fat,
    Fiber,
    Carbs,
    Protein,
}

impl NutrientKind {
    pub const ALL: [NutrientKind; 5] = [
        NutrientKind::Calories,
        NutrientKind::Fat,
        NutrientKind::Fiber,
        NutrientKind::Carbs,
        NutrientKind::Protein,
    ];

    /// Column prefix in the store: `<column>_amount` / `<column>_unit`.
    #[must_use]
    pub fn column(self) -> &'static str {
        match self {
            Self::Calories => "calories",
            Self::Fat => "fat",
            Self::Fiber => "fiber",
            Self::Carbs => "carbs",
            Self::Protein => "protein",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Calories => "Calories",
            Self::Fat => "Fat",
            Self::Fiber => "Fiber",
            Self::Carbs => "Carbs",
            Self::Protein => "Protein",
        }
    }
}

/// The five tracked nutrients of a food or recipe. Absent values stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrients {
    pub calories: Option<Nutrient>,
    pub fat: Option<Nutrient>,
    pub fiber: Option<Nutrient>,
    pub carbs: Option<Nutrient>,
    pub protein: Option<Nutrient>,
}

impl Nutrients {
    #[must_use]
    pub fn get(&self, kind: NutrientKind) -> Option<&Nutrient> {
        match kind {
            NutrientKind::Calories => self.calories.as_ref(),
            NutrientKind::Fat => self.fat.as_ref(),
            NutrientKind::Fiber => self.fiber.as_ref(),
            NutrientKind::Carbs => self.carbs.as_ref(),
            NutrientKind::Protein => self.protein.as_ref(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        NutrientKind::ALL.iter().all(|k| self.get(*k).is_none())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Food {
    pub id: i64,
    #[serde(default)]
    pub uuid: String,
    pub name: String,
    pub serving: Option<f64>,
    #[serde(flatten)]
    pub nutrients: Nutrients,
    /// `None` for catalog entries; a meal name for journal entries.
    pub meal_type: Option<String>,
    pub is_in_grocery_list: bool,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl Food {
    #[must_use]
    pub fn is_catalog(&self) -> bool {
        self.meal_type.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewFood {
    pub name: String,
    pub serving: Option<f64>,
    pub nutrients: Nutrients,
    pub meal_type: Option<String>,
    pub is_in_grocery_list: bool,
}

/// Partial update of a food. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateFood {
    pub serving: Option<f64>,
    pub nutrients: Nutrients,
}

impl UpdateFood {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.serving.is_none() && self.nutrients.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    #[serde(default)]
    pub uuid: String,
    pub name: String,
    pub ingredients: String,
    #[serde(flatten)]
    pub nutrients: Nutrients,
    pub instructions: String,
    pub image_url: Option<String>,
    pub bookmarked: bool,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, Default)]
pub struct NewRecipe {
    pub name: String,
    pub ingredients: String,
    pub nutrients: Nutrients,
    pub instructions: String,
    pub image_url: Option<String>,
    pub bookmarked: bool,
}

/// Partial update of a recipe. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateRecipe {
    pub ingredients: Option<String>,
    pub instructions: Option<String>,
    pub nutrients: Nutrients,
}

impl UpdateRecipe {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ingredients.is_none() && self.instructions.is_none() && self.nutrients.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grocery {
    pub id: i64,
    #[serde(default)]
    pub uuid: String,
    pub name: String,
    pub quantity: String,
    pub category: String,
    pub is_checked: bool,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct NewGrocery {
    pub name: String,
    pub quantity: String,
    pub category: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroceryGroup {
    pub category: String,
    pub items: Vec<Grocery>,
}

/// The single profile record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub uuid: String,
    pub name: Option<String>,
    pub age: i64,
    pub weight: f64,
    pub profile_image_path: Option<String>,
    pub nutrition_goal: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

pub const DEFAULT_PROFILE_NAME: &str = "Name";
pub const DEFAULT_NUTRITION_GOAL: &str = "2000 cal/day";

/// Profile as shown to the user, with display defaults filled in.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub name: String,
    pub age: i64,
    pub weight: f64,
    pub nutrition_goal: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image_path: Option<String>,
}

impl Profile {
    #[must_use]
    pub fn from_user(user: Option<&User>) -> Self {
        match user {
            Some(u) => Self {
                name: u
                    .name
                    .clone()
                    .unwrap_or_else(|| DEFAULT_PROFILE_NAME.to_string()),
                age: u.age,
                weight: u.weight,
                nutrition_goal: u
                    .nutrition_goal
                    .clone()
                    .unwrap_or_else(|| DEFAULT_NUTRITION_GOAL.to_string()),
                profile_image_path: u.profile_image_path.clone(),
            },
            None => Self {
                name: DEFAULT_PROFILE_NAME.to_string(),
                age: 0,
                weight: 0.0,
                nutrition_goal: DEFAULT_NUTRITION_GOAL.to_string(),
                profile_image_path: None,
            },
        }
    }
}

/// Result of an insert guarded by a uniqueness constraint.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", content = "record", rename_all = "snake_case")]
pub enum InsertOutcome<T> {
    Inserted(T),
    AlreadyExists,
}

impl<T> InsertOutcome<T> {
    #[must_use]
    pub fn is_inserted(&self) -> bool {
        matches!(self, Self::Inserted(_))
    }

    #[must_use]
    pub fn inserted(self) -> Option<T> {
        match self {
            Self::Inserted(v) => Some(v),
            Self::AlreadyExists => None,
        }
    }
}

/// Case-insensitive substring match used by the catalog and recipe searches.
/// A blank query matches every name.
#[must_use]
pub fn name_matches(name: &str, query: &str) -> bool {
    let query = query.trim();
    query.is_empty() || name.to_lowercase().contains(&query.to_lowercase())
}

// --- Form input ---

/// Raw text of the "add food" form.
#[derive(Debug, Clone, Default)]
pub struct FoodForm {
    pub name: String,
    pub meal_type: String,
    pub calories: String,
    pub fat: String,
    pub fiber: String,
    pub carbs: String,
    pub protein: String,
    pub serving: String,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileForm {
    pub name: String,
    pub age: i64,
    pub weight: f64,
    pub nutrition_goal: String,
}

/// Normalize a meal name to its canonical spelling ("lunch" -> "Lunch").
pub fn validate_meal_type(meal: &str) -> Result<String> {
    let trimmed = meal.trim();
    if trimmed.is_empty() {
        bail!("Please enter a valid meal type.");
    }
    match MEAL_TYPES.iter().find(|m| m.eq_ignore_ascii_case(trimmed)) {
        Some(m) => Ok((*m).to_string()),
        None => bail!(
            "Invalid meal type '{meal}'. Must be one of: {}",
            MEAL_TYPES.join(", ")
        ),
    }
}

fn parse_form_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn require_positive(value: &str, message: &str) -> Result<f64> {
    match parse_form_number(value) {
        Some(v) if v > 0.0 => Ok(v),
        _ => bail!("{message}"),
    }
}

/// Validate the add-food form. Nothing is stored when this fails.
pub fn validate_food_form(form: &FoodForm) -> Result<NewFood> {
    let name = form.name.trim();
    if name.is_empty() {
        bail!("Please enter a valid food name.");
    }
    let meal_type = validate_meal_type(&form.meal_type)?;

    require_positive(&form.calories, "Please enter a valid calories amount.")?;
    match parse_form_number(&form.fat) {
        Some(v) if v >= 0.0 => {}
        _ => bail!("Please enter a valid fat amount."),
    }
    require_positive(&form.fiber, "Please enter a valid fiber amount.")?;
    require_positive(&form.carbs, "Please enter a valid carbs amount.")?;
    require_positive(&form.protein, "Please enter a valid protein amount.")?;
    let serving = require_positive(&form.serving, "Please enter a valid serving size.")?;

    Ok(NewFood {
        name: name.to_string(),
        serving: Some(serving),
        nutrients: Nutrients {
            calories: Some(Nutrient::parse(form.calories.trim())),
            fat: Some(Nutrient::parse(form.fat.trim())),
            fiber: Some(Nutrient::parse(form.fiber.trim())),
            carbs: Some(Nutrient::parse(form.carbs.trim())),
            protein: Some(Nutrient::parse(form.protein.trim())),
        },
        meal_type: Some(meal_type),
        is_in_grocery_list: false,
    })
}

/// Parse the editable serving field of a logged food.
pub fn validate_serving(serving: &str) -> Result<f64> {
    require_positive(serving, "Please enter a valid serving size.")
}

/// Serving picker range when logging from the catalog: 0 to 100.
pub fn validate_picker_serving(serving: f64) -> Result<f64> {
    if !(0.0..=100.0).contains(&serving) {
        bail!("Serving must be between 0 and 100 (got {serving})");
    }
    Ok(serving)
}

pub fn validate_grocery_item(name: &str, quantity: &str) -> Result<()> {
    if name.trim().is_empty() {
        bail!("Please enter an item name.");
    }
    if quantity.trim().is_empty() {
        bail!("Please enter a quantity.");
    }
    Ok(())
}

pub fn validate_grocery_edit(name: &str, quantity: &str) -> Result<()> {
    if name.trim().is_empty() {
        bail!("Item name cannot be empty.");
    }
    if quantity.trim().is_empty() {
        bail!("Quantity cannot be empty.");
    }
    Ok(())
}

pub fn validate_profile_form(form: &ProfileForm) -> Result<()> {
    if form.name.trim().is_empty()
        || form.nutrition_goal.trim().is_empty()
        || form.age <= 0
        || form.weight <= 0.0
    {
        bail!("All fields must be filled out.");
    }
    Ok(())
}
