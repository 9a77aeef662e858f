//! Nutrient values and the arithmetic behind the journal.
//!
//! Nutrient amounts arrive as free text ("12g", "250 kcal", "3.5").
//! [`Nutrient::parse`] splits them into a number and a unit once; everything
//! downstream works on the typed pair and only turns it back into text for
//! display.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::{Food, MEAL_TYPES, NutrientKind};

static GOAL_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("goal pattern is valid"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nutrient {
    pub amount: f64,
    #[serde(default)]
    pub unit: String,
}

impl Nutrient {
    /// Split free text into amount and unit. Text without digits parses to 0.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        Self {
            amount: extract_number(text).unwrap_or(0.0),
            unit: unit_suffix(text),
        }
    }

    /// `amount * multiplier` with one decimal, followed by the unit.
    #[must_use]
    pub fn scaled(&self, multiplier: f64) -> String {
        format!("{:.1}{}", self.amount * multiplier, self.unit)
    }
}

impl fmt::Display for Nutrient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.unit)
    }
}

/// Keep only ASCII digits and '.', then parse what is left.
///
/// "12.5g" gives 12.5, "abc" gives `None`. Digits separated by letters are
/// concatenated, so "1a2" gives 12.
#[must_use]
pub fn extract_number(text: &str) -> Option<f64> {
    let digits: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Everything that is not a digit or '.', trimmed.
#[must_use]
pub fn unit_suffix(text: &str) -> String {
    let rest: String = text
        .chars()
        .filter(|c| !c.is_ascii_digit() && *c != '.')
        .collect();
    rest.trim().to_string()
}

/// Serving text to multiplier. Absent or unparsable servings count as 1.
#[must_use]
pub fn serving_multiplier(serving: Option<&str>) -> f64 {
    serving.and_then(extract_number).unwrap_or(1.0)
}

/// Scale a textual nutrient by a textual serving for display.
///
/// An absent value renders as "0".
#[must_use]
pub fn scale_nutrient(value: Option<&str>, serving: Option<&str>) -> String {
    let Some(value) = value else {
        return "0".to_string();
    };
    Nutrient::parse(value).scaled(serving_multiplier(serving))
}

/// Typed counterpart of [`scale_nutrient`].
#[must_use]
pub fn scaled_display(nutrient: Option<&Nutrient>, multiplier: f64) -> String {
    nutrient.map_or_else(|| "0".to_string(), |n| n.scaled(multiplier))
}

fn food_contribution(food: &Food, kind: NutrientKind) -> f64 {
    food.nutrients.get(kind).map_or(0.0, |n| n.amount) * food.serving.unwrap_or(1.0)
}

/// Sum of `amount * serving` of one nutrient over the foods logged to `meal`.
#[must_use]
pub fn meal_total(foods: &[Food], meal: &str, kind: NutrientKind) -> f64 {
    foods
        .iter()
        .filter(|f| f.meal_type.as_deref() == Some(meal))
        .map(|f| food_contribution(f, kind))
        .sum()
}

/// First run of digits in the goal text, e.g. "2000 cal/day" gives 2000.
#[must_use]
pub fn goal_calories(goal: Option<&str>) -> f64 {
    goal.and_then(|g| {
        GOAL_NUMBER
            .find_iter(g)
            .find_map(|m| m.as_str().parse::<f64>().ok())
    })
    .unwrap_or(0.0)
}

#[must_use]
pub fn remaining_calories<I>(goal: Option<&str>, meal_calories: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    goal_calories(goal) - meal_calories.into_iter().sum::<f64>()
}

#[derive(Debug, Clone, Serialize)]
pub struct MealSummary {
    pub meal_type: String,
    pub foods: Vec<Food>,
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub fiber: f64,
    pub carbs: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct JournalSummary {
    pub meals: Vec<MealSummary>,
    pub goal_calories: f64,
    pub consumed_calories: f64,
    pub remaining_calories: f64,
}

impl JournalSummary {
    /// "N cal left", with the remainder truncated toward zero.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn remaining_label(&self) -> String {
        format!("{} cal left", self.remaining_calories.trunc() as i64)
    }
}

/// Build the four meal cards and the calorie balance.
///
/// Every meal appears even when nothing is logged to it. Foods with no
/// meal (catalog entries) are ignored.
#[must_use]
pub fn build_journal_summary(foods: &[Food], goal: Option<&str>) -> JournalSummary {
    let meals: Vec<MealSummary> = MEAL_TYPES
        .iter()
        .map(|meal| MealSummary {
            meal_type: (*meal).to_string(),
            foods: foods
                .iter()
                .filter(|f| f.meal_type.as_deref() == Some(*meal))
                .cloned()
                .collect(),
            calories: meal_total(foods, meal, NutrientKind::Calories),
            protein: meal_total(foods, meal, NutrientKind::Protein),
            fat: meal_total(foods, meal, NutrientKind::Fat),
            fiber: meal_total(foods, meal, NutrientKind::Fiber),
            carbs: meal_total(foods, meal, NutrientKind::Carbs),
        })
        .collect();

    let consumed_calories: f64 = meals.iter().map(|m| m.calories).sum();
    let remaining_calories = remaining_calories(goal, meals.iter().map(|m| m.calories));
    JournalSummary {
        meals,
        goal_calories: goal_calories(goal),
        consumed_calories,
        remaining_calories,
    }
}
