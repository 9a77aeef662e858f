mod commands;
mod config;
mod logging;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use crate::commands::{
    cmd_food_add, cmd_food_delete, cmd_food_search, cmd_food_show, cmd_food_update,
    cmd_grocery_add, cmd_grocery_add_category, cmd_grocery_categories, cmd_grocery_check,
    cmd_grocery_delete, cmd_grocery_edit, cmd_grocery_list, cmd_journal, cmd_meal_add,
    cmd_meal_remove, cmd_meal_serving, cmd_meal_show, cmd_profile_image, cmd_profile_reset,
    cmd_profile_set, cmd_profile_show, cmd_recipe_bookmark, cmd_recipe_delete,
    cmd_recipe_groceries, cmd_recipe_list, cmd_recipe_show, cmd_recipe_unbookmark,
    cmd_recipe_update, cmd_seed_foods, cmd_seed_recipes,
};
use crate::config::Config;
use crate::logging::{Verbosity, init_logging};
use appetit_core::db::Database;
use appetit_core::models::{FoodForm, ProfileForm};

#[derive(Parser)]
#[command(
    name = "appetit",
    version,
    about = "Food journal, recipe box and grocery list",
    long_about = "Track what you eat against a daily calorie goal, keep bookmarked recipes \
                  and turn their ingredients into a grocery list."
)]
struct Cli {
    /// Directory holding the database and profile image
    #[arg(long, global = true, value_name = "PATH")]
    data_dir: Option<PathBuf>,
    /// More diagnostics on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    /// Only report errors
    #[arg(short, long, global = true)]
    quiet: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the four meals and the calories left for today
    Journal {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Foods logged to a meal
    Meal {
        #[command(subcommand)]
        command: MealCommands,
    },
    /// Catalog and journal foods
    Food {
        #[command(subcommand)]
        command: FoodCommands,
    },
    /// Browse and bookmark recipes
    Recipe {
        #[command(subcommand)]
        command: RecipeCommands,
    },
    /// Manage the grocery list
    Grocery {
        #[command(subcommand)]
        command: GroceryCommands,
    },
    /// View or edit your profile and nutrition goal
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Load reference foods or recipes from JSON
    Seed {
        #[command(subcommand)]
        command: SeedCommands,
    },
}

#[derive(Subcommand)]
enum MealCommands {
    /// List the foods logged to a meal
    Show {
        /// Meal: breakfast, lunch, dinner, snacks
        meal: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Log a catalog food to a meal
    Add {
        /// Meal: breakfast, lunch, dinner, snacks
        meal: String,
        /// Catalog food name to search for
        query: Option<String>,
        /// Serving multiplier, 0 to 100 (default: the catalog serving)
        #[arg(short, long)]
        serving: Option<f64>,
        /// Log directly by catalog food ID (skip search)
        #[arg(long)]
        food_id: Option<i64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove a food from a meal by name
    Remove {
        /// Meal: breakfast, lunch, dinner, snacks
        meal: String,
        /// Food name
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change the serving of a logged food
    Serving {
        /// Food ID
        id: i64,
        /// New serving multiplier
        serving: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum FoodCommands {
    /// Add a food to a meal
    Add {
        /// Food name
        name: String,
        /// Meal: breakfast, lunch, dinner, snacks
        #[arg(short, long)]
        meal: Option<String>,
        /// Calories
        #[arg(long)]
        calories: Option<String>,
        /// Fat (g)
        #[arg(long)]
        fat: Option<String>,
        /// Fiber (g)
        #[arg(long)]
        fiber: Option<String>,
        /// Carbohydrates (g)
        #[arg(long)]
        carbs: Option<String>,
        /// Protein (g)
        #[arg(long)]
        protein: Option<String>,
        /// Serving multiplier
        #[arg(long)]
        serving: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search the food catalog (lists everything without a query)
    Search {
        /// Search query
        query: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a food with nutrients scaled to a serving
    Show {
        /// Food ID
        id: i64,
        /// Serving multiplier (default: the food's own serving)
        #[arg(short, long)]
        serving: Option<f64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update serving or nutrients of a food
    Update {
        /// Food ID
        id: i64,
        /// New serving multiplier
        #[arg(long)]
        serving: Option<f64>,
        /// New calories
        #[arg(long)]
        calories: Option<String>,
        /// New fat
        #[arg(long)]
        fat: Option<String>,
        /// New fiber
        #[arg(long)]
        fiber: Option<String>,
        /// New carbohydrates
        #[arg(long)]
        carbs: Option<String>,
        /// New protein
        #[arg(long)]
        protein: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a food by ID
    Delete {
        /// Food ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum RecipeCommands {
    /// List recipes
    List {
        /// Only bookmarked recipes
        #[arg(long)]
        bookmarked: bool,
        /// Filter by name
        #[arg(long)]
        search: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a recipe with numbered steps
    Show {
        /// Recipe name
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit the ingredients, instructions or nutrients of a recipe
    Update {
        /// Recipe name
        name: String,
        /// Comma-separated ingredients
        #[arg(long)]
        ingredients: Option<String>,
        /// Steps, separated by periods
        #[arg(long)]
        instructions: Option<String>,
        /// New calories
        #[arg(long)]
        calories: Option<String>,
        /// New fat
        #[arg(long)]
        fat: Option<String>,
        /// New fiber
        #[arg(long)]
        fiber: Option<String>,
        /// New carbohydrates
        #[arg(long)]
        carbs: Option<String>,
        /// New protein
        #[arg(long)]
        protein: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a recipe
    Delete {
        /// Recipe name
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Bookmark a recipe
    Bookmark {
        /// Recipe name
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove recipes from the bookmarks
    Unbookmark {
        /// Recipe names
        names: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add the ingredients of recipes to the grocery list
    Groceries {
        /// Recipe names
        names: Vec<String>,
        /// Grocery category for the new items
        #[arg(short, long, default_value = "")]
        category: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum GroceryCommands {
    /// Show the grocery list grouped by category
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add an item
    Add {
        /// Item name
        name: String,
        /// Quantity (e.g. "2", "500 g")
        quantity: String,
        /// Category
        #[arg(short, long, default_value = "")]
        category: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a category with items
    AddCategory {
        /// Category name
        category: String,
        /// Item as "name=quantity" (repeatable)
        #[arg(short, long = "item", value_name = "NAME=QTY")]
        items: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Toggle the checked state of an item
    Check {
        /// Item ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Rename an item or change its quantity
    Edit {
        /// Item ID
        id: i64,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New quantity
        #[arg(long)]
        quantity: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete an item
    Delete {
        /// Item ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List existing categories
    Categories {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Show the profile
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set name, age, weight and nutrition goal
    Set {
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "0")]
        age: i64,
        #[arg(long, default_value = "0")]
        weight: f64,
        /// Free text goal, e.g. "2000 cal/day"
        #[arg(long, default_value = "")]
        goal: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Use an image file as the profile picture
    Image {
        /// Image file to copy
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete the profile
    Reset {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum SeedCommands {
    /// Load catalog foods (bundled list when no file is given)
    Foods {
        /// JSON array of foods
        file: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Load recipes (bundled list when no file is given)
    Recipes {
        /// JSON array of recipes
        file: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(Verbosity::from_flags(cli.quiet, cli.verbose));

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

#[allow(clippy::too_many_lines)]
fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.data_dir.as_deref())?;
    tracing::debug!(data_dir = %config.data_dir.display(), "using data directory");
    let db = Database::open(&config.db_path)?;

    let result = match cli.command {
        Commands::Journal { json } => cmd_journal(&db, json),
        Commands::Meal { command } => match command {
            MealCommands::Show { meal, json } => cmd_meal_show(&db, &meal, json),
            MealCommands::Add {
                meal,
                query,
                serving,
                food_id,
                json,
            } => cmd_meal_add(&db, &meal, query.as_deref(), serving, food_id, json),
            MealCommands::Remove { meal, name, json } => cmd_meal_remove(&db, &meal, &name, json),
            MealCommands::Serving { id, serving, json } => {
                cmd_meal_serving(&db, id, &serving, json)
            }
        },
        Commands::Food { command } => match command {
            FoodCommands::Add {
                name,
                meal,
                calories,
                fat,
                fiber,
                carbs,
                protein,
                serving,
                json,
            } => {
                let form = FoodForm {
                    name,
                    meal_type: meal.unwrap_or_default(),
                    calories: calories.unwrap_or_default(),
                    fat: fat.unwrap_or_default(),
                    fiber: fiber.unwrap_or_default(),
                    carbs: carbs.unwrap_or_default(),
                    protein: protein.unwrap_or_default(),
                    serving: serving.unwrap_or_default(),
                };
                cmd_food_add(&db, &form, json)
            }
            FoodCommands::Search { query, json } => {
                cmd_food_search(&db, query.as_deref().unwrap_or(""), json)
            }
            FoodCommands::Show { id, serving, json } => cmd_food_show(&db, id, serving, json),
            FoodCommands::Update {
                id,
                serving,
                calories,
                fat,
                fiber,
                carbs,
                protein,
                json,
            } => cmd_food_update(
                &db,
                id,
                serving,
                [calories, fat, fiber, carbs, protein],
                json,
            ),
            FoodCommands::Delete { id, json } => cmd_food_delete(&db, id, json),
        },
        Commands::Recipe { command } => match command {
            RecipeCommands::List {
                bookmarked,
                search,
                json,
            } => cmd_recipe_list(&db, bookmarked, search.as_deref(), json),
            RecipeCommands::Show { name, json } => cmd_recipe_show(&db, &name, json),
            RecipeCommands::Update {
                name,
                ingredients,
                instructions,
                calories,
                fat,
                fiber,
                carbs,
                protein,
                json,
            } => cmd_recipe_update(
                &db,
                &name,
                ingredients,
                instructions,
                [calories, fat, fiber, carbs, protein],
                json,
            ),
            RecipeCommands::Delete { name, json } => cmd_recipe_delete(&db, &name, json),
            RecipeCommands::Bookmark { name, json } => cmd_recipe_bookmark(&db, &name, json),
            RecipeCommands::Unbookmark { names, json } => {
                cmd_recipe_unbookmark(&db, &names, json)
            }
            RecipeCommands::Groceries {
                names,
                category,
                json,
            } => cmd_recipe_groceries(&db, &names, &category, json),
        },
        Commands::Grocery { command } => match command {
            GroceryCommands::List { json } => cmd_grocery_list(&db, json),
            GroceryCommands::Add {
                name,
                quantity,
                category,
                json,
            } => cmd_grocery_add(&db, &name, &quantity, &category, json),
            GroceryCommands::AddCategory {
                category,
                items,
                json,
            } => cmd_grocery_add_category(&db, &category, &items, json),
            GroceryCommands::Check { id, json } => cmd_grocery_check(&db, id, json),
            GroceryCommands::Edit {
                id,
                name,
                quantity,
                json,
            } => cmd_grocery_edit(&db, id, name, quantity, json),
            GroceryCommands::Delete { id, json } => cmd_grocery_delete(&db, id, json),
            GroceryCommands::Categories { json } => cmd_grocery_categories(&db, json),
        },
        Commands::Profile { command } => match command {
            ProfileCommands::Show { json } => cmd_profile_show(&db, json),
            ProfileCommands::Set {
                name,
                age,
                weight,
                goal,
                json,
            } => {
                let form = ProfileForm {
                    name,
                    age,
                    weight,
                    nutrition_goal: goal,
                };
                cmd_profile_set(&db, &form, json)
            }
            ProfileCommands::Image { file, json } => {
                cmd_profile_image(&db, &file, &config.profile_image_path, json)
            }
            ProfileCommands::Reset { json } => cmd_profile_reset(&db, json),
        },
        Commands::Seed { command } => match command {
            SeedCommands::Foods { file, json } => cmd_seed_foods(&db, file.as_deref(), json),
            SeedCommands::Recipes { file, json } => cmd_seed_recipes(&db, file.as_deref(), json),
        },
    };

    db.close()?;
    result
}
