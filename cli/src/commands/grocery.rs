use anyhow::Result;
use tabled::{Table, Tabled, settings::Style};

use appetit_core::db::Database;
use appetit_core::models::Grocery;
use appetit_core::service::AppetitService;

use super::helpers::{exit_not_found, parse_item_pair, truncate};

fn check_mark(item: &Grocery) -> &'static str {
    if item.is_checked { "[x]" } else { "[ ]" }
}

pub(crate) fn cmd_grocery_list(db: &Database, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct GroceryRow {
        #[tabled(rename = "")]
        check: &'static str,
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Item")]
        name: String,
        #[tabled(rename = "Quantity")]
        quantity: String,
    }

    let svc = AppetitService::new(db);
    let groups = svc.grocery_list()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&groups)?);
        return Ok(());
    }

    if groups.is_empty() {
        eprintln!("The grocery list is empty");
        std::process::exit(2);
    }

    for group in &groups {
        println!("{}", group.category);
        let rows: Vec<GroceryRow> = group
            .items
            .iter()
            .map(|g| GroceryRow {
                check: check_mark(g),
                id: g.id,
                name: truncate(&g.name, 35),
                quantity: g.quantity.clone(),
            })
            .collect();
        println!("{}\n", Table::new(&rows).with(Style::rounded()));
    }
    Ok(())
}

pub(crate) fn cmd_grocery_add(
    db: &Database,
    name: &str,
    quantity: &str,
    category: &str,
    json: bool,
) -> Result<()> {
    let svc = AppetitService::new(db);
    let item = svc.add_grocery(name, quantity, category)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&item)?);
    } else {
        println!("Added {} ({}) [id {}]", item.name, item.quantity, item.id);
    }
    Ok(())
}

pub(crate) fn cmd_grocery_add_category(
    db: &Database,
    category: &str,
    items: &[String],
    json: bool,
) -> Result<()> {
    let pairs = items
        .iter()
        .map(|s| parse_item_pair(s))
        .collect::<Result<Vec<_>>>()?;

    let svc = AppetitService::new(db);
    let added = svc.add_category(category, &pairs)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&added)?);
    } else {
        let count = added.len();
        println!("Added {count} item(s) to {}", category.trim());
        let skipped = pairs.len() - count;
        if skipped > 0 {
            eprintln!("Skipped {skipped} item(s) without a name or quantity");
        }
    }
    Ok(())
}

pub(crate) fn cmd_grocery_check(db: &Database, id: i64, json: bool) -> Result<()> {
    let svc = AppetitService::new(db);
    if svc.grocery(id)?.is_none() {
        exit_not_found(&format!("Grocery item {id} not found"), json);
    }
    let item = svc.toggle_grocery(id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&item)?);
    } else {
        println!("{} {}", check_mark(&item), item.name);
    }
    Ok(())
}

pub(crate) fn cmd_grocery_edit(
    db: &Database,
    id: i64,
    name: Option<String>,
    quantity: Option<String>,
    json: bool,
) -> Result<()> {
    let svc = AppetitService::new(db);
    let Some(current) = svc.grocery(id)? else {
        exit_not_found(&format!("Grocery item {id} not found"), json);
    };
    let name = name.unwrap_or(current.name);
    let quantity = quantity.unwrap_or(current.quantity);
    let item = svc.edit_grocery(id, &name, &quantity)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&item)?);
    } else {
        println!("Updated {} ({})", item.name, item.quantity);
    }
    Ok(())
}

pub(crate) fn cmd_grocery_delete(db: &Database, id: i64, json: bool) -> Result<()> {
    let svc = AppetitService::new(db);
    if !svc.delete_grocery(id)? {
        exit_not_found(&format!("Grocery item {id} not found"), json);
    }

    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted grocery item {id}");
    }
    Ok(())
}

pub(crate) fn cmd_grocery_categories(db: &Database, json: bool) -> Result<()> {
    let svc = AppetitService::new(db);
    let categories = svc.grocery_categories()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&categories)?);
        return Ok(());
    }
    for c in &categories {
        println!("{c}");
    }
    Ok(())
}
