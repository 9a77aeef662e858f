use anyhow::{Context, Result};
use std::path::Path;

use appetit_core::db::Database;
use appetit_core::models::ProfileForm;
use appetit_core::nutrition::goal_calories;
use appetit_core::service::AppetitService;

pub(crate) fn cmd_profile_show(db: &Database, json: bool) -> Result<()> {
    let svc = AppetitService::new(db);
    let profile = svc.profile()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
        return Ok(());
    }

    println!("{}", profile.name);
    println!("  Age:    {}", profile.age);
    println!("  Weight: {}", profile.weight);
    let target = goal_calories(Some(profile.nutrition_goal.as_str()));
    println!("  Goal:   {} ({target:.0} cal)", profile.nutrition_goal);
    if let Some(path) = &profile.profile_image_path {
        println!("  Image:  {path}");
    }
    Ok(())
}

pub(crate) fn cmd_profile_set(db: &Database, form: &ProfileForm, json: bool) -> Result<()> {
    let svc = AppetitService::new(db);
    let user = svc.save_profile(form)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&user)?);
    } else {
        println!("Profile saved");
    }
    Ok(())
}

pub(crate) fn cmd_profile_image(
    db: &Database,
    source: &Path,
    target: &Path,
    json: bool,
) -> Result<()> {
    let bytes = std::fs::read(source)
        .with_context(|| format!("Failed to read image: {}", source.display()))?;

    let svc = AppetitService::new(db);
    let user = svc.set_profile_image(&bytes, target)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&user)?);
    } else {
        println!("Profile image saved to {}", target.display());
    }
    Ok(())
}

pub(crate) fn cmd_profile_reset(db: &Database, json: bool) -> Result<()> {
    let svc = AppetitService::new(db);
    let removed = svc.reset_profile()?;

    if json {
        println!("{}", serde_json::json!({ "reset": removed }));
    } else if removed {
        println!("Profile deleted");
    } else {
        println!("No profile to delete");
    }
    Ok(())
}
