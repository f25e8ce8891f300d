//! Seed recipes command handler

use crate::config::Config;
use crate::db::fixtures::bundled_recipes;
use crate::state::SharedState;

pub async fn cmd_seed_recipes(config: &Config, force: bool) -> anyhow::Result<()> {
    let recipes = bundled_recipes()?;
    let state = SharedState::new(config.clone()).await?;

    let report = state
        .recipe_service
        .seed(recipes, force)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to seed recipes: {e}"))?;

    println!(
        "✓ Recipes seeded: {} created, {} replaced, {} skipped",
        report.created, report.replaced, report.skipped
    );

    if report.skipped > 0 && !force {
        println!("  Use --force to replace existing recipes");
    }

    Ok(())
}
