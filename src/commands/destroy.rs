//! Destructive command handlers.

use super::open_store;
use anyhow::Context;
use stockpile::config::StockpileConfig;
use stockpile::models::LookupKind;
use stockpile::services::{DeletionOutcome, DestroyService, EntityDeletionService};

/// Executes the destroy command.
pub fn cmd_destroy(config: &StockpileConfig, force: bool) -> anyhow::Result<bool> {
    if !force {
        eprintln!("Destroy deletes every row in the store. Re-run with --force to proceed.");
        return Ok(false);
    }

    let store = open_store(config)?;
    let result = DestroyService::new(store).destroy();

    if result.success {
        println!("Destroy completed:");
    } else {
        println!("Destroy FAILED:");
    }
    println!("  Items:       {}", result.deleted.items);
    println!("  Owners:      {}", result.deleted.owners);
    println!("  Categories:  {}", result.deleted.categories);
    println!("  Locations:   {}", result.deleted.locations);
    if result.already_absent > 0 {
        println!("  Already gone: {}", result.already_absent);
    }
    if result.has_orphans() {
        println!("  Orphaned images left: {}", result.orphaned_images);
    }
    if let Some(detail) = &result.detail {
        println!();
        println!("Error: {detail}");
    }

    Ok(result.success)
}

/// Executes the delete command.
pub fn cmd_delete(config: &StockpileConfig, kind: &str, id: i64) -> anyhow::Result<bool> {
    let kind = LookupKind::parse(kind).with_context(|| {
        format!("unknown kind '{kind}' (expected location, category or owner)")
    })?;

    let store = open_store(config)?;
    let outcome = EntityDeletionService::new(store)
        .delete(kind, id)
        .with_context(|| format!("failed to delete {kind} {id}"))?;

    match outcome {
        DeletionOutcome::Deleted => println!("Deleted {kind} {id}"),
        DeletionOutcome::AlreadyAbsent => println!("{kind} {id} does not exist"),
        DeletionOutcome::EntityInUse { item_count } => println!(
            "{}: {kind} {id} is used by {item_count} item(s); reassign or delete them first",
            outcome.code()
        ),
    }
    Ok(outcome.is_gone())
}
