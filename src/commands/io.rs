//! Archive command handlers.

use super::open_store;
use anyhow::Context;
use std::path::{Path, PathBuf};
use stockpile::config::StockpileConfig;
use stockpile::io::archive::layout::{ITEMS, lookup_member};
use stockpile::io::{dispatch, parse};
use stockpile::models::LookupKind;
use stockpile::services::{ExportOptions, ExportService, ImportService};

/// Maximum number of warnings listed individually.
const WARNING_LIMIT: usize = 10;

/// Executes the export command.
pub fn cmd_export(
    config: &StockpileConfig,
    output: Option<PathBuf>,
    strict_images: bool,
) -> anyhow::Result<bool> {
    let output = output.unwrap_or_else(|| {
        PathBuf::from(format!(
            "stockpile-export-{}.zip",
            chrono::Utc::now().format("%Y%m%dT%H%M%SZ")
        ))
    });
    let options = ExportOptions::default()
        .with_fail_on_missing_image(strict_images || config.export.fail_on_missing_image);

    let store = open_store(config)?;
    let result = ExportService::new(store)
        .export_to_file(&output, &options)
        .with_context(|| format!("export to {} failed", output.display()))?;

    println!("Exported to {}:", output.display());
    println!("  Locations:   {}", result.counts.locations);
    println!("  Categories:  {}", result.counts.categories);
    println!("  Owners:      {}", result.counts.owners);
    println!("  Items:       {}", result.counts.items);
    println!("  Images:      {} ({} embedded)", result.counts.images, result.embedded_images);

    if result.has_unresolved() {
        println!();
        println!(
            "Items exported without their image ({}):",
            result.unresolved_images.len()
        );
        for unresolved in result.unresolved_images.iter().take(WARNING_LIMIT) {
            println!(
                "  - item {} (image {})",
                unresolved.item_id, unresolved.image_uuid
            );
        }
        if result.unresolved_images.len() > WARNING_LIMIT {
            println!(
                "  ... and {} more",
                result.unresolved_images.len() - WARNING_LIMIT
            );
        }
    }

    Ok(true)
}

/// Executes the import command.
pub fn cmd_import(config: &StockpileConfig, archive: &Path, force: bool) -> anyhow::Result<bool> {
    if !force {
        eprintln!(
            "Import deletes every existing row before loading {}. Re-run with --force to proceed.",
            archive.display()
        );
        return Ok(false);
    }

    let store = open_store(config)?;
    let result = ImportService::new(store)
        .import_from_file(archive)
        .with_context(|| format!("cannot import {}", archive.display()))?;

    if result.success {
        println!("Import completed (format {}):", result.version);
    } else {
        println!("Import FAILED (format {}):", result.version);
    }
    println!("  Wiped:       {} rows", result.wiped.total());
    println!("  Locations:   {}", result.counts.locations);
    println!("  Categories:  {}", result.counts.categories);
    println!("  Owners:      {}", result.counts.owners);
    println!("  Items:       {}", result.counts.items);
    println!("  Images:      {}", result.counts.images);
    println!("  Skipped:     {}", result.skipped_items);

    if result.has_warnings() {
        println!();
        println!("Warnings ({}):", result.warnings.len());
        for warning in result.warnings.iter().take(WARNING_LIMIT) {
            println!("  - {warning}");
        }
        if result.warnings.len() > WARNING_LIMIT {
            println!("  ... and {} more", result.warnings.len() - WARNING_LIMIT);
        }
    }

    if let Some(detail) = &result.detail {
        println!();
        println!("Error: {detail}");
    }

    Ok(result.success)
}

/// Executes the inspect command.
pub fn cmd_inspect(archive: &Path) -> anyhow::Result<bool> {
    let bytes =
        std::fs::read(archive).with_context(|| format!("cannot read {}", archive.display()))?;
    let handle = parse(&bytes).with_context(|| format!("{} is not valid", archive.display()))?;

    println!("Archive: {}", archive.display());
    match handle.manifest() {
        Some(manifest) => {
            println!("  Format version:  {}", manifest.export_format_version);
            if let Some(at) = manifest.exported_at {
                println!("  Exported at:     {}", at.to_rfc3339());
            }
            if let Some(provider) = &manifest.source_provider {
                println!("  Source provider: {provider}");
            }
        },
        None => println!(
            "  Manifest unreadable; assuming format version {}",
            handle.read_version()
        ),
    }

    for kind in LookupKind::all() {
        let member = lookup_member(*kind);
        println!("  {member:<16} {} rows", handle.rows(member)?.len());
    }
    println!("  {ITEMS:<16} {} rows", handle.rows(ITEMS)?.len());
    println!("  {:<16} {} files", "images/", handle.image_count());

    let version = handle.read_version();
    match dispatch(&version) {
        Ok(strategy) => {
            println!("  Importable:      yes ({strategy} importer)");
            Ok(true)
        },
        Err(e) => {
            println!("  Importable:      no ({e})");
            Ok(false)
        },
    }
}
