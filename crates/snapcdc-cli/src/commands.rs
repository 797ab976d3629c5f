use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use snapcdc_diff::{diff_snapshots, SnapshotDiff};
use snapcdc_monitor::Monitor;
use snapcdc_source::{load_snapshot, JsonFileDirectory, PagedFetcher};
use snapcdc_types::IgnoreSet;

use crate::cli::*;
use crate::config::CdcConfig;
use crate::output::print_event;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Watch(args) => cmd_watch(args, cli.format).await,
        Command::Diff(args) => cmd_diff(args, cli.format).await,
    }
}

async fn cmd_watch(args: WatchArgs, format: OutputFormat) -> anyhow::Result<()> {
    let mut config = CdcConfig::load(&args.config)?;
    config.apply_overrides(args.refresh, &args.ignore, args.diagnostics);

    let source = config.source.path.clone();
    let connector =
        JsonFileDirectory::new(&source).with_key_attribute(&config.source.fetcher.key_attribute);
    let fetcher = PagedFetcher::connect(connector, config.source.fetcher.clone())
        .await
        .with_context(|| format!("connecting to {}", source.display()))?;

    let monitor = Monitor::new(config.monitor.clone(), Arc::new(fetcher));
    monitor.register_listener("stdout", move |event| print_event(&event, format))?;
    monitor.start();

    eprintln!(
        "{} Watching {} every {}s ({} ignored fields). Press Ctrl-C to stop.",
        "✓".green().bold(),
        source.display().to_string().bold(),
        config.monitor.effective_refresh_period().as_secs_f64(),
        config.monitor.ignore_fields.len(),
    );

    let interrupted = tokio::signal::ctrl_c().await;
    monitor.close().await;
    interrupted.context("waiting for Ctrl-C")?;
    eprintln!("{} Monitor closed.", "✓".green());
    Ok(())
}

async fn cmd_diff(args: DiffArgs, format: OutputFormat) -> anyhow::Result<()> {
    let ignore = IgnoreSet::new(args.ignore.iter().cloned());
    let diff = diff_files(&args.before, &args.after, &args.key_attribute, &ignore).await?;

    let summary = format!(
        "{} changes ({} created, {} deleted, {} modified)",
        diff.len(),
        diff.creates(),
        diff.deletes(),
        diff.modifications()
    );
    for event in &diff.events {
        print_event(event, format);
    }
    match format {
        OutputFormat::Text if diff.is_empty() => println!("No changes."),
        OutputFormat::Text => println!("{}", summary.bold()),
        OutputFormat::Json => tracing::debug!(%summary, "diff complete"),
    }
    Ok(())
}

/// Diff two snapshot dumps on disk.
async fn diff_files(
    before: &Path,
    after: &Path,
    key_attribute: &str,
    ignore: &IgnoreSet,
) -> anyhow::Result<SnapshotDiff> {
    let before = load_snapshot(before, key_attribute)
        .await
        .with_context(|| format!("loading {}", before.display()))?;
    let after_snapshot = load_snapshot(after, key_attribute)
        .await
        .with_context(|| format!("loading {}", after.display()))?;
    Ok(diff_snapshots(&before, &after_snapshot, ignore))
}
