//! Analyze command: two-pass analysis with report, previews and bundle

use super::shared::{build_processor, display_name};
use crate::archive::write_archive;
use crate::cli::args::{AnalyzeArgs, OutputFormat};
use crate::config::AnalyzerConfig;
use crate::models::RecordType;
use crate::processor::writer::{count_rows, sample_rows};
use crate::summary::{Summary, format_percentage, format_thousands};
use anyhow::Context;
use colored::*;
use indicatif::HumanDuration;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub async fn run_analyze(
    config: AnalyzerConfig,
    args: AnalyzeArgs,
    cancellation: CancellationToken,
) -> anyhow::Result<()> {
    let start_time = Instant::now();
    let record_type = RecordType::from(args.record_type);
    let processor = build_processor(config, cancellation)?;

    let summary = processor
        .analyze_in_background(args.sources.clone(), record_type)
        .await
        .with_context(|| format!("Analysis of {} sources failed", record_type))?;

    let Some(summary) = summary else {
        println!("{}", "No sources selected".bright_yellow());
        return Ok(());
    };

    match args.output_format {
        OutputFormat::Human => {
            generate_human_report(&summary, start_time.elapsed());
            if args.preview_rows > 0 {
                print_previews(&summary, args.preview_rows)?;
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    if let Some(archive_dir) = &args.archive_dir {
        let path = write_archive(&summary, archive_dir)
            .with_context(|| format!("Failed to write archive into {}", archive_dir.display()))?;
        if args.output_format == OutputFormat::Human {
            println!("{} {}", "Archive:".bright_green().bold(), path.display());
        }
    }

    if args.keep_work_dir {
        info!("Keeping working directory {}", summary.work_dir.display());
    } else if let Err(e) = summary.cleanup() {
        warn!("Could not remove working directory: {}", e);
    }
    Ok(())
}

/// Per-bucket counts with one-decimal percentages
fn generate_human_report(summary: &Summary, elapsed: Duration) {
    println!(
        "\n{} {}",
        "Analysis complete:".bright_green().bold(),
        summary.record_type.to_string().bright_white().bold()
    );
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    for report in summary.buckets() {
        let totals = report.totals;
        println!("{}", report.title.bright_cyan().bold());
        println!("   • Total: {}", format_thousands(totals.total));
        println!(
            "   • {}: {} ({})",
            report.flagged_label,
            format_thousands(totals.flagged),
            format_percentage(totals.flagged, totals.total)
        );
        println!(
            "   • Duplicados: {} ({})",
            format_thousands(totals.duplicates),
            format_percentage(totals.duplicates, totals.total)
        );
        println!(
            "   • Errores: {} ({})",
            format_thousands(totals.errors),
            format_percentage(totals.errors, totals.total)
        );
    }

    if summary.parse.has_drops() {
        println!(
            "{} {} malformed line group(s) dropped while parsing",
            "⚠".bright_yellow(),
            format_thousands(summary.parse.groups_dropped)
        );
    }
    println!("   Processing time: {}", HumanDuration(elapsed));
}

/// Header and leading rows of every written sink
fn print_previews(summary: &Summary, limit: usize) -> anyhow::Result<()> {
    for path in summary.written_sinks() {
        let rows = count_rows(path)?;
        let sample = sample_rows(path, limit)?;

        println!(
            "\n{} ({} rows)",
            display_name(path).bright_white().bold(),
            format_thousands(rows)
        );
        println!("   {}", sample.header.join(" | ").dimmed());
        for row in &sample.rows {
            println!("   {}", row.join(" | "));
        }
    }
    Ok(())
}
