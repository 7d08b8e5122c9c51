//! Unify command: merge registry files into one

use super::shared::{build_processor, display_name};
use crate::cli::args::UnifyArgs;
use crate::config::AnalyzerConfig;
use crate::models::RecordType;
use crate::summary::format_thousands;
use anyhow::Context;
use colored::*;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub async fn run_unify(
    config: AnalyzerConfig,
    args: UnifyArgs,
    cancellation: CancellationToken,
) -> anyhow::Result<()> {
    let record_type = RecordType::from(args.record_type);
    let processor = build_processor(config, cancellation)?;

    let outcome = processor
        .unify_in_background(args.sources, record_type)
        .await
        .with_context(|| format!("Unification of {} sources failed", record_type))?;

    let Some(outcome) = outcome else {
        println!("{}", "No sources selected".bright_yellow());
        return Ok(());
    };

    info!("Unified output at {}", outcome.path.display());
    println!(
        "{} {} ({} rows)",
        "Unified file:".bright_green().bold(),
        display_name(&outcome.path).bright_white(),
        format_thousands(outcome.rows)
    );
    if outcome.parse.has_drops() {
        println!(
            "  {} {} malformed line group(s) dropped",
            "⚠".bright_yellow(),
            format_thousands(outcome.parse.groups_dropped)
        );
    }
    Ok(())
}
