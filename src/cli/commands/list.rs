//! List command: candidate sources under the input root

use super::shared::{display_name, format_size};
use crate::config::AnalyzerConfig;
use crate::processor::discovery::FileDiscovery;
use anyhow::Context;
use colored::*;
use tracing::info;

pub fn run_list(config: AnalyzerConfig) -> anyhow::Result<()> {
    let discovery = FileDiscovery::new(&config.input_root);
    let sources = discovery
        .discover_sources()
        .with_context(|| format!("Failed to list {}", config.input_root.display()))?;
    info!("Listed {} source(s)", sources.len());

    if sources.is_empty() {
        println!(
            "{} {}",
            "No registry files found in".bright_yellow(),
            config.input_root.display()
        );
        return Ok(());
    }

    println!(
        "{} {}",
        "Registry files in".bright_cyan(),
        config.input_root.display()
    );
    for source in &sources {
        let size = std::fs::metadata(source).map(|m| m.len()).unwrap_or(0);
        println!("  • {} ({})", display_name(source).bright_white(), format_size(size));
    }
    Ok(())
}
