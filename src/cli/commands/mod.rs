//! Command implementations for the padron analyzer CLI
//!
//! Each subcommand lives in its own module:
//! - `list`: candidate sources under the input root
//! - `unify`: merged registry output
//! - `analyze`: two-pass analysis with report, previews and bundle

pub mod analyze;
pub mod list;
pub mod shared;
pub mod unify;

use crate::cli::args::{Args, Commands};
use tokio_util::sync::CancellationToken;

/// Dispatch to the subcommand handler
pub async fn run(args: Args, cancellation: CancellationToken) -> anyhow::Result<()> {
    shared::setup_logging(&args)?;
    let config = args.load_config()?;

    match args.command.clone() {
        Some(Commands::List) | None => list::run_list(config),
        Some(Commands::Unify(unify_args)) => {
            unify::run_unify(config, unify_args, cancellation).await
        }
        Some(Commands::Analyze(analyze_args)) => {
            analyze::run_analyze(config, analyze_args, cancellation).await
        }
    }
}
