//! Main entry point for snapcal
//!
//! This binary supports both CLI and GUI modes:
//! - CLI mode: When arguments are provided (an image path or a subcommand)
//! - GUI mode: When launched with no arguments

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    if snapcal_cli::should_run_cli_mode() {
        // CLI mode
        snapcal_cli::run().await.map_err(|e| anyhow::anyhow!(e))?;
    } else {
        // GUI mode
        if let Err(e) = snapcal_gui::run() {
            eprintln!("GUI error: {e}");
            std::process::exit(1);
        }
    }

    Ok(())
}
