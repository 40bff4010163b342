use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

/// Top-level CLI entrypoint.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub extract: ExtractArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Supported subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    #[command(subcommand)]
    Secret(SecretCommand),
}

/// API credential management.
#[derive(Debug, Clone, Subcommand)]
pub enum SecretCommand {
    /// Prompt for the model API key and store it securely.
    Set,
    /// Remove the stored API key.
    Clear,
}

/// Arguments for the main extraction flow (default command).
#[derive(Debug, Clone, Args, Default)]
pub struct ExtractArgs {
    /// Path to the flyer photo to scan.
    #[arg(value_name = "IMAGE", value_hint = ValueHint::FilePath)]
    pub image: Option<String>,

    /// Send the image through the configured relay instead of calling the
    /// model service directly.
    #[arg(long, action = ArgAction::SetTrue)]
    pub relay: bool,

    /// Override the relay origin for this invocation.
    #[arg(long = "relay-url", value_name = "URL")]
    pub relay_url: Option<String>,

    /// Override the model id for this invocation.
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Print the extracted candidates as JSON instead of a summary.
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Open each event's calendar link in the default browser.
    #[arg(long, action = ArgAction::SetTrue)]
    pub open: bool,
}

impl ExtractArgs {
    /// Returns true when no extraction inputs were provided.
    pub fn is_empty(&self) -> bool {
        self.image.is_none()
            && !self.relay
            && self.relay_url.is_none()
            && self.model.is_none()
            && !self.json
            && !self.open
    }
}
