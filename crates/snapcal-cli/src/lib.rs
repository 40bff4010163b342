//! CLI surface for Snapcal: one-shot extraction plus credential management.

pub mod cli_args;

use clap::Parser;
use cli_args::{Cli, Command, ExtractArgs, SecretCommand};
use rpassword::prompt_password;
use snapcal_core::datetime;
use snapcal_core::extract::{Extractor, ImagePayload};
use snapcal_core::logging::{LoggingDestination, init_logging};
use snapcal_core::{TransportMode, gcal, load_config, save_config};

/// The launcher runs CLI mode whenever any argument was supplied.
pub fn should_run_cli_mode() -> bool {
    std::env::args().len() > 1
}

pub async fn run() -> Result<(), String> {
    let cli = Cli::parse();
    dispatch(cli).await
}

pub async fn dispatch(cli: Cli) -> Result<(), String> {
    if let Err(err) = init_logging(LoggingDestination::FileAndStderr) {
        eprintln!("Warning: failed to initialize logging: {err}");
    }

    match cli.command {
        Some(Command::Secret(cmd)) => {
            if !cli.extract.is_empty() {
                return Err(
                    "Extraction flags cannot be combined with secret management commands.".into(),
                );
            }
            handle_secret_command(cmd)
        }
        None => run_extract(cli.extract).await,
    }
}

fn handle_secret_command(command: SecretCommand) -> Result<(), String> {
    let mut load = load_config();
    for warning in &load.warnings {
        eprintln!("Warning: {warning}");
    }

    match command {
        SecretCommand::Set => {
            let key =
                prompt_password("Model API key: ").map_err(|err| format!("read key: {err}"))?;
            load.config
                .runtime
                .set_api_key(&key)
                .map_err(|err| err.to_string())?;
            save_config(&load.config).map_err(|err| err.to_string())?;
            println!("API key stored.");
        }
        SecretCommand::Clear => {
            load.config
                .runtime
                .clear_api_key()
                .map_err(|err| err.to_string())?;
            save_config(&load.config).map_err(|err| err.to_string())?;
            println!("API key cleared.");
        }
    }
    Ok(())
}

async fn run_extract(args: ExtractArgs) -> Result<(), String> {
    let image_path = args
        .image
        .as_deref()
        .ok_or("No image given. Usage: snapcal-cli <IMAGE>")?;

    let load = load_config();
    for warning in &load.warnings {
        eprintln!("Warning: {warning}");
    }

    let mut prefs = load.config.runtime;
    if args.relay {
        prefs.transport = TransportMode::Relay;
    }
    if let Some(url) = args.relay_url {
        prefs.transport = TransportMode::Relay;
        prefs.relay_url = url;
    }
    if let Some(model) = args.model {
        prefs.model = Some(model);
    }

    let expanded = shellexpand::tilde(image_path).to_string();
    let bytes =
        std::fs::read(&expanded).map_err(|err| format!("could not read {expanded}: {err}"))?;
    let payload = ImagePayload::from_bytes(&bytes, mime_for_path(&expanded));

    let extractor = Extractor::from_preferences(&prefs).map_err(|err| err.to_string())?;
    let candidates = extractor
        .extract(&payload)
        .await
        .map_err(|err| err.to_string())?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&candidates).map_err(|err| err.to_string())?
        );
        return Ok(());
    }

    if candidates.is_empty() {
        println!("No events found in {expanded}.");
        return Ok(());
    }

    println!(
        "Found {} event{} in {expanded}:",
        candidates.len(),
        if candidates.len() == 1 { "" } else { "s" }
    );
    for (index, candidate) in candidates.iter().enumerate() {
        let url = gcal::render_url(candidate);
        println!("\n{}. {}", index + 1, candidate.title);
        let when = describe_when(candidate);
        if !when.is_empty() {
            println!("   When:  {when}");
        }
        if !candidate.location.is_empty() {
            println!("   Where: {}", candidate.location);
        }
        if !candidate.description.is_empty() {
            println!("   Notes: {}", candidate.description);
        }
        println!("   Link:  {url}");

        if args.open {
            if let Err(err) = open::that(&url) {
                eprintln!("Warning: could not open browser for event {}: {err}", index + 1);
            }
        }
    }

    Ok(())
}

fn describe_when(candidate: &snapcal_core::EventCandidate) -> String {
    let start = datetime::to_local_input(&candidate.start_date_time);
    if start.is_empty() {
        return String::new();
    }
    let end = datetime::to_local_input(&candidate.end_date_time);
    let mut when = if end.is_empty() {
        start
    } else {
        format!("{start} – {end}")
    };
    if let Some(rule) = datetime::parse_rule(&candidate.recurrence) {
        if rule.interval == 1 {
            when.push_str(&format!(" (repeats every {})", rule.unit.noun()));
        } else {
            when.push_str(&format!(
                " (repeats every {} {}s)",
                rule.interval,
                rule.unit.noun()
            ));
        }
    }
    when
}

fn mime_for_path(path: &str) -> &'static str {
    let extension = std::path::Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("heic") => "image/heic",
        _ => "image/jpeg",
    }
}
