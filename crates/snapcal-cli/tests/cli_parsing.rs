use clap::Parser;
use snapcal_cli::cli_args::{Cli, Command, SecretCommand};

// Integration tests for CLI argument parsing: flag combinations, the
// secret subcommand, and the emptiness check the launcher relies on.

#[test]
fn test_plain_image_argument() {
    let cli = Cli::try_parse_from(["snapcal-cli", "flyer.jpg"]).expect("parse");
    assert_eq!(cli.extract.image.as_deref(), Some("flyer.jpg"));
    assert!(!cli.extract.relay);
    assert!(!cli.extract.json);
    assert!(cli.command.is_none());
}

#[test]
fn test_relay_flag_and_url_override() {
    let cli = Cli::try_parse_from([
        "snapcal-cli",
        "flyer.jpg",
        "--relay",
        "--relay-url",
        "http://relay.lan:4096",
    ])
    .expect("parse");
    assert!(cli.extract.relay);
    assert_eq!(
        cli.extract.relay_url.as_deref(),
        Some("http://relay.lan:4096")
    );
}

#[test]
fn test_model_json_and_open_flags() {
    let cli = Cli::try_parse_from([
        "snapcal-cli",
        "flyer.png",
        "--model",
        "google/gemini-2.5-flash",
        "--json",
        "--open",
    ])
    .expect("parse");
    assert_eq!(
        cli.extract.model.as_deref(),
        Some("google/gemini-2.5-flash")
    );
    assert!(cli.extract.json);
    assert!(cli.extract.open);
}

#[test]
fn test_secret_set_subcommand() {
    let cli = Cli::try_parse_from(["snapcal-cli", "secret", "set"]).expect("parse");
    assert!(matches!(
        cli.command,
        Some(Command::Secret(SecretCommand::Set))
    ));
    assert!(cli.extract.is_empty());
}

#[test]
fn test_secret_clear_subcommand() {
    let cli = Cli::try_parse_from(["snapcal-cli", "secret", "clear"]).expect("parse");
    assert!(matches!(
        cli.command,
        Some(Command::Secret(SecretCommand::Clear))
    ));
}

#[test]
fn test_unknown_flag_is_rejected() {
    assert!(Cli::try_parse_from(["snapcal-cli", "--frobnicate"]).is_err());
}

#[test]
fn test_empty_args_detection() {
    let cli = Cli::try_parse_from(["snapcal-cli"]).expect("parse");
    assert!(cli.extract.is_empty());

    let cli = Cli::try_parse_from(["snapcal-cli", "--json"]).expect("parse");
    assert!(!cli.extract.is_empty());
}
