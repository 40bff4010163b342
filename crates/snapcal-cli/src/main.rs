use clap::Parser;
use snapcal_cli::cli_args::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = snapcal_cli::dispatch(cli).await {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
