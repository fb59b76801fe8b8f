use clap::Parser;
use colored::Colorize;

use billpost_cli::cli::{Cli, Commands};
use billpost_cli::commands;
use billpost_cli::output::OutputWriter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| cli.log_level.clone()),
        )
        .with_writer(std::io::stderr)
        .init();

    let writer = OutputWriter::new(cli.format);

    let result = match cli.command {
        Commands::Config(args) => commands::config::execute(args, &cli.config, &writer).await,
        Commands::Status(args) => commands::status::execute(args, &cli.config, &writer).await,
        Commands::Flow(args) => commands::flow::execute(args.action, &cli.config, &writer).await,
    };

    if let Err(e) = result {
        eprintln!("{} {e}", "error:".red().bold());
        std::process::exit(e.exit_code());
    }
}
