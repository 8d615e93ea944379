pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "cotiza",
    about = "Cotizador operator CLI",
    long_about = "Operate the quotation service: migrations, demo data and price-list imports.",
    after_help = "Examples:\n  cotiza migrate\n  cotiza seed\n  cotiza import lista-2026.pdf\n  cotiza import lista-2026.pdf --commit --replace"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations")]
    Migrate,
    #[command(about = "Load the deterministic demo catalog into an empty database")]
    Seed,
    #[command(about = "Parse a price-list PDF; print the preview or commit it to the catalog")]
    Import {
        #[arg(help = "Path to the price-list PDF")]
        file: PathBuf,
        #[arg(long, help = "Write the parsed products to the catalog instead of previewing")]
        commit: bool,
        #[arg(
            long,
            requires = "commit",
            help = "Deactivate machines absent from the imported list"
        )]
        replace: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Import { file, commit, replace } => commands::import::run(&file, commit, replace),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
