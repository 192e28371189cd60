mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{check, fmt, init, tree, CheckArgs, FmtArgs, InitArgs, TreeArgs};

/// Quire CLI - tools for Quire documents
#[derive(Parser, Debug)]
#[command(name = "quire")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize a new Quire project
    Init(InitArgs),

    /// Parse documents and report errors
    Check(CheckArgs),

    /// Rewrite documents in canonical form
    Fmt(FmtArgs),

    /// Print a document's node tree with positions
    Tree(TreeArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = std::env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|cwd| match cli.command {
            Command::Init(args) => init(args, &cwd),
            Command::Check(args) => check(args, &cwd),
            Command::Fmt(args) => fmt(args, &cwd),
            Command::Tree(args) => tree(args),
        });

    if let Err(err) = result {
        tracing::debug!(?err, "command failed");
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
