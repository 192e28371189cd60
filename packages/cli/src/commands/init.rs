use crate::config::{Config, DEFAULT_CONFIG_NAME};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use quire_model::build::*;
use quire_model::{Mark, Node};
use quire_parser::serialize_pretty;
use std::fs;
use std::path::Path;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Directory for documents
    #[arg(short, long, default_value = "content")]
    pub content_dir: String,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

/// Sample document written by `quire init`
fn welcome_document() -> Node {
    doc(vec![
        heading(1, vec![text("Welcome to Quire")]),
        paragraph(vec![
            text("Type "),
            marked("/", vec![Mark::bold()]),
            text(" in an empty line to open the command palette."),
        ]),
        bullet_list(vec![
            list_item(vec![paragraph(vec![text("Headings, lists and quotes")])]),
            list_item(vec![paragraph(vec![text("Code blocks and dividers")])]),
        ]),
        horizontal_rule(),
    ])
}

pub fn init(args: InitArgs, cwd: &Path) -> Result<()> {
    let config_path = cwd.join(DEFAULT_CONFIG_NAME);

    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Initializing Quire project...".bright_blue().bold());

    let config = Config {
        content_dir: args.content_dir.clone(),
        ..Config::default()
    };

    let content_dir = config.get_content_dir(cwd);
    if !content_dir.exists() {
        fs::create_dir_all(&content_dir)?;
        println!("  {} Created {}/", "✓".green(), args.content_dir);
    }

    let welcome = content_dir.join(format!("welcome.{}", config.extension));
    if !welcome.exists() {
        fs::write(&welcome, serialize_pretty(&welcome_document()))?;
        println!("  {} Created welcome.{}", "✓".green(), config.extension);
    }

    fs::write(&config_path, serde_json::to_string_pretty(&config)?)?;
    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    println!();
    println!("{}", "✅ Project initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Edit {}/welcome.{}", args.content_dir, config.extension);
    println!("  2. Run: quire check");

    Ok(())
}
