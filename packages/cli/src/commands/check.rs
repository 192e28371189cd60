use super::{collect_documents, relative};
use crate::config::Config;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use quire_model::{Node, NodeType};
use quire_parser::error::pretty::format_error;
use quire_parser::parse;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Document or directory to check (defaults to the content directory)
    pub input: Option<PathBuf>,

    /// Print a line for every valid document too
    #[arg(short, long)]
    pub verbose: bool,
}

/// Block and image counts of a valid document
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DocumentStats {
    pub blocks: usize,
    pub images: usize,
}

pub fn stats(doc: &Node) -> DocumentStats {
    let mut stats = DocumentStats::default();
    doc.descendants(|node, _, _, _| {
        if node.is_block() {
            stats.blocks += 1;
        }
        if node.node_type() == NodeType::Image {
            stats.images += 1;
        }
        !node.is_textblock()
    });
    stats
}

/// Parse one document, rendering any error against its source
pub fn check_file(path: &Path) -> Result<std::result::Result<DocumentStats, String>> {
    let source = fs::read_to_string(path)?;
    Ok(match parse(&source) {
        Ok(doc) => Ok(stats(&doc)),
        Err(err) => Err(format_error(&err, &path.to_string_lossy(), &source)),
    })
}

pub fn check(args: CheckArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let files = collect_documents(args.input.as_deref(), &config, cwd)?;

    println!("🔍 {} {} documents", "Checking".green().bold(), files.len());
    println!();

    let mut failed = 0;
    for file in &files {
        match check_file(file)? {
            Ok(stats) => {
                if args.verbose {
                    println!(
                        "  {} {} ({} blocks, {} images)",
                        "✓".green(),
                        relative(file, cwd),
                        stats.blocks,
                        stats.images
                    );
                }
            }
            Err(report) => {
                failed += 1;
                eprintln!("  {} {}", "✗".red(), relative(file, cwd));
                eprintln!("{}", report);
            }
        }
    }

    println!();
    if failed > 0 {
        return Err(anyhow!("{} of {} documents failed to parse", failed, files.len()));
    }
    println!("   {} No issues found!", "✓".green());
    Ok(())
}
