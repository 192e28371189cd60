use anyhow::Result;
use clap::Args;
use colored::Colorize;
use quire_editor::{project, EditorState};
use quire_model::{Node, Selection};
use quire_parser::parse;
use std::fmt::Write;
use std::fs;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Document to inspect
    pub file: PathBuf,

    /// Print the toolbar state for a caret at this position
    #[arg(long)]
    pub at: Option<usize>,
}

/// One line per node: start position, type, attributes and marks
pub fn render_tree(doc: &Node) -> Result<String> {
    let mut nodes = Vec::new();
    doc.descendants(|node, pos, _, _| {
        nodes.push((pos, node.clone()));
        true
    });

    let mut out = String::new();
    writeln!(out, "{:>4} doc ({})", 0, doc.content_size())?;
    for (pos, node) in nodes {
        let depth = doc.resolve(pos)?.depth() + 1;
        write!(out, "{:>4} {}", pos, "  ".repeat(depth))?;
        match node.text() {
            Some(text) => write!(out, "{:?}", text)?,
            None => write!(out, "{}", node.node_type().name())?,
        }
        for (name, value) in node.attrs() {
            if !value.is_null() {
                write!(out, " {}={}", name, value)?;
            }
        }
        for mark in node.marks() {
            write!(out, " [{}]", mark.mark_type.name())?;
        }
        writeln!(out)?;
    }
    Ok(out)
}

pub fn tree(args: TreeArgs) -> Result<()> {
    let source = fs::read_to_string(&args.file)?;
    let doc = parse(&source)?;

    println!("{}", args.file.display().to_string().bright_white().bold());
    print!("{}", render_tree(&doc)?);

    if let Some(pos) = args.at {
        let state = EditorState::with_selection(doc, Selection::caret(pos));
        println!();
        println!("{} {}", "Active at".bright_blue(), state.selection().head);
        println!("{}", serde_json::to_string_pretty(&project(&state))?);
    }
    Ok(())
}
