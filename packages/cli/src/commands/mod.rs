pub mod check;
pub mod fmt;
pub mod init;
pub mod tree;

pub use check::{check, CheckArgs};
pub use fmt::{fmt, FmtArgs};
pub use init::{init, InitArgs};
pub use tree::{tree, TreeArgs};

use crate::config::Config;
use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Documents to work on: `input` when given (a file or a directory),
/// otherwise the configured content directory
pub fn collect_documents(input: Option<&Path>, config: &Config, cwd: &Path) -> Result<Vec<PathBuf>> {
    let root = match input {
        Some(path) if path.is_file() => return Ok(vec![path.to_path_buf()]),
        Some(path) => path.to_path_buf(),
        None => config.get_content_dir(cwd),
    };
    if !root.is_dir() {
        return Err(anyhow!("Input path does not exist: {}", root.display()));
    }
    Ok(find_documents(&root, config))
}

fn find_documents(dir: &Path, config: &Config) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|entry| entry.into_path())
        .filter(|path| config.is_document(path))
        .collect();
    files.sort();
    files
}

/// Path relative to `base` for display
pub fn relative<'a>(path: &'a Path, base: &Path) -> std::path::Display<'a> {
    path.strip_prefix(base).unwrap_or(path).display()
}
