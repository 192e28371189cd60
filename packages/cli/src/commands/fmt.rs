use super::{collect_documents, relative};
use crate::config::Config;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use quire_parser::{parse, serialize, serialize_pretty};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct FmtArgs {
    /// Document or directory to format (defaults to the content directory)
    pub input: Option<PathBuf>,

    /// Report unformatted documents without writing them
    #[arg(long)]
    pub check: bool,

    /// Write everything on one line
    #[arg(long)]
    pub compact: bool,

    /// Print formatted output instead of writing files
    #[arg(long)]
    pub stdout: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub enum FmtOutcome {
    Unchanged,
    Formatted(String),
    Invalid(String),
}

/// Canonical form of `source`
pub fn format_source(source: &str, compact: bool) -> FmtOutcome {
    let doc = match parse(source) {
        Ok(doc) => doc,
        Err(err) => return FmtOutcome::Invalid(err.to_string()),
    };
    let formatted = if compact {
        serialize(&doc)
    } else {
        serialize_pretty(&doc)
    };
    if formatted == source {
        FmtOutcome::Unchanged
    } else {
        FmtOutcome::Formatted(formatted)
    }
}

pub fn fmt(args: FmtArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let files = collect_documents(args.input.as_deref(), &config, cwd)?;

    let mut changed = 0;
    let mut invalid = 0;
    for file in &files {
        let source = fs::read_to_string(file)?;
        match format_source(&source, args.compact) {
            FmtOutcome::Unchanged => {
                if args.stdout {
                    print!("{}", source);
                }
            }
            FmtOutcome::Formatted(formatted) => {
                changed += 1;
                if args.stdout {
                    print!("{}", formatted);
                } else if args.check {
                    println!("  {} {} needs formatting", "✗".yellow(), relative(file, cwd));
                } else {
                    fs::write(file, formatted)?;
                    println!("  {} {}", "✓".green(), relative(file, cwd));
                }
            }
            FmtOutcome::Invalid(err) => {
                invalid += 1;
                eprintln!("  {} {} - {}", "✗".red(), relative(file, cwd), err);
            }
        }
    }

    if invalid > 0 {
        return Err(anyhow!("{} documents could not be parsed", invalid));
    }
    if args.check && changed > 0 {
        return Err(anyhow!("{} documents need formatting", changed));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPACT: &str = "<doc><paragraph>Hi</paragraph></doc>";
    const PRETTY: &str = "<doc>\n  <paragraph>Hi</paragraph>\n</doc>\n";

    #[test]
    fn test_format_source() {
        assert_eq!(
            format_source(COMPACT, false),
            FmtOutcome::Formatted(PRETTY.to_string())
        );
        assert_eq!(format_source(PRETTY, false), FmtOutcome::Unchanged);
        assert_eq!(
            format_source(PRETTY, true),
            FmtOutcome::Formatted(COMPACT.to_string())
        );
        assert!(matches!(format_source("<doc>", false), FmtOutcome::Invalid(_)));
    }

    #[test]
    fn test_fmt_rewrites_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.quire");
        fs::write(&file, COMPACT).unwrap();

        let args = |check| FmtArgs {
            input: Some(dir.path().to_path_buf()),
            check,
            compact: false,
            stdout: false,
        };
        assert!(fmt(args(true), dir.path()).is_err());
        assert_eq!(fs::read_to_string(&file).unwrap(), COMPACT);

        fmt(args(false), dir.path()).unwrap();
        assert_eq!(fs::read_to_string(&file).unwrap(), PRETTY);
        fmt(args(true), dir.path()).unwrap();
    }
}
