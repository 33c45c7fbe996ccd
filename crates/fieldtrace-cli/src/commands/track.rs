//! Track command - analyzes marked bindings in files or whole directories

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use fieldtrace_core::config::load_config_or_default;
use fieldtrace_core::tracker::{DependencyTracker, TrackReport};
use walkdir::WalkDir;

use crate::output::json::JsonFormatter;
use crate::output::pretty::PrettyFormatter;

#[derive(Args, Debug)]
pub struct TrackArgs {
    /// File or directory to analyze
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Project root for alias imports (defaults to the analyzed directory)
    #[arg(long, value_name = "DIR")]
    pub base: Option<PathBuf>,

    /// Output format (pretty, json)
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

impl TrackArgs {
    pub fn run(&self) -> Result<()> {
        self.configure_colors();

        let config = load_config_or_default(&self.path);
        let base_dir = self.base.clone().unwrap_or_else(|| {
            if self.path.is_dir() {
                self.path.clone()
            } else {
                self.path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("."))
            }
        });

        let files = discover_files(&self.path, &config.extensions)?;
        if files.is_empty() {
            println!("No JavaScript/TypeScript files found.");
            return Ok(());
        }

        let tracker = DependencyTracker::with_config(config);
        let mut results: Vec<(PathBuf, Vec<TrackReport>)> = Vec::new();
        for file in &files {
            let source = fs::read_to_string(file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            match tracker.analyze(&file.to_string_lossy(), &source, &base_dir) {
                Ok(reports) => {
                    if !reports.is_empty() {
                        results.push((file.clone(), reports));
                    }
                }
                Err(err) => {
                    eprintln!("{} {}: {}", "error:".red().bold(), file.display(), err);
                }
            }
        }

        match self.format.as_str() {
            "json" => println!("{}", JsonFormatter.format(&results, files.len())?),
            "pretty" => print!("{}", PrettyFormatter.format(&results)),
            other => anyhow::bail!("Invalid format '{}'. Valid values: pretty, json", other),
        }

        Ok(())
    }

    fn configure_colors(&self) {
        let no_color_env = std::env::var("NO_COLOR").is_ok();
        if self.no_color || no_color_env {
            colored::control::set_override(false);
        }
    }
}

fn discover_files(path: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_entry(|e| e.file_name() != "node_modules")
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| extensions.iter().any(|known| known == e))
        })
        .collect();
    files.sort();
    Ok(files)
}
