//! Init command - writes a default configuration file

use std::fs;
use std::path::Path;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use fieldtrace_core::config::CONFIG_FILENAME;

const DEFAULT_CONFIG: &str = r#"# Fieldtrace configuration file

# Comment markers that designate bindings for tracking
# marker = "track_this_variable"
# named_marker = "track_variable"

# Member properties that terminate a path
# reserved_properties = ["length"]

# Array methods treated as iteration into their callback
# iteration_methods = ["map", "flatMap", "filter", "forEach"]

# Import specifier prefix resolved against the project root
# alias_prefix = "@/"

# File extensions probed when resolving imports
# extensions = ["ts", "tsx", "js", "jsx"]
"#;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Force overwrite existing configuration
    #[arg(short, long)]
    pub force: bool,
}

impl InitArgs {
    pub fn run(&self) -> Result<()> {
        let target = Path::new(CONFIG_FILENAME);

        if target.exists() && !self.force {
            anyhow::bail!(
                "{} already exists. Use --force to overwrite.",
                CONFIG_FILENAME
            );
        }

        fs::write(target, DEFAULT_CONFIG)?;
        println!("{} Created {}", "✓".green().bold(), CONFIG_FILENAME);
        Ok(())
    }
}
