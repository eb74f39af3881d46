//! Command-line interface implementation for stamp.
//! Provides argument parsing using clap, and merges flags over the config file.

use crate::config::Config;
use crate::error::{Error, Result};
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments structure for stamp.
#[derive(Parser, Debug)]
#[command(author, version, about = "stamp: render templates from data sources", long_about = None)]
pub struct Args {
    /// Template text to render
    #[arg(short = 'i', long = "in", value_name = "TEXT")]
    pub input: Option<String>,

    /// Template file to render, `-` for stdin (repeatable)
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    pub input_files: Vec<String>,

    /// Output file, `-` for stdout (repeatable, one per input file)
    #[arg(short = 'o', long = "out", value_name = "FILE")]
    pub output_files: Vec<String>,

    /// Directory of templates to render recursively
    #[arg(long, value_name = "DIR")]
    pub input_dir: Option<PathBuf>,

    /// Directory to write rendered templates to
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Template computing each output path from `in`, the input path
    #[arg(long, value_name = "TEMPLATE")]
    pub output_map: Option<String>,

    /// Glob of input-directory paths to skip (repeatable)
    #[arg(long = "exclude", value_name = "GLOB")]
    pub excludes: Vec<String>,

    /// Octal mode applied to every output file
    #[arg(long, value_name = "MODE")]
    pub chmod: Option<String>,

    /// Data source, as ALIAS=URL (repeatable)
    #[arg(short, long = "context", value_name = "ALIAS=URL")]
    pub context: Vec<String>,

    /// Nested template, as [ALIAS=]PATH (repeatable)
    #[arg(short, long = "template", value_name = "[ALIAS=]PATH")]
    pub templates: Vec<String>,

    /// Left delimiter of `{{ }}` expressions; `{% %}` and `{# #}` are unchanged
    #[arg(long, value_name = "DELIM")]
    pub left_delim: Option<String>,

    /// Right delimiter of `{{ }}` expressions; `{% %}` and `{# #}` are unchanged
    #[arg(long, value_name = "DELIM")]
    pub right_delim: Option<String>,

    /// Do not write output that is empty or only whitespace
    #[arg(long)]
    pub suppress_empty: bool,

    /// Configuration file (defaults to .stamp.yaml when present)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Overrides `cfg` with every flag that was given.
    ///
    /// # Errors
    /// * `Error::ConfigError` if a context argument is not `ALIAS=URL`
    pub fn apply_to(&self, cfg: &mut Config) -> Result<()> {
        if self.input.is_some() {
            cfg.input = self.input.clone();
        }
        if !self.input_files.is_empty() {
            cfg.input_files = self.input_files.clone();
        }
        if !self.output_files.is_empty() {
            cfg.output_files = self.output_files.clone();
        }
        if self.input_dir.is_some() {
            cfg.input_dir = self.input_dir.clone();
        }
        if self.output_dir.is_some() {
            cfg.output_dir = self.output_dir.clone();
        }
        if self.output_map.is_some() {
            cfg.output_map = self.output_map.clone();
        }
        if !self.excludes.is_empty() {
            cfg.excludes = self.excludes.clone();
        }
        if self.chmod.is_some() {
            cfg.chmod = self.chmod.clone();
        }
        for arg in &self.context {
            let (alias, url) = arg.split_once('=').ok_or_else(|| {
                Error::ConfigError(format!("invalid context '{arg}', expected ALIAS=URL"))
            })?;
            cfg.context.insert(alias.to_string(), url.to_string());
        }
        cfg.templates.extend(self.templates.iter().cloned());
        if self.left_delim.is_some() {
            cfg.left_delim = self.left_delim.clone();
        }
        if self.right_delim.is_some() {
            cfg.right_delim = self.right_delim.clone();
        }
        if self.suppress_empty {
            cfg.suppress_empty = true;
        }
        Ok(())
    }
}

/// Parses command line arguments and returns the Args structure.
pub fn get_args() -> Args {
    Args::parse()
}
