//! Configuration handling for stamp.
//! Settings are read from an optional config file (JSON or YAML) and then
//! overridden by command-line flags.

use crate::constants::{DEFAULT_LEFT_DELIM, DEFAULT_RIGHT_DELIM, STDIO};
use crate::error::{Error, Result};
use crate::mode::parse_mode;
use indexmap::IndexMap;
use log::debug;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Everything a render run needs to know.
#[derive(Debug, Default, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Inline template text.
    #[serde(rename = "in")]
    pub input: Option<String>,
    /// Input template files; `-` reads standard input.
    pub input_files: Vec<String>,
    /// Input directory, walked recursively.
    pub input_dir: Option<PathBuf>,
    /// Output files, matched to inputs by index; `-` writes standard output.
    pub output_files: Vec<String>,
    /// Output root for directory inputs.
    pub output_dir: Option<PathBuf>,
    /// Template computing the output path of each directory input.
    pub output_map: Option<String>,
    /// Extra exclusion globs for directory inputs.
    pub excludes: Vec<String>,
    /// Octal mode forced on every output.
    pub chmod: Option<String>,
    pub left_delim: Option<String>,
    pub right_delim: Option<String>,
    /// Data source URLs keyed by context alias.
    pub context: IndexMap<String, String>,
    /// Nested templates, as `alias=path` or `path`.
    pub templates: Vec<String>,
    /// Treat whitespace-only output as empty.
    pub suppress_empty: bool,
}

impl Config {
    /// Loads configuration from a file.
    ///
    /// # Errors
    /// * `Error::ConfigError` if the file cannot be read or parsed
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading configuration from {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    /// Parses configuration content, trying JSON first and YAML second.
    pub fn parse(content: &str) -> Result<Self> {
        match serde_json::from_str(content) {
            Ok(config) => Ok(config),
            Err(_) => serde_yaml::from_str(content)
                .map_err(|e| Error::ConfigError(format!("Invalid configuration format: {e}"))),
        }
    }

    /// Fills in the defaults for unset inputs, outputs and delimiters.
    pub fn apply_defaults(&mut self) {
        if self.input.is_none() && self.input_dir.is_none() && self.input_files.is_empty() {
            self.input_files = vec![STDIO.to_string()];
        }
        if self.input_dir.is_none() && self.output_files.is_empty() {
            self.output_files = vec![STDIO.to_string()];
        }
        if self.input_dir.is_some() && self.output_dir.is_none() && self.output_map.is_none() {
            self.output_dir = Some(PathBuf::from("."));
        }
        if self.left_delim.is_none() {
            self.left_delim = Some(DEFAULT_LEFT_DELIM.to_string());
        }
        if self.right_delim.is_none() {
            self.right_delim = Some(DEFAULT_RIGHT_DELIM.to_string());
        }
    }

    /// Checks that the options form one coherent input mode.
    ///
    /// # Errors
    /// * `Error::ConfigError` describing the first conflict found
    pub fn validate(&self) -> Result<()> {
        let inputs = [self.input.is_some(), !self.input_files.is_empty(), self.input_dir.is_some()];
        if inputs.iter().filter(|set| **set).count() > 1 {
            return Err(Error::ConfigError(
                "only one of in, inputFiles or inputDir may be set".to_string(),
            ));
        }
        if self.input_dir.is_none() {
            if self.output_dir.is_some() {
                return Err(Error::ConfigError("outputDir requires inputDir".to_string()));
            }
            if self.output_map.is_some() {
                return Err(Error::ConfigError("outputMap requires inputDir".to_string()));
            }
        } else if !self.output_files.is_empty() {
            return Err(Error::ConfigError(
                "outputFiles can not be used with inputDir".to_string(),
            ));
        }
        if self.output_dir.is_some() && self.output_map.is_some() {
            return Err(Error::ConfigError(
                "outputDir and outputMap are mutually exclusive".to_string(),
            ));
        }
        if self.input.is_some() && self.output_files.len() > 1 {
            return Err(Error::ConfigError(
                "an inline template takes at most one output file".to_string(),
            ));
        }
        if !self.input_files.is_empty() && self.input_files.len() != self.output_files.len() {
            return Err(Error::ConfigError(format!(
                "must provide same number of outputFiles ({}) as inputFiles ({})",
                self.output_files.len(),
                self.input_files.len()
            )));
        }
        Ok(())
    }

    /// Returns the configured output mode and whether it overrides existing files.
    pub fn get_mode(&self) -> Result<(u32, bool)> {
        let mode = match self.chmod.as_deref() {
            Some(chmod) if !chmod.is_empty() => parse_mode(chmod)?,
            _ => 0,
        };
        Ok((mode, mode != 0))
    }

    pub fn left_delim(&self) -> &str {
        self.left_delim.as_deref().unwrap_or(DEFAULT_LEFT_DELIM)
    }

    pub fn right_delim(&self) -> &str {
        self.right_delim.as_deref().unwrap_or(DEFAULT_RIGHT_DELIM)
    }
}
