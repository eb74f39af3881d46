//! Nested template aliases, loaded into the shared namespace before rendering.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use std::fs;
use std::path::PathBuf;
use walkdir::WalkDir;

/// Template paths keyed by the name templates refer to them by.
pub type TemplateAliases = IndexMap<String, PathBuf>;

/// Parses `alias=path` and `path` arguments.
///
/// # Notes
/// - A file is registered under its alias, or under its own path
/// - A directory registers every file directly inside it (one level only), as
///   `<alias or path>/<file name>`
///
/// # Errors
/// * `Error::ConfigError` if a path does not exist
pub fn parse_template_args(args: &[String]) -> Result<TemplateAliases> {
    let mut aliases = TemplateAliases::new();
    for arg in args {
        parse_template_arg(arg, &mut aliases)?;
    }
    Ok(aliases)
}

fn parse_template_arg(arg: &str, aliases: &mut TemplateAliases) -> Result<()> {
    let (alias, path) = match arg.split_once('=') {
        Some((alias, path)) => (Some(alias), path),
        None => (None, arg),
    };

    let metadata = fs::metadata(path)
        .map_err(|e| Error::ConfigError(format!("invalid template '{arg}': {e}")))?;

    if metadata.is_dir() {
        let prefix = alias.unwrap_or(path).trim_end_matches('/');
        for entry in WalkDir::new(path).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| Error::IoError(e.into()))?;
            if entry.file_type().is_dir() {
                continue;
            }
            let name = format!("{}/{}", prefix, entry.file_name().to_string_lossy());
            aliases.insert(name, entry.path().to_path_buf());
        }
    } else {
        aliases.insert(alias.unwrap_or(path).to_string(), PathBuf::from(path));
    }
    Ok(())
}
