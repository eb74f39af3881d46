//! File ignore pattern handling for input directories.
//! Processes nested .stampignore files, with .gitignore semantics, plus any
//! exclude globs given in the configuration.

use crate::constants::IGNORE_FILE;
use crate::error::{Error, Result};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use ignore::WalkBuilder;
use log::{debug, trace};
use std::path::{Path, PathBuf};

/// Builds a matcher from exclude globs, rooted at `base`.
///
/// The globs use ignore-file syntax, so `!pattern` re-includes a path that an
/// earlier exclude matched.
pub fn build_excludes<P: AsRef<Path>>(base: P, exclude_globs: &[String]) -> Result<Gitignore> {
    let base = base.as_ref();
    let mut builder = GitignoreBuilder::new(base);
    for glob in exclude_globs {
        builder.add_line(None, glob).map_err(|e| traversal_error(base, e))?;
    }
    builder.build().map_err(|e| traversal_error(base, e))
}

/// Lists the files under `root` that survive ignore-file rules and exclude globs.
///
/// # Arguments
/// * `root` - Directory to walk
/// * `exclude_globs` - Extra exclusion rules applied after the ignore files
///
/// # Returns
/// * `Result<Vec<PathBuf>>` - Paths relative to `root`, sorted by file name
///   within each directory
///
/// # Notes
/// - Ignore files only affect their own directory and below
/// - The ignore files themselves are never listed
/// - Symlinks to files are listed; symlinked directories are not entered
pub fn matched_files<P: AsRef<Path>>(root: P, exclude_globs: &[String]) -> Result<Vec<PathBuf>> {
    let root = root.as_ref();
    // nested ignore-file discovery needs a concrete base path
    let base = if root == Path::new(".") || root.as_os_str().is_empty() {
        std::env::current_dir().map_err(|e| traversal_error(root, e.into()))?
    } else {
        root.to_path_buf()
    };

    let metadata = std::fs::metadata(&base).map_err(|e| traversal_error(&base, e.into()))?;
    if !metadata.is_dir() {
        return Err(Error::TraversalError {
            path: base.display().to_string(),
            source: ignore::Error::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "not a directory",
            )),
        });
    }

    let excludes = build_excludes(&base, exclude_globs)?;

    let walker = WalkBuilder::new(&base)
        .standard_filters(false)
        .hidden(false)
        .add_custom_ignore_filename(IGNORE_FILE)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| traversal_error(&base, e))?;
        let is_file = match entry.file_type() {
            Some(ft) if ft.is_symlink() => entry.path().metadata().is_ok_and(|m| m.is_file()),
            Some(ft) => ft.is_file(),
            None => false,
        };
        if !is_file {
            continue;
        }
        if entry.file_name() == IGNORE_FILE {
            continue;
        }
        let relative = match entry.path().strip_prefix(&base) {
            Ok(relative) => relative.to_path_buf(),
            Err(_) => continue,
        };
        if excludes.matched_path_or_any_parents(&relative, false).is_ignore() {
            debug!("Skipping file {} from exclude globs", relative.display());
            continue;
        }
        trace!("Matched file {}", relative.display());
        files.push(relative);
    }

    Ok(files)
}

fn traversal_error(path: &Path, source: ignore::Error) -> Error {
    Error::TraversalError { path: path.display().to_string(), source }
}
