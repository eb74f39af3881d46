//! Output permission resolution.
//! Output files take an explicit mode when one is configured, otherwise they
//! inherit the mode of their source file, and finally that of the input directory.

use std::fs::Metadata;

use crate::constants::DEFAULT_FILE_MODE;
use crate::error::{Error, Result};

/// Returns the permission bits of a file, as far as the platform exposes them.
#[cfg(unix)]
pub fn file_mode(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode()
}

#[cfg(not(unix))]
pub fn file_mode(metadata: &Metadata) -> u32 {
    if metadata.permissions().readonly() {
        0o444
    } else {
        0o666
    }
}

/// Strips everything but the permission bits, and maps them to the values the
/// platform can actually represent.
pub fn normalize_file_mode(mode: u32) -> u32 {
    let perm = mode & 0o777;
    if cfg!(windows) {
        if perm & 0o200 == 0 {
            0o444
        } else {
            0o666
        }
    } else {
        perm
    }
}

/// Computes the effective mode of an output file.
///
/// # Arguments
/// * `explicit` - Configured mode, `0` when unset
/// * `source` - Metadata of the source file, if it is a real file
/// * `dir` - Metadata of the containing input directory, if any
pub fn resolve_mode(explicit: u32, source: Option<&Metadata>, dir: Option<&Metadata>) -> u32 {
    let mode = if explicit != 0 {
        explicit
    } else if let Some(source) = source.filter(|m| m.is_file()) {
        file_mode(source)
    } else if let Some(dir) = dir {
        file_mode(dir)
    } else {
        DEFAULT_FILE_MODE
    };
    normalize_file_mode(mode)
}

/// Parses an octal mode string such as `755` or `0640`.
pub fn parse_mode(s: &str) -> Result<u32> {
    let trimmed = s.trim();
    let digits = trimmed.strip_prefix("0o").unwrap_or(trimmed);
    let mode = u32::from_str_radix(digits, 8)
        .map_err(|e| Error::ConfigError(format!("invalid mode '{s}': {e}")))?;
    if mode > 0o7777 {
        return Err(Error::ConfigError(format!("invalid mode '{s}': out of range")));
    }
    Ok(mode)
}
