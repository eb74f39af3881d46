//! The unit of work: one input template paired with its output.

use crate::constants::IGNORE_FILE;
use crate::error::{Error, Result};
use crate::writer::Target;
use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;

/// One template to render.
///
/// Units are built by the gatherer; afterwards only `contents` and `target`
/// are filled in, when they were not known up front.
#[derive(Debug, Default)]
pub struct Template {
    /// Template identifier, usually the input path. Unique within a render pass.
    pub name: String,
    /// Output path. `None` when the target was supplied directly.
    pub target_path: Option<PathBuf>,
    /// Output destination, opened lazily from `target_path` when unset.
    pub target: Option<Target>,
    /// Raw template text; empty until loaded.
    pub contents: String,
    /// Permission bits for the output, `0` when unresolved.
    pub mode: u32,
    /// Apply `mode` to an existing output even when its content is unchanged.
    pub mode_override: bool,
}

impl Template {
    /// Reads the template text from `input`, or from the file named by the
    /// template when no reader is given.
    ///
    /// # Errors
    /// * `Error::LoadError` if the input cannot be opened, fully read, or is not UTF-8
    pub fn load_contents(&self, input: Option<&mut dyn Read>) -> Result<String> {
        let mut contents = String::new();
        let read = match input {
            Some(input) => input.read_to_string(&mut contents),
            None => {
                let mut file = File::open(&self.name).map_err(|source| Error::LoadError {
                    name: self.name.clone(),
                    source,
                })?;
                file.read_to_string(&mut contents)
            }
        };
        read.map_err(|e| {
            let source = if e.kind() == io::ErrorKind::InvalidData {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("not UTF-8 text, skip it with {IGNORE_FILE} or an exclude glob"),
                )
            } else {
                e
            };
            Error::LoadError { name: self.name.clone(), source }
        })?;
        Ok(contents)
    }
}
