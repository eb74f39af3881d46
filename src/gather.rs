//! Template gathering: turns the configured inputs into an ordered list of
//! templates, each paired with its output.

use crate::config::Config;
use crate::constants::{ARG_TEMPLATE_NAME, STDIO};
use crate::error::{Error, Result};
use crate::ignore::matched_files;
use crate::mode::resolve_mode;
use crate::namer::{clean_path, OutputNamer};
use crate::template::Template;
use crate::writer::{create_out_file, SharedWriter, Target};
use log::debug;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Standard streams used for `-` inputs and outputs.
pub struct Streams {
    pub stdin: Box<dyn Read>,
    pub stdout: SharedWriter,
}

impl Streams {
    pub fn new(stdin: Box<dyn Read>, stdout: SharedWriter) -> Self {
        Self { stdin, stdout }
    }

    /// The process's own standard input and output.
    pub fn stdio() -> Self {
        Self::new(Box::new(io::stdin()), SharedWriter::stdout())
    }
}

/// Gathers and prepares the input templates and their outputs for rendering.
///
/// The input mode is chosen by precedence: inline text, then an input
/// directory, then the list of input files (which defaults to standard input).
///
/// # Errors
/// * `Error::TraversalError` if the input directory cannot be walked
/// * `Error::NamingError` if an output path cannot be computed
/// * `Error::LoadError` if an input cannot be read
pub fn gather_templates(
    cfg: &Config,
    streams: &mut Streams,
    namer: &dyn OutputNamer,
) -> Result<Vec<Template>> {
    let (mode, mode_override) = cfg.get_mode()?;

    let templates = if let Some(input) = cfg.input.as_deref().filter(|s| !s.is_empty()) {
        let target = cfg.output_files.first().map(String::as_str).unwrap_or(STDIO);
        vec![Template {
            name: ARG_TEMPLATE_NAME.to_string(),
            target_path: Some(PathBuf::from(target)),
            contents: input.to_string(),
            mode: resolve_mode(mode, None, None),
            mode_override,
            ..Default::default()
        }]
    } else if let Some(dir) = &cfg.input_dir {
        walk_dir(dir, namer, &cfg.excludes, mode, mode_override)?
    } else {
        cfg.input_files
            .iter()
            .zip(&cfg.output_files)
            .map(|(input, output)| file_to_template(input, output, mode, mode_override))
            .collect::<Result<Vec<_>>>()?
    };

    process_templates(templates, streams, cfg.suppress_empty)
}

/// Loads contents and opens targets for templates that do not have them yet.
pub fn process_templates(
    mut templates: Vec<Template>,
    streams: &mut Streams,
    suppress_empty: bool,
) -> Result<Vec<Template>> {
    for template in templates.iter_mut() {
        if template.contents.is_empty() {
            template.contents = if template.name == STDIO {
                template.load_contents(Some(&mut *streams.stdin))?
            } else {
                template.load_contents(None)?
            };
        }

        if template.target.is_none() {
            let target_path = template.target_path.as_deref().ok_or_else(|| {
                Error::ConfigError(format!("no output for template '{}'", template.name))
            })?;
            template.target = Some(open_target(
                target_path,
                template.mode,
                template.mode_override,
                streams,
                suppress_empty,
            )?);
        }
    }

    Ok(templates)
}

fn open_target(
    path: &Path,
    mode: u32,
    mode_override: bool,
    streams: &Streams,
    suppress_empty: bool,
) -> Result<Target> {
    if path == Path::new(STDIO) {
        return Ok(Target::stream(streams.stdout.clone(), suppress_empty));
    }
    let out = create_out_file(path, mode, mode_override)?;
    Ok(Target::file(out, suppress_empty))
}

/// Walks `dir` and creates one template per file that is not ignored.
///
/// Output parent directories are created up front, with the input directory's
/// mode.
pub fn walk_dir<P: AsRef<Path>>(
    dir: P,
    namer: &dyn OutputNamer,
    exclude_globs: &[String],
    mode: u32,
    mode_override: bool,
) -> Result<Vec<Template>> {
    let dir = clean_path(dir);
    let dir_metadata = fs::metadata(&dir).map_err(|e| Error::TraversalError {
        path: dir.display().to_string(),
        source: e.into(),
    })?;
    let dir_mode = crate::mode::file_mode(&dir_metadata);

    let mut templates = Vec::new();
    for file in matched_files(&dir, exclude_globs)? {
        let in_path = clean_path(dir.join(&file));
        let out_path = namer.name(&file)?;

        let source_metadata = if mode == 0 { fs::metadata(&in_path).ok() } else { None };
        let file_mode = resolve_mode(mode, source_metadata.as_ref(), Some(&dir_metadata));

        if let Some(parent) = out_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_dir_all(parent, dir_mode)?;
        }

        debug!("Gathered {} -> {}", in_path.display(), out_path.display());
        templates.push(Template {
            name: in_path.to_string_lossy().into_owned(),
            target_path: Some(out_path),
            mode: file_mode,
            mode_override,
            ..Default::default()
        });
    }

    Ok(templates)
}

/// Creates a template for a single input file.
pub fn file_to_template(
    input: &str,
    output: &str,
    mode: u32,
    mode_override: bool,
) -> Result<Template> {
    let source_metadata = if input == STDIO {
        None
    } else {
        let metadata = fs::metadata(input)
            .map_err(|source| Error::LoadError { name: input.to_string(), source })?;
        Some(metadata)
    };

    Ok(Template {
        name: input.to_string(),
        target_path: Some(PathBuf::from(output)),
        mode: resolve_mode(mode, source_metadata.as_ref(), None),
        mode_override,
        ..Default::default()
    })
}

#[cfg(unix)]
fn create_dir_all(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(mode & 0o777).create(path).map_err(Error::IoError)
}

#[cfg(not(unix))]
fn create_dir_all(path: &Path, _mode: u32) -> Result<()> {
    fs::create_dir_all(path).map_err(Error::IoError)
}
