//! Output destinations for rendered templates.
//!
//! Files are opened lazily: nothing touches the filesystem until the first
//! non-empty write. When the output already exists, written bytes are buffered
//! and compared with the current contents on close, and the file is only
//! rewritten when they differ.

use crate::error::{Error, Result};
use crate::mode::normalize_file_mode;
use log::debug;
use std::cell::RefCell;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Deferred acquisition of a writer.
pub type Opener = Box<dyn FnOnce() -> io::Result<Box<dyn Write>>>;

/// A writer whose underlying resource is acquired on the first write.
///
/// The opener runs at most once. Closing a writer that was never opened is a
/// no-op.
pub struct LazyWriter {
    opener: Option<Opener>,
    inner: Option<Box<dyn Write>>,
}

impl LazyWriter {
    pub fn new(opener: Opener) -> Self {
        Self { opener: Some(opener), inner: None }
    }

    pub fn is_open(&self) -> bool {
        self.inner.is_some()
    }

    fn acquire(&mut self) -> io::Result<&mut Box<dyn Write>> {
        if self.inner.is_none() {
            let open = self
                .opener
                .take()
                .ok_or_else(|| io::Error::other("output previously failed to open"))?;
            self.inner = Some(open()?);
        }
        match self.inner.as_mut() {
            Some(inner) => Ok(inner),
            None => Err(io::Error::other("output is not open")),
        }
    }

    /// Flushes and releases the underlying writer, if it was ever acquired.
    pub fn close(mut self) -> io::Result<()> {
        match self.inner.take() {
            Some(mut inner) => inner.flush(),
            None => Ok(()),
        }
    }
}

impl Write for LazyWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.acquire()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.inner.as_mut() {
            Some(inner) => inner.flush(),
            None => Ok(()),
        }
    }
}

/// A lazily opened output file.
pub struct OutputFile {
    path: PathBuf,
    writer: LazyWriter,
    /// Pending bytes, kept only when the file already existed.
    same: Option<Vec<u8>>,
}

impl OutputFile {
    /// Writes straight through to `opener` on the first write.
    pub fn new<P: Into<PathBuf>>(path: P, opener: Opener) -> Self {
        Self { path: path.into(), writer: LazyWriter::new(opener), same: None }
    }

    /// Buffers everything until close, and only opens when the content differs
    /// from what is currently stored at `path`.
    pub fn same_skipping<P: Into<PathBuf>>(path: P, opener: Opener) -> Self {
        Self { path: path.into(), writer: LazyWriter::new(opener), same: Some(Vec::new()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn close(mut self) -> io::Result<()> {
        if let Some(pending) = self.same.take() {
            if pending.is_empty() {
                debug!("Nothing written to {}, leaving it untouched", self.path.display());
            } else if fs::read(&self.path).is_ok_and(|current| current == pending) {
                debug!("Contents of {} unchanged, skipping write", self.path.display());
            } else {
                self.writer.write_all(&pending)?;
            }
        }
        self.writer.close()
    }
}

impl Write for OutputFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.same.as_mut() {
            Some(pending) => {
                pending.extend_from_slice(buf);
                Ok(buf.len())
            }
            None => self.writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Holds back leading whitespace, and only forwards it once a non-whitespace
/// byte arrives. Output made only of whitespace never reaches the inner writer.
pub struct EmptySkipper<W: Write> {
    inner: W,
    pending: Vec<u8>,
    started: bool,
}

impl<W: Write> EmptySkipper<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, pending: Vec::new(), started: false }
    }

    /// Forwards every write, whitespace or not.
    pub fn passthrough(inner: W) -> Self {
        Self { inner, pending: Vec::new(), started: true }
    }

    /// Returns the inner writer. Held-back whitespace is discarded.
    pub fn into_inner(self) -> W {
        if !self.started && !self.pending.is_empty() {
            debug!("Discarding whitespace-only output");
        }
        self.inner
    }
}

impl<W: Write> Write for EmptySkipper<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.started {
            if buf.iter().all(u8::is_ascii_whitespace) {
                self.pending.extend_from_slice(buf);
                return Ok(buf.len());
            }
            self.started = true;
            let pending = std::mem::take(&mut self.pending);
            self.inner.write_all(&pending)?;
        }
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// A stream shared between the caller and any number of targets, such as the
/// process's standard output or a test buffer.
#[derive(Clone)]
pub struct SharedWriter(Rc<RefCell<dyn Write>>);

impl SharedWriter {
    pub fn new(inner: Rc<RefCell<dyn Write>>) -> Self {
        Self(inner)
    }

    pub fn stdout() -> Self {
        Self(Rc::new(RefCell::new(io::stdout())))
    }
}

impl Write for SharedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.borrow_mut().flush()
    }
}

/// Where a template's output goes.
pub enum Target {
    /// A stream owned by the caller; flushed but never closed here.
    Stream(EmptySkipper<SharedWriter>),
    /// A file opened on first write and closed when rendering finishes.
    File(EmptySkipper<OutputFile>),
}

impl Target {
    pub fn stream(out: SharedWriter, suppress_empty: bool) -> Self {
        if suppress_empty {
            Target::Stream(EmptySkipper::new(out))
        } else {
            Target::Stream(EmptySkipper::passthrough(out))
        }
    }

    pub fn file(out: OutputFile, suppress_empty: bool) -> Self {
        if suppress_empty {
            Target::File(EmptySkipper::new(out))
        } else {
            Target::File(EmptySkipper::passthrough(out))
        }
    }

    /// Releases the target according to its kind.
    pub fn close(self) -> io::Result<()> {
        match self {
            Target::Stream(out) => out.into_inner().flush(),
            Target::File(out) => out.into_inner().close(),
        }
    }
}

impl Write for Target {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Target::Stream(out) => out.write(buf),
            Target::File(out) => out.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Target::Stream(out) => out.flush(),
            Target::File(out) => out.flush(),
        }
    }
}

impl std::fmt::Debug for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Stream(_) => write!(f, "Target::Stream"),
            Target::File(out) => write!(f, "Target::File({})", out.inner.path().display()),
        }
    }
}

/// Prepares an output file for writing.
///
/// # Arguments
/// * `path` - Output file path
/// * `mode` - Permission bits for a newly created file
/// * `mode_override` - Also apply `mode` to a file that already exists
///
/// # Errors
/// * `Error::IsDirectoryError` if `path` is an existing directory
/// * `Error::PermissionError` if changing the mode of an existing file fails
pub fn create_out_file<P: AsRef<Path>>(path: P, mode: u32, mode_override: bool) -> Result<OutputFile> {
    let path = path.as_ref();
    let mode = normalize_file_mode(mode);

    let existing = match fs::metadata(path) {
        Ok(metadata) if metadata.is_dir() => {
            return Err(Error::IsDirectoryError { path: path.display().to_string() })
        }
        Ok(_) => true,
        Err(_) => false,
    };

    if mode_override {
        match set_mode(path, mode) {
            Ok(()) => {}
            // the file will be created with the right mode
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(Error::PermissionError {
                    path: path.display().to_string(),
                    mode,
                    source,
                })
            }
        }
    }

    let target = path.to_path_buf();
    let opener: Opener = Box::new(move || -> io::Result<Box<dyn Write>> {
        let file = open_out_file(&target, mode, !existing).map_err(|e| {
            io::Error::new(
                e.kind(),
                format!("failed to open output file '{}' for writing: {e}", target.display()),
            )
        })?;
        Ok(Box::new(file) as Box<dyn Write>)
    });

    if existing {
        Ok(OutputFile::same_skipping(path, opener))
    } else {
        Ok(OutputFile::new(path, opener))
    }
}

fn open_out_file(path: &Path, mode: u32, created: bool) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }
    let file = options.open(path)?;
    if created {
        // the process umask must not narrow the resolved mode
        set_mode(path, mode)?;
    }
    Ok(file)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_readonly(mode & 0o200 == 0);
    fs::set_permissions(path, permissions)
}
