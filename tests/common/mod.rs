#![allow(dead_code)]

use stamp::gather::Streams;
use stamp::writer::SharedWriter;
use std::cell::RefCell;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::rc::Rc;

pub type Buffer = Rc<RefCell<Vec<u8>>>;

/// Streams reading `stdin` and writing into the returned buffer.
pub fn buffer_streams(stdin: &str) -> (Streams, Buffer) {
    let out: Buffer = Rc::new(RefCell::new(Vec::new()));
    let streams = Streams::new(
        Box::new(Cursor::new(stdin.as_bytes().to_vec())),
        SharedWriter::new(out.clone()),
    );
    (streams, out)
}

pub fn contents(buffer: &Buffer) -> String {
    String::from_utf8(buffer.borrow().clone()).unwrap()
}

pub fn write_file<P: AsRef<Path>>(path: P, content: &str) {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

#[cfg(unix)]
pub fn set_mode<P: AsRef<Path>>(path: P, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
}

#[cfg(unix)]
pub fn mode_of<P: AsRef<Path>>(path: P) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path).unwrap().permissions().mode() & 0o777
}
