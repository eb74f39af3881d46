//! Walks that start from the current directory. Kept in their own test binary
//! because they change the process working directory.

mod common;

use common::write_file;
use stamp::constants::IGNORE_FILE;
use stamp::gather::walk_dir;
use stamp::ignore::matched_files;
use stamp::namer::StaticNamer;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_current_dir_shorthand_is_resolved() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("in");
    let output = temp_dir.path().join("out");
    write_file(root.join("one/foo"), "foo");
    write_file(root.join("two/baz"), "baz");
    write_file(root.join(IGNORE_FILE), "two/\n");

    let previous = std::env::current_dir().unwrap();
    std::env::set_current_dir(&root).unwrap();
    let files = matched_files(".", &[]);
    let empty = matched_files("", &[]);
    let templates = walk_dir(".", &StaticNamer::new(&output), &[], 0, false);
    std::env::set_current_dir(previous).unwrap();

    assert_eq!(files.unwrap(), vec![PathBuf::from("one/foo")]);
    assert_eq!(empty.unwrap(), vec![PathBuf::from("one/foo")]);

    let templates = templates.unwrap();
    assert_eq!(templates.len(), 1);
    assert_eq!(templates[0].name, "one/foo");
    assert_eq!(templates[0].target_path, Some(output.join("one/foo")));
}
