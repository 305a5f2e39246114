//! File system helpers shared by the output writers.

use std::fs;
use std::io;
use std::path::Path;

/// Creates the parent directory of `path` if it has one and it is missing.
pub fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => fs::create_dir_all(dir),
        _ => Ok(()),
    }
}
