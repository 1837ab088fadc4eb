//! File-system collaborators shared by the zone and lease readers.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::Result;

/// Yields the lines of a text file, without their terminators.
pub fn read_lines(path: &Path) -> Result<impl Iterator<Item = io::Result<String>>> {
    let file = File::open(path)?;
    Ok(BufReader::new(file).lines())
}

/// Atomically replaces `path` with `content`.
///
/// The content goes to a temporary file in the target's directory and is
/// renamed over the target, so a concurrent reader observes either the
/// fully-old or fully-new file, never a partial write.
pub fn save(content: &str, path: &Path) -> Result<()> {
    // The temp file must live on the same filesystem for the rename to
    // be atomic.
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(content.as_bytes())?;
    file.persist(path).map_err(|persist| persist.error)?;
    Ok(())
}
