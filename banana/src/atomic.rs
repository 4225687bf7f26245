//! Crash-safe file replacement.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

/// Write `bytes` to `path` so readers see either the old or the new contents.
///
/// Data goes to a uniquely named temp file in the target directory, is fsynced,
/// then renamed over `path`. Concurrent writers to the same path never share a
/// temp file; the last rename wins. Parent directories are created as needed.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut tmp_file = NamedTempFile::new_in(parent)?;
    tmp_file.write_all(bytes)?;
    tmp_file.as_file().sync_all()?;
    tmp_file.persist(path).map_err(|e| e.error)?;
    Ok(())
}
