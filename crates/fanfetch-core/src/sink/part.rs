//! Temporary `.part` file with guaranteed cleanup.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Suffix of in-progress files.
const PART_SUFFIX: &str = ".part";

static PART_SEQ: AtomicU64 = AtomicU64::new(0);

/// Unique temp path next to `final_path`: `.<name>.<pid>.<seq>.part`.
///
/// Unique per process and per call, so two writers of the same final name
/// (threads or worker processes) never share a temp file.
fn part_path(final_path: &Path) -> PathBuf {
    let name = final_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let seq = PART_SEQ.fetch_add(1, Ordering::Relaxed);
    let part = format!(".{}.{}.{}{}", name, std::process::id(), seq, PART_SUFFIX);
    final_path.with_file_name(part)
}

/// Open temp file. Dropping it without [`PartFile::finalize`] closes the
/// handle and deletes the file.
pub(crate) struct PartFile {
    file: Option<File>,
    path: PathBuf,
}

impl PartFile {
    /// Creates (or truncates) a fresh temp file for `final_path`.
    pub(crate) fn create(final_path: &Path) -> io::Result<Self> {
        let path = part_path(final_path);
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;
        Ok(Self {
            file: Some(file),
            path,
        })
    }

    #[cfg(test)]
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.handle()?.write_all(data)
    }

    /// Flush and fsync file data.
    pub(crate) fn sync(&mut self) -> io::Result<()> {
        let f = self.handle()?;
        f.flush()?;
        f.sync_all()
    }

    /// Closes the handle and renames the temp file onto `final_path`,
    /// replacing any existing file.
    pub(crate) fn finalize(mut self, final_path: &Path) -> io::Result<()> {
        drop(self.file.take());
        std::fs::rename(&self.path, final_path)?;
        // Renamed away: nothing left for Drop to clean up.
        self.path = PathBuf::new();
        Ok(())
    }

    fn handle(&mut self) -> io::Result<&mut File> {
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "part file already closed"))
    }
}

impl Drop for PartFile {
    fn drop(&mut self) {
        drop(self.file.take());
        if self.path.as_os_str().is_empty() {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), "could not remove part file: {}", e);
            }
        }
    }
}
