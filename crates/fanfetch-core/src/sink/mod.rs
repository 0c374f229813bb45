//! Sink writer: persists one payload under a destination name.
//!
//! Each write goes to a uniquely named `.part` file in the output directory,
//! is synced, then atomically renamed onto the final name. Concurrent writes
//! of the same name therefore leave exactly one complete file behind.

mod part;

use std::path::{Path, PathBuf};

use crate::error::WriteError;
use crate::url_model;

use part::PartFile;

/// Output directory that payloads are written into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sink {
    dir: PathBuf,
}

impl Sink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Final path of `name` in the output directory.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Creates or replaces the file `name` with `payload`.
    ///
    /// The temporary file is removed on every failure path; on success the
    /// handle is closed before the rename.
    pub fn write(&self, name: &str, payload: &[u8]) -> Result<(), WriteError> {
        validate_name(name)?;
        let io_err = |source| WriteError::Io {
            name: name.to_string(),
            source,
        };
        let final_path = self.path_for(name);
        let mut part = PartFile::create(&final_path).map_err(io_err)?;
        part.write_all(payload).map_err(io_err)?;
        part.sync().map_err(io_err)?;
        part.finalize(&final_path).map_err(io_err)?;
        tracing::debug!(name, bytes = payload.len(), "payload written");
        Ok(())
    }
}

/// A destination name must be a single path component.
fn validate_name(name: &str) -> Result<(), WriteError> {
    if !url_model::is_storable_name(name) {
        return Err(WriteError::InvalidName(name.to_string()));
    }
    Ok(())
}
