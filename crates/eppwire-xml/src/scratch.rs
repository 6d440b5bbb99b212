use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{Result, XmlError};

/// A directory in which payloads may be written out temporarily.
///
/// Every call to [`ScratchSpace::materialize`] creates its own uniquely
/// named file, so one space can be shared freely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScratchSpace {
    dir: PathBuf,
}

impl ScratchSpace {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The platform temporary directory.
    pub fn system() -> Self {
        Self::new(std::env::temp_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `payload` to a fresh file in this space.
    pub fn materialize(&self, payload: &[u8]) -> Result<ScratchFile> {
        let scratch_error = |source| XmlError::Scratch {
            dir: self.dir.clone(),
            source,
        };

        let mut file = tempfile::Builder::new()
            .prefix("eppwire-")
            .suffix(".xml")
            .tempfile_in(&self.dir)
            .map_err(scratch_error)?;
        file.write_all(payload).map_err(scratch_error)?;
        file.flush().map_err(scratch_error)?;

        debug!(path = %file.path().display(), bytes = payload.len(), "scratch file written");
        Ok(ScratchFile { file })
    }
}

impl Default for ScratchSpace {
    fn default() -> Self {
        Self::system()
    }
}

/// A scratch file that is removed when dropped.
#[derive(Debug)]
pub struct ScratchFile {
    file: NamedTempFile,
}

impl ScratchFile {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Open an independent read handle positioned at the start.
    pub fn reopen(&self) -> Result<File> {
        Ok(self.file.reopen()?)
    }
}
