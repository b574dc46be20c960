//! Native filesystem provider implementation using `std::fs`.
//!
//! Generation runs once, synchronously, so plain blocking I/O is used. Every
//! error carries the operation and the path that produced it.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::errors::{GeneratorError, Result};

/// Suffix of the staging file written next to each output document
const STAGING_SUFFIX: &str = ".staged";

/// Native filesystem provider.
#[derive(Debug, Clone)]
pub struct NativeFileSystemProvider;

impl NativeFileSystemProvider {
    /// Read the entire contents of a file as a UTF-8 string.
    pub fn read_file(path: impl AsRef<Path>) -> Result<String> {
        fs::read_to_string(path.as_ref())
            .map_err(|e| GeneratorError::file_system("read", path.as_ref(), e))
    }

    /// Check if a file or directory exists.
    pub fn file_exists(path: &Path) -> Result<bool> {
        match fs::metadata(path) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(GeneratorError::file_system("check existence", path, e)),
        }
    }

    /// Create a directory and all of its parents.
    pub fn create_dir_all(path: &Path) -> Result<()> {
        fs::create_dir_all(path).map_err(|e| GeneratorError::file_system("create directory", path, e))
    }

    /// Write a set of files as one unit.
    ///
    /// Every file is first written to a staging sibling. Only when all of
    /// them have been staged are they renamed into place. If staging fails,
    /// the staged files are removed and no target is touched.
    pub fn write_all<P, C>(files: &[(P, C)]) -> Result<()>
    where
        P: AsRef<Path>,
        C: AsRef<str>,
    {
        let mut staged: Vec<(PathBuf, &Path)> = Vec::with_capacity(files.len());

        for (target, contents) in files {
            let target = target.as_ref();
            let staging = staging_path(target);
            let written = target
                .parent()
                .filter(|parent| !parent.as_os_str().is_empty())
                .map_or(Ok(()), Self::create_dir_all)
                .and_then(|()| {
                    fs::write(&staging, contents.as_ref())
                        .map_err(|e| GeneratorError::file_system("write", &staging, e))
                });

            if let Err(e) = written {
                Self::discard(staged.iter().map(|(s, _)| s.as_path()));
                Self::discard(std::iter::once(staging.as_path()));
                return Err(e);
            }
            debug!("Staged {}", target.display());
            staged.push((staging, target));
        }

        for (staging, target) in &staged {
            fs::rename(staging, target)
                .map_err(|e| GeneratorError::file_system("rename", target, e))?;
        }
        Ok(())
    }

    fn discard<'a>(paths: impl Iterator<Item = &'a Path>) {
        for path in paths {
            if let Err(e) = fs::remove_file(path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to remove staged file {}: {}", path.display(), e);
                }
            }
        }
    }
}

fn staging_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(STAGING_SUFFIX);
    PathBuf::from(name)
}
