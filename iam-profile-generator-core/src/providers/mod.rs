//! Filesystem access used to load catalogs and templates and to commit output.

pub(crate) mod filesystem;

/// Blocking `std::fs` provider with staged multi-file commits.
pub type FileSystemProvider = filesystem::NativeFileSystemProvider;
