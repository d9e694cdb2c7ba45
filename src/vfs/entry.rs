use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EntryType {
    File,
    Directory,
}

/// Metadata snapshot of a host file, taken at the moment of the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    path: PathBuf,
    size: u64,
    modified: SystemTime,
    entry_type: EntryType,
}

impl FileRecord {
    pub(crate) fn from_metadata<P: AsRef<Path>>(path: P, meta: &Metadata) -> std::io::Result<Self> {
        let entry_type = if meta.is_dir() {
            EntryType::Directory
        } else {
            EntryType::File
        };
        Ok(Self {
            path: path.as_ref().to_path_buf(),
            size: meta.len(),
            modified: meta.modified()?,
            entry_type,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Last modification time.
    pub fn modified(&self) -> SystemTime {
        self.modified
    }

    pub fn entry_type(&self) -> EntryType {
        self.entry_type
    }

    pub fn is_file(&self) -> bool {
        self.entry_type == EntryType::File
    }

    pub fn is_dir(&self) -> bool {
        self.entry_type == EntryType::Directory
    }
}
