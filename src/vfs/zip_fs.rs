//! This module treats one zip container on the host as a small file system of entries.
//!
//! Every public operation of [`ZipFS`] runs the same scoped sequence: mount the container,
//! perform a single logical operation on the [`ArchiveHandle`], unmount. The unmount step runs
//! on every exit path, including errors and panics unwinding through the operation.
//!
//! ### Key Features:
//! - **Replace semantics**: writing an existing entry name replaces its content; an entry name
//!   occurs at most once in the container.
//! - **Atomic writes**: a write either leaves the container with the new entry content or leaves
//!   it as it was (absent containers stay absent).
//! - **Distinct failures**: a missing entry is `EntryNotFound`, a missing container is
//!   `ContainerNotFound`, an unparsable container is `Corrupt`.
//!
//! ### Limitations:
//! - Two `ZipFS` instances (or processes) writing the same container concurrently are not
//!   coordinated; the last rename wins and the other writer's entry is lost.
//! - Operations block until finished and cannot be cancelled midway.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use zip::CompressionMethod;

use crate::base::{Event, FsBackend, Observer, default_observer, utils};
use crate::error::{ArchiveError, StoreError};
use crate::vfs::{ArchiveHandle, MountMode};

type Result<T> = std::result::Result<T, ArchiveError>;

/// A zip container addressed as a file system.
///
/// Entry names are slash-rooted paths: `hello.txt` and `/hello.txt` name the same entry.
///
/// ### Example:
/// ```no_run
/// use zipfs_kit::ZipFS;
///
/// let zip = ZipFS::new("/tmp/zip_demo/example.zip");
/// zip.write_entry("hello.txt", "Hi").unwrap();
/// assert!(zip.entry_exists("hello.txt").unwrap());
/// assert_eq!(zip.read_entry("/hello.txt").unwrap(), b"Hi");
/// ```
pub struct ZipFS {
    container: PathBuf,
    compression: CompressionMethod,
    observer: Arc<dyn Observer>,
}

impl ZipFS {
    /// Creates a file system over the container at `container`.
    /// Nothing is touched on the host until the first operation.
    pub fn new<P: AsRef<Path>>(container: P) -> Self {
        Self {
            container: container.as_ref().to_path_buf(),
            compression: CompressionMethod::Deflated,
            observer: default_observer(),
        }
    }

    /// Host path of the container.
    pub fn container(&self) -> &Path {
        &self.container
    }

    /// Compression used for entries written from now on. Existing entries keep theirs.
    pub fn set_compression(&mut self, compression: CompressionMethod) {
        self.compression = compression;
    }

    pub fn set_observer(&mut self, observer: Arc<dyn Observer>) {
        self.observer = observer;
    }

    /// Mounts the container. The caller owns the handle and must let it unmount
    /// (explicitly or by dropping it).
    pub fn mount(&self, mode: MountMode) -> Result<ArchiveHandle> {
        ArchiveHandle::mount(&self.container, mode, self.compression, self.observer.clone())
    }

    /// Mounts the container, runs `op` on the handle and unmounts.
    ///
    /// The unmount runs whether `op` succeeds or not. An error from `op` takes precedence over
    /// an error from the unmount.
    pub fn with_mount<T, F>(&self, mode: MountMode, op: F) -> Result<T>
    where
        F: FnOnce(&mut ArchiveHandle) -> Result<T>,
    {
        let mut handle = self.mount(mode)?;
        let outcome = op(&mut handle);
        let unmounted = handle.unmount();
        match (outcome, unmounted) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Err(unmount_err)) => {
                self.observer.notify(
                    Event::error("unmount failed after operation error")
                        .with("container", self.container.display())
                        .with("error", unmount_err),
                );
                Err(e)
            }
            (Err(e), Ok(())) => Err(e),
        }
    }

    /// Writes `content` under `name`, creating the container if needed and replacing the entry
    /// if it exists.
    pub fn write_entry<C: AsRef<[u8]>>(&self, name: &str, content: C) -> Result<()> {
        self.with_mount(MountMode::Create, |handle| {
            handle.write(name, content.as_ref())
        })
        .inspect_err(|e| self.failed("write_entry", name, e))
    }

    /// Reads the whole entry. The container must exist.
    pub fn read_entry(&self, name: &str) -> Result<Vec<u8>> {
        self.with_mount(MountMode::ReadOnly, |handle| {
            if !handle.exists(name)? {
                let key = utils::entry_key(name).unwrap_or_else(|| name.to_string());
                return Err(ArchiveError::EntryNotFound {
                    container: self.container.clone(),
                    entry: utils::rooted(&key),
                });
            }
            handle.read(name)
        })
        .inspect_err(|e| self.failed("read_entry", name, e))
    }

    /// Reads the entry and decodes it as UTF-8.
    pub fn read_entry_text(&self, name: &str) -> Result<String> {
        let content = self.read_entry(name)?;
        String::from_utf8(content)
            .map_err(|source| ArchiveError::Decode {
                entry: name.to_string(),
                source,
            })
            .inspect_err(|e| self.failed("read_entry_text", name, e))
    }

    /// Imports the host file `source` as entry `name`, replacing an existing entry.
    /// The source is read completely before the container is mounted.
    pub fn copy_external_file<P: AsRef<Path>>(&self, source: P, name: &str) -> Result<()> {
        let source = source.as_ref();
        let imported = std::fs::read(source)
            .map_err(|e| ArchiveError::from(StoreError::from_io(source, e)))
            .and_then(|content| {
                self.with_mount(MountMode::Create, |handle| handle.write(name, &content))
            });
        imported
            .inspect(|_| {
                self.observer.notify(
                    Event::info("external file imported")
                        .with("source", source.display())
                        .with("entry", name),
                )
            })
            .inspect_err(|e| self.failed("copy_external_file", name, e))
    }

    /// Returns whether entry `name` exists. A missing entry is `Ok(false)`; a missing or
    /// unreadable container is an error.
    pub fn entry_exists(&self, name: &str) -> Result<bool> {
        self.with_mount(MountMode::ReadOnly, |handle| handle.exists(name))
            .inspect_err(|e| self.failed("entry_exists", name, e))
    }

    /// Slash-rooted names of all entries, sorted.
    pub fn list_entries(&self) -> Result<Vec<String>> {
        self.with_mount(MountMode::ReadOnly, |handle| handle.entry_names())
            .inspect_err(|e| self.failed("list_entries", "/", e))
    }

    fn failed(&self, operation: &'static str, entry: &str, err: &ArchiveError) {
        self.observer.notify(
            Event::error("archive operation failed")
                .with("operation", operation)
                .with("container", self.container.display())
                .with("entry", entry)
                .with("error", err),
        );
    }
}

impl FsBackend for ZipFS {
    type Error = ArchiveError;

    fn exists<P: AsRef<Path>>(&self, path: P) -> Result<bool> {
        self.entry_exists(entry_name(path.as_ref())?)
    }

    fn read<P: AsRef<Path>>(&self, path: P) -> Result<Vec<u8>> {
        self.read_entry(entry_name(path.as_ref())?)
    }

    fn write<P: AsRef<Path>>(&self, path: P, content: &[u8]) -> Result<()> {
        self.write_entry(entry_name(path.as_ref())?, content)
    }
}

/// Entry names are UTF-8; a path that is not has no entry.
fn entry_name(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| ArchiveError::InvalidName(path.to_string_lossy().into_owned()))
}
