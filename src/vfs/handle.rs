//! A zip container mounted for one logical operation.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::base::{Event, Observer, utils};
use crate::error::ArchiveError;

type Result<T> = std::result::Result<T, ArchiveError>;

const MAX_PREALLOCATION: u64 = 64 * 1024;

/// How a container is mounted.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MountMode {
    /// The container must exist; writes are rejected.
    ReadOnly,
    /// A missing container is treated as empty and written on unmount if anything was staged.
    Create,
}

impl fmt::Display for MountMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MountMode::ReadOnly => f.write_str("read-only"),
            MountMode::Create => f.write_str("create"),
        }
    }
}

/// One mounted zip container.
///
/// Entries written through the handle are staged in memory and land in the container when the
/// handle is unmounted: a fresh archive is assembled next to the container, the untouched
/// entries are copied over raw, and the result is renamed over the container. Until that
/// rename succeeds the container on disk keeps its previous content (or stays absent).
///
/// Every handle is unmounted exactly once: explicitly with `unmount()`, or on drop. After that
/// every operation fails with `ArchiveError::Closed`; a second `unmount()` is a no-op.
pub struct ArchiveHandle {
    container: PathBuf,
    mode: MountMode,
    archive: Option<ZipArchive<BufReader<File>>>,
    index: BTreeMap<String, usize>, // entry key -> index in `archive`
    staged: BTreeMap<String, Vec<u8>>,
    compression: CompressionMethod,
    observer: Arc<dyn Observer>,
    mounted: bool,
}

impl ArchiveHandle {
    pub(crate) fn mount(
        container: &Path,
        mode: MountMode,
        compression: CompressionMethod,
        observer: Arc<dyn Observer>,
    ) -> Result<Self> {
        let archive = match File::open(container) {
            Ok(file) => Some(
                ZipArchive::new(BufReader::new(file))
                    .map_err(|e| ArchiveError::from_zip(container, e))?,
            ),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => match mode {
                MountMode::Create => None,
                MountMode::ReadOnly => {
                    return Err(ArchiveError::ContainerNotFound(container.to_path_buf()));
                }
            },
            Err(e) => return Err(ArchiveError::io(container, e)),
        };

        let mut index = BTreeMap::new();
        if let Some(archive) = &archive {
            for i in 0..archive.len() {
                let Some(name) = archive.name_for_index(i) else {
                    continue;
                };
                if name.ends_with('/') {
                    continue; // directory record
                }
                if let Some(key) = utils::entry_key(name) {
                    index.insert(key, i);
                }
            }
        }

        observer.notify(
            Event::info("archive mounted")
                .with("container", container.display())
                .with("mode", mode)
                .with("entries", index.len()),
        );

        Ok(Self {
            container: container.to_path_buf(),
            mode,
            archive,
            index,
            staged: BTreeMap::new(),
            compression,
            observer,
            mounted: true,
        })
    }

    pub fn container(&self) -> &Path {
        &self.container
    }

    pub fn mode(&self) -> MountMode {
        self.mode
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Returns true if the entry is present, staged writes included.
    pub fn exists(&self, name: &str) -> Result<bool> {
        self.ensure_mounted()?;
        let key = self.key(name)?;
        Ok(self.staged.contains_key(&key) || self.index.contains_key(&key))
    }

    /// Reads the whole entry.
    /// A missing entry is `EntryNotFound`; undecodable data is `Corrupt`.
    pub fn read(&mut self, name: &str) -> Result<Vec<u8>> {
        self.ensure_mounted()?;
        let key = self.key(name)?;
        if let Some(content) = self.staged.get(&key) {
            return Ok(content.clone());
        }

        let (Some(archive), Some(&i)) = (self.archive.as_mut(), self.index.get(&key)) else {
            return Err(ArchiveError::EntryNotFound {
                container: self.container.clone(),
                entry: utils::rooted(&key),
            });
        };

        let container = &self.container;
        let mut file = archive
            .by_index(i)
            .map_err(|e| ArchiveError::from_zip(container, e))?;
        // the declared size comes from the container and is not trusted for allocation
        let declared = file.size();
        let mut content = Vec::with_capacity(declared.min(MAX_PREALLOCATION) as usize);
        file.read_to_end(&mut content)
            .map_err(|e| ArchiveError::from_zip(container, e.into()))?;
        if content.len() as u64 != declared {
            return Err(ArchiveError::corrupt(
                container,
                format!(
                    "entry {} holds {} bytes but declares {declared}",
                    utils::rooted(&key),
                    content.len()
                ),
            ));
        }

        self.observer.notify(
            Event::debug("entry read")
                .with("container", self.container.display())
                .with("entry", utils::rooted(&key))
                .with("bytes", content.len()),
        );
        Ok(content)
    }

    /// Stages `content` under `name`, replacing any previous content of that entry.
    pub fn write(&mut self, name: &str, content: &[u8]) -> Result<()> {
        self.ensure_mounted()?;
        if self.mode == MountMode::ReadOnly {
            return Err(ArchiveError::ReadOnly(self.container.clone()));
        }
        let key = self.key(name)?;

        self.observer.notify(
            Event::info("entry written")
                .with("container", self.container.display())
                .with("entry", utils::rooted(&key))
                .with("bytes", content.len()),
        );
        self.staged.insert(key, content.to_vec());
        Ok(())
    }

    /// Slash-rooted names of all file entries, sorted.
    pub fn entry_names(&self) -> Result<Vec<String>> {
        self.ensure_mounted()?;
        let mut keys: Vec<&String> = self.index.keys().chain(self.staged.keys()).collect();
        keys.sort();
        keys.dedup();
        Ok(keys.into_iter().map(|k| utils::rooted(k)).collect())
    }

    /// Flushes staged entries to the container and releases it.
    ///
    /// The handle is unmounted even when the flush fails; in that case the container keeps
    /// its previous state and the staged entries are lost.
    pub fn unmount(&mut self) -> Result<()> {
        if !self.mounted {
            return Ok(());
        }
        self.mounted = false;

        let staged = self.staged.len();
        let flushed = if staged > 0 { self.flush() } else { Ok(()) };
        self.archive = None;
        self.staged.clear();

        if flushed.is_ok() {
            self.observer.notify(
                Event::info("archive unmounted")
                    .with("container", self.container.display())
                    .with("flushed", staged),
            );
        }
        flushed
    }

    fn flush(&mut self) -> Result<()> {
        let container = self.container.as_path();
        let to_err = |e: std::io::Error| ArchiveError::io(container, e);

        let staging = staging_file(container).map_err(to_err)?;
        let mut writer = ZipWriter::new(staging);

        // the reader must be closed before the rename below
        if let Some(mut archive) = self.archive.take() {
            for i in 0..archive.len() {
                let file = archive
                    .by_index_raw(i)
                    .map_err(|e| ArchiveError::from_zip(container, e))?;
                let replaced = utils::entry_key(file.name())
                    .is_some_and(|key| self.staged.contains_key(&key));
                if replaced {
                    continue;
                }
                writer
                    .raw_copy_file(file)
                    .map_err(|e| ArchiveError::from_zip(container, e))?;
            }
        }

        for (key, content) in &self.staged {
            let options = SimpleFileOptions::default().compression_method(self.compression);
            writer
                .start_file(key.as_str(), options)
                .map_err(|e| ArchiveError::from_zip(container, e))?;
            writer.write_all(content).map_err(to_err)?;
        }

        let staging = writer
            .finish()
            .map_err(|e| ArchiveError::from_zip(container, e))?;
        staging.as_file().sync_all().map_err(to_err)?;
        staging.persist(container).map_err(|e| to_err(e.error))?;
        Ok(())
    }

    fn ensure_mounted(&self) -> Result<()> {
        if !self.mounted {
            return Err(ArchiveError::Closed(self.container.clone()));
        }
        Ok(())
    }

    fn key(&self, name: &str) -> Result<String> {
        utils::entry_key(name).ok_or_else(|| ArchiveError::InvalidName(name.to_string()))
    }
}

/// Creates the file the new archive is assembled in, next to `container`.
///
/// The staging file takes over the permissions of an existing container. For a new container
/// it gets the mode a plain `File::create` would give it.
fn staging_file(container: &Path) -> std::io::Result<NamedTempFile> {
    let dir = utils::parent_dir(container);
    match std::fs::metadata(container) {
        Ok(meta) => {
            let staging = NamedTempFile::new_in(dir)?;
            staging.as_file().set_permissions(meta.permissions())?;
            Ok(staging)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => new_file_builder().tempfile_in(dir),
        Err(e) => Err(e),
    }
}

#[cfg(unix)]
fn new_file_builder() -> tempfile::Builder<'static, 'static> {
    use std::os::unix::fs::PermissionsExt;

    let mut builder = tempfile::Builder::new();
    // masked by the process umask on creation
    builder.permissions(std::fs::Permissions::from_mode(0o666));
    builder
}

#[cfg(not(unix))]
fn new_file_builder() -> tempfile::Builder<'static, 'static> {
    tempfile::Builder::new()
}

impl Drop for ArchiveHandle {
    fn drop(&mut self) {
        if !self.mounted {
            return;
        }
        if let Err(e) = self.unmount() {
            self.observer.notify(
                Event::error("failed to unmount archive")
                    .with("container", self.container.display())
                    .with("error", e),
            );
        }
    }
}
