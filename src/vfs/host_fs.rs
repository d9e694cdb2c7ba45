//! Whole-file operations on the host file system.
//!
//! `HostFS` works on already-resolved host paths and keeps no state between calls:
//! every `stat()` and `list_dir()` asks the host again.
//!
//! ### Key Features:
//! - **Typed failures**: every error is a [`StoreError`] variant (`NotFound`, `PermissionDenied`,
//!   `AlreadyExists`, `Decode`, `Io`).
//! - **All-or-nothing copy**: `copy()` stages the content next to the target and renames it into
//!   place, so the target holds either the old or the new content, never a prefix.
//! - **Explicit parents**: writes create missing parent directories only when asked through
//!   [`WriteOptions`].

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use std::sync::Arc;

use tempfile::NamedTempFile;

use crate::base::{Event, FsBackend, Observer, default_observer, utils};
use crate::error::StoreError;
use crate::io::{read_byte, read_char};
use crate::vfs::FileRecord;

type Result<T> = std::result::Result<T, StoreError>;

/// Options for `write_text_with()` and `write_bytes_with()`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Create missing parent directories before writing.
    pub create_parents: bool,
}

/// Plain file store over the host file system.
///
/// ### Example:
/// ```no_run
/// use zipfs_kit::HostFS;
///
/// let fs = HostFS::new();
/// fs.write_text("/tmp/notes.txt", "Hello NIO Files!").unwrap();
/// fs.copy("/tmp/notes.txt", "/tmp/notes_copy.txt", true).unwrap();
/// fs.move_file("/tmp/notes_copy.txt", "/tmp/notes_renamed.txt", true).unwrap();
/// assert_eq!(fs.stat("/tmp/notes_renamed.txt").unwrap().size(), 16);
/// fs.delete("/tmp/notes_renamed.txt", false).unwrap();
/// ```
pub struct HostFS {
    observer: Arc<dyn Observer>,
}

impl Default for HostFS {
    fn default() -> Self {
        Self::new()
    }
}

impl HostFS {
    /// Creates a store that reports to the `log` facade.
    pub fn new() -> Self {
        Self {
            observer: default_observer(),
        }
    }

    pub fn set_observer(&mut self, observer: Arc<dyn Observer>) {
        self.observer = observer;
    }

    /// Writes `content` as UTF-8, truncating any existing file.
    pub fn write_text<P: AsRef<Path>>(&self, path: P, content: &str) -> Result<()> {
        self.write_bytes_with(path, content.as_bytes(), WriteOptions::default())
    }

    pub fn write_text_with<P: AsRef<Path>>(
        &self,
        path: P,
        content: &str,
        options: WriteOptions,
    ) -> Result<()> {
        self.write_bytes_with(path, content.as_bytes(), options)
    }

    pub fn write_bytes<P: AsRef<Path>>(&self, path: P, content: &[u8]) -> Result<()> {
        self.write_bytes_with(path, content, WriteOptions::default())
    }

    /// Writes `content`, truncating any existing file.
    /// Parent directories are created only with `options.create_parents`.
    pub fn write_bytes_with<P: AsRef<Path>>(
        &self,
        path: P,
        content: &[u8],
        options: WriteOptions,
    ) -> Result<()> {
        let path = path.as_ref();
        let written = (|| -> io::Result<()> {
            if options.create_parents {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(path, content)
        })();
        written
            .map_err(|e| StoreError::from_io(path, e))
            .inspect(|_| {
                self.observer.notify(
                    Event::info("file written")
                        .with("path", path.display())
                        .with("bytes", content.len()),
                )
            })
            .inspect_err(|e| self.failed("write", e))
    }

    /// Reads the whole file and decodes it as UTF-8.
    pub fn read_text<P: AsRef<Path>>(&self, path: P) -> Result<String> {
        let path = path.as_ref();
        let bytes = self.read_bytes(path)?;
        String::from_utf8(bytes)
            .map_err(|source| StoreError::Decode {
                path: path.to_path_buf(),
                source,
            })
            .inspect_err(|e| self.failed("read", e))
    }

    /// Reads the file as UTF-8 text split into lines, without line terminators.
    pub fn read_lines<P: AsRef<Path>>(&self, path: P) -> Result<Vec<String>> {
        let text = self.read_text(path)?;
        Ok(text.lines().map(str::to_owned).collect())
    }

    pub fn read_bytes<P: AsRef<Path>>(&self, path: P) -> Result<Vec<u8>> {
        let path = path.as_ref();
        std::fs::read(path)
            .map_err(|e| StoreError::from_io(path, e))
            .inspect(|bytes| {
                self.observer.notify(
                    Event::debug("file read")
                        .with("path", path.display())
                        .with("bytes", bytes.len()),
                )
            })
            .inspect_err(|e| self.failed("read", e))
    }

    /// Reads the file one byte per `read` call on the unbuffered file, reporting every byte
    /// as a debug event.
    pub fn read_byte_stream<P: AsRef<Path>>(&self, path: P) -> Result<Vec<u8>> {
        let path = path.as_ref();
        let to_err = |e: io::Error| StoreError::from_io(path, e);
        let streamed = (|| -> Result<Vec<u8>> {
            let mut file = File::open(path).map_err(to_err)?;
            self.stream_opened(path, "bytes");
            let mut bytes = Vec::new();
            while let Some(byte) = read_byte(&mut file).map_err(to_err)? {
                self.observer.notify(Event::debug("byte read").with("value", byte));
                bytes.push(byte);
            }
            Ok(bytes)
        })();
        streamed
            .inspect(|bytes| self.stream_finished(path, bytes.len()))
            .inspect_err(|e| self.failed("read_byte_stream", e))
    }

    /// Reads the file as UTF-8 one char at a time, reporting every char as a debug event.
    ///
    /// Unlike collecting `read_byte_stream()` output byte by byte into chars, multi-byte
    /// sequences are decoded as a whole. An invalid sequence fails with `Decode`.
    pub fn read_char_stream<P: AsRef<Path>>(&self, path: P) -> Result<String> {
        let path = path.as_ref();
        let to_err = |e: io::Error| StoreError::from_io(path, e);
        let streamed = (|| -> Result<String> {
            let mut reader = BufReader::new(File::open(path).map_err(to_err)?);
            self.stream_opened(path, "chars");
            let mut text = String::new();
            while let Some(decoded) = read_char(&mut reader).map_err(to_err)? {
                let ch = decoded.map_err(|source| StoreError::Decode {
                    path: path.to_path_buf(),
                    source,
                })?;
                self.observer.notify(Event::debug("char read").with("value", ch));
                text.push(ch);
            }
            Ok(text)
        })();
        streamed
            .inspect(|text| self.stream_finished(path, text.chars().count()))
            .inspect_err(|e| self.failed("read_char_stream", e))
    }

    /// Creates `path` and all missing parents. Existing directories are not an error.
    pub fn create_dir_all<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)
            .map_err(|e| StoreError::from_io(path, e))
            .inspect(|_| {
                self.observer
                    .notify(Event::info("directory created").with("path", path.display()))
            })
            .inspect_err(|e| self.failed("create_dir_all", e))
    }

    /// Copies `src` to `dst`.
    ///
    /// Fails with `AlreadyExists` if `dst` exists and `replace_existing` is false.
    /// The content is staged in `dst`'s directory and renamed over `dst`, so a failed copy
    /// leaves `dst` untouched.
    pub fn copy<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        src: P,
        dst: Q,
        replace_existing: bool,
    ) -> Result<()> {
        let (src, dst) = (src.as_ref(), dst.as_ref());
        self.copy_staged(src, dst, replace_existing)
            .inspect(|_| {
                self.observer.notify(
                    Event::info("file copied")
                        .with("from", src.display())
                        .with("to", dst.display()),
                )
            })
            .inspect_err(|e| self.failed("copy", e))
    }

    /// Moves `src` to `dst`.
    ///
    /// A same-filesystem move is a single rename. When the rename crosses devices the file is
    /// copied and then the source removed; the source is kept if the copy fails.
    pub fn move_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        src: P,
        dst: Q,
        replace_existing: bool,
    ) -> Result<()> {
        let (src, dst) = (src.as_ref(), dst.as_ref());
        self.move_or_copy(src, dst, replace_existing)
            .inspect(|_| {
                self.observer.notify(
                    Event::info("file moved")
                        .with("from", src.display())
                        .with("to", dst.display()),
                )
            })
            .inspect_err(|e| self.failed("move", e))
    }

    /// Returns size, modification time and kind of `path`.
    pub fn stat<P: AsRef<Path>>(&self, path: P) -> Result<FileRecord> {
        let path = path.as_ref();
        std::fs::metadata(path)
            .and_then(|meta| FileRecord::from_metadata(path, &meta))
            .map_err(|e| StoreError::from_io(path, e))
            .inspect_err(|e| self.failed("stat", e))
    }

    /// Lists the immediate children of the directory `path`.
    ///
    /// The iterator reads the directory lazily; calling `list_dir()` again starts a fresh
    /// traversal. Entries that vanish while iterating are yielded as `NotFound` errors.
    pub fn list_dir<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> Result<impl Iterator<Item = Result<FileRecord>> + use<P>> {
        let dir = path.as_ref().to_path_buf();
        let entries = std::fs::read_dir(&dir)
            .map_err(|e| StoreError::from_io(&dir, e))
            .inspect_err(|e| self.failed("list_dir", e))?;

        Ok(entries.map(move |entry| {
            let entry = entry.map_err(|e| StoreError::from_io(&dir, e))?;
            let path = entry.path();
            entry
                .metadata()
                .and_then(|meta| FileRecord::from_metadata(&path, &meta))
                .map_err(|e| StoreError::from_io(&path, e))
        }))
    }

    /// Removes a file or an empty directory.
    /// With `if_exists`, a missing `path` is a successful no-op.
    pub fn delete<P: AsRef<Path>>(&self, path: P, if_exists: bool) -> Result<()> {
        let path = path.as_ref();
        match utils::rm_on_host(path) {
            Ok(()) => {
                self.observer
                    .notify(Event::info("file deleted").with("path", path.display()));
                Ok(())
            }
            Err(e) if if_exists && e.kind() == io::ErrorKind::NotFound => {
                self.observer
                    .notify(Event::debug("nothing to delete").with("path", path.display()));
                Ok(())
            }
            Err(e) => {
                let err = StoreError::from_io(path, e);
                self.failed("delete", &err);
                Err(err)
            }
        }
    }

    fn copy_staged(&self, src: &Path, dst: &Path, replace_existing: bool) -> Result<()> {
        if !replace_existing && exists_on_host(dst)? {
            return Err(StoreError::AlreadyExists(dst.to_path_buf()));
        }

        let mut input = File::open(src).map_err(|e| StoreError::from_io(src, e))?;
        let permissions = input
            .metadata()
            .map_err(|e| StoreError::from_io(src, e))?
            .permissions();

        let to_dst = |e: io::Error| StoreError::from_io(dst, e);
        let mut staged = NamedTempFile::new_in(utils::parent_dir(dst)).map_err(to_dst)?;
        io::copy(&mut input, &mut staged).map_err(to_dst)?;
        staged.as_file().set_permissions(permissions).map_err(to_dst)?;
        staged.as_file().sync_all().map_err(to_dst)?;

        if replace_existing {
            staged.persist(dst).map_err(|e| to_dst(e.error))?;
        } else {
            staged.persist_noclobber(dst).map_err(|e| to_dst(e.error))?;
        }
        Ok(())
    }

    fn move_or_copy(&self, src: &Path, dst: &Path, replace_existing: bool) -> Result<()> {
        if !exists_on_host(src)? {
            return Err(StoreError::NotFound(src.to_path_buf()));
        }
        if !replace_existing && exists_on_host(dst)? {
            return Err(StoreError::AlreadyExists(dst.to_path_buf()));
        }

        match std::fs::rename(src, dst) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
                self.copy_staged(src, dst, replace_existing)?;
                std::fs::remove_file(src).map_err(|e| StoreError::from_io(src, e))
            }
            Err(e) => Err(StoreError::from_io(src, e)),
        }
    }

    fn stream_opened(&self, path: &Path, unit: &'static str) {
        self.observer.notify(
            Event::info("stream opened")
                .with("path", path.display())
                .with("unit", unit),
        );
    }

    fn stream_finished(&self, path: &Path, units: usize) {
        self.observer.notify(
            Event::info("stream finished")
                .with("path", path.display())
                .with("units", units),
        );
    }

    fn failed(&self, operation: &'static str, err: &StoreError) {
        self.observer.notify(
            Event::error("file operation failed")
                .with("operation", operation)
                .with("error", err),
        );
    }
}

fn exists_on_host(path: &Path) -> Result<bool> {
    std::fs::exists(path).map_err(|e| StoreError::from_io(path, e))
}

impl FsBackend for HostFS {
    type Error = StoreError;

    fn exists<P: AsRef<Path>>(&self, path: P) -> Result<bool> {
        exists_on_host(path.as_ref())
    }

    fn read<P: AsRef<Path>>(&self, path: P) -> Result<Vec<u8>> {
        self.read_bytes(path)
    }

    fn write<P: AsRef<Path>>(&self, path: P, content: &[u8]) -> Result<()> {
        self.write_bytes(path, content)
    }
}
