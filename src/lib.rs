//! A small file-access kit: zip containers mounted as file systems, whole-file operations on
//! the host, and timing of buffered vs. unbuffered stream reads.
//!
//! ### Overview
//!
//! `zipfs-kit` offers three independent pieces:
//! - [`ZipFS`] treats one zip container as a file system of slash-rooted entries. Each
//!   operation mounts the container, performs one logical step on an [`ArchiveHandle`] and
//!   unmounts it again, on error paths too.
//! - [`HostFS`] reads, writes, copies, moves, deletes and inspects plain host files.
//! - [`BufferComparator`] drains a file byte by byte with and without buffering and reports
//!   both [`TimingSample`]s.
//!
//! **Key ideas**:
//! - **Scoped resources**: a mounted container is always unmounted and flushed, whichever way
//!   the operation ends.
//! - **Typed failures**: [`ArchiveError`], [`StoreError`] and [`TimingError`] are plain enums to
//!   match on; a missing entry never looks like a corrupt archive.
//! - **Injected observers**: components report structured [`Event`]s to an [`Observer`] chosen
//!   by the caller ([`LogObserver`] by default).
//! - **Common seam**: [`FsBackend`] lets generic code read and write through either backend.

mod base;
mod error;
mod io;
mod vfs;

pub use base::{Event, FsBackend, LogObserver, MemoryObserver, Observer};
pub use error::{ArchiveError, StoreError, TimingError};
pub use io::{BufferComparator, Comparison, CountingReader, ReadMethod, StreamTimer, TimingSample};
pub use vfs::{ArchiveHandle, EntryType, FileRecord, HostFS, MountMode, WriteOptions, ZipFS};

/// Compression methods accepted by [`ZipFS::set_compression`].
pub use zip::CompressionMethod;
