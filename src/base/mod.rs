use std::path::Path;

mod observer;
pub mod utils;

pub use observer::{Event, LogObserver, MemoryObserver, Observer, default_observer};

/// The operations shared by every backend: whole-content read and write plus existence.
///
/// `HostFS` maps paths to host files, `ZipFS` maps them to entries of one zip container.
/// Each backend reports failures with its own error type so callers can match on
/// backend-specific variants.
pub trait FsBackend {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns true if `path` exists. A missing path is `Ok(false)`, never an error.
    fn exists<P: AsRef<Path>>(&self, path: P) -> Result<bool, Self::Error>;

    /// Reads the whole content stored at `path`.
    fn read<P: AsRef<Path>>(&self, path: P) -> Result<Vec<u8>, Self::Error>;

    /// Stores `content` at `path`, replacing whatever was there.
    fn write<P: AsRef<Path>>(&self, path: P, content: &[u8]) -> Result<(), Self::Error>;
}
