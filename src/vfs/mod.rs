mod entry;
mod handle;
mod host_fs;
mod zip_fs;

pub use entry::{EntryType, FileRecord};
pub use handle::{ArchiveHandle, MountMode};
pub use host_fs::{HostFS, WriteOptions};
pub use zip_fs::ZipFS;
