mod comparator;
mod reader;
mod timer;

pub use comparator::{BufferComparator, Comparison};
pub use reader::CountingReader;
pub(crate) use reader::{read_byte, read_char};
pub use timer::{ReadMethod, StreamTimer, TimingSample};
