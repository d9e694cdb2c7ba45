//! Buffered vs. unbuffered read timing of one host file.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use crate::base::{Event, Observer, default_observer};
use crate::error::{StoreError, TimingError};
use crate::io::{CountingReader, ReadMethod, StreamTimer, TimingSample};

type Result<T> = std::result::Result<T, TimingError>;

const DEFAULT_BUFFER_CAPACITY: usize = 8 * 1024;

/// Result of `BufferComparator::compare()`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub unbuffered: TimingSample,
    pub buffered: TimingSample,
}

impl Comparison {
    /// `unbuffered - buffered` in nanoseconds. Negative when the buffered pass was slower,
    /// which is a valid outcome for small files.
    pub fn delta_nanos(&self) -> i128 {
        self.unbuffered.nanos() as i128 - self.buffered.nanos() as i128
    }
}

/// Times draining a file byte by byte with and without a `BufReader` in front of it.
pub struct BufferComparator {
    timer: StreamTimer,
    capacity: usize,
    observer: Arc<dyn Observer>,
}

impl Default for BufferComparator {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferComparator {
    pub fn new() -> Self {
        Self {
            timer: StreamTimer::new(),
            capacity: DEFAULT_BUFFER_CAPACITY,
            observer: default_observer(),
        }
    }

    /// Capacity of the `BufReader` used for the buffered pass; at least one byte.
    pub fn set_buffer_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
    }

    pub fn buffer_capacity(&self) -> usize {
        self.capacity
    }

    pub fn set_observer(&mut self, observer: Arc<dyn Observer>) {
        self.observer = observer;
    }

    /// Drains `stream` and returns the sample. `None` is rejected with `IllegalArgument`
    /// before any timing starts.
    pub fn measure<R: std::io::Read>(
        &self,
        stream: Option<R>,
        method: ReadMethod,
    ) -> Result<TimingSample> {
        let sample = self
            .timer
            .measure(stream, method)
            .inspect_err(|e| self.failed(method, e))?;
        self.observer.notify(
            Event::debug("stream measured")
                .with("method", method)
                .with("bytes", sample.bytes())
                .with("nanos", sample.nanos()),
        );
        Ok(sample)
    }

    /// Times one pass over `path` straight from the file, one read call per byte.
    pub fn measure_unbuffered<P: AsRef<Path>>(&self, path: P) -> Result<TimingSample> {
        let path = path.as_ref();
        let mut source = CountingReader::new(self.open(path)?);
        let sample = self.measure(Some(&mut source), ReadMethod::Unbuffered)?;
        self.report(path, sample.with_source_reads(source.reads()))
    }

    /// Times one pass over `path` through a `BufReader` of the configured capacity.
    pub fn measure_buffered<P: AsRef<Path>>(&self, path: P) -> Result<TimingSample> {
        let path = path.as_ref();
        let mut source = CountingReader::new(self.open(path)?);
        let buffered = BufReader::with_capacity(self.capacity, &mut source);
        let sample = self.measure(Some(buffered), ReadMethod::Buffered)?;
        self.report(path, sample.with_source_reads(source.reads()))
    }

    /// Times an unbuffered pass, then a buffered pass over `path`.
    ///
    /// The passes run one after the other, never concurrently, and always in this order. The
    /// second pass therefore finds the file in the OS page cache warmed by the first, which
    /// favours the buffered timing; reordering the passes changes what the delta means.
    pub fn compare<P: AsRef<Path>>(&self, path: P) -> Result<Comparison> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            let err = TimingError::IllegalArgument("path must not be empty");
            self.failed(ReadMethod::Unbuffered, &err);
            return Err(err);
        }

        let comparison = Comparison {
            unbuffered: self.measure_unbuffered(path)?,
            buffered: self.measure_buffered(path)?,
        };
        self.observer.notify(
            Event::info("read performance difference")
                .with("path", path.display())
                .with("delta_ms", comparison.delta_nanos() / 1_000_000)
                .with("delta_nanos", comparison.delta_nanos()),
        );
        Ok(comparison)
    }

    fn open(&self, path: &Path) -> Result<File> {
        File::open(path)
            .map_err(|e| TimingError::from(StoreError::from_io(path, e)))
            .inspect_err(|e| self.failed(ReadMethod::Unbuffered, e))
    }

    fn report(&self, path: &Path, sample: TimingSample) -> Result<TimingSample> {
        self.observer.notify(
            Event::info("read time")
                .with("path", path.display())
                .with("method", sample.method())
                .with("ms", sample.nanos() / 1_000_000)
                .with("source_reads", sample.source_reads().unwrap_or_default()),
        );
        Ok(sample)
    }

    fn failed(&self, method: ReadMethod, err: &TimingError) {
        self.observer.notify(
            Event::error("read measurement failed")
                .with("method", method)
                .with("error", err),
        );
    }
}
