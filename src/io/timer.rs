use std::fmt;
use std::io::{self, Read};
use std::time::{Duration, Instant};

use crate::error::TimingError;

/// How a measured stream was read.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ReadMethod {
    Unbuffered,
    Buffered,
}

impl fmt::Display for ReadMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadMethod::Unbuffered => f.write_str("unbuffered"),
            ReadMethod::Buffered => f.write_str("buffered"),
        }
    }
}

/// One measured drain of a stream.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TimingSample {
    elapsed: Duration,
    bytes: u64,
    source_reads: Option<u64>,
    method: ReadMethod,
}

impl TimingSample {
    pub fn new(elapsed: Duration, bytes: u64, method: ReadMethod) -> Self {
        Self {
            elapsed,
            bytes,
            source_reads: None,
            method,
        }
    }

    pub(crate) fn with_source_reads(mut self, reads: u64) -> Self {
        self.source_reads = Some(reads);
        self
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn nanos(&self) -> u128 {
        self.elapsed.as_nanos()
    }

    /// Bytes drained from the stream.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Read calls that reached the underlying file, when the sample was taken on one.
    pub fn source_reads(&self) -> Option<u64> {
        self.source_reads
    }

    pub fn method(&self) -> ReadMethod {
        self.method
    }
}

/// Measures the wall-clock time needed to drain a stream one byte per `read` call.
#[derive(Debug, Default, Clone, Copy)]
pub struct StreamTimer;

impl StreamTimer {
    pub fn new() -> Self {
        Self
    }

    /// Drains `stream` to end of data and returns the elapsed nanoseconds.
    /// A read error aborts the measurement; no partial time is reported.
    pub fn time<R: Read>(&self, stream: &mut R) -> Result<u128, TimingError> {
        let (elapsed, _) = self.drain(stream)?;
        Ok(elapsed.as_nanos())
    }

    /// Like `time()`, also returning the number of bytes drained.
    ///
    /// A read that fails with `ErrorKind::Interrupted` delivered no data and is issued again; it
    /// does not count as a failure. Any other error ends the drain.
    pub fn drain<R: Read>(&self, stream: &mut R) -> io::Result<(Duration, u64)> {
        let mut byte = [0u8; 1];
        let mut count = 0u64;

        let start = Instant::now();
        loop {
            match stream.read(&mut byte) {
                Ok(0) => break,
                Ok(_) => count += 1,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok((start.elapsed(), count))
    }

    /// Drains `stream` and labels the result with `method`.
    /// `None` stands for an absent stream and is rejected before the clock starts.
    pub fn measure<R: Read>(
        &self,
        stream: Option<R>,
        method: ReadMethod,
    ) -> Result<TimingSample, TimingError> {
        let mut stream =
            stream.ok_or(TimingError::IllegalArgument("input stream must not be absent"))?;
        let (elapsed, bytes) = self.drain(&mut stream)?;
        Ok(TimingSample::new(elapsed, bytes, method))
    }
}
