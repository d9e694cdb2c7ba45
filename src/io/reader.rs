use std::io::{self, Read};
use std::string::FromUtf8Error;

/// Wraps a reader and counts the `read` calls that reach it and the bytes they return.
///
/// Placed under a `BufReader` it shows how many reads actually hit the source.
#[derive(Debug)]
pub struct CountingReader<R> {
    inner: R,
    reads: u64,
    bytes: u64,
}

impl<R: Read> CountingReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            reads: 0,
            bytes: 0,
        }
    }

    /// Number of `read` calls forwarded to the inner reader, including the final one at
    /// end of data.
    pub fn reads(&self) -> u64 {
        self.reads
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reads += 1;
        let n = self.inner.read(buf)?;
        self.bytes += n as u64;
        Ok(n)
    }
}

/// Reads a single byte; `None` at end of data.
pub(crate) fn read_byte<R: Read>(reader: &mut R) -> io::Result<Option<u8>> {
    let mut byte = [0u8; 1];
    loop {
        match reader.read(&mut byte) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(byte[0])),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Reads a single UTF-8 encoded char, pulling only as many bytes as its lead byte announces.
///
/// `None` at end of data. An invalid or truncated sequence yields `Some(Err(_))`; the reader is
/// then positioned after the bytes consumed for it.
pub(crate) fn read_char<R: Read>(
    reader: &mut R,
) -> io::Result<Option<Result<char, FromUtf8Error>>> {
    let Some(lead) = read_byte(reader)? else {
        return Ok(None);
    };
    let width = match lead {
        0x00..=0x7f => 1,
        0xc2..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf4 => 4,
        _ => 1, // never valid as a lead byte; decoding below reports it
    };

    let mut encoded = vec![lead];
    while encoded.len() < width {
        match read_byte(reader)? {
            Some(byte) => encoded.push(byte),
            None => break,
        }
    }
    Ok(String::from_utf8(encoded)
        .map(|decoded| decoded.chars().next())
        .transpose())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufReader;

    #[test]
    fn test_counts_reads_and_bytes() {
        let mut reader = CountingReader::new(&b"hello"[..]);
        let mut buf = [0u8; 2];

        while reader.read(&mut buf).unwrap() > 0 {}

        assert_eq!(CountingReader::bytes(&reader), 5);
        assert_eq!(reader.reads(), 4); // 2 + 2 + 1 + end of data
    }

    #[test]
    fn test_read_char_decodes_multibyte() {
        let mut reader = CountingReader::new("aж€😀".as_bytes());
        let mut chars = Vec::new();

        while let Some(ch) = read_char(&mut reader).unwrap() {
            chars.push(ch.unwrap());
        }

        assert_eq!(chars, vec!['a', 'ж', '€', '😀']);
        assert_eq!(CountingReader::bytes(&reader), 10);
    }

    #[test]
    fn test_read_char_rejects_invalid_sequences() {
        let mut stray = &[0x80u8, b'a'][..];
        assert!(read_char(&mut stray).unwrap().unwrap().is_err());
        assert_eq!(read_char(&mut stray).unwrap().unwrap().unwrap(), 'a');

        let mut truncated = &[0xd0u8][..];
        assert!(read_char(&mut truncated).unwrap().unwrap().is_err());
        assert!(read_char(&mut truncated).unwrap().is_none());
    }

    #[test]
    fn test_buffering_reduces_source_reads() {
        let data = vec![7u8; 1000];
        let mut counting = CountingReader::new(&data[..]);
        {
            let mut buffered = BufReader::with_capacity(512, &mut counting);
            let mut byte = [0u8; 1];
            while buffered.read(&mut byte).unwrap() > 0 {}
        }

        assert_eq!(CountingReader::bytes(&counting), 1000);
        assert_eq!(counting.reads(), 3);
        assert!(counting.into_inner().is_empty());
    }
}
