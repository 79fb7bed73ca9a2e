/*
 * reader.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Tagliacarte, a cross-platform email client.
 *
 * Tagliacarte is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Tagliacarte is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Tagliacarte.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Pull-style byte readers.

use std::io::Read;

use bytes::Bytes;

use crate::error::{Error, Result};

const READ_CHUNK: usize = 8192;

/// Sequential reader over a body. Offsets count bytes already consumed.
pub trait DataReader: Send {
    /// Whether `set_offset` may move to any position.
    fn is_seekable(&self) -> bool;

    /// True once the end of the stream (or an error) has been reached.
    fn is_done(&self) -> bool;

    /// Terminal status; an error is latched once it occurs.
    fn status(&self) -> Result<()>;

    fn offset(&self) -> u64;

    /// Total length in bytes, if known up front.
    fn total_length(&self) -> Option<u64>;

    /// Move to `position`. Non-seekable readers only accept their current offset.
    fn set_offset(&mut self, position: u64) -> Result<u64>;

    /// Append up to `max` bytes to `storage`; returns the number appended (0 at end).
    fn read_into_buffer(&mut self, max: usize, storage: &mut Vec<u8>) -> Result<usize>;

    fn reset(&mut self) -> bool {
        matches!(self.set_offset(0), Ok(0))
    }

    /// Drain everything left into `storage`.
    fn read_remaining(&mut self, storage: &mut Vec<u8>) -> Result<usize> {
        let mut total = 0;
        loop {
            let n = self.read_into_buffer(READ_CHUNK, storage)?;
            if n == 0 {
                return Ok(total);
            }
            total += n;
        }
    }
}

/// Seekable reader over an immutable buffer.
#[derive(Debug, Clone)]
pub struct InMemoryDataReader {
    data: Bytes,
    offset: usize,
}

impl InMemoryDataReader {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            offset: 0,
        }
    }

    pub fn empty() -> Self {
        Self::new(Bytes::new())
    }
}

impl DataReader for InMemoryDataReader {
    fn is_seekable(&self) -> bool {
        true
    }

    fn is_done(&self) -> bool {
        self.offset >= self.data.len()
    }

    fn status(&self) -> Result<()> {
        Ok(())
    }

    fn offset(&self) -> u64 {
        self.offset as u64
    }

    fn total_length(&self) -> Option<u64> {
        Some(self.data.len() as u64)
    }

    fn set_offset(&mut self, position: u64) -> Result<u64> {
        if position > self.data.len() as u64 {
            return Err(Error::invalid_argument(format!(
                "offset {} past end of {} byte buffer",
                position,
                self.data.len()
            )));
        }
        self.offset = position as usize;
        Ok(position)
    }

    fn read_into_buffer(&mut self, max: usize, storage: &mut Vec<u8>) -> Result<usize> {
        let remaining = self.data.len() - self.offset;
        let n = remaining.min(max);
        storage.extend_from_slice(&self.data[self.offset..self.offset + n]);
        self.offset += n;
        Ok(n)
    }
}

/// Forward-only reader over any `io::Read`. The declared length, if given, is advisory
/// (used for Content-Length); reading stops at EOF of the inner reader.
pub struct IoDataReader<R> {
    inner: R,
    length: Option<u64>,
    offset: u64,
    done: bool,
    status: Result<()>,
}

impl<R: Read + Send> IoDataReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            length: None,
            offset: 0,
            done: false,
            status: Ok(()),
        }
    }

    pub fn with_length(inner: R, length: u64) -> Self {
        Self {
            length: Some(length),
            ..Self::new(inner)
        }
    }
}

impl<R: Read + Send> DataReader for IoDataReader<R> {
    fn is_seekable(&self) -> bool {
        false
    }

    fn is_done(&self) -> bool {
        self.done
    }

    fn status(&self) -> Result<()> {
        self.status.clone()
    }

    fn offset(&self) -> u64 {
        self.offset
    }

    fn total_length(&self) -> Option<u64> {
        self.length
    }

    fn set_offset(&mut self, position: u64) -> Result<u64> {
        if position == self.offset {
            return Ok(position);
        }
        Err(Error::invalid_argument(format!(
            "stream reader cannot seek from {} to {}",
            self.offset, position
        )))
    }

    fn read_into_buffer(&mut self, max: usize, storage: &mut Vec<u8>) -> Result<usize> {
        if self.done {
            return self.status.clone().map(|_| 0);
        }
        let start = storage.len();
        storage.resize(start + max, 0);
        match self.inner.read(&mut storage[start..]) {
            Ok(n) => {
                storage.truncate(start + n);
                if n == 0 {
                    self.done = true;
                }
                self.offset += n as u64;
                Ok(n)
            }
            Err(e) => {
                storage.truncate(start);
                let err = Error::from(e);
                self.done = true;
                self.status = Err(err.clone());
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use std::io;

    #[test]
    fn in_memory_reads_in_pieces_and_resets() {
        let mut r = InMemoryDataReader::new(&b"hello world"[..]);
        assert_eq!(r.total_length(), Some(11));
        let mut out = Vec::new();
        assert_eq!(r.read_into_buffer(5, &mut out).unwrap(), 5);
        assert_eq!(out, b"hello");
        assert!(!r.is_done());
        assert_eq!(r.read_remaining(&mut out).unwrap(), 6);
        assert!(r.is_done());
        assert!(r.reset());
        assert_eq!(r.offset(), 0);
        out.clear();
        r.read_remaining(&mut out).unwrap();
        assert_eq!(out, b"hello world");
    }

    #[test]
    fn io_reader_cannot_rewind_after_reading() {
        let mut r = IoDataReader::new(io::Cursor::new(b"abc".to_vec()));
        assert!(r.reset());
        let mut out = Vec::new();
        r.read_remaining(&mut out).unwrap();
        assert_eq!(out, b"abc");
        assert!(r.is_done());
        assert!(!r.reset());
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk on fire"))
        }
    }

    #[test]
    fn io_reader_latches_errors() {
        let mut r = IoDataReader::new(Broken);
        let mut out = Vec::new();
        assert!(r.read_into_buffer(16, &mut out).is_err());
        assert!(out.is_empty());
        assert!(r.is_done());
        assert_eq!(r.status().unwrap_err().code(), ErrorCode::Unknown);
    }
}
