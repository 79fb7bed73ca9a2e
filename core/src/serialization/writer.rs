/*
 * writer.rs
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

//! Push-style byte sinks.

use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};

/// Sink for body bytes.
pub trait DataWriter: Send {
    fn write_data(&mut self, data: &[u8]) -> Result<()>;
}

/// Clonable writer over a shared buffer; keep one clone to inspect what was written.
#[derive(Debug, Clone, Default)]
pub struct SharedBufferWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl SharedBufferWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Vec<u8> {
        match self.buf.lock() {
            Ok(b) => b.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        match self.buf.lock() {
            Ok(b) => b.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DataWriter for SharedBufferWriter {
    fn write_data(&mut self, data: &[u8]) -> Result<()> {
        let mut b = self
            .buf
            .lock()
            .map_err(|_| Error::unknown("body buffer lock poisoned"))?;
        b.extend_from_slice(data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_buffer() {
        let sink = SharedBufferWriter::new();
        assert!(sink.is_empty());
        let mut w: Box<dyn DataWriter> = Box::new(sink.clone());
        w.write_data(b"Wiki").unwrap();
        w.write_data(b"pedia").unwrap();
        assert_eq!(sink.contents(), b"Wikipedia");
        assert_eq!(sink.len(), 9);
    }
}
