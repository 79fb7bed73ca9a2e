/*
 * response.rs
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

//! HTTP response: status, headers and the two body channels.
//!
//! The parser pushes body bytes into the writer channel; callers pull them from the reader
//! channel. Without a caller-supplied writer the bytes are buffered and become an in-memory
//! reader when the response completes.

use std::fmt;
use std::sync::Arc;

use bytes::BytesMut;

use crate::error::{Error, Result};
use crate::protocol::http::types::{HeaderMap, RequestState};
use crate::serialization::{DataReader, DataWriter, InMemoryDataReader};

pub struct Response {
    state: Arc<RequestState>,
    version: String,
    reason: String,
    headers: HeaderMap,
    body_reader: Option<Box<dyn DataReader>>,
    body_writer: Option<Box<dyn DataWriter>>,
    body_buffer: BytesMut,
}

impl Response {
    pub(crate) fn new(state: Arc<RequestState>) -> Self {
        Self {
            state,
            version: String::new(),
            reason: String::new(),
            headers: HeaderMap::new(),
            body_reader: None,
            body_writer: None,
            body_buffer: BytesMut::new(),
        }
    }

    pub fn request_state(&self) -> &Arc<RequestState> {
        &self.state
    }

    /// Status code of the response (0 until a status line arrives).
    pub fn http_code(&self) -> u16 {
        self.state.http_code()
    }

    pub fn set_http_code(&self, code: u16) {
        self.state.set_http_code(code);
    }

    /// HTTP version from the status line, e.g. "1.1".
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Start of a (possibly interim) response: headers seen so far are discarded.
    pub(crate) fn set_status(&mut self, version: &str, code: u16, reason: &str) {
        self.version = version.to_string();
        self.reason = reason.to_string();
        self.headers.clear();
        self.state.set_http_code(code);
    }

    pub fn add_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name, value);
    }

    pub fn find_header_value(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn set_body_reader(&mut self, reader: Box<dyn DataReader>) {
        self.body_reader = Some(reader);
    }

    pub fn body_reader(&mut self) -> Option<&mut (dyn DataReader + 'static)> {
        self.body_reader.as_deref_mut()
    }

    pub fn take_body_reader(&mut self) -> Option<Box<dyn DataReader>> {
        self.body_reader.take()
    }

    pub fn set_body_writer(&mut self, writer: Box<dyn DataWriter>) {
        self.body_writer = Some(writer);
    }

    pub fn take_body_writer(&mut self) -> Option<Box<dyn DataWriter>> {
        self.body_writer.take()
    }

    pub(crate) fn write_body(&mut self, data: &[u8]) -> Result<()> {
        match self.body_writer.as_mut() {
            Some(w) => w.write_data(data),
            None => {
                self.body_buffer.extend_from_slice(data);
                Ok(())
            }
        }
    }

    /// Body is complete: buffered bytes become the body reader.
    pub(crate) fn finish_body(&mut self) {
        if self.body_writer.is_none() {
            let body = self.body_buffer.split().freeze();
            self.body_reader = Some(Box::new(InMemoryDataReader::new(body)));
        }
    }

    /// Rewind the body reader and append the whole body to `out`. Returns the reader's
    /// terminal status. A response without a body reader appends nothing.
    pub fn get_body(&mut self, out: &mut Vec<u8>) -> Result<()> {
        let reader = match self.body_reader.as_mut() {
            Some(r) => r,
            None => return Ok(()),
        };
        if !reader.reset() {
            return Err(Error::invalid_argument(
                "body reader is not seekable and has already been read",
            ));
        }
        reader.read_remaining(out)?;
        reader.status()
    }

    pub(crate) fn clear(&mut self) {
        self.version.clear();
        self.reason.clear();
        self.headers.clear();
        self.body_buffer.clear();
        self.body_reader = None;
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("http_code", &self.http_code())
            .field("reason", &self.reason)
            .field("headers", &self.headers)
            .field("has_body_reader", &self.body_reader.is_some())
            .field("has_body_writer", &self.body_writer.is_some())
            .finish()
    }
}
