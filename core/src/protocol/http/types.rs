/*
 * types.rs
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

//! Types shared by requests and responses: header map, request lifecycle state, status codes.

use std::collections::hash_map;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use crate::error::{Error, Result};
use crate::protocol::http::request::RequestCallback;

/// Status codes the engine cares about, and classification helpers.
pub mod status_code {
    pub const CONTINUE: u16 = 100;
    pub const SWITCHING_PROTOCOLS: u16 = 101;
    pub const OK: u16 = 200;
    pub const CREATED: u16 = 201;
    pub const NO_CONTENT: u16 = 204;
    pub const MOVED_PERMANENTLY: u16 = 301;
    pub const FOUND: u16 = 302;
    pub const NOT_MODIFIED: u16 = 304;
    pub const TEMPORARY_REDIRECT: u16 = 307;
    pub const BAD_REQUEST: u16 = 400;
    pub const NOT_FOUND: u16 = 404;
    pub const INTERNAL_SERVER_ERROR: u16 = 500;
    pub const SERVICE_UNAVAILABLE: u16 = 503;

    pub fn is_valid(code: u16) -> bool {
        (100..600).contains(&code)
    }

    pub fn is_informational(code: u16) -> bool {
        (100..200).contains(&code)
    }

    pub fn is_ok(code: u16) -> bool {
        (200..300).contains(&code)
    }

    pub fn is_redirect(code: u16) -> bool {
        (300..=307).contains(&code) && code != NOT_MODIFIED
    }

    pub fn is_client_error(code: u16) -> bool {
        (400..500).contains(&code)
    }

    pub fn is_server_error(code: u16) -> bool {
        (500..600).contains(&code)
    }

    /// 1xx, 204 and 304 responses never carry a body.
    pub fn forbids_body(code: u16) -> bool {
        is_informational(code) || code == NO_CONTENT || code == NOT_MODIFIED
    }
}

/// Header collection keyed by lower-cased name. Setting a name again replaces its value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    map: HashMap<String, String>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.map.insert(name.to_ascii_lowercase(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.map.remove(&name.to_ascii_lowercase())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.map.get(&name.to_ascii_lowercase()).map(|s| s.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(&name.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Iterate (lower-cased name, value) pairs in no particular order.
    pub fn iter(&self) -> hash_map::Iter<'_, String, String> {
        self.map.iter()
    }
}

impl<'a> IntoIterator for &'a HeaderMap {
    type Item = (&'a String, &'a String);
    type IntoIter = hash_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.map.iter()
    }
}

/// Lifecycle of a request: UNSENT → QUEUED → PENDING → one terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateCode {
    /// Not sent yet.
    Unsent,
    /// Handed to an executor (async) but not started.
    Queued,
    /// A processor is working on it.
    Pending,
    /// A valid HTTP response was received.
    Completed,
    /// Connect or send failed.
    CouldNotSend,
    /// A deadline expired.
    TimedOut,
    /// Cancelled before it was sent.
    Cancelled,
    /// Failed while receiving or parsing the response.
    Aborted,
}

impl StateCode {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StateCode::Unsent | StateCode::Queued | StateCode::Pending)
    }
}

impl fmt::Display for StateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StateCode::Unsent => "UNSENT",
            StateCode::Queued => "QUEUED",
            StateCode::Pending => "PENDING",
            StateCode::Completed => "COMPLETED",
            StateCode::CouldNotSend => "COULD_NOT_SEND",
            StateCode::TimedOut => "TIMED_OUT",
            StateCode::Cancelled => "CANCELLED",
            StateCode::Aborted => "ABORTED",
        };
        f.write_str(s)
    }
}

struct StateInner {
    code: StateCode,
    http_code: u16,
    transaction_status: Result<()>,
    callback: Option<RequestCallback>,
}

/// State shared by a request and its response. All access goes through one lock.
pub struct RequestState {
    inner: Mutex<StateInner>,
}

impl RequestState {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StateInner {
                code: StateCode::Unsent,
                http_code: 0,
                transaction_status: Ok(()),
                callback: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StateInner> {
        // Every critical section leaves the state consistent, so a poisoned lock is still usable.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn state_code(&self) -> StateCode {
        self.lock().code
    }

    pub fn set_state_code(&self, code: StateCode) {
        self.lock().code = code;
    }

    /// Last HTTP status code received (0 before any status line).
    pub fn http_code(&self) -> u16 {
        self.lock().http_code
    }

    pub fn set_http_code(&self, code: u16) {
        self.lock().http_code = code;
    }

    /// Outcome of the last execution.
    pub fn transaction_status(&self) -> Result<()> {
        self.lock().transaction_status.clone()
    }

    pub fn has_callback(&self) -> bool {
        self.lock().callback.is_some()
    }

    pub(crate) fn set_callback(&self, callback: Option<RequestCallback>) {
        self.lock().callback = callback;
    }

    pub(crate) fn take_callback(&self) -> Option<RequestCallback> {
        self.lock().callback.take()
    }

    /// UNSENT or QUEUED → CANCELLED. Returns false once a processor has started.
    pub fn cancel(&self) -> bool {
        let mut s = self.lock();
        match s.code {
            StateCode::Unsent | StateCode::Queued => {
                s.code = StateCode::Cancelled;
                s.transaction_status = Err(Error::cancelled("request cancelled"));
                true
            }
            _ => false,
        }
    }

    /// UNSENT → QUEUED for asynchronous execution.
    pub(crate) fn enqueue(&self) -> Result<()> {
        let mut s = self.lock();
        match s.code {
            StateCode::Unsent => {
                s.code = StateCode::Queued;
                Ok(())
            }
            StateCode::Cancelled => Err(Error::cancelled("request cancelled")),
            other => Err(Error::invalid_argument(format!(
                "cannot execute request in state {}; call clear() before reusing",
                other
            ))),
        }
    }

    /// UNSENT or QUEUED → PENDING, atomically with respect to `cancel`.
    pub(crate) fn start(&self) -> Result<()> {
        let mut s = self.lock();
        match s.code {
            StateCode::Unsent | StateCode::Queued => {
                s.code = StateCode::Pending;
                s.http_code = 0;
                s.transaction_status = Ok(());
                Ok(())
            }
            StateCode::Cancelled => Err(Error::cancelled("request cancelled")),
            other => Err(Error::invalid_argument(format!(
                "cannot execute request in state {}; call clear() before reusing",
                other
            ))),
        }
    }

    /// Record the terminal state and status of an execution.
    pub(crate) fn finish(&self, code: StateCode, status: Result<()>) {
        let mut s = self.lock();
        s.code = code;
        s.transaction_status = status;
    }

    /// Back to UNSENT; a registered callback stays registered.
    pub(crate) fn reset(&self) {
        let mut s = self.lock();
        s.code = StateCode::Unsent;
        s.http_code = 0;
        s.transaction_status = Ok(());
    }
}

impl Default for RequestState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.lock();
        f.debug_struct("RequestState")
            .field("code", &s.code)
            .field("http_code", &s.http_code)
            .field("transaction_status", &s.transaction_status)
            .field("has_callback", &s.callback.is_some())
            .finish()
    }
}
