/*
 * request.rs
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

//! HTTP request: method, URL, headers, outbound body, options and the response it owns.
//!
//! Created by `Transaction::create_http_request`; run with `execute` (blocking) or
//! `execute_async` (completion delivered through a callback and `PendingRequest`).

use std::fmt;
use std::sync::Arc;

use tokio::sync::oneshot;

use crate::callback::{Callback1, Closure};
use crate::config::RequestOptions;
use crate::error::Result;
use crate::protocol::http::response::Response;
use crate::protocol::http::transaction::HttpTransaction;
use crate::protocol::http::types::{HeaderMap, RequestState, StateCode};
use crate::serialization::{DataReader, DataWriter, InMemoryDataReader};

/// Notified with the finished request after asynchronous execution.
pub type RequestCallback = Callback1<Request>;

/// Well-known header names.
pub mod header {
    pub const AUTHORIZATION: &str = "Authorization";
    pub const CONTENT_LENGTH: &str = "Content-Length";
    pub const CONTENT_TYPE: &str = "Content-Type";
    pub const HOST: &str = "Host";
    pub const TRANSFER_ENCODING: &str = "Transfer-Encoding";
    pub const USER_AGENT: &str = "User-Agent";
}

/// Common Content-Type values.
pub mod content_type {
    pub const HTML: &str = "text/html";
    pub const JSON: &str = "application/json";
    pub const TEXT: &str = "text/plain";
}

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Patch,
    Other(&'static str),
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Patch => "PATCH",
            Method::Other(s) => s,
        }
    }

    /// Methods for which an empty body is still announced with `Content-Length: 0`.
    pub(crate) fn expects_body(&self) -> bool {
        matches!(self, Method::Post | Method::Put | Method::Patch)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request bound to the transaction that created it.
pub struct Request {
    method: Method,
    url: String,
    headers: HeaderMap,
    options: RequestOptions,
    transaction: Arc<dyn HttpTransaction>,
    response: Response,
    content_reader: Box<dyn DataReader>,
}

impl Request {
    pub(crate) fn new(method: Method, transaction: Arc<dyn HttpTransaction>) -> Self {
        let options = transaction.options().request_options.clone();
        Self {
            method,
            url: String::new(),
            headers: HeaderMap::new(),
            options,
            transaction,
            response: Response::new(Arc::new(RequestState::new())),
            content_reader: Box::new(InMemoryDataReader::empty()),
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// Request target sent on the request line, e.g. `/index.html?q=1`.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    /// Add or replace a header. Names are case-insensitive.
    pub fn add_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name, value);
    }

    pub fn remove_header(&mut self, name: &str) {
        self.headers.remove(name);
    }

    pub fn find_header_value(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn options(&self) -> &RequestOptions {
        &self.options
    }

    /// Options take effect only if changed before `execute`.
    pub fn options_mut(&mut self) -> &mut RequestOptions {
        &mut self.options
    }

    /// Outbound body. Replaces the default empty body.
    pub fn set_content_reader(&mut self, reader: Box<dyn DataReader>) {
        self.content_reader = reader;
    }

    pub fn content_reader(&self) -> &dyn DataReader {
        self.content_reader.as_ref()
    }

    pub(crate) fn content_reader_mut(&mut self) -> &mut dyn DataReader {
        self.content_reader.as_mut()
    }

    /// Route the response body into `writer` instead of the response's own buffer.
    pub fn set_content_writer(&mut self, writer: Box<dyn DataWriter>) {
        self.response.set_body_writer(writer);
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut Response {
        &mut self.response
    }

    pub fn request_state(&self) -> &Arc<RequestState> {
        self.response.request_state()
    }

    pub fn state_code(&self) -> StateCode {
        self.request_state().state_code()
    }

    pub fn transaction(&self) -> &Arc<dyn HttpTransaction> {
        &self.transaction
    }

    /// Register (or clear) the callback run after asynchronous execution.
    pub fn set_callback(&mut self, callback: Option<RequestCallback>) {
        self.request_state().set_callback(callback);
    }

    /// Cancel an UNSENT or QUEUED request. Returns false if it already started.
    pub fn cancel(&self) -> bool {
        self.request_state().cancel()
    }

    /// Reset to UNSENT so the request can be executed again. Response headers and body are
    /// discarded; a registered callback and a caller-supplied body writer stay in place.
    pub fn clear(&mut self) {
        self.request_state().reset();
        self.response.clear();
    }

    /// Send the request and block until the response is parsed or the exchange fails.
    ///
    /// Must be called on an UNSENT request (QUEUED is accepted too); anything else is an
    /// `InvalidArgument` error and leaves the request untouched. Do not call from inside an
    /// async task: the transaction blocks on its runtime.
    pub fn execute(&mut self) -> Result<()> {
        self.request_state().start()?;
        let transaction = self.transaction.clone();
        let result = transaction.perform_request(self);
        let state = self.request_state();
        if !state.state_code().is_terminal() {
            let code = if result.is_ok() {
                StateCode::Completed
            } else {
                StateCode::Aborted
            };
            state.finish(code, result.clone());
        }
        result
    }

    /// Queue the request for execution elsewhere and return immediately.
    ///
    /// Same precondition as `execute`, except that only UNSENT is accepted; a rejected request
    /// is dropped. The callback, if any, is registered on the request state and invoked on the
    /// transaction's callback executor once the request reaches a terminal state.
    pub fn execute_async(self, callback: Option<RequestCallback>) -> Result<PendingRequest> {
        let state = self.request_state().clone();
        state.enqueue()?;
        if callback.is_some() {
            state.set_callback(callback);
        }
        let (tx, rx) = oneshot::channel();
        let transaction = self.transaction.clone();
        let job = Closure::once(move || {
            let mut request = self;
            if let Err(e) = request.execute() {
                log::debug!("async {} {} failed: {}", request.method, request.url, e);
            }
            let callback_executor = request.transaction.options().callback_executor.clone();
            if let Err(e) = callback_executor.add(Closure::once(move || request.notify(tx))) {
                log::warn!("completion of async request not delivered: {}", e);
            }
        });
        if let Err(e) = transaction.dispatch(job) {
            state.finish(StateCode::CouldNotSend, Err(e.clone()));
            return Err(e);
        }
        Ok(PendingRequest { rx, state })
    }

    fn notify(self, tx: oneshot::Sender<Request>) {
        let state = self.request_state().clone();
        if let Some(callback) = state.take_callback() {
            if let Some(repeatable) = callback.run(&self) {
                state.set_callback(Some(repeatable));
            }
        }
        if !self.options.destroy_when_done() {
            // The receiver may already be gone; then the request is simply dropped.
            let _ = tx.send(self);
        }
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &self.headers)
            .field("options", &self.options)
            .field("state", self.request_state())
            .finish()
    }
}

/// Handle to an asynchronously executing request.
pub struct PendingRequest {
    rx: oneshot::Receiver<Request>,
    state: Arc<RequestState>,
}

impl PendingRequest {
    pub fn state_code(&self) -> StateCode {
        self.state.state_code()
    }

    pub fn request_state(&self) -> &Arc<RequestState> {
        &self.state
    }

    /// Cancel if the worker has not started it yet.
    pub fn cancel(&self) -> bool {
        self.state.cancel()
    }

    /// Block until the request finishes and its callback has run. Returns None when the request
    /// was destroyed on completion (`destroy_when_done`). Not for use inside an async task.
    pub fn wait(self) -> Option<Request> {
        self.rx.blocking_recv().ok()
    }
}
