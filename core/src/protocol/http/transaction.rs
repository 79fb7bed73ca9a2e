/*
 * transaction.rs
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

//! Transactions bind a target host and configuration; requests are created from them.

use std::sync::Arc;
use std::thread;

use crate::callback::Closure;
use crate::config::TransactionOptions;
use crate::error::{Error, Result};
use crate::protocol::http::request::{Method, Request};

/// Engine behind a `Transaction`.
pub trait HttpTransaction: Send + Sync {
    fn options(&self) -> &TransactionOptions;

    /// Run `request` to completion on the calling thread. The request is already PENDING;
    /// on return it must be in a terminal state.
    fn perform_request(&self, request: &mut Request) -> Result<()>;

    /// Run an asynchronous request job: on the request executor if one is configured,
    /// otherwise on a fresh worker thread.
    fn dispatch(&self, job: Closure) -> Result<()> {
        match &self.options().request_executor {
            Some(executor) => executor.add(job),
            None => {
                thread::Builder::new()
                    .name("http-request".to_string())
                    .spawn(move || job.run())
                    .map_err(|e| Error::unknown(format!("cannot start request worker: {}", e)))?;
                Ok(())
            }
        }
    }
}

/// Caller's handle on a transaction.
pub struct Transaction {
    inner: Arc<dyn HttpTransaction>,
}

impl Transaction {
    pub fn new(inner: Arc<dyn HttpTransaction>) -> Self {
        Self { inner }
    }

    pub fn options(&self) -> &TransactionOptions {
        self.inner.options()
    }

    /// The only way to create a request.
    pub fn create_http_request(&self, method: Method) -> Request {
        Request::new(method, self.inner.clone())
    }

    pub fn engine(&self) -> &Arc<dyn HttpTransaction> {
        &self.inner
    }
}

/// Creates transactions. Creation does no network I/O and cannot fail.
pub trait TransactionFactory {
    /// Identifies the kind of transaction this factory makes, for diagnostics.
    fn default_id(&self) -> &str;

    fn set_default_id(&mut self, id: String);

    fn alloc(&self, options: TransactionOptions) -> Arc<dyn HttpTransaction>;

    fn create_transaction(&self, options: TransactionOptions) -> Transaction {
        Transaction::new(self.alloc(options))
    }
}
