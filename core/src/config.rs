/*
 * config.rs
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

//! Transaction and request configuration.
//!
//! Everything is an explicit value: a transaction copies its `TransactionOptions` at creation
//! and hands `request_options` to every request it creates. There is no process-wide default.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::executor::{Executor, InlineExecutor};

pub const DEFAULT_PORT: u16 = 80;
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
/// How long one read may wait for the socket to become readable.
pub const READ_TIMEOUT: Duration = Duration::from_secs(5);

pub fn default_user_agent() -> String {
    format!("tagliacarte/{}", env!("CARGO_PKG_VERSION"))
}

/// Per-request tunables. Changing them after `execute` has started has no effect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    timeout: Option<Duration>,
    priority: u32,
    destroy_when_done: bool,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deadline for the whole request (connect, send and receive).
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn set_timeout_ms(&mut self, ms: u64) {
        self.timeout = if ms == 0 {
            None
        } else {
            Some(Duration::from_millis(ms))
        };
    }

    pub fn clear_timeout(&mut self) {
        self.timeout = None;
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    pub fn set_priority(&mut self, priority: u32) {
        self.priority = priority;
    }

    /// When set, an asynchronously executed request is dropped after its callback runs
    /// instead of being handed back through `PendingRequest::wait`.
    pub fn destroy_when_done(&self) -> bool {
        self.destroy_when_done
    }

    pub fn set_destroy_when_done(&mut self, toggle: bool) {
        self.destroy_when_done = toggle;
    }
}

/// Per-transaction configuration: target, identity, timeouts and executors.
#[derive(Clone)]
pub struct TransactionOptions {
    pub host: String,
    pub port: u16,
    pub user_agent: String,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    /// Runs asynchronous requests. When unset each async request gets its own worker thread.
    pub request_executor: Option<Arc<dyn Executor>>,
    /// Delivers completion callbacks.
    pub callback_executor: Arc<dyn Executor>,
    /// Initial options of every request created by the transaction.
    pub request_options: RequestOptions,
}

impl TransactionOptions {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_request_executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.request_executor = Some(executor);
        self
    }

    pub fn with_callback_executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.callback_executor = executor;
        self
    }

    pub fn with_request_options(mut self, options: RequestOptions) -> Self {
        self.request_options = options;
        self
    }

    /// Value for the Host header: port is omitted when it is the HTTP default.
    pub fn host_header(&self) -> String {
        if self.port == DEFAULT_PORT {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl Default for TransactionOptions {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_PORT,
            user_agent: default_user_agent(),
            connect_timeout: CONNECT_TIMEOUT,
            read_timeout: READ_TIMEOUT,
            request_executor: None,
            callback_executor: Arc::new(InlineExecutor::new()),
            request_options: RequestOptions::default(),
        }
    }
}

impl fmt::Debug for TransactionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionOptions")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user_agent", &self.user_agent)
            .field("connect_timeout", &self.connect_timeout)
            .field("read_timeout", &self.read_timeout)
            .field("request_executor", &self.request_executor.is_some())
            .field("request_options", &self.request_options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let o = TransactionOptions::new("example.org", 80);
        assert_eq!(o.connect_timeout, CONNECT_TIMEOUT);
        assert_eq!(o.read_timeout, READ_TIMEOUT);
        assert!(o.user_agent.starts_with("tagliacarte/"));
        assert!(o.request_executor.is_none());
        assert_eq!(o.host_header(), "example.org");
        assert_eq!(TransactionOptions::new("h", 8080).host_header(), "h:8080");
    }

    #[test]
    fn zero_timeout_clears() {
        let mut r = RequestOptions::new();
        r.set_timeout_ms(250);
        assert_eq!(r.timeout(), Some(Duration::from_millis(250)));
        r.set_timeout_ms(0);
        assert_eq!(r.timeout(), None);
        r.set_timeout_ms(10);
        r.clear_timeout();
        assert_eq!(r.timeout(), None);
    }
}
