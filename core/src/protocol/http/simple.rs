/*
 * simple.rs
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

//! Socket-backed transactions: each request borrows a pooled `Processor` and runs it to
//! completion on the factory's tokio runtime, blocking the calling thread.

use std::fmt;
use std::io;
use std::sync::Arc;

use tokio::runtime::{Builder, Handle, Runtime};

use crate::config::TransactionOptions;
use crate::error::Result;
use crate::protocol::http::pool::ProcessorPool;
use crate::protocol::http::request::Request;
use crate::protocol::http::transaction::{HttpTransaction, TransactionFactory};

/// Default id of `SimpleTransactionFactory`.
pub const SIMPLE_TRANSACTION_ID: &str = "SimpleHttpTransaction";

/// Runtime shared by a factory and its transactions. Owned runtimes shut down when the last
/// transaction and the factory are gone.
#[derive(Clone)]
struct RuntimeRef {
    handle: Handle,
    _owned: Option<Arc<Runtime>>,
}

pub struct SimpleTransactionFactory {
    default_id: String,
    runtime: RuntimeRef,
}

impl SimpleTransactionFactory {
    /// Factory with its own multi-thread runtime.
    pub fn new() -> io::Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("tagliacarte-http")
            .enable_all()
            .build()?;
        let runtime = Arc::new(runtime);
        Ok(Self {
            default_id: SIMPLE_TRANSACTION_ID.to_string(),
            runtime: RuntimeRef {
                handle: runtime.handle().clone(),
                _owned: Some(runtime),
            },
        })
    }

    /// Factory driving I/O on an existing multi-thread runtime (with I/O and time enabled).
    pub fn with_runtime_handle(handle: Handle) -> Self {
        Self {
            default_id: SIMPLE_TRANSACTION_ID.to_string(),
            runtime: RuntimeRef {
                handle,
                _owned: None,
            },
        }
    }
}

impl TransactionFactory for SimpleTransactionFactory {
    fn default_id(&self) -> &str {
        &self.default_id
    }

    fn set_default_id(&mut self, id: String) {
        self.default_id = id;
    }

    fn alloc(&self, options: TransactionOptions) -> Arc<dyn HttpTransaction> {
        Arc::new(SimpleTransaction::new(options, self.runtime.clone()))
    }
}

impl fmt::Debug for SimpleTransactionFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleTransactionFactory")
            .field("default_id", &self.default_id)
            .finish()
    }
}

pub struct SimpleTransaction {
    options: TransactionOptions,
    runtime: RuntimeRef,
    pool: ProcessorPool,
}

impl SimpleTransaction {
    fn new(options: TransactionOptions, runtime: RuntimeRef) -> Self {
        let pool = ProcessorPool::new(options.clone());
        Self {
            options,
            runtime,
            pool,
        }
    }

    pub fn pool(&self) -> &ProcessorPool {
        &self.pool
    }
}

impl HttpTransaction for SimpleTransaction {
    fn options(&self) -> &TransactionOptions {
        &self.options
    }

    fn perform_request(&self, request: &mut Request) -> Result<()> {
        let mut processor = self.pool.acquire();
        let result = self
            .runtime
            .handle
            .block_on(processor.perform_request(request));
        self.pool.release(processor);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::http::request::Method;
    use crate::protocol::http::types::StateCode;

    #[test]
    fn factory_id_and_transaction_creation() {
        let mut factory = SimpleTransactionFactory::new().unwrap();
        assert_eq!(factory.default_id(), SIMPLE_TRANSACTION_ID);
        factory.set_default_id("custom".to_string());
        assert_eq!(factory.default_id(), "custom");

        let transaction = factory.create_transaction(TransactionOptions::new("127.0.0.1", 9));
        assert_eq!(transaction.options().host, "127.0.0.1");
        let request = transaction.create_http_request(Method::Get);
        assert_eq!(request.method(), Method::Get);
        assert_eq!(request.state_code(), StateCode::Unsent);
    }

    #[test]
    fn sequential_requests_reuse_one_processor() {
        use std::io::{Read, Write};
        use std::net::TcpListener;
        use crate::protocol::http::transaction::Transaction;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        std::thread::spawn(move || {
            for _ in 0..2 {
                let (mut stream, _) = listener.accept().unwrap();
                let mut seen = Vec::new();
                let mut buf = [0u8; 1024];
                while !seen.windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = stream.read(&mut buf).unwrap();
                    if n == 0 {
                        break;
                    }
                    seen.extend_from_slice(&buf[..n]);
                }
                stream
                    .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nok")
                    .unwrap();
            }
        });

        let factory = SimpleTransactionFactory::new().unwrap();
        let engine = Arc::new(SimpleTransaction::new(
            TransactionOptions::new("127.0.0.1", port),
            factory.runtime.clone(),
        ));
        let transaction = Transaction::new(engine.clone());
        for _ in 0..2 {
            let mut request = transaction.create_http_request(Method::Get);
            request.execute().unwrap();
            assert_eq!(request.response().http_code(), 200);
        }
        assert_eq!(engine.pool().allocated_count(), 1);
        assert_eq!(engine.pool().idle_count(), 1);
    }
}
