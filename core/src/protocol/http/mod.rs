/*
 * mod.rs
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

//! HTTP/1.1 client engine.
//!
//! Design:
//! - `TransactionFactory` makes a `Transaction` bound to one host:port and a copy of its
//!   `TransactionOptions`; a transaction makes `Request`s, each owning its `Response`.
//! - `Request::execute` blocks; `Request::execute_async` runs on a request executor or worker
//!   thread and reports through a callback on the callback executor.
//! - `SimpleTransaction` pools `Processor`s. A processor opens a TCP socket, writes the request,
//!   drives the `h1::ResponseParser` state machine and closes the socket, on a tokio runtime.
//! - Faults never abort: they come back as `Error` values and a terminal `StateCode`.
//! - No TLS, no keep-alive, no redirects, no retries.

mod pool;
mod processor;
mod request;
mod response;
mod simple;
mod transaction;
mod types;

pub mod h1;

pub use pool::ProcessorPool;
pub use processor::Processor;
pub use request::{content_type, header, Method, PendingRequest, Request, RequestCallback};
pub use response::Response;
pub use simple::{SimpleTransaction, SimpleTransactionFactory, SIMPLE_TRANSACTION_ID};
pub use transaction::{HttpTransaction, Transaction, TransactionFactory};
pub use types::{status_code, HeaderMap, RequestState, StateCode};
