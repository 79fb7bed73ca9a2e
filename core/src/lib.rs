/*
 * lib.rs
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

//! Tagliacarte transport: a small blocking HTTP/1.1 client engine.
//!
//! ```no_run
//! use tagliacarte_transport::config::TransactionOptions;
//! use tagliacarte_transport::protocol::http::{Method, SimpleTransactionFactory, TransactionFactory};
//!
//! let factory = SimpleTransactionFactory::new().expect("runtime");
//! let transaction = factory.create_transaction(TransactionOptions::new("example.org", 80));
//! let mut request = transaction.create_http_request(Method::Get);
//! request.set_url("/");
//! request.execute().expect("request failed");
//! let mut body = Vec::new();
//! request.response_mut().get_body(&mut body).expect("body");
//! ```

pub mod callback;
pub mod config;
pub mod error;
pub mod executor;
pub mod protocol;
pub mod serialization;

pub use error::{Error, ErrorCode, Result};
