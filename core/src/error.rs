/*
 * error.rs
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

//! Transport errors.

use std::fmt;
use std::io;

/// Error kinds surfaced by the transport layer. Success is `Ok(())`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Request was cancelled, or a deadline expired.
    Cancelled,
    /// I/O failure with no more specific classification.
    Unknown,
    /// Caller broke an API contract (e.g. executing a request twice).
    InvalidArgument,
    /// Host name could not be resolved.
    NotFound,
    /// Peer sent bytes that do not form a valid HTTP/1.1 response.
    DataLoss,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Cancelled => "CANCELLED",
            ErrorCode::Unknown => "UNKNOWN",
            ErrorCode::InvalidArgument => "INVALID_ARGUMENT",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::DataLoss => "DATA_LOSS",
        }
    }
}

/// Error carrying a code and a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    code: ErrorCode,
    message: String,
}

impl Error {
    pub fn new(code: ErrorCode, msg: impl Into<String>) -> Self {
        Self {
            code,
            message: msg.into(),
        }
    }

    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Cancelled, msg)
    }

    pub fn unknown(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unknown, msg)
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidArgument, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, msg)
    }

    pub fn data_loss(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::DataLoss, msg)
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        let code = match e.kind() {
            io::ErrorKind::TimedOut => ErrorCode::Cancelled,
            io::ErrorKind::NotFound => ErrorCode::NotFound,
            io::ErrorKind::UnexpectedEof => ErrorCode::DataLoss,
            _ => ErrorCode::Unknown,
        };
        Self::new(code, e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_code() {
        let e = Error::data_loss("bad chunk size");
        assert_eq!(e.to_string(), "DATA_LOSS: bad chunk size");
        assert_eq!(e.code(), ErrorCode::DataLoss);
        assert_eq!(e.message(), "bad chunk size");
    }

    #[test]
    fn io_error_kinds_map_to_codes() {
        let t: Error = io::Error::new(io::ErrorKind::TimedOut, "slow").into();
        assert_eq!(t.code(), ErrorCode::Cancelled);
        let r: Error = io::Error::new(io::ErrorKind::ConnectionRefused, "refused").into();
        assert_eq!(r.code(), ErrorCode::Unknown);
        let e: Error = io::Error::new(io::ErrorKind::UnexpectedEof, "eof").into();
        assert_eq!(e.code(), ErrorCode::DataLoss);
    }
}
