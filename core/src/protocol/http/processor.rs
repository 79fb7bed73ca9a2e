/*
 * processor.rs
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

//! Socket processor: connect, send one request, parse the reply, close.
//!
//! All per-call state (parser, receive buffer, socket) is reset on every `perform_request`.
//! The connection is never kept alive.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{lookup_host, TcpStream};
use tokio::time::timeout;

use crate::config::TransactionOptions;
use crate::error::{Error, Result};
use crate::protocol::http::h1::{H1ResponseHandler, ResponseParser};
use crate::protocol::http::request::{Method, Request};
use crate::protocol::http::response::Response;
use crate::protocol::http::types::StateCode;

const READ_CHUNK: usize = 8192;
const SEND_CHUNK: usize = 8192;

/// A failed exchange and the terminal state it leaves the request in.
struct Failure {
    state: StateCode,
    error: Error,
}

impl Failure {
    fn could_not_send(error: Error) -> Self {
        Self {
            state: StateCode::CouldNotSend,
            error,
        }
    }

    fn aborted(error: Error) -> Self {
        Self {
            state: StateCode::Aborted,
            error,
        }
    }

    fn timed_out(msg: String) -> Self {
        Self {
            state: StateCode::TimedOut,
            error: Error::cancelled(msg),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyFraming {
    None,
    Fixed(u64),
    Chunked,
}

/// Bridges parser callbacks to the Response.
struct ResponseSink<'a> {
    response: &'a mut Response,
}

impl H1ResponseHandler for ResponseSink<'_> {
    fn status(&mut self, version: &str, code: u16, reason: &str) {
        log::debug!("HTTP/{} {} {}", version, code, reason);
        self.response.set_status(version, code, reason);
    }

    fn header(&mut self, name: &str, value: &str) {
        self.response.add_header(name, value);
    }

    fn body_chunk(&mut self, data: &[u8]) -> Result<()> {
        self.response.write_body(data)
    }

    fn trailer(&mut self, name: &str, value: &str) {
        self.response.add_header(name, value);
    }

    fn complete(&mut self) {
        self.response.finish_body();
    }
}

/// Performs the connect/send/receive/parse cycle for one request at a time.
pub struct Processor {
    id: usize,
    host: String,
    port: u16,
    host_header: String,
    user_agent: String,
    connect_timeout: Duration,
    read_timeout: Duration,
    stream: Option<TcpStream>,
    parser: ResponseParser,
    read_buf: BytesMut,
}

impl Processor {
    pub fn new(id: usize, options: &TransactionOptions) -> Self {
        Self {
            id,
            host: options.host.clone(),
            port: options.port,
            host_header: options.host_header(),
            user_agent: options.user_agent.clone(),
            connect_timeout: options.connect_timeout,
            read_timeout: options.read_timeout,
            stream: None,
            parser: ResponseParser::new(),
            read_buf: BytesMut::with_capacity(READ_CHUNK),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Run the whole exchange for `request` (already PENDING) and record its terminal state.
    /// The socket is closed on every path.
    pub async fn perform_request(&mut self, request: &mut Request) -> Result<()> {
        self.parser.reset();
        self.parser.set_head_request(request.method() == Method::Head);
        self.read_buf.clear();

        let outcome = match request.options().timeout() {
            Some(limit) => {
                let result = timeout(limit, self.exchange(request)).await;
                result.unwrap_or_else(|_| {
                    Err(Failure::timed_out(format!(
                        "request to {}:{} timed out after {:?}",
                        self.host, self.port, limit
                    )))
                })
            }
            None => self.exchange(request).await,
        };
        self.close().await;

        let state = request.request_state();
        match outcome {
            Ok(()) => {
                log::debug!(
                    "{} {} on {}:{} completed with {}",
                    request.method(),
                    request.url(),
                    self.host,
                    self.port,
                    request.response().http_code()
                );
                state.finish(StateCode::Completed, Ok(()));
                Ok(())
            }
            Err(f) => {
                log::warn!(
                    "{} {} on {}:{} failed ({}): {}",
                    request.method(),
                    request.url(),
                    self.host,
                    self.port,
                    f.state,
                    f.error
                );
                state.finish(f.state, Err(f.error.clone()));
                Err(f.error)
            }
        }
    }

    async fn exchange(&mut self, request: &mut Request) -> std::result::Result<(), Failure> {
        let (head, framing) = self.serialize_head(request).map_err(Failure::could_not_send)?;
        self.connect().await?;
        self.send(&head, framing, request).await?;
        self.receive(request.response_mut()).await
    }

    /// Request line, fixed headers, caller headers and body framing, up to the blank line.
    fn serialize_head(&self, request: &Request) -> Result<(Vec<u8>, BodyFraming)> {
        let url = if request.url().is_empty() {
            "/"
        } else {
            request.url()
        };
        if url.bytes().any(|b| b == b' ' || b == b'\r' || b == b'\n') {
            return Err(Error::invalid_argument(format!("invalid request target: {:?}", url)));
        }
        let mut head = format!(
            "{} {} HTTP/1.1\r\nHost: {}\r\nAccept-Encoding: identity\r\n",
            request.method().as_str(),
            url,
            self.host_header
        );
        if !self.user_agent.is_empty() && !request.headers().contains("user-agent") {
            head.push_str("User-Agent: ");
            head.push_str(&self.user_agent);
            head.push_str("\r\n");
        }
        for (name, value) in request.headers() {
            if matches!(name.as_str(), "host" | "accept-encoding" | "connection") {
                continue;
            }
            if name.bytes().chain(value.bytes()).any(|b| b == b'\r' || b == b'\n') {
                return Err(Error::invalid_argument(format!("invalid header: {}", name)));
            }
            head.push_str(name);
            head.push_str(": ");
            head.push_str(value);
            head.push_str("\r\n");
        }

        let declared = match request.find_header_value("content-length") {
            Some(v) => Some(v.trim().parse::<u64>().map_err(|_| {
                Error::invalid_argument(format!("invalid Content-Length header: {:?}", v))
            })?),
            None => None,
        };
        let encoding = request.find_header_value("transfer-encoding");
        let available = request.content_reader().total_length();
        let framing = match (encoding, declared) {
            (Some(_), Some(_)) => {
                return Err(Error::invalid_argument(
                    "both Content-Length and Transfer-Encoding set",
                ))
            }
            (Some(te), None) => {
                if !te.split(',').any(|c| c.trim().eq_ignore_ascii_case("chunked")) {
                    head.push_str("Transfer-Encoding: chunked\r\n");
                }
                BodyFraming::Chunked
            }
            (None, Some(declared)) => {
                if let Some(n) = available.filter(|&n| n != declared) {
                    return Err(Error::invalid_argument(format!(
                        "Content-Length {} does not match body length {}",
                        declared, n
                    )));
                }
                BodyFraming::Fixed(declared)
            }
            (None, None) => match available {
                Some(0) => {
                    if request.method().expects_body() {
                        head.push_str("Content-Length: 0\r\n");
                    }
                    BodyFraming::None
                }
                Some(n) => {
                    head.push_str(&format!("Content-Length: {}\r\n", n));
                    BodyFraming::Fixed(n)
                }
                None => {
                    head.push_str("Transfer-Encoding: chunked\r\n");
                    BodyFraming::Chunked
                }
            },
        };
        head.push_str("Connection: close\r\n\r\n");
        Ok((head.into_bytes(), framing))
    }

    async fn resolve(host: &str, port: u16) -> Result<SocketAddr> {
        if let Ok(ip) = host.parse::<Ipv4Addr>() {
            return Ok(SocketAddr::new(IpAddr::V4(ip), port));
        }
        let addrs = lookup_host((host, port))
            .await
            .map_err(|e| Error::not_found(format!("cannot resolve {}: {}", host, e)))?;
        addrs
            .into_iter()
            .find(|a| a.is_ipv4())
            .ok_or_else(|| Error::not_found(format!("no IPv4 address for {}", host)))
    }

    async fn connect(&mut self) -> std::result::Result<(), Failure> {
        let host = self.host.clone();
        let port = self.port;
        let open = async move {
            let addr = Self::resolve(&host, port).await?;
            log::debug!("connecting to {}:{} ({})", host, port, addr);
            TcpStream::connect(addr)
                .await
                .map_err(|e| Error::unknown(format!("connect to {} failed: {}", addr, e)))
        };
        let stream = match timeout(self.connect_timeout, open).await {
            Ok(r) => r.map_err(Failure::could_not_send)?,
            Err(_) => {
                return Err(Failure::timed_out(format!(
                    "connect to {}:{} timed out",
                    self.host, self.port
                )))
            }
        };
        let _ = stream.set_nodelay(true);
        self.stream = Some(stream);
        Ok(())
    }

    async fn send(
        &mut self,
        head: &[u8],
        framing: BodyFraming,
        request: &mut Request,
    ) -> std::result::Result<(), Failure> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| Failure::could_not_send(Error::unknown("not connected")))?;
        let io_err =
            |e: std::io::Error| Failure::could_not_send(Error::unknown(format!("send failed: {}", e)));
        stream.write_all(head).await.map_err(io_err)?;

        if framing != BodyFraming::None {
            let reader = request.content_reader_mut();
            if !reader.reset() {
                return Err(Failure::could_not_send(Error::invalid_argument(
                    "content reader cannot be rewound",
                )));
            }
            let mut chunk = Vec::with_capacity(SEND_CHUNK);
            let mut sent: u64 = 0;
            loop {
                chunk.clear();
                let n = reader
                    .read_into_buffer(SEND_CHUNK, &mut chunk)
                    .map_err(Failure::could_not_send)?;
                if n == 0 {
                    break;
                }
                if let BodyFraming::Fixed(declared) = framing {
                    if sent + n as u64 > declared {
                        return Err(Failure::could_not_send(Error::invalid_argument(format!(
                            "content reader produced more than the {} bytes declared",
                            declared
                        ))));
                    }
                }
                sent += n as u64;
                if framing == BodyFraming::Chunked {
                    stream
                        .write_all(format!("{:x}\r\n", n).as_bytes())
                        .await
                        .map_err(io_err)?;
                    stream.write_all(&chunk).await.map_err(io_err)?;
                    stream.write_all(b"\r\n").await.map_err(io_err)?;
                } else {
                    stream.write_all(&chunk).await.map_err(io_err)?;
                }
            }
            reader.status().map_err(Failure::could_not_send)?;
            match framing {
                BodyFraming::Chunked => {
                    stream.write_all(b"0\r\n\r\n").await.map_err(io_err)?;
                }
                BodyFraming::Fixed(declared) if declared != sent => {
                    return Err(Failure::could_not_send(Error::invalid_argument(format!(
                        "content reader produced {} bytes, {} declared",
                        sent, declared
                    ))));
                }
                _ => {}
            }
        }
        stream.flush().await.map_err(io_err)?;
        log::debug!("sent request to {}:{}", self.host, self.port);
        Ok(())
    }

    async fn receive(&mut self, response: &mut Response) -> std::result::Result<(), Failure> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| Failure::aborted(Error::unknown("not connected")))?;
        let mut sink = ResponseSink { response };
        while !self.parser.is_complete() {
            self.read_buf.reserve(READ_CHUNK);
            let n = match timeout(self.read_timeout, stream.read_buf(&mut self.read_buf)).await {
                Ok(Ok(n)) => n,
                Ok(Err(e)) => {
                    return Err(Failure::aborted(Error::unknown(format!(
                        "receive from {}:{} failed: {}",
                        self.host, self.port, e
                    ))))
                }
                Err(_) => {
                    return Err(Failure::timed_out(format!(
                        "no data from {}:{} for {:?}",
                        self.host, self.port, self.read_timeout
                    )))
                }
            };
            if n == 0 {
                self.parser.finish(&mut sink).map_err(Failure::aborted)?;
                break;
            }
            self.parser
                .receive(&mut self.read_buf, &mut sink)
                .map_err(Failure::aborted)?;
        }
        Ok(())
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn resolve(host: &str, port: u16) -> Result<SocketAddr> {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(Processor::resolve(host, port))
    }

    #[test]
    fn dotted_quad_needs_no_lookup() {
        let addr = resolve("192.0.2.7", 8080).unwrap();
        assert_eq!(addr, "192.0.2.7:8080".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn ipv6_only_host_is_not_found() {
        let err = resolve("::1", 80).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
        assert!(err.message().contains("no IPv4 address"), "{}", err);
    }

    #[test]
    fn unresolvable_name_is_not_found() {
        let err = resolve("nonexistent.invalid", 80).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }
}
