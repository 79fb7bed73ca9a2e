/*
 * parser.rs
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

//! HTTP/1.1 response push parser: status line, headers, body (Content-Length, chunked or
//! read-until-close), footers.

use bytes::{Buf, BytesMut};

use crate::error::{Error, Result};
use crate::protocol::http::types::status_code;

/// Longest status, header, chunk-size or footer line accepted.
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Callback for HTTP/1.1 response events. The processor implements this and fills the Response.
pub trait H1ResponseHandler {
    /// A status line was parsed. Interim (100 Continue) responses produce more than one.
    fn status(&mut self, version: &str, code: u16, reason: &str);
    fn header(&mut self, name: &str, value: &str);
    fn body_chunk(&mut self, data: &[u8]) -> Result<()>;
    /// Footer line after the last chunk.
    fn trailer(&mut self, name: &str, value: &str);
    fn complete(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    StatusLine,
    Headers,
    /// Raw body bytes: a Content-Length body, a chunk's data, or everything until close.
    Body,
    ChunkLen,
    /// Chunk data consumed; expecting its terminating CRLF.
    ChunkEnd,
    Footers,
    Complete,
}

/// Push parser for one HTTP/1.1 response. Feed bytes via `receive`, call `finish` at EOF.
#[derive(Debug)]
pub struct ResponseParser {
    state: ParseState,
    code: u16,
    chunked: bool,
    content_length: Option<u64>,
    /// Bytes still expected in the current body or chunk; None reads until close.
    remaining: Option<u64>,
    received_any: bool,
    /// Answer to a HEAD request: framing headers describe a body that is never sent.
    head_request: bool,
}

impl ResponseParser {
    pub fn new() -> Self {
        Self {
            state: ParseState::StatusLine,
            code: 0,
            chunked: false,
            content_length: None,
            remaining: None,
            received_any: false,
            head_request: false,
        }
    }

    /// Parser for the response to a request with the given method name.
    pub fn for_method(method: &str) -> Self {
        let mut parser = Self::new();
        parser.set_head_request(method.eq_ignore_ascii_case("HEAD"));
        parser
    }

    /// Complete the final response at the end of its headers, whatever its framing says.
    pub fn set_head_request(&mut self, head_request: bool) {
        self.head_request = head_request;
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state == ParseState::Complete
    }

    /// Status code of the most recent status line (0 before one is parsed).
    pub fn http_code(&self) -> u16 {
        self.code
    }

    pub fn is_chunked(&self) -> bool {
        self.chunked
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Split one line off the front of buf, without its LF or CRLF terminator.
    fn take_line(buf: &mut BytesMut) -> Result<Option<BytesMut>> {
        match buf.iter().position(|&b| b == b'\n') {
            Some(n) => {
                if n > MAX_LINE_LENGTH {
                    return Err(Error::data_loss("line too long"));
                }
                let mut line = buf.split_to(n + 1);
                line.truncate(n);
                if line.last() == Some(&b'\r') {
                    line.truncate(n - 1);
                }
                Ok(Some(line))
            }
            None if buf.len() > MAX_LINE_LENGTH => Err(Error::data_loss("line too long")),
            None => Ok(None),
        }
    }

    fn line_str<'a>(line: &'a [u8], what: &str) -> Result<&'a str> {
        std::str::from_utf8(line).map_err(|_| Error::data_loss(format!("invalid {} UTF-8", what)))
    }

    fn split_header(line: &str) -> Result<(&str, &str)> {
        let colon = line
            .find(':')
            .ok_or_else(|| Error::data_loss(format!("header line without colon: {:?}", line)))?;
        let name = line[..colon].trim();
        if name.is_empty() {
            return Err(Error::data_loss("header line without name"));
        }
        Ok((name, line[colon + 1..].trim()))
    }

    /// Consume and parse as much as possible from buf. Handler is called for each complete token.
    /// A partial line stays in buf until more bytes arrive.
    pub fn receive<H: H1ResponseHandler + ?Sized>(
        &mut self,
        buf: &mut BytesMut,
        handler: &mut H,
    ) -> Result<()> {
        if !buf.is_empty() {
            self.received_any = true;
        }
        while !buf.is_empty() {
            match self.state {
                ParseState::StatusLine => {
                    let line = match Self::take_line(buf)? {
                        Some(l) => l,
                        None => return Ok(()),
                    };
                    // Tolerate stray blank lines before the status line.
                    if line.is_empty() {
                        continue;
                    }
                    self.parse_status_line(&line, handler)?;
                    self.state = ParseState::Headers;
                }
                ParseState::Headers => {
                    let line = match Self::take_line(buf)? {
                        Some(l) => l,
                        None => return Ok(()),
                    };
                    if line.is_empty() {
                        if self.code == status_code::CONTINUE {
                            self.state = ParseState::StatusLine;
                        } else {
                            self.begin_body(handler);
                        }
                        continue;
                    }
                    let line_str = Self::line_str(&line, "header")?;
                    let (name, value) = Self::split_header(line_str)?;
                    if name.eq_ignore_ascii_case("transfer-encoding") {
                        if value.split(',').any(|v| v.trim().eq_ignore_ascii_case("chunked")) {
                            self.chunked = true;
                        }
                    } else if name.eq_ignore_ascii_case("content-length") {
                        self.content_length = value.parse::<u64>().ok();
                    }
                    handler.header(name, value);
                }
                ParseState::Body => match self.remaining {
                    Some(remaining) => {
                        let to_read = (remaining.min(buf.len() as u64)) as usize;
                        let chunk = buf.split_to(to_read);
                        handler.body_chunk(&chunk)?;
                        let left = remaining - to_read as u64;
                        self.remaining = Some(left);
                        if left == 0 {
                            if self.chunked {
                                self.state = ParseState::ChunkEnd;
                            } else {
                                self.complete(handler);
                            }
                        }
                    }
                    None => {
                        // Read until close: deliver everything available.
                        let chunk = buf.split_to(buf.len());
                        handler.body_chunk(&chunk)?;
                    }
                },
                ParseState::ChunkLen => {
                    let line = match Self::take_line(buf)? {
                        Some(l) => l,
                        None => return Ok(()),
                    };
                    let size = Self::parse_chunk_size(&line)?;
                    if size == 0 {
                        self.state = ParseState::Footers;
                    } else {
                        self.remaining = Some(size);
                        self.state = ParseState::Body;
                    }
                }
                ParseState::ChunkEnd => {
                    let line = match Self::take_line(buf)? {
                        Some(l) => l,
                        None => return Ok(()),
                    };
                    if !line.is_empty() {
                        return Err(Error::data_loss("chunk data longer than its declared size"));
                    }
                    self.state = ParseState::ChunkLen;
                }
                ParseState::Footers => {
                    let line = match Self::take_line(buf)? {
                        Some(l) => l,
                        None => return Ok(()),
                    };
                    if line.is_empty() {
                        self.complete(handler);
                    } else {
                        let line_str = Self::line_str(&line, "footer")?;
                        let (name, value) = Self::split_header(line_str)?;
                        handler.trailer(name, value);
                    }
                }
                ParseState::Complete => {
                    // Nothing follows a complete response on a non-persistent connection.
                    buf.advance(buf.len());
                }
            }
        }
        Ok(())
    }

    /// The peer closed the connection. Completes a read-until-close body; anything else
    /// short of Complete is a truncated response.
    pub fn finish<H: H1ResponseHandler + ?Sized>(&mut self, handler: &mut H) -> Result<()> {
        match self.state {
            ParseState::Complete => Ok(()),
            ParseState::Body if self.remaining.is_none() => {
                self.complete(handler);
                Ok(())
            }
            ParseState::StatusLine if !self.received_any => {
                Err(Error::data_loss("connection closed without a response"))
            }
            state => Err(Error::data_loss(format!(
                "connection closed before response complete (in {:?})",
                state
            ))),
        }
    }

    fn parse_status_line<H: H1ResponseHandler + ?Sized>(
        &mut self,
        line: &[u8],
        handler: &mut H,
    ) -> Result<()> {
        let line_str = Self::line_str(line, "status line")?;
        // HTTP/1.1 200 OK or HTTP/1.1 200
        let rest = line_str
            .strip_prefix("HTTP/")
            .ok_or_else(|| Error::data_loss(format!("malformed status line: {:?}", line_str)))?;
        let mut parts = rest.splitn(3, ' ');
        let version = parts.next().unwrap_or("");
        let code_str = parts.next().unwrap_or("");
        let reason = parts.next().unwrap_or("").trim();
        if version.is_empty()
            || code_str.len() != 3
            || !code_str.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(Error::data_loss(format!("malformed status line: {:?}", line_str)));
        }
        let code: u16 = code_str
            .parse()
            .map_err(|_| Error::data_loss(format!("malformed status code: {:?}", code_str)))?;
        if !status_code::is_valid(code) {
            return Err(Error::data_loss(format!("status code {} out of range", code)));
        }
        self.code = code;
        self.chunked = false;
        self.content_length = None;
        self.remaining = None;
        handler.status(version, code, reason);
        Ok(())
    }

    fn parse_chunk_size(line: &[u8]) -> Result<u64> {
        let line_str = Self::line_str(line, "chunk size")?;
        let hex = line_str.split(';').next().unwrap_or("").trim();
        if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::data_loss(format!("invalid chunk size: {:?}", line_str)));
        }
        u64::from_str_radix(hex, 16)
            .map_err(|_| Error::data_loss(format!("chunk size overflow: {:?}", hex)))
    }

    /// Decide body framing once the headers are done.
    fn begin_body<H: H1ResponseHandler + ?Sized>(&mut self, handler: &mut H) {
        if self.head_request || status_code::forbids_body(self.code) {
            self.complete(handler);
        } else if self.chunked {
            self.remaining = None;
            self.state = ParseState::ChunkLen;
        } else {
            match self.content_length {
                Some(0) => self.complete(handler),
                Some(n) => {
                    self.remaining = Some(n);
                    self.state = ParseState::Body;
                }
                None => {
                    self.remaining = None;
                    self.state = ParseState::Body;
                }
            }
        }
    }

    fn complete<H: H1ResponseHandler + ?Sized>(&mut self, handler: &mut H) {
        self.state = ParseState::Complete;
        handler.complete();
    }
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[derive(Default)]
    struct Recorder {
        statuses: Vec<(String, u16, String)>,
        headers: Vec<(String, String)>,
        trailers: Vec<(String, String)>,
        body: Vec<u8>,
        completed: usize,
    }

    impl H1ResponseHandler for Recorder {
        fn status(&mut self, version: &str, code: u16, reason: &str) {
            self.statuses.push((version.to_string(), code, reason.to_string()));
            self.headers.clear();
        }
        fn header(&mut self, name: &str, value: &str) {
            self.headers.push((name.to_ascii_lowercase(), value.to_string()));
        }
        fn body_chunk(&mut self, data: &[u8]) -> Result<()> {
            self.body.extend_from_slice(data);
            Ok(())
        }
        fn trailer(&mut self, name: &str, value: &str) {
            self.trailers.push((name.to_string(), value.to_string()));
        }
        fn complete(&mut self) {
            self.completed += 1;
        }
    }

    fn parse_all(input: &[u8]) -> (ResponseParser, Recorder, Result<()>) {
        let mut p = ResponseParser::new();
        let mut r = Recorder::default();
        let mut buf = BytesMut::from(input);
        let res = p.receive(&mut buf, &mut r);
        (p, r, res)
    }

    #[test]
    fn content_length_body() {
        let (p, r, res) = parse_all(b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello");
        res.unwrap();
        assert!(p.is_complete());
        assert_eq!(r.statuses, vec![("1.1".to_string(), 200, "OK".to_string())]);
        assert_eq!(r.headers, vec![("content-length".to_string(), "5".to_string())]);
        assert_eq!(r.body, b"hello");
        assert_eq!(r.completed, 1);
    }

    #[test]
    fn chunked_body() {
        let (p, r, res) = parse_all(
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n",
        );
        res.unwrap();
        assert!(p.is_complete());
        assert!(p.is_chunked());
        assert_eq!(r.body, b"Wikipedia");
        assert!(r.trailers.is_empty());
    }

    #[test]
    fn chunked_wins_over_content_length_and_keeps_footers() {
        let (p, r, res) = parse_all(
            b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\nTransfer-Encoding: Chunked\r\n\r\n3;ext=1\r\nabc\r\n0\r\nX-Checksum: 42\r\n\r\n",
        );
        res.unwrap();
        assert!(p.is_complete());
        assert_eq!(r.body, b"abc");
        assert_eq!(r.trailers, vec![("X-Checksum".to_string(), "42".to_string())]);
    }

    #[test]
    fn bodiless_status_codes_ignore_framing_headers() {
        for code in ["204 No Content", "304 Not Modified", "101 Switching Protocols"] {
            let input = format!(
                "HTTP/1.1 {}\r\nContent-Length: 5\r\nTransfer-Encoding: chunked\r\n\r\nhello",
                code
            );
            let (p, r, res) = parse_all(input.as_bytes());
            res.unwrap();
            assert!(p.is_complete(), "{}", code);
            assert!(r.body.is_empty(), "{}", code);
            assert_eq!(r.completed, 1);
        }
    }

    #[test]
    fn head_response_ends_at_headers() {
        for framing in ["Content-Length: 1234", "Transfer-Encoding: chunked", "X-None: 1"] {
            let mut p = ResponseParser::for_method("HEAD");
            let mut r = Recorder::default();
            let input = format!(
                "HTTP/1.1 100 Continue\r\n\r\nHTTP/1.1 200 OK\r\n{}\r\n\r\n",
                framing
            );
            let mut buf = BytesMut::from(input.as_bytes());
            p.receive(&mut buf, &mut r).unwrap();
            assert!(p.is_complete(), "{}", framing);
            assert_eq!(p.http_code(), 200);
            assert!(r.body.is_empty());
            assert_eq!(r.completed, 1);
            p.finish(&mut r).unwrap();
        }
        assert!(!ResponseParser::for_method("GET").head_request);
    }

    #[test]
    fn continue_reenters_status_line() {
        let (p, r, res) = parse_all(
            b"HTTP/1.1 100 Continue\r\nX-Interim: yes\r\n\r\nHTTP/1.1 201 Created\r\nContent-Length: 2\r\n\r\nok",
        );
        res.unwrap();
        assert!(p.is_complete());
        assert_eq!(p.http_code(), 201);
        assert_eq!(r.statuses.len(), 2);
        assert_eq!(r.statuses[0].1, 100);
        assert_eq!(r.headers, vec![("content-length".to_string(), "2".to_string())]);
        assert_eq!(r.body, b"ok");
        assert_eq!(r.completed, 1);
    }

    #[test]
    fn continue_alone_is_not_complete() {
        let (p, r, res) = parse_all(b"HTTP/1.1 100 Continue\r\n\r\n");
        res.unwrap();
        assert_eq!(p.state(), ParseState::StatusLine);
        assert_eq!(r.completed, 0);
    }

    #[test]
    fn read_until_close() {
        let (mut p, mut r, res) = parse_all(b"HTTP/1.0 200 OK\r\nServer: test\r\n\r\nsome bytes");
        res.unwrap();
        assert_eq!(p.state(), ParseState::Body);
        let mut more = BytesMut::from(&b" and more"[..]);
        p.receive(&mut more, &mut r).unwrap();
        p.finish(&mut r).unwrap();
        assert!(p.is_complete());
        assert_eq!(r.body, b"some bytes and more");
        assert_eq!(r.completed, 1);
    }

    #[test]
    fn bare_lf_and_reason_without_text() {
        let (p, r, res) = parse_all(b"HTTP/1.1 404\nContent-Length: 0\n\n");
        res.unwrap();
        assert!(p.is_complete());
        assert_eq!(r.statuses, vec![("1.1".to_string(), 404, String::new())]);
    }

    #[test]
    fn malformed_status_lines_are_data_loss() {
        for input in [
            &b"HTP/1.1 200 OK\r\n"[..],
            &b"HTTP/1.1\r\n"[..],
            &b"HTTP/1.1 20 OK\r\n"[..],
            &b"HTTP/1.1 2000 OK\r\n"[..],
            &b"HTTP/1.1 abc OK\r\n"[..],
            &b"HTTP/1.1 099 Low\r\n"[..],
            &b"HTTP/1.1 600 High\r\n"[..],
        ] {
            let (_, _, res) = parse_all(input);
            assert_eq!(
                res.unwrap_err().code(),
                ErrorCode::DataLoss,
                "{}",
                String::from_utf8_lossy(input)
            );
        }
    }

    #[test]
    fn header_without_colon_is_data_loss() {
        let (_, _, res) = parse_all(b"HTTP/1.1 200 OK\r\nBroken header\r\n\r\n");
        assert_eq!(res.unwrap_err().code(), ErrorCode::DataLoss);
    }

    #[test]
    fn bad_chunk_size_and_overrun() {
        let (_, _, res) =
            parse_all(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\nzz\r\n");
        assert_eq!(res.unwrap_err().code(), ErrorCode::DataLoss);
        let (_, _, res) =
            parse_all(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n2\r\nabc\r\n0\r\n\r\n");
        assert_eq!(res.unwrap_err().code(), ErrorCode::DataLoss);
    }

    #[test]
    fn truncated_response_fails_on_finish() {
        let (mut p, mut r, res) = parse_all(b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\nshort");
        res.unwrap();
        assert_eq!(p.finish(&mut r).unwrap_err().code(), ErrorCode::DataLoss);

        let mut p = ResponseParser::new();
        let mut r = Recorder::default();
        let err = p.finish(&mut r).unwrap_err();
        assert!(err.message().contains("without a response"));
    }

    #[test]
    fn overlong_line_is_rejected() {
        let mut input = b"HTTP/1.1 200 OK\r\nX-Big: ".to_vec();
        input.extend(std::iter::repeat(b'a').take(MAX_LINE_LENGTH + 1));
        let (_, _, res) = parse_all(&input);
        assert_eq!(res.unwrap_err().code(), ErrorCode::DataLoss);
    }

    #[test]
    fn byte_at_a_time_matches_whole() {
        let input = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n";
        let mut p = ResponseParser::new();
        let mut r = Recorder::default();
        let mut buf = BytesMut::new();
        for b in input.iter() {
            buf.extend_from_slice(&[*b]);
            p.receive(&mut buf, &mut r).unwrap();
        }
        assert!(p.is_complete());
        assert_eq!(r.body, b"Wikipedia");
        assert_eq!(r.completed, 1);
    }

    #[test]
    fn random_chunk_sequences_reconstruct_full_length() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..200 {
            let count = rng.gen_range(0..12);
            let mut wire = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n".to_vec();
            let mut expected = Vec::new();
            for _ in 0..count {
                let size: usize = rng.gen_range(1..3000);
                let data: Vec<u8> = (0..size).map(|_| rng.gen()).collect();
                if rng.gen_bool(0.5) {
                    wire.extend_from_slice(format!("{:x}\r\n", size).as_bytes());
                } else {
                    wire.extend_from_slice(format!("{:X}\r\n", size).as_bytes());
                }
                wire.extend_from_slice(&data);
                wire.extend_from_slice(b"\r\n");
                expected.extend_from_slice(&data);
            }
            wire.extend_from_slice(b"0\r\n\r\n");

            let mut p = ResponseParser::new();
            let mut r = Recorder::default();
            let mut buf = BytesMut::new();
            let mut pos = 0;
            while pos < wire.len() {
                let step = rng.gen_range(1..512).min(wire.len() - pos);
                buf.extend_from_slice(&wire[pos..pos + step]);
                pos += step;
                p.receive(&mut buf, &mut r).unwrap();
            }
            assert!(p.is_complete());
            assert_eq!(r.body.len(), expected.len());
            assert_eq!(r.body, expected);
        }
    }
}
