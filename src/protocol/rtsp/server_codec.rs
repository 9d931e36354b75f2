//! Server-side RTSP codec for parsing requests and generating responses
//!
//! The decoder is a line-oriented state machine:
//! `RequestLine -> Headers -> Body -> (complete request)`.
//! Request lines with fewer than three space-separated tokens are dropped
//! and decoding resumes with the next line. Header lines without a colon
//! are ignored. A declared `Content-Length` body is consumed with its
//! request.

use super::headers::{names, raop};
use super::{Headers, Method, RTSP_VERSION, RtspRequest, RtspResponse, StatusCode};
use bytes::BytesMut;
use std::fmt::Write as _;

/// Errors during RTSP parsing
///
/// Both variants are fatal for the connection: the peer is sending data
/// the receiver refuses to buffer.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Line exceeds {max} bytes")]
    LineTooLong { max: usize },

    #[error("Body too large: {size} > {max}")]
    BodyTooLarge { size: usize, max: usize },
}

/// Maximum allowed body size (16 MB should be plenty for any RTSP body)
const MAX_BODY_SIZE: usize = 16 * 1024 * 1024;

/// Maximum length of a single request or header line (64 KB)
const MAX_LINE_SIZE: usize = 64 * 1024;

/// Request being assembled
#[derive(Debug)]
struct PartialRequest {
    method: Method,
    uri: String,
    version: String,
    headers: Headers,
}

#[derive(Debug)]
enum DecodeState {
    RequestLine,
    Headers(PartialRequest),
    Body(PartialRequest, usize),
}

/// Server-side RTSP codec
///
/// # Sans-IO Design
///
/// This codec performs no I/O. It operates on byte buffers:
/// - `feed()` adds bytes to the internal buffer
/// - `decode()` attempts to parse a complete request
/// - `encode_response()` generates response bytes
///
/// # Example
///
/// ```rust
/// use airhome::protocol::rtsp::server_codec::RtspServerCodec;
///
/// let mut codec = RtspServerCodec::new();
/// codec.feed(b"OPTIONS * RTSP/1.0\r\nCSeq: 1\r\n\r\n");
///
/// let request = codec.decode().unwrap().unwrap();
/// assert_eq!(request.method.as_str(), "OPTIONS");
/// ```
pub struct RtspServerCodec {
    buffer: BytesMut,
    state: DecodeState,
    discarded_lines: u64,
}

impl RtspServerCodec {
    /// Create a new server codec
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            state: DecodeState::RequestLine,
            discarded_lines: 0,
        }
    }

    /// Feed bytes into the internal buffer
    pub fn feed(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Get current buffer length
    #[must_use]
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    /// Number of malformed request lines dropped so far
    #[must_use]
    pub fn discarded_lines(&self) -> u64 {
        self.discarded_lines
    }

    /// Whether a request has been started but not completed
    #[must_use]
    pub fn has_partial_request(&self) -> bool {
        !matches!(self.state, DecodeState::RequestLine) || !self.buffer.is_empty()
    }

    /// Reset buffer and parser state
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.state = DecodeState::RequestLine;
    }

    /// Attempt to decode a complete RTSP request
    ///
    /// Returns:
    /// - `Ok(Some(request))` if a complete request was parsed
    /// - `Ok(None)` if more data is needed
    /// - `Err(e)` if the peer exceeded a size limit
    ///
    /// # Errors
    /// Returns `ParseError` if a line or declared body exceeds the limits.
    pub fn decode(&mut self) -> Result<Option<RtspRequest>, ParseError> {
        loop {
            match std::mem::replace(&mut self.state, DecodeState::RequestLine) {
                DecodeState::RequestLine => {
                    let Some(line) = self.next_line()? else {
                        return Ok(None);
                    };

                    let parts: Vec<&str> = line.splitn(3, ' ').collect();
                    if parts.len() < 3 {
                        if !line.is_empty() {
                            tracing::warn!(line = %line, "Discarding malformed RTSP request line");
                        }
                        self.discarded_lines += 1;
                        continue;
                    }

                    self.state = DecodeState::Headers(PartialRequest {
                        method: Method::parse(parts[0]),
                        uri: parts[1].to_string(),
                        version: parts[2].to_string(),
                        headers: Headers::new(),
                    });
                }
                DecodeState::Headers(mut partial) => {
                    let Some(line) = self.next_line()? else {
                        self.state = DecodeState::Headers(partial);
                        return Ok(None);
                    };

                    if line.is_empty() {
                        let content_length = partial.headers.content_length();
                        if content_length > MAX_BODY_SIZE {
                            return Err(ParseError::BodyTooLarge {
                                size: content_length,
                                max: MAX_BODY_SIZE,
                            });
                        }
                        if content_length == 0 {
                            return Ok(Some(Self::complete(partial, Vec::new())));
                        }
                        self.state = DecodeState::Body(partial, content_length);
                        continue;
                    }

                    match line.find(':') {
                        Some(pos) if pos > 0 => {
                            let name = line[..pos].trim();
                            let value = line[pos + 1..].trim();
                            partial.headers.insert(name, value);
                        }
                        _ => {}
                    }
                    self.state = DecodeState::Headers(partial);
                }
                DecodeState::Body(partial, length) => {
                    if self.buffer.len() < length {
                        self.state = DecodeState::Body(partial, length);
                        return Ok(None);
                    }
                    let body = self.buffer.split_to(length).to_vec();
                    return Ok(Some(Self::complete(partial, body)));
                }
            }
        }
    }

    fn complete(partial: PartialRequest, body: Vec<u8>) -> RtspRequest {
        RtspRequest {
            method: partial.method,
            uri: partial.uri,
            version: partial.version,
            headers: partial.headers,
            body,
        }
    }

    /// Take the next `\n`-terminated line, without its terminator
    fn next_line(&mut self) -> Result<Option<String>, ParseError> {
        let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') else {
            if self.buffer.len() > MAX_LINE_SIZE {
                return Err(ParseError::LineTooLong { max: MAX_LINE_SIZE });
            }
            return Ok(None);
        };

        if pos > MAX_LINE_SIZE {
            return Err(ParseError::LineTooLong { max: MAX_LINE_SIZE });
        }

        let raw = self.buffer.split_to(pos + 1);
        let mut line = &raw[..pos];
        if let [rest @ .., b'\r'] = line {
            line = rest;
        }

        Ok(Some(String::from_utf8_lossy(line).into_owned()))
    }
}

impl Default for RtspServerCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for receiver responses
///
/// Wire order is fixed: `CSeq`, `Server`, then handler headers in the
/// order they were added. Responses never carry a body.
#[derive(Debug, Clone)]
pub struct ResponseBuilder {
    status: StatusCode,
    cseq: Option<String>,
    server: Option<String>,
    headers: Headers,
}

impl ResponseBuilder {
    /// Response with `status`
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            cseq: None,
            server: None,
            headers: Headers::new(),
        }
    }

    /// 200 OK
    #[must_use]
    pub fn ok() -> Self {
        Self::new(StatusCode::OK)
    }

    /// Error response
    #[must_use]
    pub fn error(status: StatusCode) -> Self {
        Self::new(status)
    }

    /// Echo the request `CSeq`; `"1"` when the request had none
    #[must_use]
    pub fn cseq(mut self, cseq: Option<&str>) -> Self {
        self.cseq = cseq.map(str::to_string);
        self
    }

    /// Set the `Server` header
    #[must_use]
    pub fn server(mut self, server: &str) -> Self {
        self.server = Some(server.to_string());
        self
    }

    /// Set `Session`
    #[must_use]
    pub fn session(self, session_id: &str) -> Self {
        self.header(names::SESSION, session_id)
    }

    /// Append a header
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Set `Audio-Latency`, in samples
    #[must_use]
    pub fn audio_latency(self, samples: u32) -> Self {
        self.header(raop::AUDIO_LATENCY, &samples.to_string())
    }

    /// Finish
    #[must_use]
    pub fn build(self) -> RtspResponse {
        let mut headers = Headers::new();
        headers.insert(names::CSEQ, self.cseq.unwrap_or_else(|| "1".to_string()));
        if let Some(server) = self.server {
            headers.insert(names::SERVER, server);
        }
        for (name, value) in self.headers.iter() {
            headers.insert(name, value);
        }

        RtspResponse {
            version: RTSP_VERSION.to_string(),
            status: self.status,
            reason: self.status.reason().to_string(),
            headers,
            body: Vec::new(),
        }
    }

    /// Build and serialize
    #[must_use]
    pub fn encode(self) -> Vec<u8> {
        encode_response(&self.build())
    }
}

/// Serialize a response: status line, headers, blank line, body
#[must_use]
pub fn encode_response(response: &RtspResponse) -> Vec<u8> {
    let mut head = format!(
        "{} {} {}\r\n",
        response.version,
        response.status.as_u16(),
        response.reason
    );
    for (name, value) in response.headers.iter() {
        let _ = write!(head, "{name}: {value}\r\n");
    }
    head.push_str("\r\n");

    let mut out = head.into_bytes();
    out.extend_from_slice(&response.body);
    out
}
