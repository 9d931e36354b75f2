use super::{Headers, Method, RTSP_VERSION, headers::names};
use std::fmt::Write as _;

/// A decoded RTSP request
#[derive(Debug, Clone)]
pub struct RtspRequest {
    /// Request method
    pub method: Method,
    /// Target URI, `*` for OPTIONS
    pub uri: String,
    /// Version token from the request line
    pub version: String,
    /// Headers in wire order
    pub headers: Headers,
    /// Body, exactly `Content-Length` bytes
    pub body: Vec<u8>,
}

impl RtspRequest {
    /// Request with no headers or body
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            version: RTSP_VERSION.to_string(),
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    /// Start building a request
    pub fn builder(method: Method, uri: impl Into<String>) -> RtspRequestBuilder {
        RtspRequestBuilder {
            request: Self::new(method, uri),
        }
    }

    /// Serialize for sending
    ///
    /// `Content-Length` is always derived from the body rather than copied
    /// from the headers.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut head = format!("{} {} {}\r\n", self.method, self.uri, self.version);
        for (name, value) in self.headers.iter().filter(|(n, _)| *n != names::CONTENT_LENGTH) {
            let _ = write!(head, "{name}: {value}\r\n");
        }
        if !self.body.is_empty() {
            let _ = write!(head, "{}: {}\r\n", names::CONTENT_LENGTH, self.body.len());
        }
        head.push_str("\r\n");

        let mut out = head.into_bytes();
        out.extend_from_slice(&self.body);
        out
    }
}

/// Fluent construction of [`RtspRequest`]s
#[derive(Debug)]
pub struct RtspRequestBuilder {
    request: RtspRequest,
}

impl RtspRequestBuilder {
    /// Set a header
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.headers.insert(name, value);
        self
    }

    /// Set `CSeq`
    #[must_use]
    pub fn cseq(self, seq: u32) -> Self {
        self.header(names::CSEQ, seq.to_string())
    }

    /// Set `Content-Type`
    #[must_use]
    pub fn content_type(self, content_type: &str) -> Self {
        self.header(names::CONTENT_TYPE, content_type)
    }

    /// Set `Transport`
    #[must_use]
    pub fn transport(self, transport: &str) -> Self {
        self.header(names::TRANSPORT, transport)
    }

    /// Attach a body and its `Content-Length`
    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        let body = body.into();
        self.request
            .headers
            .insert(names::CONTENT_LENGTH, body.len().to_string());
        self.request.body = body;
        self
    }

    /// Finish
    #[must_use]
    pub fn build(self) -> RtspRequest {
        self.request
    }
}
