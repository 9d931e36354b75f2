use super::Headers;

/// RTSP status code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCode(pub u16);

impl StatusCode {
    pub const OK: StatusCode = StatusCode(200);
    pub const BAD_REQUEST: StatusCode = StatusCode(400);
    pub const INTERNAL_ERROR: StatusCode = StatusCode(500);
    pub const NOT_IMPLEMENTED: StatusCode = StatusCode(501);

    /// 2xx
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.0)
    }

    /// 4xx
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.0)
    }

    /// 5xx
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.0)
    }

    /// Numeric code
    #[must_use]
    pub fn as_u16(&self) -> u16 {
        self.0
    }

    /// Reason phrase written on the status line
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match *self {
            Self::OK => "OK",
            Self::BAD_REQUEST => "Bad Request",
            Self::INTERNAL_ERROR => "Internal Server Error",
            Self::NOT_IMPLEMENTED => "Not Implemented",
            _ => "Unknown",
        }
    }
}

/// An RTSP response
#[derive(Debug, Clone)]
pub struct RtspResponse {
    /// Version token, `RTSP/1.0`
    pub version: String,
    /// Status code
    pub status: StatusCode,
    /// Reason phrase
    pub reason: String,
    /// Headers in wire order
    pub headers: Headers,
    /// Body, empty for every response the receiver sends
    pub body: Vec<u8>,
}

impl RtspResponse {
    /// Whether the status is 2xx
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Echoed `CSeq`
    #[must_use]
    pub fn cseq(&self) -> Option<&str> {
        self.headers.cseq()
    }

    /// Session id, set on SETUP responses
    #[must_use]
    pub fn session(&self) -> Option<&str> {
        self.headers.session()
    }

    /// Parse a status line and headers, as a sender reads them
    ///
    /// Returns `None` when the status line has no numeric code.
    #[must_use]
    pub fn parse_head(head: &str) -> Option<Self> {
        let mut lines = head.lines();
        let mut status_line = lines.next()?.splitn(3, ' ');
        let version = status_line.next()?.to_string();
        let status = StatusCode(status_line.next()?.parse().ok()?);
        let reason = status_line.next().unwrap_or_default().to_string();

        let mut headers = Headers::new();
        for (name, value) in lines
            .take_while(|line| !line.is_empty())
            .filter_map(|line| line.split_once(':'))
        {
            headers.insert(name.trim(), value.trim());
        }

        Some(Self {
            version,
            status,
            reason,
            headers,
            body: Vec::new(),
        })
    }
}
