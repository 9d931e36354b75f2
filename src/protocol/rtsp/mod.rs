//! Sans-IO RTSP protocol implementation for the RAOP control channel

pub mod headers;
pub mod request;
pub mod response;
pub mod server_codec;

#[cfg(test)]
mod tests;

pub use headers::Headers;
pub use request::RtspRequest;
pub use response::{RtspResponse, StatusCode};
pub use server_codec::{ParseError, ResponseBuilder, RtspServerCodec, encode_response};

/// RTSP protocol version written on every response
pub const RTSP_VERSION: &str = "RTSP/1.0";

/// RTSP methods understood by the receiver
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    /// Capability negotiation
    Options,
    /// Announce stream information (SDP)
    Announce,
    /// Set up transport and session
    Setup,
    /// Start streaming
    Record,
    /// Set parameter (volume, metadata, artwork)
    SetParameter,
    /// Flush buffers
    Flush,
    /// Tear down session
    Teardown,
    /// Get parameter (keep-alive)
    GetParameter,
    /// Any method the receiver does not implement, kept verbatim
    Other(String),
}

impl Method {
    /// Methods advertised in the OPTIONS `Public` header
    pub const PUBLIC: &'static [&'static str] = &[
        "ANNOUNCE",
        "SETUP",
        "RECORD",
        "FLUSH",
        "TEARDOWN",
        "OPTIONS",
        "GET_PARAMETER",
        "SET_PARAMETER",
    ];

    /// Convert to RTSP method string
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Method::Options => "OPTIONS",
            Method::Announce => "ANNOUNCE",
            Method::Setup => "SETUP",
            Method::Record => "RECORD",
            Method::SetParameter => "SET_PARAMETER",
            Method::Flush => "FLUSH",
            Method::Teardown => "TEARDOWN",
            Method::GetParameter => "GET_PARAMETER",
            Method::Other(name) => name,
        }
    }

    /// Parse a method token. Matching is case-sensitive.
    #[must_use]
    pub fn parse(token: &str) -> Self {
        match token {
            "OPTIONS" => Method::Options,
            "ANNOUNCE" => Method::Announce,
            "SETUP" => Method::Setup,
            "RECORD" => Method::Record,
            "SET_PARAMETER" => Method::SetParameter,
            "FLUSH" => Method::Flush,
            "TEARDOWN" => Method::Teardown,
            "GET_PARAMETER" => Method::GetParameter,
            other => Method::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
