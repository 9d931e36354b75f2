//! Mock RAOP sender for testing the receiver
//!
//! Speaks just enough of the control protocol to drive a receiver through
//! ANNOUNCE, SETUP, RECORD, SET_PARAMETER, FLUSH and TEARDOWN, and sends
//! RTP audio to the port SETUP returned.

use crate::protocol::rtp::RtpPacket;
use crate::protocol::rtsp::headers::names;
use crate::protocol::rtsp::request::RtspRequestBuilder;
use crate::protocol::rtsp::{Method, RtspRequest, RtspResponse};
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};

const REQUEST_URI: &str = "rtsp://127.0.0.1/3413821438";
const TRANSPORT: &str = "RTP/AVP/UDP;unicast;interleaved=0-1;mode=record";

/// Mock RAOP sender
pub struct MockSender {
    receiver_addr: SocketAddr,
    stream: TcpStream,
    cseq: u32,
    session_id: Option<String>,
    server_port: Option<u16>,
    audio_socket: Option<UdpSocket>,
    sequence: u16,
    timestamp: u32,
    pending: Vec<u8>,
}

impl MockSender {
    /// Connect to a receiver
    ///
    /// # Errors
    ///
    /// Returns `MockSenderError::Io` if the connection fails.
    pub async fn connect(receiver_addr: SocketAddr) -> Result<Self, MockSenderError> {
        let stream = TcpStream::connect(receiver_addr).await?;
        Ok(Self {
            receiver_addr,
            stream,
            cseq: 0,
            session_id: None,
            server_port: None,
            audio_socket: None,
            sequence: 0,
            timestamp: 0,
            pending: Vec::new(),
        })
    }

    /// Session id returned by the last successful SETUP
    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Audio port returned by the last successful SETUP
    #[must_use]
    pub fn server_port(&self) -> Option<u16> {
        self.server_port
    }

    /// Send OPTIONS
    ///
    /// # Errors
    ///
    /// Returns `MockSenderError` on I/O failure or a malformed response.
    pub async fn options(&mut self) -> Result<RtspResponse, MockSenderError> {
        let request = self.request(Method::Options).build();
        self.send(&request).await
    }

    /// Send ANNOUNCE with an SDP body for `codec/rate`
    ///
    /// # Errors
    ///
    /// Returns `MockSenderError` on I/O failure or a malformed response.
    pub async fn announce(
        &mut self,
        codec: &str,
        sample_rate: u32,
    ) -> Result<RtspResponse, MockSenderError> {
        let sdp = format!(
            "v=0\r\n\
             o=iTunes 3413821438 0 IN IP4 127.0.0.1\r\n\
             s=iTunes\r\n\
             c=IN IP4 127.0.0.1\r\n\
             t=0 0\r\n\
             m=audio 0 RTP/AVP 96\r\n\
             a=rtpmap:96 {codec}/{sample_rate}\r\n"
        );
        let request = self
            .request(Method::Announce)
            .content_type("application/sdp")
            .body(sdp)
            .build();
        self.send(&request).await
    }

    /// Send SETUP and bind a local audio socket to the returned port
    ///
    /// # Errors
    ///
    /// Returns `MockSenderError` on I/O failure or a malformed response.
    pub async fn setup(&mut self) -> Result<RtspResponse, MockSenderError> {
        let request = self.request(Method::Setup).transport(TRANSPORT).build();
        let response = self.send(&request).await?;

        if response.is_success() {
            self.session_id = response.session().map(ToString::to_string);
            self.server_port = response
                .headers
                .get(names::TRANSPORT)
                .and_then(parse_server_port);

            if let Some(port) = self.server_port {
                let socket = UdpSocket::bind("127.0.0.1:0").await?;
                socket
                    .connect(SocketAddr::new(self.receiver_addr.ip(), port))
                    .await?;
                self.audio_socket = Some(socket);
            }
        }

        Ok(response)
    }

    /// Send RECORD
    ///
    /// # Errors
    ///
    /// Returns `MockSenderError` on I/O failure or a malformed response.
    pub async fn record(&mut self) -> Result<RtspResponse, MockSenderError> {
        let request = self
            .request(Method::Record)
            .header("Range", "npt=0-")
            .header(
                "RTP-Info",
                format!("seq={};rtptime={}", self.sequence, self.timestamp),
            )
            .build();
        self.send(&request).await
    }

    /// Send `SET_PARAMETER` with a volume body
    ///
    /// # Errors
    ///
    /// Returns `MockSenderError` on I/O failure or a malformed response.
    pub async fn set_volume(&mut self, db: f32) -> Result<RtspResponse, MockSenderError> {
        self.set_parameter("text/parameters", format!("volume: {db:.6}\r\n").as_bytes())
            .await
    }

    /// Send `SET_PARAMETER` with an arbitrary body
    ///
    /// # Errors
    ///
    /// Returns `MockSenderError` on I/O failure or a malformed response.
    pub async fn set_parameter(
        &mut self,
        content_type: &str,
        body: &[u8],
    ) -> Result<RtspResponse, MockSenderError> {
        let request = self
            .request(Method::SetParameter)
            .content_type(content_type)
            .body(body)
            .build();
        self.send(&request).await
    }

    /// Send `GET_PARAMETER`
    ///
    /// # Errors
    ///
    /// Returns `MockSenderError` on I/O failure or a malformed response.
    pub async fn get_parameter(&mut self) -> Result<RtspResponse, MockSenderError> {
        let request = self.request(Method::GetParameter).build();
        self.send(&request).await
    }

    /// Send FLUSH
    ///
    /// # Errors
    ///
    /// Returns `MockSenderError` on I/O failure or a malformed response.
    pub async fn flush(&mut self) -> Result<RtspResponse, MockSenderError> {
        let request = self
            .request(Method::Flush)
            .header("RTP-Info", format!("seq={};rtptime={}", self.sequence, self.timestamp))
            .build();
        self.send(&request).await
    }

    /// Send TEARDOWN
    ///
    /// # Errors
    ///
    /// Returns `MockSenderError` on I/O failure or a malformed response.
    pub async fn teardown(&mut self) -> Result<RtspResponse, MockSenderError> {
        let request = self.request(Method::Teardown).build();
        let response = self.send(&request).await?;
        if response.is_success() {
            self.session_id = None;
            self.audio_socket = None;
        }
        Ok(response)
    }

    /// Send a request with any method token
    ///
    /// # Errors
    ///
    /// Returns `MockSenderError` on I/O failure or a malformed response.
    pub async fn custom(&mut self, method: &str) -> Result<RtspResponse, MockSenderError> {
        let request = self.request(Method::parse(method)).build();
        self.send(&request).await
    }

    /// Send raw bytes and read one response
    ///
    /// # Errors
    ///
    /// Returns `MockSenderError` on I/O failure or a malformed response.
    pub async fn send_raw(&mut self, data: &[u8]) -> Result<RtspResponse, MockSenderError> {
        self.stream.write_all(data).await?;
        self.read_response().await
    }

    /// Send raw bytes without waiting for a response
    ///
    /// # Errors
    ///
    /// Returns `MockSenderError::Io` on write failure.
    pub async fn write_raw(&mut self, data: &[u8]) -> Result<(), MockSenderError> {
        self.stream.write_all(data).await?;
        Ok(())
    }

    /// Send one RTP audio packet carrying `payload`
    ///
    /// # Errors
    ///
    /// Returns `MockSenderError::NotSetup` before a successful SETUP.
    pub async fn send_audio(&mut self, payload: &[u8]) -> Result<(), MockSenderError> {
        let socket = self
            .audio_socket
            .as_ref()
            .ok_or(MockSenderError::NotSetup)?;

        let packet = RtpPacket::audio(self.sequence, self.timestamp, 0x1234_5678, payload.to_vec());
        socket.send(&packet.encode()).await?;

        self.sequence = self.sequence.wrapping_add(1);
        self.timestamp = self.timestamp.wrapping_add(352);
        Ok(())
    }

    /// Wait until the receiver closes the connection
    ///
    /// # Errors
    ///
    /// Returns `MockSenderError::Io` on read failure.
    pub async fn wait_closed(&mut self) -> Result<(), MockSenderError> {
        let mut buf = [0u8; 256];
        while self.stream.read(&mut buf).await? > 0 {}
        Ok(())
    }

    fn request(&mut self, method: Method) -> RtspRequestBuilder {
        self.cseq += 1;
        let builder = RtspRequest::builder(method, REQUEST_URI)
            .cseq(self.cseq)
            .header(names::USER_AGENT, "AirHomeTest/1.0");
        match &self.session_id {
            Some(id) => builder.header(names::SESSION, id.clone()),
            None => builder,
        }
    }

    async fn send(&mut self, request: &RtspRequest) -> Result<RtspResponse, MockSenderError> {
        self.stream.write_all(&request.encode()).await?;
        self.read_response().await
    }

    /// Read one response head; receiver responses carry no body
    async fn read_response(&mut self) -> Result<RtspResponse, MockSenderError> {
        let mut buf = [0u8; 1024];
        loop {
            if let Some(end) = find_head_end(&self.pending) {
                let head: Vec<u8> = self.pending.drain(..end + 4).collect();
                let text = String::from_utf8_lossy(&head);
                return RtspResponse::parse_head(&text).ok_or(MockSenderError::InvalidResponse);
            }

            let n = self.stream.read(&mut buf).await?;
            if n == 0 {
                return Err(MockSenderError::ConnectionClosed);
            }
            self.pending.extend_from_slice(&buf[..n]);
        }
    }
}

fn find_head_end(data: &[u8]) -> Option<usize> {
    data.windows(4).position(|w| w == b"\r\n\r\n")
}

fn parse_server_port(transport: &str) -> Option<u16> {
    transport
        .split(';')
        .find_map(|part| part.trim().strip_prefix("server_port="))
        .and_then(|value| value.split('-').next())
        .and_then(|port| port.parse().ok())
}

/// Errors from mock sender
#[derive(Debug, thiserror::Error)]
pub enum MockSenderError {
    /// Session not set up
    #[error("Not setup")]
    NotSetup,

    /// Invalid RTSP response
    #[error("Invalid response")]
    InvalidResponse,

    /// Receiver closed the connection before responding
    #[error("Connection closed")]
    ConnectionClosed,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
