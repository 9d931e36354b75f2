//! RTP framing for the RAOP audio data channel

mod packet;

#[cfg(test)]
mod tests;

pub use packet::{PayloadType, RtpDecodeError, RtpHeader, RtpPacket};
