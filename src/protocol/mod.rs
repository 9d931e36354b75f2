//! Protocol module

pub mod rtp;
pub mod rtsp;
pub mod sdp;
