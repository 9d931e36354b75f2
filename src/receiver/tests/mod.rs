mod config;
mod playback;
mod session_registry;

mod artwork_handler;
