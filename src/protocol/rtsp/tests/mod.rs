mod headers;
mod server_codec;
