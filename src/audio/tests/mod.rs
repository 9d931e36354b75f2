mod buffer;
mod decoder;
mod format;
mod output_cpal;
