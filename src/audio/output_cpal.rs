//! CPAL-based audio output
//!
//! Cross-platform audio output using the `cpal` crate.
//! Works on macOS, Windows, Linux, iOS, Android.
//!
//! Sessions always produce native-endian 16-bit PCM; it is converted here to
//! whatever sample type the device's default configuration uses.

/// Fill an `i16` device buffer from 16-bit PCM bytes, scaled by `gain`
///
/// Slots past the end of `pcm` are filled with silence.
#[allow(clippy::cast_possible_truncation)]
pub fn render_i16(pcm: &[u8], out: &mut [i16], gain: f32) {
    let mut samples = pcm_samples(pcm);
    for slot in out {
        *slot = samples.next().map_or(0, |v| (f32::from(v) * gain) as i16);
    }
}

/// Fill an `f32` device buffer from 16-bit PCM bytes, scaled by `gain`
///
/// Samples are normalised to `[-1.0, 1.0)`. Slots past the end of `pcm` are
/// filled with silence.
pub fn render_f32(pcm: &[u8], out: &mut [f32], gain: f32) {
    let mut samples = pcm_samples(pcm);
    for slot in out {
        *slot = samples
            .next()
            .map_or(0.0, |v| f32::from(v) / 32768.0 * gain);
    }
}

fn pcm_samples(pcm: &[u8]) -> impl Iterator<Item = i16> + '_ {
    pcm.chunks_exact(2).map(|b| i16::from_ne_bytes([b[0], b[1]]))
}

#[cfg(feature = "audio-cpal")]
mod implementation {
    use super::{render_f32, render_i16};
    use crate::audio::buffer::PlaybackBuffer;
    use crate::audio::format::SinkFormat;
    use crate::audio::sink::{AudioBackend, AudioSink, SinkError};
    use cpal::SampleFormat;
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use std::sync::{Arc, Mutex, PoisonError, mpsc};
    use std::thread;
    use std::time::Duration;

    /// Length of one buffer period
    const PERIOD: Duration = Duration::from_millis(100);

    enum StreamCommand {
        Stop,
    }

    /// System audio output through CPAL
    ///
    /// The output gain is applied in software to every sink opened from
    /// this backend.
    pub struct CpalBackend {
        device_name: Option<String>,
        gain: Arc<Mutex<f32>>,
    }

    impl CpalBackend {
        /// Create a backend for the named device, or the default device
        ///
        /// # Errors
        ///
        /// Returns `SinkError::DeviceNotFound` if no such device exists.
        pub fn new(device_name: Option<&str>) -> Result<Self, SinkError> {
            let device = Self::find_device(device_name)?;
            tracing::info!(
                device = %device.name().unwrap_or_default(),
                "Using CPAL output device"
            );

            Ok(Self {
                device_name: device_name.map(ToString::to_string),
                gain: Arc::new(Mutex::new(1.0)),
            })
        }

        fn find_device(name: Option<&str>) -> Result<cpal::Device, SinkError> {
            let host = cpal::default_host();
            if let Some(id) = name {
                host.output_devices()
                    .map_err(|e| SinkError::DeviceError(e.to_string()))?
                    .find(|d| d.name().ok().as_deref() == Some(id))
                    .ok_or_else(|| SinkError::DeviceNotFound(id.to_string()))
            } else {
                host.default_output_device()
                    .ok_or_else(|| SinkError::DeviceNotFound("No default device".into()))
            }
        }

        fn spawn_stream_thread(
            device: cpal::Device,
            config: cpal::StreamConfig,
            sample_format: SampleFormat,
            buffer: Arc<PlaybackBuffer>,
            gain: Arc<Mutex<f32>>,
            rx: mpsc::Receiver<StreamCommand>,
            status_tx: mpsc::Sender<Result<(), SinkError>>,
        ) {
            thread::spawn(move || {
                let err_fn = |err| tracing::error!("CPAL stream error: {}", err);
                let current_gain = move || *gain.lock().unwrap_or_else(PoisonError::into_inner);

                let mut scratch: Vec<u8> = Vec::new();
                let stream_result = match sample_format {
                    SampleFormat::I16 => device.build_output_stream(
                        &config,
                        move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                            scratch.resize(data.len() * 2, 0);
                            let filled = buffer.read_into(&mut scratch);
                            render_i16(&scratch[..filled], data, current_gain());
                        },
                        err_fn,
                        None,
                    ),
                    SampleFormat::F32 => device.build_output_stream(
                        &config,
                        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                            scratch.resize(data.len() * 2, 0);
                            let filled = buffer.read_into(&mut scratch);
                            render_f32(&scratch[..filled], data, current_gain());
                        },
                        err_fn,
                        None,
                    ),
                    other => {
                        let _ = status_tx.send(Err(SinkError::StreamError(format!(
                            "Unsupported device sample format {other:?}"
                        ))));
                        return;
                    }
                };

                match stream_result {
                    Ok(stream) => {
                        if let Err(e) = stream.play() {
                            let _ = status_tx.send(Err(SinkError::StreamError(e.to_string())));
                            return;
                        }

                        if status_tx.send(Ok(())).is_err() {
                            return;
                        }

                        // Holds the stream alive until stopped or the sink is dropped
                        while let Ok(command) = rx.recv() {
                            match command {
                                StreamCommand::Stop => break,
                            }
                        }
                        let _ = stream.pause();
                    }
                    Err(e) => {
                        let _ = status_tx.send(Err(SinkError::StreamError(e.to_string())));
                    }
                }
            });
        }
    }

    impl AudioBackend for CpalBackend {
        fn open_sink(
            &self,
            format: SinkFormat,
            periods: usize,
        ) -> Result<Arc<dyn AudioSink>, SinkError> {
            let device = Self::find_device(self.device_name.as_deref())?;
            let sample_format = device
                .default_output_config()
                .map_err(|e| SinkError::DeviceError(e.to_string()))?
                .sample_format();

            let capacity = format.bytes_for(PERIOD).saturating_mul(periods.max(1));
            let buffer = Arc::new(PlaybackBuffer::new(capacity));

            let config = cpal::StreamConfig {
                channels: format.channels,
                sample_rate: cpal::SampleRate(format.sample_rate),
                buffer_size: cpal::BufferSize::Default,
            };

            let (tx, rx) = mpsc::channel();
            let (status_tx, status_rx) = mpsc::channel();

            Self::spawn_stream_thread(
                device,
                config,
                sample_format,
                buffer.clone(),
                self.gain.clone(),
                rx,
                status_tx,
            );

            status_rx
                .recv()
                .map_err(|_| SinkError::DeviceError("Audio thread panicked".into()))??;

            tracing::debug!(
                sample_rate = format.sample_rate,
                channels = format.channels,
                sample_format = ?sample_format,
                capacity,
                "Opened CPAL sink"
            );

            Ok(Arc::new(CpalSink {
                buffer,
                command_tx: Mutex::new(Some(tx)),
            }))
        }

        fn output_gain(&self) -> f32 {
            *self.gain.lock().unwrap_or_else(PoisonError::into_inner)
        }

        fn set_output_gain(&self, gain: f32) -> Result<(), SinkError> {
            *self.gain.lock().unwrap_or_else(PoisonError::into_inner) = gain.clamp(0.0, 1.0);
            Ok(())
        }
    }

    /// One open CPAL output stream
    pub struct CpalSink {
        buffer: Arc<PlaybackBuffer>,
        command_tx: Mutex<Option<mpsc::Sender<StreamCommand>>>,
    }

    impl AudioSink for CpalSink {
        fn write(&self, chunk: &[u8]) -> Result<(), SinkError> {
            self.buffer.write(chunk)
        }

        fn flush_epoch(&self) -> u64 {
            self.buffer.epoch()
        }

        fn write_at(&self, chunk: &[u8], epoch: u64) -> Result<(), SinkError> {
            self.buffer.write_at(chunk, epoch)
        }

        fn flush(&self) {
            self.buffer.flush();
        }

        fn close(&self) {
            self.buffer.close();
            let tx = self
                .command_tx
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            if let Some(tx) = tx {
                let _ = tx.send(StreamCommand::Stop);
            }
        }

        fn is_closed(&self) -> bool {
            self.buffer.is_closed()
        }
    }
}

#[cfg(feature = "audio-cpal")]
pub use implementation::{CpalBackend, CpalSink};
