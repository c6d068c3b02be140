//! Cross-platform capture adapter using cpal
//!
//! Implements both capture ports: the session-long live source
//! (acquire/release) and the per-step recording spans. The cpal stream is
//! not Send, so each span runs it on a dedicated thread coordinated
//! through atomics; samples land in the span's chunk list as little-endian
//! i16 bytes, mixed down to mono.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use tokio::time::Duration as TokioDuration;

use super::{flac, wav};
use crate::application::ports::{CaptureDevice, DeviceError, RecordError, SpanRecorder};
use crate::domain::segment::{CaptureSpan, SegmentData, SegmentEncoding};

/// cpal-backed capture source and span recorder.
/// Clones share the underlying source, so one adapter can serve as both
/// the live device handle and the span recorder.
#[derive(Clone)]
pub struct CpalCapture {
    /// The active span, present between begin and end
    span: Arc<StdMutex<Option<CaptureSpan>>>,
    /// Device sample rate, set during acquisition
    device_sample_rate: Arc<AtomicU32>,
    /// Whether the live source is held
    is_live: Arc<AtomicBool>,
    /// Whether a span is currently recording
    is_recording: Arc<AtomicBool>,
}

impl CpalCapture {
    /// Create a new capture adapter; nothing is opened yet
    pub fn new() -> Self {
        Self {
            span: Arc::new(StdMutex::new(None)),
            device_sample_rate: Arc::new(AtomicU32::new(0)),
            is_live: Arc::new(AtomicBool::new(false)),
            is_recording: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get the default input device
    fn get_input_device() -> Result<cpal::Device, DeviceError> {
        let host = cpal::default_host();
        host.default_input_device().ok_or(DeviceError::NoDevice)
    }

    /// Get a suitable input configuration, preferring mono i16/f32
    fn get_input_config(
        device: &cpal::Device,
    ) -> Result<(StreamConfig, SampleFormat), DeviceError> {
        let supported_configs = device
            .supported_input_configs()
            .map_err(|e| DeviceError::AccessDenied(e.to_string()))?;

        let mut best_config: Option<cpal::SupportedStreamConfigRange> = None;

        for config in supported_configs {
            if config.sample_format() != SampleFormat::I16
                && config.sample_format() != SampleFormat::F32
            {
                continue;
            }

            let is_better = match &best_config {
                None => true,
                Some(current) => config.channels() < current.channels(),
            };
            if is_better {
                best_config = Some(config);
            }
        }

        let config_range = best_config
            .ok_or_else(|| DeviceError::OpenFailed("No suitable input config found".into()))?;

        let sample_format = config_range.sample_format();
        let sample_rate = config_range.min_sample_rate().max(cpal::SampleRate(16000));
        let sample_rate = sample_rate.min(config_range.max_sample_rate());

        let config = StreamConfig {
            channels: config_range.channels(),
            sample_rate,
            buffer_size: cpal::BufferSize::Default,
        };

        Ok((config, sample_format))
    }

    /// Mix interleaved frames down to mono
    fn stereo_to_mono(samples: &[i16], channels: u16) -> Vec<i16> {
        if channels == 1 {
            return samples.to_vec();
        }

        samples
            .chunks(channels as usize)
            .map(|chunk| {
                let sum: i32 = chunk.iter().map(|&s| s as i32).sum();
                (sum / channels as i32) as i16
            })
            .collect()
    }

    /// Append mono samples to the active span as little-endian bytes
    fn push_samples(span: &StdMutex<Option<CaptureSpan>>, mono: &[i16]) {
        let mut bytes = Vec::with_capacity(mono.len() * 2);
        for sample in mono {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        if let Ok(mut guard) = span.lock() {
            if let Some(span) = guard.as_mut() {
                let _ = span.push_chunk(bytes);
            }
        }
    }

    /// Encode the raw PCM blob, preferring FLAC with a WAV fallback so an
    /// encoder rejection never loses the span.
    fn encode_blob(blob: Vec<u8>, sample_rate: u32) -> Result<SegmentData, RecordError> {
        let samples: Vec<i16> = blob
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();

        if samples.is_empty() {
            return Err(RecordError::EmptySpan);
        }

        match flac::encode_flac(&samples, sample_rate) {
            Ok(data) => Ok(SegmentData::new(data, SegmentEncoding::Flac)),
            Err(_) => Ok(SegmentData::new(
                wav::encode_wav(&samples, sample_rate),
                SegmentEncoding::Wav,
            )),
        }
    }
}

impl Default for CpalCapture {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaptureDevice for CpalCapture {
    async fn acquire(&self) -> Result<(), DeviceError> {
        let device_sample_rate = Arc::clone(&self.device_sample_rate);

        // Probe the device up front so a denial fails the session before
        // any recording starts
        tokio::task::spawn_blocking(move || {
            let device = Self::get_input_device()?;
            let (config, _) = Self::get_input_config(&device)?;
            device_sample_rate.store(config.sample_rate.0, Ordering::SeqCst);
            Ok::<(), DeviceError>(())
        })
        .await
        .map_err(|e| DeviceError::OpenFailed(format!("Task join error: {}", e)))??;

        self.is_live.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn release(&self) {
        self.is_recording.store(false, Ordering::SeqCst);
        if self.is_live.swap(false, Ordering::SeqCst) {
            // Let an active stream thread notice the flag and shut down
            tokio::time::sleep(TokioDuration::from_millis(100)).await;
        }
    }

    fn is_live(&self) -> bool {
        self.is_live.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpanRecorder for CpalCapture {
    async fn begin(&self, step: u32) -> Result<(), RecordError> {
        if !self.is_live.load(Ordering::SeqCst) {
            return Err(RecordError::SourceNotLive);
        }
        if self.is_recording.load(Ordering::SeqCst) {
            return Err(RecordError::StartFailed(
                "A span is already recording".into(),
            ));
        }

        {
            let mut guard = self
                .span
                .lock()
                .map_err(|_| RecordError::StartFailed("Span lock poisoned".into()))?;
            let mut span = CaptureSpan::new(step);
            span.start()
                .map_err(|e| RecordError::StartFailed(e.to_string()))?;
            *guard = Some(span);
        }

        self.is_recording.store(true, Ordering::SeqCst);

        let span = Arc::clone(&self.span);
        let is_recording = Arc::clone(&self.is_recording);
        let is_live = Arc::clone(&self.is_live);

        // The stream lives on its own thread; cpal::Stream is not Send
        std::thread::spawn(move || {
            let device = match Self::get_input_device() {
                Ok(d) => d,
                Err(_) => {
                    is_recording.store(false, Ordering::SeqCst);
                    return;
                }
            };

            let (config, sample_format) = match Self::get_input_config(&device) {
                Ok(c) => c,
                Err(_) => {
                    is_recording.store(false, Ordering::SeqCst);
                    return;
                }
            };

            let channels = config.channels;
            let span_clone = Arc::clone(&span);
            let is_recording_clone = Arc::clone(&is_recording);

            let stream_result = match sample_format {
                SampleFormat::I16 => device.build_input_stream(
                    &config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        if is_recording_clone.load(Ordering::SeqCst) {
                            let mono = Self::stereo_to_mono(data, channels);
                            Self::push_samples(&span_clone, &mono);
                        }
                    },
                    |err| eprintln!("Audio stream error: {}", err),
                    None,
                ),

                SampleFormat::F32 => {
                    let span_clone = Arc::clone(&span);
                    let is_recording_clone = Arc::clone(&is_recording);

                    device.build_input_stream(
                        &config,
                        move |data: &[f32], _: &cpal::InputCallbackInfo| {
                            if is_recording_clone.load(Ordering::SeqCst) {
                                let i16_data: Vec<i16> =
                                    data.iter().map(|&s| (s * 32767.0) as i16).collect();
                                let mono = Self::stereo_to_mono(&i16_data, channels);
                                Self::push_samples(&span_clone, &mono);
                            }
                        },
                        |err| eprintln!("Audio stream error: {}", err),
                        None,
                    )
                }

                _ => {
                    is_recording.store(false, Ordering::SeqCst);
                    return;
                }
            };

            let stream = match stream_result {
                Ok(s) => s,
                Err(_) => {
                    is_recording.store(false, Ordering::SeqCst);
                    return;
                }
            };

            if stream.play().is_err() {
                is_recording.store(false, Ordering::SeqCst);
                return;
            }

            while is_recording.load(Ordering::SeqCst) && is_live.load(Ordering::SeqCst) {
                std::thread::sleep(std::time::Duration::from_millis(100));
            }

            drop(stream);
        });

        // Give the thread a moment to start
        tokio::time::sleep(TokioDuration::from_millis(50)).await;

        if !self.is_recording.load(Ordering::SeqCst) {
            return Err(RecordError::StartFailed(
                "Failed to start the capture stream".into(),
            ));
        }

        Ok(())
    }

    async fn end(&self) -> Result<SegmentData, RecordError> {
        if !self.is_live.load(Ordering::SeqCst) {
            return Err(RecordError::SourceNotLive);
        }
        if !self.is_recording.load(Ordering::SeqCst) {
            return Err(RecordError::RecordingFailed("No active span".into()));
        }

        self.is_recording.store(false, Ordering::SeqCst);

        // Give the stream thread a moment to clean up
        tokio::time::sleep(TokioDuration::from_millis(100)).await;

        let span = {
            let mut guard = self
                .span
                .lock()
                .map_err(|_| RecordError::RecordingFailed("Span lock poisoned".into()))?;
            guard.take()
        };

        let mut span = span.ok_or_else(|| RecordError::RecordingFailed("No active span".into()))?;
        span.end();
        let blob = span
            .into_blob()
            .map_err(|e| RecordError::RecordingFailed(e.to_string()))?;

        let sample_rate = self.device_sample_rate.load(Ordering::SeqCst);
        if sample_rate == 0 {
            return Err(RecordError::RecordingFailed("Sample rate not set".into()));
        }

        // Encoding is CPU-bound
        tokio::task::spawn_blocking(move || Self::encode_blob(blob, sample_rate))
            .await
            .map_err(|e| RecordError::RecordingFailed(format!("Encode task error: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stereo_to_mono_averages_channels() {
        let samples = [100i16, 200, -50, 50];
        let mono = CpalCapture::stereo_to_mono(&samples, 2);
        assert_eq!(mono, vec![150, 0]);
    }

    #[test]
    fn mono_passes_through() {
        let samples = [1i16, 2, 3];
        let mono = CpalCapture::stereo_to_mono(&samples, 1);
        assert_eq!(mono, vec![1, 2, 3]);
    }

    #[test]
    fn encode_blob_prefers_flac() {
        let samples: Vec<u8> = vec![0u8; 3200];
        let segment = CpalCapture::encode_blob(samples, 16000).unwrap();
        assert_eq!(segment.encoding(), SegmentEncoding::Flac);
        assert_eq!(&segment.data()[0..4], b"fLaC");
    }

    #[test]
    fn encode_blob_rejects_empty_span() {
        let err = CpalCapture::encode_blob(Vec::new(), 16000).unwrap_err();
        assert!(matches!(err, RecordError::EmptySpan));
    }

    #[tokio::test]
    async fn begin_without_acquire_fails() {
        let capture = CpalCapture::new();
        let err = capture.begin(0).await.unwrap_err();
        assert!(matches!(err, RecordError::SourceNotLive));
    }

    #[tokio::test]
    async fn end_without_span_fails() {
        let capture = CpalCapture::new();
        capture.is_live.store(true, Ordering::SeqCst);
        let err = capture.end().await.unwrap_err();
        assert!(matches!(err, RecordError::RecordingFailed(_)));
    }

    #[tokio::test]
    async fn release_is_idempotent() {
        let capture = CpalCapture::new();
        capture.is_live.store(true, Ordering::SeqCst);

        capture.release().await;
        assert!(!capture.is_live());
        capture.release().await;
        assert!(!capture.is_live());
    }
}
