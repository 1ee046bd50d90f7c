//! cpal-based audio capture
//!
//! cpal::Stream is not Send, so the stream lives on a dedicated thread
//! and the async side talks to it over channels. Starting walks a
//! fallback chain (configured device, then the host default, then any
//! remaining input device) and reports success only once a stream is
//! actually running, so the session never enters Recording against a
//! dead microphone.

use super::AudioCapture;
use crate::config::AudioConfig;
use crate::error::AudioError;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tokio::sync::oneshot;

/// Commands sent to the audio capture thread
enum CaptureCommand {
    Stop(oneshot::Sender<Vec<f32>>),
}

/// Parameters for building an audio input stream
struct StreamBuildParams {
    samples: Arc<Mutex<Vec<f32>>>,
    source_rate: u32,
    target_rate: u32,
    source_channels: usize,
}

/// cpal-based audio capture implementation
pub struct CpalCapture {
    config: AudioConfig,
    cmd_tx: Option<std::sync::mpsc::Sender<CaptureCommand>>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

impl CpalCapture {
    pub fn new(config: &AudioConfig) -> Result<Self, AudioError> {
        Ok(Self {
            config: config.clone(),
            cmd_tx: None,
            thread_handle: None,
        })
    }
}

#[async_trait::async_trait]
impl AudioCapture for CpalCapture {
    async fn start(&mut self) -> Result<(), AudioError> {
        let host = cpal::default_host();
        let candidates = candidate_devices(&host, &self.config.device)?;
        if candidates.is_empty() {
            return Err(AudioError::NoInputDevice);
        }

        let target_rate = self.config.sample_rate;
        let (cmd_tx, cmd_rx) = std::sync::mpsc::channel::<CaptureCommand>();
        let (ready_tx, ready_rx) = oneshot::channel::<Result<(), AudioError>>();

        let samples = Arc::new(Mutex::new(Vec::<f32>::new()));
        let samples_clone = samples.clone();

        let thread_handle = thread::spawn(move || {
            // Try candidates in priority order until a stream opens
            let mut active: Option<(cpal::Stream, String)> = None;
            for device in candidates {
                let name = device.name().unwrap_or_else(|_| "unknown".to_string());
                match open_stream(&device, target_rate, samples_clone.clone()) {
                    Ok(stream) => {
                        active = Some((stream, name));
                        break;
                    }
                    Err(e) => tracing::warn!("Audio device '{}' unusable: {}", name, e),
                }
            }

            let (stream, name) = match active {
                Some(pair) => pair,
                None => {
                    let _ = ready_tx.send(Err(AudioError::NoInputDevice));
                    return;
                }
            };

            tracing::info!("Recording from audio device: {}", name);
            let _ = ready_tx.send(Ok(()));

            // Hold the stream until told to stop (or the handle is dropped)
            if let Ok(CaptureCommand::Stop(response_tx)) = cmd_rx.recv() {
                drop(stream);
                let collected = samples_clone.lock().unwrap().clone();
                let _ = response_tx.send(collected);
            }

            tracing::debug!("Audio capture thread stopped");
        });

        self.cmd_tx = Some(cmd_tx);
        self.thread_handle = Some(thread_handle);

        match tokio::time::timeout(Duration::from_secs(5), ready_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(AudioError::Stream(
                "Capture thread exited before starting".to_string(),
            )),
            Err(_) => Err(AudioError::Stream(
                "Timed out waiting for audio stream to open".to_string(),
            )),
        }
    }

    async fn stop(&mut self) -> Result<Vec<f32>, AudioError> {
        let samples = if let Some(cmd_tx) = self.cmd_tx.take() {
            let (response_tx, response_rx) = oneshot::channel();

            if cmd_tx.send(CaptureCommand::Stop(response_tx)).is_ok() {
                match tokio::time::timeout(Duration::from_secs(2), response_rx).await {
                    Ok(Ok(samples)) => samples,
                    Ok(Err(_)) => {
                        return Err(AudioError::Stream(
                            "Capture thread dropped its reply".to_string(),
                        ))
                    }
                    Err(_) => {
                        return Err(AudioError::Stream(
                            "Timed out stopping audio stream".to_string(),
                        ))
                    }
                }
            } else {
                Vec::new()
            }
        } else {
            Vec::new()
        };

        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }

        tracing::debug!(
            "Audio capture stopped: {} samples ({:.2}s)",
            samples.len(),
            samples.len() as f32 / self.config.sample_rate as f32
        );

        if samples.is_empty() {
            return Err(AudioError::EmptyRecording);
        }

        Ok(samples)
    }
}

/// Input devices in the order they should be tried: the configured
/// device first (matched exactly, then case-insensitively, then by
/// substring), the host default next, everything else after.
fn candidate_devices(host: &cpal::Host, preferred: &str) -> Result<Vec<cpal::Device>, AudioError> {
    let devices: Vec<cpal::Device> = host
        .input_devices()
        .map_err(|e| AudioError::Stream(e.to_string()))?
        .collect();
    let names: Vec<String> = devices
        .iter()
        .map(|d| d.name().unwrap_or_else(|_| "unknown".to_string()))
        .collect();

    let default_name = host.default_input_device().and_then(|d| d.name().ok());

    let preferred_idx = if preferred == "default" {
        None
    } else {
        let idx = find_device_index(&names, preferred);
        if idx.is_none() {
            let available = if names.is_empty() {
                "(none)".to_string()
            } else {
                names.join(", ")
            };
            tracing::warn!(
                "Configured audio device '{}' not found, trying fallbacks. Available: {}",
                preferred,
                available
            );
        }
        idx
    };

    let rank = |i: usize| -> u8 {
        if Some(i) == preferred_idx {
            0
        } else if default_name.as_deref() == Some(names[i].as_str()) {
            1
        } else {
            2
        }
    };

    let mut order: Vec<usize> = (0..devices.len()).collect();
    order.sort_by_key(|&i| rank(i));

    let mut slots: Vec<Option<cpal::Device>> = devices.into_iter().map(Some).collect();
    let mut ordered: Vec<cpal::Device> =
        order.into_iter().filter_map(|i| slots[i].take()).collect();

    // Some hosts expose a default device that enumeration misses
    if ordered.is_empty() {
        if let Some(default) = host.default_input_device() {
            ordered.push(default);
        }
    }

    Ok(ordered)
}

/// Locate a device by name: exact, then case-insensitive, then substring
fn find_device_index(names: &[String], wanted: &str) -> Option<usize> {
    let wanted_lower = wanted.to_lowercase();
    names
        .iter()
        .position(|n| n == wanted)
        .or_else(|| names.iter().position(|n| n.to_lowercase() == wanted_lower))
        .or_else(|| {
            names
                .iter()
                .position(|n| n.to_lowercase().contains(&wanted_lower))
        })
}

/// Open and start an input stream on one device
fn open_stream(
    device: &cpal::Device,
    target_rate: u32,
    samples: Arc<Mutex<Vec<f32>>>,
) -> Result<cpal::Stream, AudioError> {
    let supported = device
        .default_input_config()
        .map_err(|e| AudioError::Stream(e.to_string()))?;

    let source_rate = supported.sample_rate().0;
    let source_channels = supported.channels() as usize;
    let sample_format = supported.sample_format();

    tracing::debug!(
        "Device config: {} Hz, {} channel(s), format: {:?}",
        source_rate,
        source_channels,
        sample_format
    );

    let stream_config = cpal::StreamConfig {
        channels: supported.channels(),
        sample_rate: supported.sample_rate(),
        buffer_size: cpal::BufferSize::Default,
    };

    let err_fn = |err| tracing::error!("Audio stream error: {}", err);
    let params = StreamBuildParams {
        samples,
        source_rate,
        target_rate,
        source_channels,
    };

    let stream = match sample_format {
        cpal::SampleFormat::F32 => build_stream::<f32>(device, &stream_config, params, err_fn),
        cpal::SampleFormat::I16 => build_stream::<i16>(device, &stream_config, params, err_fn),
        cpal::SampleFormat::U16 => build_stream::<u16>(device, &stream_config, params, err_fn),
        format => Err(AudioError::Stream(format!(
            "Unsupported sample format: {:?}",
            format
        ))),
    }?;

    stream.play().map_err(|e| AudioError::Stream(e.to_string()))?;
    Ok(stream)
}

/// Build an input stream for a specific sample type
fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    params: StreamBuildParams,
    err_fn: impl Fn(cpal::StreamError) + Send + 'static,
) -> Result<cpal::Stream, AudioError>
where
    T: cpal::Sample + cpal::SizedSample + Send + 'static,
    f32: cpal::FromSample<T>,
{
    let StreamBuildParams {
        samples,
        source_rate,
        target_rate,
        source_channels,
    } = params;

    let stream = device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                // Convert to f32 and mix to mono
                let mono_f32: Vec<f32> = data
                    .chunks(source_channels)
                    .map(|frame| {
                        let sum: f32 = frame
                            .iter()
                            .map(|&s| <f32 as cpal::FromSample<T>>::from_sample_(s))
                            .sum();
                        sum / source_channels as f32
                    })
                    .collect();

                let resampled = if source_rate != target_rate {
                    resample(&mono_f32, source_rate, target_rate)
                } else {
                    mono_f32
                };

                if let Ok(mut guard) = samples.lock() {
                    guard.extend_from_slice(&resampled);
                }
            },
            err_fn,
            None,
        )
        .map_err(|e| AudioError::Stream(e.to_string()))?;

    Ok(stream)
}

/// Linear interpolation resampling
pub(crate) fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let new_len = (samples.len() as f64 * ratio).ceil() as usize;
    let mut output = Vec::with_capacity(new_len);

    for i in 0..new_len {
        let src_idx = i as f64 / ratio;
        let idx = src_idx.floor() as usize;
        let frac = (src_idx - idx as f64) as f32;

        let sample = if idx + 1 < samples.len() {
            samples[idx] * (1.0 - frac) + samples[idx + 1] * frac
        } else {
            samples.get(idx).copied().unwrap_or(0.0)
        };

        output.push(sample);
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resample_same_rate_is_identity() {
        let samples = vec![0.25, -0.5, 0.75, -1.0];
        assert_eq!(resample(&samples, 16000, 16000), samples);
    }

    #[test]
    fn test_resample_downsample_length() {
        let samples = vec![0.0; 48000];
        let result = resample(&samples, 48000, 16000);
        assert!((result.len() as i64 - 16000).abs() <= 1);
    }

    #[test]
    fn test_resample_upsample_interpolates() {
        let samples = vec![0.0, 1.0];
        let result = resample(&samples, 8000, 16000);
        assert_eq!(result.len(), 4);
        // Midpoint between the two source samples
        assert!((result[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_resample_empty() {
        let samples: Vec<f32> = vec![];
        assert!(resample(&samples, 48000, 16000).is_empty());
    }

    #[test]
    fn test_find_device_exact_match_wins() {
        let names = vec![
            "alsa_input.usb-mic.analog-stereo".to_string(),
            "USB-Mic".to_string(),
            "usb-mic".to_string(),
        ];
        assert_eq!(find_device_index(&names, "usb-mic"), Some(2));
    }

    #[test]
    fn test_find_device_case_insensitive() {
        let names = vec!["Built-in Microphone".to_string()];
        assert_eq!(find_device_index(&names, "built-in microphone"), Some(0));
    }

    #[test]
    fn test_find_device_substring() {
        let names = vec![
            "alsa_output.pci.analog-stereo".to_string(),
            "alsa_input.pci-0000_00_1f.3.analog-stereo".to_string(),
        ];
        assert_eq!(find_device_index(&names, "alsa_input"), Some(1));
    }

    #[test]
    fn test_find_device_no_match() {
        let names = vec!["mic-a".to_string(), "mic-b".to_string()];
        assert_eq!(find_device_index(&names, "webcam"), None);
    }
}
