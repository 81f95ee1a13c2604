use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::{Arc, Mutex};

use crate::error::CaptureError;

/// An open capture stream. Samples accumulate until drained; dropping the
/// stream releases the device.
pub trait CaptureStream {
    fn sample_rate(&self) -> u32;

    /// Take all samples captured since the last drain.
    fn drain(&mut self) -> Vec<f32>;
}

// `unwrap_err` in tests needs the Ok type to be Debug; cpal::Stream isn't,
// so the impl stays test-only.
#[cfg(test)]
impl std::fmt::Debug for dyn CaptureStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureStream")
            .field("sample_rate", &self.sample_rate())
            .finish_non_exhaustive()
    }
}

/// Opens capture streams. Production goes through cpal; tests substitute a
/// scripted device.
pub trait CaptureDevice {
    /// Startup probe: is there any input device to record from?
    fn is_available(&self) -> bool;

    fn open(&self, preferred_rates: &[u32]) -> Result<Box<dyn CaptureStream>, CaptureError>;
}

/// The default host's default input device.
pub struct CpalDevice;

impl CaptureDevice for CpalDevice {
    fn is_available(&self) -> bool {
        cpal::default_host().default_input_device().is_some()
    }

    fn open(&self, preferred_rates: &[u32]) -> Result<Box<dyn CaptureStream>, CaptureError> {
        Ok(Box::new(start_capture(preferred_rates)?))
    }
}

struct CpalCapture {
    // Held so the device stays open; dropping it stops the callback.
    _stream: cpal::Stream,
    buffer: Arc<Mutex<Vec<f32>>>,
    sample_rate: u32,
}

impl CaptureStream for CpalCapture {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn drain(&mut self) -> Vec<f32> {
        std::mem::take(&mut *self.buffer.lock().unwrap())
    }
}

/// Start capturing mono f32 audio from the default input device, walking the
/// rate preference list in order and falling back to the device's native
/// config with integer downsampling.
fn start_capture(preferred_rates: &[u32]) -> Result<CpalCapture, CaptureError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| CaptureError::CapabilityDenied("no input device found".into()))?;

    log::info!("Input device: {:?}", device.description());

    let supported_configs: Vec<_> = device
        .supported_input_configs()
        .map_err(|e| CaptureError::CapabilityDenied(format!("input configs unavailable: {e}")))?
        .collect();

    let desired = preferred_rates.iter().find_map(|&rate| {
        supported_configs
            .iter()
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= rate
                    && c.max_sample_rate() >= rate
                    && c.sample_format() == cpal::SampleFormat::F32
            })
            .map(|c| (c, rate))
    });

    let (config, capture_rate, downsample_factor) = if let Some((cfg, rate)) = desired {
        let config = cfg.with_sample_rate(rate).config();
        (config, rate, 1usize)
    } else {
        // No preferred rate is supported as mono f32; take the device default
        // and downsample toward the first preference.
        let default_config = device
            .default_input_config()
            .map_err(|e| CaptureError::CapabilityDenied(format!("no default input config: {e}")))?;
        let rate = default_config.sample_rate();
        let target = preferred_rates.first().copied().unwrap_or(16000);
        let factor = (rate / target).max(1) as usize;
        let actual_rate = rate / factor as u32;
        log::info!("Using native rate {rate}Hz, downsampling by {factor}x to ~{actual_rate}Hz");
        (default_config.config(), actual_rate, factor)
    };

    let channels = config.channels as usize;
    let buffer: Arc<Mutex<Vec<f32>>> = Arc::new(Mutex::new(Vec::new()));
    let callback_buffer = buffer.clone();

    let stream = device
        .build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let mut buf = callback_buffer.lock().unwrap();
                for (i, chunk) in data.chunks(channels).enumerate() {
                    if i % downsample_factor == 0 {
                        let mono = chunk.iter().sum::<f32>() / channels as f32;
                        buf.push(mono);
                    }
                }
            },
            |err| log::error!("Input stream error: {err}"),
            None,
        )
        .map_err(|e| {
            CaptureError::CapabilityDenied(format!("could not open capture stream: {e}"))
        })?;

    stream.play().map_err(|e| {
        CaptureError::CapabilityDenied(format!("could not start capture stream: {e}"))
    })?;

    log::info!("Capture stream open at {capture_rate}Hz");
    Ok(CpalCapture {
        _stream: stream,
        buffer,
        sample_rate: capture_rate,
    })
}

/// Convert f32 samples to WAV bytes (mono 16-bit PCM).
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, CaptureError> {
    let mut cursor = std::io::Cursor::new(Vec::new());
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::new(&mut cursor, spec)
        .map_err(|e| CaptureError::CaptureFailed(format!("could not start wav encoder: {e}")))?;
    for &s in samples {
        let clamped = s.clamp(-1.0, 1.0);
        let i16_val = (clamped * i16::MAX as f32) as i16;
        writer
            .write_sample(i16_val)
            .map_err(|e| CaptureError::CaptureFailed(format!("could not encode sample: {e}")))?;
    }
    writer
        .finalize()
        .map_err(|e| CaptureError::CaptureFailed(format!("could not finalize wav: {e}")))?;
    Ok(cursor.into_inner())
}

/// Scripted stand-in for the cpal device. The shared flags let tests observe
/// opens and releases from outside the state machine.
#[cfg(test)]
pub struct FakeDevice {
    pub available: bool,
    pub deny: bool,
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub released: Arc<std::sync::atomic::AtomicBool>,
    pub opened: Arc<std::sync::atomic::AtomicUsize>,
}

#[cfg(test)]
impl FakeDevice {
    pub fn with_samples(samples: Vec<f32>) -> FakeDevice {
        FakeDevice {
            available: true,
            deny: false,
            samples,
            sample_rate: 16000,
            released: Arc::new(std::sync::atomic::AtomicBool::new(false)),
            opened: Arc::new(std::sync::atomic::AtomicUsize::new(0)),
        }
    }

    /// One second of quiet tone at 16kHz.
    pub fn with_tone() -> FakeDevice {
        FakeDevice::with_samples(vec![0.1; 16000])
    }

    /// Opens succeed but no samples ever arrive.
    pub fn silent() -> FakeDevice {
        FakeDevice::with_samples(Vec::new())
    }

    /// Every open is refused.
    pub fn denied() -> FakeDevice {
        FakeDevice {
            deny: true,
            ..FakeDevice::with_tone()
        }
    }

    /// No input device at all.
    pub fn unavailable() -> FakeDevice {
        FakeDevice {
            available: false,
            ..FakeDevice::denied()
        }
    }
}

#[cfg(test)]
impl CaptureDevice for FakeDevice {
    fn is_available(&self) -> bool {
        self.available
    }

    fn open(&self, _preferred_rates: &[u32]) -> Result<Box<dyn CaptureStream>, CaptureError> {
        use std::sync::atomic::Ordering;
        if self.deny {
            return Err(CaptureError::CapabilityDenied(
                "microphone access refused".into(),
            ));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        self.released.store(false, Ordering::SeqCst);
        Ok(Box::new(FakeStream {
            samples: self.samples.clone(),
            sample_rate: self.sample_rate,
            released: self.released.clone(),
        }))
    }
}

#[cfg(test)]
pub struct FakeStream {
    samples: Vec<f32>,
    sample_rate: u32,
    released: Arc<std::sync::atomic::AtomicBool>,
}

#[cfg(test)]
impl CaptureStream for FakeStream {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    // The scripted chunk is always "what arrived since the last drain", so a
    // pre-roll discard followed by the final drain still yields samples.
    fn drain(&mut self) -> Vec<f32> {
        self.samples.clone()
    }
}

#[cfg(test)]
impl Drop for FakeStream {
    fn drop(&mut self) {
        self.released.store(true, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    #[test]
    fn wav_encoding_round_trips_samples() {
        let samples = vec![0.0f32, 0.5, -0.5, 1.0, -1.0];
        let bytes = samples_to_wav(&samples, 16000).unwrap();

        let reader = hound::WavReader::new(std::io::Cursor::new(bytes)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 16000);
        assert_eq!(spec.bits_per_sample, 16);

        let decoded: Vec<i16> = reader.into_samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded.len(), samples.len());
        assert_eq!(decoded[0], 0);
        assert_eq!(decoded[3], i16::MAX);
        assert_eq!(decoded[4], -i16::MAX);
    }

    #[test]
    fn wav_encoding_clamps_out_of_range_samples() {
        let bytes = samples_to_wav(&[2.0f32, -3.0], 16000).unwrap();
        let reader = hound::WavReader::new(std::io::Cursor::new(bytes)).unwrap();
        let decoded: Vec<i16> = reader.into_samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, vec![i16::MAX, -i16::MAX]);
    }

    #[test]
    fn empty_capture_still_encodes_a_valid_header() {
        let bytes = samples_to_wav(&[], 44100).unwrap();
        let reader = hound::WavReader::new(std::io::Cursor::new(bytes)).unwrap();
        assert_eq!(reader.spec().sample_rate, 44100);
        assert_eq!(reader.len(), 0);
    }

    #[test]
    fn fake_stream_reports_release_on_drop() {
        let device = FakeDevice::with_tone();
        let released = device.released.clone();

        let stream = device.open(&[16000]).unwrap();
        assert!(!released.load(Ordering::SeqCst));
        drop(stream);
        assert!(released.load(Ordering::SeqCst));
        assert_eq!(device.opened.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn denied_device_never_hands_out_a_stream() {
        let device = FakeDevice::denied();
        let err = device.open(&[16000]).unwrap_err();
        assert!(matches!(err, CaptureError::CapabilityDenied(_)));
        assert_eq!(device.opened.load(Ordering::SeqCst), 0);
    }
}
