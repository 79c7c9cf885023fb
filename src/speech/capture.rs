//! Microphone capture with RMS-based endpointing.
//!
//! Frames are downmixed to mono f32 and fed through an [`Endpointer`]: the
//! utterance starts at the first frame above the speech threshold and ends
//! after a fixed run of trailing silence, with a hard cap on total length so
//! a never-ending utterance cannot pin the worker thread forever.

use crate::errors::{AssistantError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
// `from_sample` is a provided method of `Sample`; `FromSample` only carries
// the conversion impls, so both traits have to be in scope.
use cpal::{FromSample, Sample};
use std::sync::mpsc;
use std::time::Duration;

/// Tuning for capture and endpointing
#[derive(Debug, Clone)]
pub struct CaptureSettings {
    /// RMS level above which a chunk counts as speech
    pub speech_threshold: f32,
    /// Trailing silence that ends the utterance
    pub trailing_silence: Duration,
    /// Hard cap on utterance length once speech has started
    pub max_utterance: Duration,
    /// How long to wait for speech to start before giving up
    pub max_wait_for_speech: Duration,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            speech_threshold: 0.015,
            trailing_silence: Duration::from_millis(1200),
            max_utterance: Duration::from_secs(30),
            max_wait_for_speech: Duration::from_secs(10),
        }
    }
}

/// One captured utterance: mono 16-bit samples at the device rate
#[derive(Debug, Clone)]
pub struct Utterance {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
}

/// Capture one utterance from the default input device.
///
/// Blocks until the endpointer fires. The stream is dropped on every exit
/// path, releasing the device.
pub fn capture_utterance(settings: &CaptureSettings) -> Result<Utterance> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| AssistantError::Capture("no default input device".to_string()))?;
    let supported = device
        .default_input_config()
        .map_err(|e| AssistantError::Capture(format!("no default input config: {}", e)))?;

    let sample_rate = supported.sample_rate().0;
    let channels = supported.channels() as usize;
    let (tx, rx) = mpsc::channel::<Vec<f32>>();

    let stream = match supported.sample_format() {
        cpal::SampleFormat::F32 => build_stream::<f32>(&device, &supported.into(), channels, tx),
        cpal::SampleFormat::I16 => build_stream::<i16>(&device, &supported.into(), channels, tx),
        cpal::SampleFormat::U16 => build_stream::<u16>(&device, &supported.into(), channels, tx),
        other => Err(AssistantError::Capture(format!(
            "unsupported sample format: {:?}",
            other
        ))),
    }?;

    stream
        .play()
        .map_err(|e| AssistantError::Capture(format!("failed to start stream: {}", e)))?;

    let mut endpointer = Endpointer::new(settings, sample_rate);
    loop {
        let chunk = match rx.recv_timeout(Duration::from_millis(500)) {
            Ok(chunk) => chunk,
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                return Err(AssistantError::Capture("input stream closed".to_string()))
            }
        };
        match endpointer.push(&chunk) {
            Verdict::Continue => {}
            Verdict::Done => break,
            Verdict::NoSpeech => return Err(AssistantError::Unintelligible),
        }
    }
    drop(stream);

    let samples = endpointer
        .take_samples()
        .into_iter()
        .map(|s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
        .collect();
    Ok(Utterance {
        samples,
        sample_rate,
    })
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    channels: usize,
    tx: mpsc::Sender<Vec<f32>>,
) -> Result<cpal::Stream>
where
    T: cpal::SizedSample,
    f32: FromSample<T>,
{
    device
        .build_input_stream(
            config,
            move |data: &[T], _| {
                let _ = tx.send(downmix_to_mono(data, channels));
            },
            |e| log::warn!("input stream error: {}", e),
            None,
        )
        .map_err(|e| AssistantError::Capture(format!("failed to build input stream: {}", e)))
}

/// Average interleaved frames down to one f32 channel
fn downmix_to_mono<T>(data: &[T], channels: usize) -> Vec<f32>
where
    T: cpal::SizedSample,
    f32: FromSample<T>,
{
    data.chunks(channels.max(1))
        .map(|frame| {
            frame.iter().map(|s| f32::from_sample(*s)).sum::<f32>() / frame.len() as f32
        })
        .collect()
}

/// Endpointing outcome for one pushed chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Verdict {
    Continue,
    Done,
    NoSpeech,
}

/// Pure endpointing state machine, separated from the device so the decision
/// logic is testable without hardware
pub(crate) struct Endpointer {
    threshold: f32,
    silence_needed: usize,
    max_samples: usize,
    wait_limit: usize,
    voiced: bool,
    silence_run: usize,
    waited: usize,
    samples: Vec<f32>,
}

impl Endpointer {
    pub(crate) fn new(settings: &CaptureSettings, sample_rate: u32) -> Self {
        let per_sec = sample_rate as f64;
        Self {
            threshold: settings.speech_threshold,
            silence_needed: (settings.trailing_silence.as_secs_f64() * per_sec) as usize,
            max_samples: (settings.max_utterance.as_secs_f64() * per_sec) as usize,
            wait_limit: (settings.max_wait_for_speech.as_secs_f64() * per_sec) as usize,
            voiced: false,
            silence_run: 0,
            waited: 0,
            samples: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, chunk: &[f32]) -> Verdict {
        if chunk.is_empty() {
            return Verdict::Continue;
        }
        let loud = rms(chunk) >= self.threshold;

        if !self.voiced {
            if loud {
                self.voiced = true;
                self.samples.extend_from_slice(chunk);
            } else {
                self.waited += chunk.len();
                if self.waited >= self.wait_limit {
                    return Verdict::NoSpeech;
                }
            }
            return Verdict::Continue;
        }

        self.samples.extend_from_slice(chunk);
        if loud {
            self.silence_run = 0;
        } else {
            self.silence_run += chunk.len();
        }

        if self.silence_run >= self.silence_needed || self.samples.len() >= self.max_samples {
            Verdict::Done
        } else {
            Verdict::Continue
        }
    }

    pub(crate) fn take_samples(self) -> Vec<f32> {
        self.samples
    }
}

fn rms(chunk: &[f32]) -> f32 {
    (chunk.iter().map(|s| s * s).sum::<f32>() / chunk.len() as f32).sqrt()
}
