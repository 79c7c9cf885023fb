//! Voice query handling.
//!
//! Capture runs on the default input device and blocks until the endpointer
//! decides the utterance is over; the clip then goes to the external
//! transcription service. Two failure modes are user-visible and non-fatal:
//! unintelligible audio, and a broken transcription service.

pub mod capture;
pub mod transcribe;

pub use capture::{capture_utterance, CaptureSettings, Utterance};
pub use transcribe::TranscriptionClient;

use crate::errors::{AssistantError, Result};

/// Message for audio that produced no usable transcript
pub const UNINTELLIGIBLE_MESSAGE: &str = "Sorry, I couldn't understand what you said.";

/// Message for an unreachable or erroring transcription service
pub const SERVICE_ERROR_MESSAGE: &str =
    "There was an issue with the speech recognition service.";

/// Capture one utterance from the microphone and transcribe it.
///
/// Capture is blocking and runs on a worker thread; the device is released
/// when the capture returns.
pub async fn listen_and_transcribe(
    settings: CaptureSettings,
    client: &TranscriptionClient,
) -> Result<String> {
    let utterance = tokio::task::spawn_blocking(move || capture_utterance(&settings))
        .await
        .map_err(|e| AssistantError::Capture(format!("capture task failed: {}", e)))??;

    log::info!(
        "captured {} samples at {} Hz",
        utterance.samples.len(),
        utterance.sample_rate
    );
    client.transcribe(&utterance).await
}
