//! Client for the external transcription service.
//!
//! The captured utterance is packed into a 16-bit PCM WAV and posted as a
//! multipart form; the service replies with `{ "text": ... }`. Service and
//! transport failures map to the service-error variant; an empty transcript
//! maps to unintelligible.

use crate::errors::{AssistantError, Result};
use crate::speech::capture::Utterance;
use hound::{SampleFormat, WavSpec, WavWriter};
use reqwest::multipart;
use serde::Deserialize;
use std::io::Cursor;
use std::time::Duration;

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// HTTP client bound to one transcription endpoint
pub struct TranscriptionClient {
    client: reqwest::Client,
    endpoint: String,
}

impl TranscriptionClient {
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Transcribe one utterance. No retries; the client timeout is the only
    /// policy beyond what the service provides.
    pub async fn transcribe(&self, utterance: &Utterance) -> Result<String> {
        let wav = encode_wav(utterance)?;

        let part = multipart::Part::bytes(wav)
            .file_name("question.wav")
            .mime_str("audio/wav")
            .map_err(|e| AssistantError::TranscriptionService(e.to_string()))?;
        let form = multipart::Form::new().part("file", part);

        let resp = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AssistantError::TranscriptionService(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AssistantError::TranscriptionService(format!(
                "{} - {}",
                status, body
            )));
        }

        let parsed: TranscriptionResponse = resp
            .json()
            .await
            .map_err(|e| AssistantError::TranscriptionService(e.to_string()))?;

        let text = parsed.text.trim().to_string();
        if text.is_empty() {
            return Err(AssistantError::Unintelligible);
        }
        Ok(text)
    }
}

/// Pack mono 16-bit samples into an in-memory WAV
fn encode_wav(utterance: &Utterance) -> Result<Vec<u8>> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: utterance.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut bytes = Vec::new();
    {
        let mut writer = WavWriter::new(Cursor::new(&mut bytes), spec)
            .map_err(|e| AssistantError::Capture(format!("wav header: {}", e)))?;
        for &sample in &utterance.samples {
            writer
                .write_sample(sample)
                .map_err(|e| AssistantError::Capture(format!("wav sample: {}", e)))?;
        }
        writer
            .finalize()
            .map_err(|e| AssistantError::Capture(format!("wav finalize: {}", e)))?;
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_wav_header() {
        let utterance = Utterance {
            samples: vec![0, 100, -100, 0],
            sample_rate: 16_000,
        };
        let wav = encode_wav(&utterance).unwrap();
        assert_eq!(&wav[..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        // 4 samples * 2 bytes + 44-byte header
        assert_eq!(wav.len(), 52);
    }

    #[tokio::test]
    async fn test_unreachable_service_maps_to_service_error() {
        // Reserved TEST-NET address, nothing listens there
        let client = TranscriptionClient::new(
            "http://192.0.2.1:9/transcribe".to_string(),
            Duration::from_millis(200),
        )
        .unwrap();
        let utterance = Utterance {
            samples: vec![0; 160],
            sample_rate: 16_000,
        };
        let err = client.transcribe(&utterance).await.unwrap_err();
        assert!(matches!(err, AssistantError::TranscriptionService(_)));
    }
}
