//! Command-line argument parsing.
//!
//! Flags (with environment fallbacks) take precedence over the config file,
//! which takes precedence over the built-in defaults.

use crate::config::Config;
use crate::qa::DEFAULT_MODEL_ID;
use crate::speech::CaptureSettings;
use clap::{Parser, Subcommand};
use std::time::Duration;

/// Default URL of the transcription service
pub const DEFAULT_TRANSCRIBE_URL: &str = "http://localhost:9000/transcribe";

/// healthbuddy - virtual health assistant service
#[derive(Parser, Debug)]
#[command(name = "healthbuddy")]
#[command(version = "0.1.0")]
#[command(about = "Virtual health assistant: QA, voice queries, health report analysis", long_about = None)]
pub struct Args {
    /// Address to bind the HTTP server to (host:port)
    #[arg(long, env = "HEALTHBUDDY_BIND", default_value = "127.0.0.1:8080")]
    pub bind: String,

    /// QA model checkpoint id
    #[arg(long, env = "HEALTHBUDDY_MODEL")]
    pub model: Option<String>,

    /// Transcription service URL
    #[arg(long, env = "HEALTHBUDDY_TRANSCRIBE_URL")]
    pub transcribe_url: Option<String>,

    /// Seconds before transcription requests time out
    #[arg(long, default_value_t = 30)]
    pub transcribe_timeout_secs: u64,

    /// RMS level above which captured audio counts as speech
    #[arg(long, default_value_t = 0.015)]
    pub speech_threshold: f32,

    /// Trailing silence in milliseconds that ends an utterance
    #[arg(long, default_value_t = 1200)]
    pub trailing_silence_ms: u64,

    /// Hard cap on utterance length in seconds
    #[arg(long, default_value_t = 30)]
    pub max_utterance_secs: u64,

    /// Subcommand
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the assistant server (default)
    Serve,
    /// Run system diagnostics and health checks
    Doctor,
    /// Display the effective configuration
    Config,
}

/// Effective runtime settings after merging flags, env, and config file
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind: String,
    pub model_id: String,
    pub transcribe_url: String,
    pub transcribe_timeout: Duration,
    pub capture: CaptureSettings,
}

impl Args {
    /// Merge with the persisted config file
    pub fn settings(&self, file: &Config) -> Settings {
        let model_id = self
            .model
            .clone()
            .or_else(|| file.model.id.clone())
            .unwrap_or_else(|| DEFAULT_MODEL_ID.to_string());
        let transcribe_url = self
            .transcribe_url
            .clone()
            .or_else(|| file.speech.endpoint.clone())
            .unwrap_or_else(|| DEFAULT_TRANSCRIBE_URL.to_string());

        let capture = CaptureSettings {
            speech_threshold: self.speech_threshold,
            trailing_silence: Duration::from_millis(self.trailing_silence_ms),
            max_utterance: Duration::from_secs(self.max_utterance_secs),
            ..CaptureSettings::default()
        };

        Settings {
            bind: self.bind.clone(),
            model_id,
            transcribe_url,
            transcribe_timeout: Duration::from_secs(self.transcribe_timeout_secs.max(1)),
            capture,
        }
    }
}
