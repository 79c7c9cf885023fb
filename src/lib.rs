//! healthbuddy - Virtual Health Assistant Service
//!
//! A small web service that answers free-text health questions with a local
//! extractive QA model, takes voice queries through an external transcription
//! service, analyzes uploaded health-metric CSVs against fixed thresholds,
//! and serves canned health tips.
//!
//! # Architecture
//!
//! - `qa`: model loader + extractive question answering (candle)
//! - `assistant`: text query handling against the fixed context document
//! - `speech`: microphone capture, endpointing, transcription client
//! - `report`: CSV analysis, condition flags, chart rendering
//! - `server`: thin axum layer wiring the handlers together

pub mod errors;
pub mod config;
pub mod cli;
pub mod qa;
pub mod assistant;
pub mod speech;
pub mod report;
pub mod tips;
pub mod doctor;
pub mod server;

// Re-export commonly used types
pub use errors::{AssistantError, Result};
