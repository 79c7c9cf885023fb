//! Extractive question answering.
//!
//! The model is loaded once at startup. On any load failure the handle
//! degrades to `Unavailable` with the captured reason; dependent handlers
//! must check availability and go inert instead of crashing.

pub mod engine;

pub use engine::QaEngine;

use crate::errors::Result;
use serde::Serialize;

/// Default pretrained extractive QA checkpoint.
///
/// BERT-family on purpose: the encoder builds absolute position ids starting
/// at 0, which RoBERTa checkpoints do not use (their position ids are offset
/// by `pad_token_id + 1`). RoBERTa-family checkpoints are rejected at load.
pub const DEFAULT_MODEL_ID: &str = "deepset/bert-base-cased-squad2";

/// One extracted answer span.
///
/// `start`/`end` are byte offsets into the context passage; `text` is the
/// span itself and may be empty when the model prefers the no-answer option.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub text: String,
    pub score: f32,
    pub start: usize,
    pub end: usize,
}

/// Capability interface for answering a question against a context passage
pub trait QuestionAnswerer: Send + Sync {
    fn answer(&self, question: &str, context: &str) -> Result<Answer>;
}

/// Process-wide QA capability, constructed once and shared read-only
pub enum QaHandle {
    Ready(Box<dyn QuestionAnswerer>),
    Unavailable(String),
}

impl QaHandle {
    /// Try to load the model; failures degrade to `Unavailable`, never panic
    pub fn load(model_id: &str) -> Self {
        match QaEngine::load(model_id) {
            Ok(engine) => QaHandle::Ready(Box::new(engine)),
            Err(e) => QaHandle::Unavailable(e.to_string()),
        }
    }

    pub fn ready(answerer: impl QuestionAnswerer + 'static) -> Self {
        QaHandle::Ready(Box::new(answerer))
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        QaHandle::Unavailable(reason.into())
    }

    pub fn is_available(&self) -> bool {
        matches!(self, QaHandle::Ready(_))
    }

    pub fn unavailable_reason(&self) -> Option<&str> {
        match self {
            QaHandle::Ready(_) => None,
            QaHandle::Unavailable(reason) => Some(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedAnswerer(&'static str);

    impl QuestionAnswerer for FixedAnswerer {
        fn answer(&self, _question: &str, _context: &str) -> Result<Answer> {
            Ok(Answer {
                text: self.0.to_string(),
                score: 0.9,
                start: 0,
                end: self.0.len(),
            })
        }
    }

    #[test]
    fn test_handle_availability() {
        let ready = QaHandle::ready(FixedAnswerer("rest"));
        assert!(ready.is_available());
        assert!(ready.unavailable_reason().is_none());

        let down = QaHandle::unavailable("weights missing");
        assert!(!down.is_available());
        assert_eq!(down.unavailable_reason(), Some("weights missing"));
    }
}
