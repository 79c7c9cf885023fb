//! Text query handling.
//!
//! Every question runs against the fixed context document below. The handler
//! is inert while the model is unavailable and never surfaces an inference
//! failure as anything other than the fixed fallback message.

use crate::qa::{Answer, QaHandle};
use serde::Serialize;
use std::sync::Arc;

/// The fixed background passage all questions are evaluated against
pub const CONTEXT_DOCUMENT: &str = "\
Virtual doctors provide general health advice. However, for conditions like \
diabetes, high blood pressure, or heart disease, consult a real doctor.
Stay healthy by eating well, exercising, staying hydrated, and managing stress.

Sitting for too long can cause health problems. It may increase the risk of \
obesity, heart disease, diabetes, and back pain.
It can also weaken muscles, reduce circulation, and lead to posture problems.
To stay healthy, take breaks, stand up, stretch, and walk around every hour.";

/// Shown when the model answer is blank or inference failed
pub const FALLBACK_REPLY: &str =
    "Doctor: Sorry, I couldn't understand your question. Can you rephrase it?";

/// Shown instead of calling a model that failed to load
pub const MODEL_UNAVAILABLE_REPLY: &str =
    "The answering model is unavailable right now. Health report analysis and tips still work.";

/// One reply to a text or transcribed query
#[derive(Debug, Clone, Serialize)]
pub struct Reply {
    pub reply: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_answer: Option<Answer>,
}

/// Text Query Handler bound to the shared QA capability
pub struct Assistant {
    qa: Arc<QaHandle>,
}

impl Assistant {
    pub fn new(qa: Arc<QaHandle>) -> Self {
        Self { qa }
    }

    pub fn qa(&self) -> &QaHandle {
        &self.qa
    }

    /// Answer one query. A single failed or empty answer is final for the
    /// interaction; there are no retries.
    pub fn respond(&self, question: &str) -> Reply {
        let answerer = match self.qa.as_ref() {
            QaHandle::Ready(answerer) => answerer,
            QaHandle::Unavailable(reason) => {
                log::warn!("query rejected, model unavailable: {}", reason);
                return Reply {
                    reply: MODEL_UNAVAILABLE_REPLY.to_string(),
                    model_answer: None,
                };
            }
        };

        match answerer.answer(question, CONTEXT_DOCUMENT) {
            Ok(answer) if !answer.text.trim().is_empty() => Reply {
                reply: format!("Doctor: {}", answer.text.trim()),
                model_answer: Some(answer),
            },
            Ok(answer) => {
                log::info!("blank answer (score {:.3}), using fallback", answer.score);
                Reply {
                    reply: FALLBACK_REPLY.to_string(),
                    model_answer: None,
                }
            }
            Err(e) => {
                log::warn!("inference failed, using fallback: {}", e);
                Reply {
                    reply: FALLBACK_REPLY.to_string(),
                    model_answer: None,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{AssistantError, Result};
    use crate::qa::QuestionAnswerer;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingAnswerer {
        calls: Arc<AtomicUsize>,
        text: &'static str,
    }

    impl QuestionAnswerer for CountingAnswerer {
        fn answer(&self, _question: &str, context: &str) -> Result<Answer> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(context, CONTEXT_DOCUMENT);
            Ok(Answer {
                text: self.text.to_string(),
                score: 0.5,
                start: 0,
                end: self.text.len(),
            })
        }
    }

    struct FailingAnswerer;

    impl QuestionAnswerer for FailingAnswerer {
        fn answer(&self, _question: &str, _context: &str) -> Result<Answer> {
            Err(AssistantError::Inference("shape mismatch".to_string()))
        }
    }

    #[test]
    fn test_unavailable_model_is_never_called() {
        let assistant = Assistant::new(Arc::new(QaHandle::unavailable("no weights")));
        let reply = assistant.respond("Can sitting too much cause health problems?");
        assert_eq!(reply.reply, MODEL_UNAVAILABLE_REPLY);
        assert!(reply.model_answer.is_none());
    }

    #[test]
    fn test_answer_gets_doctor_prefix() {
        let calls = Arc::new(AtomicUsize::new(0));
        let assistant = Assistant::new(Arc::new(QaHandle::ready(CountingAnswerer {
            calls: calls.clone(),
            text: "take breaks, stand up, stretch",
        })));
        let reply = assistant.respond("How do I avoid sitting problems?");
        assert_eq!(reply.reply, "Doctor: take breaks, stand up, stretch");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(reply.model_answer.is_some());
    }

    #[test]
    fn test_whitespace_answer_uses_fallback() {
        let calls = Arc::new(AtomicUsize::new(0));
        let assistant = Assistant::new(Arc::new(QaHandle::ready(CountingAnswerer {
            calls,
            text: "   ",
        })));
        let reply = assistant.respond("What?");
        assert_eq!(reply.reply, FALLBACK_REPLY);
        assert!(reply.model_answer.is_none());
    }

    #[test]
    fn test_inference_error_uses_fallback_without_raising() {
        let assistant = Assistant::new(Arc::new(QaHandle::ready(FailingAnswerer)));
        let reply = assistant.respond("What are the symptoms of food poisoning?");
        assert_eq!(reply.reply, FALLBACK_REPLY);
    }
}
