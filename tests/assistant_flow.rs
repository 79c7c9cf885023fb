//! Query handling and tip selection properties, exercised through the
//! public capability interface with a stand-in answerer.

use healthbuddy::assistant::{Assistant, CONTEXT_DOCUMENT, FALLBACK_REPLY, MODEL_UNAVAILABLE_REPLY};
use healthbuddy::qa::{Answer, QaHandle, QuestionAnswerer};
use healthbuddy::tips::{random_tip, HEALTH_TIPS};
use healthbuddy::Result;
use std::collections::HashMap;
use std::sync::Arc;

/// Answers every question with a fixed span from the context
struct SpanAnswerer {
    text: String,
}

impl QuestionAnswerer for SpanAnswerer {
    fn answer(&self, _question: &str, context: &str) -> Result<Answer> {
        let start = context.find(&self.text).unwrap_or(0);
        Ok(Answer {
            text: self.text.clone(),
            score: 0.8,
            start,
            end: start + self.text.len(),
        })
    }
}

#[test]
fn unavailable_capability_replies_without_erroring() {
    let assistant = Assistant::new(Arc::new(QaHandle::unavailable("download failed")));
    let reply = assistant.respond("Does sitting for long hours cause diseases?");
    assert_eq!(reply.reply, MODEL_UNAVAILABLE_REPLY);
    assert!(reply.model_answer.is_none());

    // A ready handle does invoke its answerer
    let assistant = Assistant::new(Arc::new(QaHandle::ready(SpanAnswerer {
        text: "take breaks".to_string(),
    })));
    let reply = assistant.respond("How do I avoid problems from sitting?");
    assert_eq!(reply.reply, "Doctor: take breaks");
}

#[test]
fn blank_answer_yields_fixed_fallback() {
    let assistant = Assistant::new(Arc::new(QaHandle::ready(SpanAnswerer {
        text: "  \t ".to_string(),
    })));
    let reply = assistant.respond("What are the symptoms of food poisoning?");
    assert_eq!(reply.reply, FALLBACK_REPLY);
    assert!(reply.model_answer.is_none());
}

#[test]
fn answer_offsets_point_into_the_context_document() {
    let span = "walk around every hour";
    assert!(CONTEXT_DOCUMENT.contains(span));
    let assistant = Assistant::new(Arc::new(QaHandle::ready(SpanAnswerer {
        text: span.to_string(),
    })));
    let reply = assistant.respond("What should I do every hour?");
    let answer = reply.model_answer.expect("answer expected");
    assert_eq!(&CONTEXT_DOCUMENT[answer.start..answer.end], span);
}

#[test]
fn tips_are_roughly_uniform_over_many_draws() {
    let samples = 16_000;
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for _ in 0..samples {
        *counts.entry(random_tip()).or_default() += 1;
    }
    assert_eq!(counts.len(), HEALTH_TIPS.len(), "every tip must appear");
    let expected = samples / HEALTH_TIPS.len();
    for (tip, count) in counts {
        assert!(
            count > expected / 2 && count < expected * 2,
            "tip {:?} drawn {} times, expected near {}",
            tip,
            count,
            expected
        );
    }
}
