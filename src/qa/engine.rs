//! QA engine: BERT-family encoder plus span-prediction head via Candle.
//!
//! Weights, config, and tokenizer are fetched through the HuggingFace Hub on
//! first use and cached locally. Inference runs on CPU.

use crate::errors::{AssistantError, Result as CrateResult};
use crate::qa::{Answer, QuestionAnswerer, DEFAULT_MODEL_ID};
use anyhow::{Context, Result};
use candle_core::{Device, Tensor};
use candle_nn::{Linear, Module, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config};
use hf_hub::{api::sync::Api, Repo, RepoType};
use std::sync::Arc;
use tokenizers::Tokenizer;

/// Longest answer span considered, in tokens
const MAX_ANSWER_TOKENS: usize = 30;

/// Extractive QA engine bound to one pretrained checkpoint
pub struct QaEngine {
    model: Arc<BertModel>,
    qa_head: Linear,
    tokenizer: Arc<Tokenizer>,
    device: Device,
}

impl QaEngine {
    /// Load the checkpoint (downloads model files on first use)
    pub fn load(model_id: &str) -> Result<Self> {
        let device = Device::Cpu;

        let api = Api::new().context("Failed to create HuggingFace API client")?;
        let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));

        let config_path = repo
            .get("config.json")
            .context("Failed to download model config")?;
        let tokenizer_path = repo
            .get("tokenizer.json")
            .context("Failed to download tokenizer")?;
        let weights_path = repo
            .get("model.safetensors")
            .context("Failed to download model weights")?;

        let config_contents =
            std::fs::read_to_string(config_path).context("Failed to read config file")?;
        ensure_bert_family(&config_contents)?;
        let config: Config =
            serde_json::from_str(&config_contents).context("Failed to parse model config")?;

        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(
                &[weights_path],
                candle_core::DType::F32,
                &device,
            )
            .context("Failed to load model weights")?
        };

        // BERT SQuAD2 checkpoints keep the encoder under the "bert" prefix
        // and the span head under "qa_outputs"
        let model =
            BertModel::load(vb.pp("bert"), &config).context("Failed to create encoder")?;
        let qa_head = candle_nn::linear(config.hidden_size, 2, vb.pp("qa_outputs"))
            .context("Failed to load span-prediction head")?;

        Ok(Self {
            model: Arc::new(model),
            qa_head,
            tokenizer: Arc::new(tokenizer),
            device,
        })
    }

    fn span_logits(&self, question: &str, context: &str) -> CrateResult<SpanScores> {
        let encoding = self
            .tokenizer
            .encode((question, context), true)
            .map_err(|e| AssistantError::Tokenizer(e.to_string()))?;

        let seq_len = encoding.get_ids().len();
        if seq_len == 0 {
            return Err(AssistantError::Tokenizer("empty encoding".to_string()));
        }

        let input_ids = Tensor::from_vec(
            encoding.get_ids().to_vec(),
            (1, seq_len),
            &self.device,
        )
        .map_err(|e| AssistantError::Inference(e.to_string()))?;
        let token_type_ids = Tensor::from_vec(
            encoding.get_type_ids().to_vec(),
            (1, seq_len),
            &self.device,
        )
        .map_err(|e| AssistantError::Inference(e.to_string()))?;
        let attention_mask = Tensor::from_vec(
            encoding.get_attention_mask().to_vec(),
            (1, seq_len),
            &self.device,
        )
        .map_err(|e| AssistantError::Inference(e.to_string()))?;

        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))
            .map_err(|e| AssistantError::Inference(e.to_string()))?;
        // (1, seq, 2) -> start and end logit vectors
        let logits = self
            .qa_head
            .forward(&hidden)
            .map_err(|e| AssistantError::Inference(e.to_string()))?;

        let start_logits = logits
            .narrow(2, 0, 1)
            .and_then(|t| t.squeeze(2))
            .and_then(|t| t.squeeze(0))
            .and_then(|t| t.to_vec1::<f32>())
            .map_err(|e| AssistantError::Inference(e.to_string()))?;
        let end_logits = logits
            .narrow(2, 1, 1)
            .and_then(|t| t.squeeze(2))
            .and_then(|t| t.squeeze(0))
            .and_then(|t| t.to_vec1::<f32>())
            .map_err(|e| AssistantError::Inference(e.to_string()))?;

        Ok(SpanScores {
            start_logits,
            end_logits,
            context_mask: encoding
                .get_sequence_ids()
                .iter()
                .map(|s| *s == Some(1))
                .collect(),
            offsets: encoding.get_offsets().to_vec(),
        })
    }
}

impl QuestionAnswerer for QaEngine {
    fn answer(&self, question: &str, context: &str) -> CrateResult<Answer> {
        let scores = self.span_logits(question, context)?;
        Ok(scores.best_answer(context))
    }
}

/// Raw per-token scores plus the bookkeeping needed to map a token span back
/// to a character span in the context
struct SpanScores {
    start_logits: Vec<f32>,
    end_logits: Vec<f32>,
    context_mask: Vec<bool>,
    offsets: Vec<(usize, usize)>,
}

impl SpanScores {
    /// Best (start, end) pair restricted to context tokens, against the
    /// no-answer option scored at the first token (SQuAD2 convention)
    fn best_answer(&self, context: &str) -> Answer {
        let p_start = masked_softmax(&self.start_logits, &self.context_mask, true);
        let p_end = masked_softmax(&self.end_logits, &self.context_mask, true);

        let null_score = p_start[0] * p_end[0];

        let mut best = (0usize, 0usize, 0.0f32);
        for i in 0..p_start.len() {
            if !self.context_mask[i] {
                continue;
            }
            let j_max = (i + MAX_ANSWER_TOKENS).min(p_end.len() - 1);
            for j in i..=j_max {
                if !self.context_mask[j] {
                    continue;
                }
                let score = p_start[i] * p_end[j];
                if score > best.2 {
                    best = (i, j, score);
                }
            }
        }

        let (start_tok, end_tok, score) = best;
        if score <= null_score || score == 0.0 {
            return Answer {
                text: String::new(),
                score: null_score,
                start: 0,
                end: 0,
            };
        }

        let start = self.offsets[start_tok].0;
        let end = self.offsets[end_tok].1;
        let text = context.get(start..end).unwrap_or("").to_string();
        Answer {
            text,
            score,
            start,
            end,
        }
    }
}

/// Reject checkpoints whose position-embedding convention the encoder does
/// not implement.
///
/// The encoder indexes position embeddings as `0..seq`; RoBERTa-family
/// checkpoints are trained with position ids offset by `pad_token_id + 1`,
/// so loading one here would read every position embedding shifted by two.
fn ensure_bert_family(raw_config: &str) -> Result<()> {
    let value: serde_json::Value =
        serde_json::from_str(raw_config).context("Failed to parse model config")?;
    if let Some(kind) = value.get("model_type").and_then(|v| v.as_str()) {
        if matches!(kind, "roberta" | "xlm-roberta" | "camembert") {
            anyhow::bail!(
                "unsupported model type {:?}: its position ids are offset by \
                 pad_token_id + 1, which this encoder does not apply; use a \
                 BERT-family SQuAD2 checkpoint such as {}",
                kind,
                DEFAULT_MODEL_ID
            );
        }
    }
    Ok(())
}

/// Softmax over the logits, optionally keeping the first token live so the
/// no-answer option stays comparable
fn masked_softmax(logits: &[f32], mask: &[bool], keep_first: bool) -> Vec<f32> {
    let live = |i: usize| mask[i] || (keep_first && i == 0);
    let max = logits
        .iter()
        .enumerate()
        .filter(|(i, _)| live(*i))
        .map(|(_, v)| *v)
        .fold(f32::NEG_INFINITY, f32::max);
    if max == f32::NEG_INFINITY {
        return vec![0.0; logits.len()];
    }
    let exps: Vec<f32> = logits
        .iter()
        .enumerate()
        .map(|(i, v)| if live(i) { (v - max).exp() } else { 0.0 })
        .collect();
    let sum: f32 = exps.iter().sum();
    if sum == 0.0 {
        return exps;
    }
    exps.into_iter().map(|e| e / sum).collect()
}
