// Sentence embeddings via a BERT model running on candle
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config};
use hf_hub::{api::sync::Api, Repo, RepoType};
use std::fmt::Display;
use std::sync::Arc;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::info;

use super::{l2_normalize, validate_text, Embedder};
use crate::errors::{RagError, Result};

pub const DEFAULT_MODEL_ID: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Longest token sequence fed to the model
const MAX_SEQUENCE_TOKENS: usize = 256;

/// BERT sentence embedder (downloads the model on construction)
pub struct NeuralEmbedder {
    model: Arc<BertModel>,
    tokenizer: Arc<Tokenizer>,
    device: Device,
    dimension: usize,
    model_id: String,
}

fn load_error<E: Display>(what: &str) -> impl FnOnce(E) -> RagError + '_ {
    move |e| RagError::EmbeddingFailure(format!("{}: {}", what, e))
}

impl NeuralEmbedder {
    /// Fetch config, tokenizer and weights from the HuggingFace Hub and load them
    pub fn new(model_id: &str) -> Result<Self> {
        let device = Device::Cpu;

        info!(model_id, "loading neural embedding model");
        let api = Api::new().map_err(load_error("failed to create HuggingFace API client"))?;
        let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));

        let config_path = repo
            .get("config.json")
            .map_err(load_error("failed to download model config"))?;
        let tokenizer_path = repo
            .get("tokenizer.json")
            .map_err(load_error("failed to download tokenizer"))?;
        let weights_path = repo
            .get("model.safetensors")
            .map_err(load_error("failed to download model weights"))?;

        let config_contents = std::fs::read_to_string(config_path)?;
        let raw_config: serde_json::Value = serde_json::from_str(&config_contents)?;
        let dimension = raw_config
            .get("hidden_size")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| RagError::EmbeddingFailure("model config lacks hidden_size".to_string()))?
            as usize;
        let config: Config = serde_json::from_value(raw_config)?;

        let mut tokenizer =
            Tokenizer::from_file(tokenizer_path).map_err(load_error("failed to load tokenizer"))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQUENCE_TOKENS,
                ..Default::default()
            }))
            .map_err(load_error("failed to configure truncation"))?;

        // Safety: the safetensors file is not modified while mapped
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)
                .map_err(load_error("failed to load model weights"))?
        };
        let model = BertModel::load(vb, &config).map_err(load_error("failed to build BERT model"))?;
        info!(model_id, dimension, "neural embedding model ready");

        Ok(Self {
            model: Arc::new(model),
            tokenizer: Arc::new(tokenizer),
            device,
            dimension,
            model_id: model_id.to_string(),
        })
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    fn forward(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(load_error("tokenization failed"))?;

        let max_len = encodings.iter().map(|e| e.get_ids().len()).max().unwrap_or(0);
        let batch_size = texts.len();

        // Right-pad ids and masks to the longest sequence
        let mut flat_ids = vec![0u32; batch_size * max_len];
        let mut flat_mask = vec![0u32; batch_size * max_len];
        for (row, encoding) in encodings.iter().enumerate() {
            let ids = encoding.get_ids();
            let mask = encoding.get_attention_mask();
            let start = row * max_len;
            flat_ids[start..start + ids.len()].copy_from_slice(ids);
            flat_mask[start..start + mask.len()].copy_from_slice(mask);
        }

        let inference = load_error("model inference failed");
        let run = || -> candle_core::Result<Vec<Vec<f32>>> {
            let token_ids = Tensor::from_vec(flat_ids, (batch_size, max_len), &self.device)?;
            let attention_mask = Tensor::from_vec(flat_mask, (batch_size, max_len), &self.device)?;
            let token_type_ids = token_ids.zeros_like()?;

            let hidden = self
                .model
                .forward(&token_ids, &token_type_ids, Some(&attention_mask))?;
            Self::mean_pool(&hidden, &attention_mask)?.to_vec2::<f32>()
        };
        let mut vectors = run().map_err(inference)?;

        for vector in vectors.iter_mut() {
            l2_normalize(vector);
        }
        Ok(vectors)
    }

    /// Mean over the sequence, counting only unmasked tokens
    fn mean_pool(hidden: &Tensor, attention_mask: &Tensor) -> candle_core::Result<Tensor> {
        let mask = attention_mask
            .unsqueeze(2)?
            .expand(hidden.shape())?
            .to_dtype(hidden.dtype())?;

        let summed = (hidden * &mask)?.sum(1)?;
        let counts = mask.sum(1)?.clamp(1e-9, f64::MAX)?;
        summed.broadcast_div(&counts)
    }
}

impl Embedder for NeuralEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let trimmed = validate_text(text)?;
        self.forward(&[trimmed])?
            .pop()
            .ok_or_else(|| RagError::EmbeddingFailure("model returned no embedding".to_string()))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let trimmed = texts
            .iter()
            .map(|t| validate_text(t))
            .collect::<Result<Vec<_>>>()?;
        self.forward(&trimmed)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "neural"
    }
}
