use anyhow::{anyhow, Context, Result};
use candle::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use std::fs;
use std::path::Path;
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};
use tracing::{debug, info};

use super::snapshot::ModelSnapshot;
use super::TextEmbedder;

/// E5 sentence encoder: BERT forward pass, masked mean pooling, optional L2 norm.
pub struct E5Embedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    model_id: String,
    hidden_size: usize,
}

impl E5Embedder {
    pub fn load(
        model_id: &str,
        snapshot: &ModelSnapshot,
        device: Device,
        max_seq_len: usize,
    ) -> Result<Self> {
        info!(
            model_id,
            snapshot = %snapshot.dir.display(),
            device = ?device,
            "loading embedding model"
        );

        let raw = fs::read(&snapshot.config)
            .with_context(|| format!("failed to read {}", snapshot.config.display()))?;
        let config: BertConfig = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse {}", snapshot.config.display()))?;

        let max_len = max_seq_len.min(config.max_position_embeddings).max(1);
        let tokenizer = build_tokenizer(&snapshot.tokenizer, max_len)?;

        let vb = build_var_builder(&snapshot.weights, DType::F32, &device)?;
        let model = BertModel::load(vb, &config)
            .with_context(|| format!("failed to build BERT model for {model_id}"))?;

        info!(
            model_id,
            dims = config.hidden_size,
            max_len,
            "embedding model ready"
        );

        Ok(Self {
            model,
            tokenizer,
            device,
            model_id: model_id.to_string(),
            hidden_size: config.hidden_size,
        })
    }

    fn forward_batch(&self, texts: &[String], normalize: bool) -> Result<Tensor> {
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow!("Tokenizer encode error: {e}"))?;

        let batch = encodings.len();
        let seq_len = encodings.first().map(|e| e.get_ids().len()).unwrap_or(0);
        if seq_len == 0 {
            return Err(anyhow!("tokenizer produced empty sequences"));
        }

        let mut ids = Vec::with_capacity(batch * seq_len);
        let mut mask = Vec::with_capacity(batch * seq_len);
        for enc in &encodings {
            ids.extend_from_slice(enc.get_ids());
            mask.extend_from_slice(enc.get_attention_mask());
        }
        debug!(batch, seq_len, "running embedding forward pass");

        let input_ids = Tensor::from_vec(ids, (batch, seq_len), &self.device)?;
        let attention_mask = Tensor::from_vec(mask, (batch, seq_len), &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;

        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))
            .context("embedding forward pass failed")?;

        let pooled = mean_pool(&hidden, &attention_mask)?;
        if normalize {
            Ok(l2_normalize(&pooled)?)
        } else {
            Ok(pooled)
        }
    }
}

impl TextEmbedder for E5Embedder {
    fn encode(&self, texts: &[String], normalize: bool) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let embeddings = self.forward_batch(texts, normalize)?;
        embeddings
            .to_device(&Device::Cpu)?
            .to_vec2::<f32>()
            .map_err(|e| anyhow!("failed to decode embeddings: {e}"))
    }

    fn dimension(&self) -> usize {
        self.hidden_size
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

fn build_tokenizer(path: &Path, max_len: usize) -> Result<Tokenizer> {
    let mut tokenizer = Tokenizer::from_file(path)
        .map_err(|e| anyhow!("Tokenizer load failed ({}): {e}", path.display()))?;

    let pad_id = pad_token_id(&tokenizer);
    let pad_token = tokenizer
        .id_to_token(pad_id)
        .unwrap_or_else(|| "<pad>".to_string());
    tokenizer.with_padding(Some(PaddingParams {
        strategy: PaddingStrategy::BatchLongest,
        pad_id,
        pad_token,
        ..Default::default()
    }));
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length: max_len,
            ..Default::default()
        }))
        .map_err(|e| anyhow!("Tokenizer truncation setup failed: {e}"))?;

    Ok(tokenizer)
}

fn pad_token_id(tokenizer: &Tokenizer) -> u32 {
    tokenizer
        .get_padding()
        .map(|params| params.pad_id)
        .or_else(|| tokenizer.token_to_id("<pad>"))
        .or_else(|| tokenizer.token_to_id("[PAD]"))
        .unwrap_or(0)
}

fn build_var_builder(path: &Path, dtype: DType, device: &Device) -> Result<VarBuilder<'static>> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    if ext == "safetensors" {
        let files = vec![path.to_path_buf()];
        unsafe {
            VarBuilder::from_mmaped_safetensors(&files, dtype, device)
                .map_err(|e| anyhow!("failed to load {}: {e}", path.display()))
        }
    } else {
        VarBuilder::from_pth(path, dtype, device)
            .map_err(|e| anyhow!("failed to load {}: {e}", path.display()))
    }
}

/// Average token states over positions where `attention_mask` is 1.
fn mean_pool(hidden: &Tensor, attention_mask: &Tensor) -> candle::Result<Tensor> {
    let hidden = hidden.to_dtype(DType::F32)?;
    let mask = attention_mask.to_dtype(DType::F32)?.unsqueeze(2)?;
    let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
    let counts = mask.sum(1)?.clamp(1e-9f32, f32::MAX)?;
    summed.broadcast_div(&counts)
}

fn l2_normalize(v: &Tensor) -> candle::Result<Tensor> {
    let norm = v.sqr()?.sum_keepdim(1)?.sqrt()?.clamp(1e-12f32, f32::MAX)?;
    v.broadcast_div(&norm)
}
