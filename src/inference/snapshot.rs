use anyhow::{anyhow, Context, Result};
use hf_hub::api::sync::ApiBuilder;
use std::path::{Path, PathBuf};
use tracing::info;

const WEIGHT_CANDIDATES: [&str; 2] = ["model.safetensors", "pytorch_model.bin"];

/// Files needed to build the embedder.
#[derive(Debug, Clone)]
pub struct ModelSnapshot {
    pub dir: PathBuf,
    pub config: PathBuf,
    pub tokenizer: PathBuf,
    pub weights: PathBuf,
}

impl ModelSnapshot {
    /// Use an explicit local directory when given, otherwise go through the HF hub cache.
    pub fn resolve(model_id: &str, local_dir: Option<&Path>) -> Result<Self> {
        match local_dir {
            Some(dir) => Self::from_dir(dir),
            None => Self::fetch(model_id),
        }
    }

    pub fn from_dir(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(anyhow!("model directory {} does not exist", dir.display()));
        }
        let config = require_file(dir, "config.json")?;
        let tokenizer = require_file(dir, "tokenizer.json")?;
        let weights = find_model_weights(dir)
            .ok_or_else(|| anyhow!("no model weights found under {}", dir.display()))?;

        Ok(Self {
            dir: dir.to_path_buf(),
            config,
            tokenizer,
            weights,
        })
    }

    /// Download (or reuse the cached copy of) the model files from the HF hub.
    pub fn fetch(model_id: &str) -> Result<Self> {
        info!(model_id, "resolving model through huggingface hub cache");
        let api = ApiBuilder::new()
            .with_progress(false)
            .build()
            .context("failed to initialize huggingface hub client")?;
        let repo = api.model(model_id.to_string());

        let config = repo
            .get("config.json")
            .with_context(|| format!("failed to fetch config.json for {model_id}"))?;
        let tokenizer = repo
            .get("tokenizer.json")
            .with_context(|| format!("failed to fetch tokenizer.json for {model_id}"))?;
        let weights = WEIGHT_CANDIDATES
            .iter()
            .find_map(|name| repo.get(name).ok())
            .ok_or_else(|| anyhow!("no model weights available for {model_id}"))?;

        let dir = config
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self {
            dir,
            config,
            tokenizer,
            weights,
        })
    }
}

fn require_file(dir: &Path, name: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    if path.exists() {
        Ok(path)
    } else {
        Err(anyhow!("{name} not found under {}", dir.display()))
    }
}

fn find_model_weights(dir: &Path) -> Option<PathBuf> {
    WEIGHT_CANDIDATES
        .iter()
        .map(|candidate| dir.join(candidate))
        .find(|path| path.exists())
}
