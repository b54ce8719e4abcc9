use anyhow::{anyhow, Result};
use std::path::PathBuf;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8001";
pub const DEFAULT_MODEL_ID: &str = "intfloat/multilingual-e5-small";
pub const DEFAULT_MAX_SEQ_LEN: usize = 512;

/// Runtime settings for the embedding service.
///
/// Read from the process environment (and a `.env` file when present):
/// `EMBED_BIND_ADDR`, `EMBED_MODEL_ID`, `EMBED_MODEL_DIR`, `EMBED_DEVICE`,
/// `EMBED_MAX_SEQ_LEN`, `EMBED_MAX_BATCH` and `EMBED_MAX_BODY_BYTES`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub bind_addr: String,
    pub model_id: String,
    /// Local snapshot directory. When unset the model is fetched through the HF hub cache.
    pub model_dir: Option<PathBuf>,
    pub device: String,
    pub max_seq_len: usize,
    /// Upper bound on `texts` per request. `None` accepts any batch size.
    pub max_batch: Option<usize>,
    /// Upper bound on request body size. `None` accepts any body size.
    pub max_body_bytes: Option<usize>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            model_dir: None,
            device: "cpu".to_string(),
            max_seq_len: DEFAULT_MAX_SEQ_LEN,
            max_batch: None,
            max_body_bytes: None,
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| dotenvy::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let max_seq_len = match get("EMBED_MAX_SEQ_LEN") {
            Some(raw) => parse_positive("EMBED_MAX_SEQ_LEN", &raw)?,
            None => defaults.max_seq_len,
        };
        let max_batch = get("EMBED_MAX_BATCH")
            .map(|raw| parse_positive("EMBED_MAX_BATCH", &raw))
            .transpose()?;
        let max_body_bytes = get("EMBED_MAX_BODY_BYTES")
            .map(|raw| parse_positive("EMBED_MAX_BODY_BYTES", &raw))
            .transpose()?;

        Ok(Self {
            bind_addr: get("EMBED_BIND_ADDR").unwrap_or(defaults.bind_addr),
            model_id: get("EMBED_MODEL_ID").unwrap_or(defaults.model_id),
            model_dir: get("EMBED_MODEL_DIR").map(PathBuf::from),
            device: get("EMBED_DEVICE").unwrap_or(defaults.device),
            max_seq_len,
            max_batch,
            max_body_bytes,
        })
    }
}

fn parse_positive(key: &str, raw: &str) -> Result<usize> {
    match raw.trim().parse::<usize>() {
        Ok(0) => Err(anyhow!("{key} must be greater than zero")),
        Ok(value) => Ok(value),
        Err(e) => Err(anyhow!("invalid {key} value '{raw}': {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let cfg = ServiceConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(cfg, ServiceConfig::default());
        assert_eq!(cfg.bind_addr, "0.0.0.0:8001");
        assert_eq!(cfg.model_id, "intfloat/multilingual-e5-small");
        assert_eq!(cfg.max_batch, None);
        assert_eq!(cfg.max_body_bytes, None);
    }

    #[test]
    fn reads_overrides() {
        let cfg = ServiceConfig::from_lookup(lookup_from(&[
            ("EMBED_BIND_ADDR", "127.0.0.1:9000"),
            ("EMBED_MODEL_DIR", "/models/e5"),
            ("EMBED_DEVICE", "cuda:1"),
            ("EMBED_MAX_SEQ_LEN", "256"),
            ("EMBED_MAX_BATCH", "64"),
            ("EMBED_MAX_BODY_BYTES", "4194304"),
        ]))
        .unwrap();

        assert_eq!(cfg.bind_addr, "127.0.0.1:9000");
        assert_eq!(cfg.model_dir, Some(PathBuf::from("/models/e5")));
        assert_eq!(cfg.device, "cuda:1");
        assert_eq!(cfg.max_seq_len, 256);
        assert_eq!(cfg.max_batch, Some(64));
        assert_eq!(cfg.max_body_bytes, Some(4 * 1024 * 1024));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let cfg = ServiceConfig::from_lookup(lookup_from(&[
            ("EMBED_MODEL_ID", "  "),
            ("EMBED_MAX_BATCH", ""),
        ]))
        .unwrap();
        assert_eq!(cfg.model_id, DEFAULT_MODEL_ID);
        assert_eq!(cfg.max_batch, None);
    }

    #[test]
    fn rejects_bad_numbers() {
        let err = ServiceConfig::from_lookup(lookup_from(&[("EMBED_MAX_SEQ_LEN", "lots")]))
            .unwrap_err();
        assert!(err.to_string().contains("EMBED_MAX_SEQ_LEN"));

        let err =
            ServiceConfig::from_lookup(lookup_from(&[("EMBED_MAX_BATCH", "0")])).unwrap_err();
        assert!(err.to_string().contains("greater than zero"));
    }
}
