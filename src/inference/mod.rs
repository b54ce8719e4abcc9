pub mod device;
pub mod e5;
pub mod snapshot;

use anyhow::Result;

pub use e5::E5Embedder;

/// Text-to-vector capability the HTTP layer depends on.
///
/// Implementations return one vector per input, in input order. When
/// `normalize` is set every vector has unit L2 norm.
pub trait TextEmbedder: Send + Sync {
    fn encode(&self, texts: &[String], normalize: bool) -> Result<Vec<Vec<f32>>>;

    fn dimension(&self) -> usize;

    fn model_id(&self) -> &str;
}
