use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::{Tokenizer, TruncationParams};
use tracing::info;

use super::{Embedder, EmbeddingError};

/// Sentence-transformer models are trained on sequences of at most 256 tokens.
const MAX_SEQ_LEN: usize = 256;

/// BERT sentence-embedding model (mean pooling, L2-normalized output).
pub struct BertEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
}

impl std::fmt::Debug for BertEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BertEmbedder")
            .field("device", &self.device)
            .finish_non_exhaustive()
    }
}

impl BertEmbedder {
    /// Downloads (or reuses the local cache of) a BERT model from the Hugging Face Hub.
    pub fn load(repo_id: &str) -> Result<Self, EmbeddingError> {
        let device = Device::Cpu;
        let api = hf_hub::api::sync::Api::new().map_err(|e| {
            EmbeddingError::ModelLoad(format!("failed to create HuggingFace API client: {e}"))
        })?;
        let repo = api.model(repo_id.to_owned());

        let fetch = |file: &str| {
            repo.get(file).map_err(|e| {
                EmbeddingError::ModelLoad(format!("failed to download {file} from {repo_id}: {e}"))
            })
        };
        let config_path = fetch("config.json")?;
        let tokenizer_path = fetch("tokenizer.json")?;
        let weights_path = fetch("model.safetensors")?;

        let config_str = std::fs::read_to_string(&config_path)
            .map_err(|e| EmbeddingError::ModelLoad(format!("failed to read BERT config: {e}")))?;
        let config: BertConfig = serde_json::from_str(&config_str)
            .map_err(|e| EmbeddingError::ModelLoad(format!("invalid BERT config: {e}")))?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| EmbeddingError::ModelLoad(format!("failed to load tokenizer: {e}")))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQ_LEN,
                ..Default::default()
            }))
            .map_err(|e| EmbeddingError::ModelLoad(format!("failed to configure tokenizer: {e}")))?;

        // SAFETY: file is a valid safetensors downloaded from hf-hub, not modified during
        // VarBuilder lifetime
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)
                .map_err(|e| EmbeddingError::ModelLoad(e.to_string()))?
        };
        let model =
            BertModel::load(vb, &config).map_err(|e| EmbeddingError::ModelLoad(e.to_string()))?;

        info!("Embedding model loaded: {repo_id}");
        Ok(Self {
            model,
            tokenizer,
            device,
        })
    }

    fn forward(&self, text: &str) -> candle_core::Result<Vec<f32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| candle_core::Error::Msg(format!("tokenizer encode failed: {e}")))?;

        let token_ids = encoding.get_ids();
        let token_type_ids: Vec<u32> = vec![0; token_ids.len()];

        let input_ids = Tensor::new(token_ids, &self.device)?.unsqueeze(0)?;
        let token_type_ids = Tensor::new(token_type_ids.as_slice(), &self.device)?.unsqueeze(0)?;

        let embeddings = self.model.forward(&input_ids, &token_type_ids, None)?;

        // Mean pooling over sequence dimension
        let seq_len = embeddings.dim(1)?;
        let mean_pooled = (embeddings.sum(1)? / seq_len as f64)?;

        // L2 normalization
        let norm = mean_pooled.sqr()?.sum_keepdim(1)?.sqrt()?;
        let normalized = mean_pooled.broadcast_div(&norm)?.squeeze(0)?;

        normalized.to_vec1::<f32>()
    }
}

impl Embedder for BertEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.forward(text)
            .map_err(|e| EmbeddingError::Inference(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_EMBEDDING_MODEL;
    use crate::embedding::cosine_similarity;

    const JD: &str = "Senior backend engineer with Go and distributed systems experience";
    const GO_RESUME: &str = "10 years Go, distributed systems, Kubernetes";
    const REACT_RESUME: &str = "Frontend React developer, no backend experience";

    #[test]
    #[ignore = "downloads the embedding model from the Hugging Face Hub"]
    fn test_go_resume_is_closer_than_react_resume() {
        let embedder = BertEmbedder::load(DEFAULT_EMBEDDING_MODEL).unwrap();
        let vectors = embedder
            .embed_batch(&[JD.to_string(), GO_RESUME.to_string(), REACT_RESUME.to_string()])
            .unwrap();

        let go = cosine_similarity(&vectors[0], &vectors[1]);
        let react = cosine_similarity(&vectors[0], &vectors[2]);
        assert!((-1.0..=1.0).contains(&go), "{go}");
        assert!((-1.0..=1.0).contains(&react), "{react}");
        assert!(go > react, "go={go} react={react}");
    }

    #[test]
    #[ignore = "downloads the embedding model from the Hugging Face Hub"]
    fn test_embeddings_are_unit_length_even_past_truncation() {
        let embedder = BertEmbedder::load(DEFAULT_EMBEDDING_MODEL).unwrap();
        let long_text = "distributed systems engineer ".repeat(400);
        for text in [JD, long_text.as_str()] {
            let v = embedder.embed(text).unwrap();
            let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-4, "{norm}");
        }
    }
}
