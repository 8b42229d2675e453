//! Text embedding with a remote primary path and a deterministic fallback.
//!
//! The primary path calls an OpenAI-compatible `/embeddings` endpoint with
//! the configured model. Any transport, HTTP, or decode failure (including a
//! timeout) is masked by a local hash-derived vector, so [`Embedder::embed`]
//! never fails outward and ingestion keeps working through provider outages.

use crate::config::EmbeddingConfig;
use crate::vector::l2_normalize;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Dimension of the hash-derived fallback vectors.
pub const FALLBACK_DIMENSION: usize = 128;

/// Internal error channel for the remote path. Never escapes [`Embedder::embed`].
#[derive(Error, Debug)]
enum EmbedError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("embedding API returned status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("decode error: {0}")]
    Decode(String),
}

#[derive(Serialize)]
struct EmbeddingRequestBody<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponseBody {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Turns text into a fixed-length float vector.
pub struct Embedder {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl Embedder {
    pub fn new(config: &EmbeddingConfig) -> Embedder {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("failed to build HTTP client");

        Embedder {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    /// Embeds `text`, falling back to a deterministic local vector when the
    /// remote API is unreachable, times out, or returns something unusable.
    ///
    /// The remote path returns whatever dimension the configured model
    /// produces; the fallback always produces [`FALLBACK_DIMENSION`]
    /// components.
    pub async fn embed(&self, text: &str) -> Vec<f32> {
        match self.remote_embed(text).await {
            Ok(vector) => vector,
            Err(error) => {
                warn!(error = %error, "remote embedding failed, using hash fallback");
                fallback_embed(text)
            }
        }
    }

    async fn remote_embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let body = EmbeddingRequestBody { model: &self.model, input: text };

        let response = self.client
            .post(format!("{}/embeddings", self.api_url.trim_end_matches('/')))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EmbedError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await
                .unwrap_or_else(|_| "<unable to read body>".to_string());
            return Err(EmbedError::HttpStatus { status: status.as_u16(), body });
        }

        let parsed: EmbeddingResponseBody = response.json().await
            .map_err(|e| EmbedError::Decode(e.to_string()))?;

        let first = parsed.data.into_iter().next()
            .ok_or_else(|| EmbedError::Decode("no embedding data in response".to_string()))?;

        Ok(first.embedding)
    }
}

/// Deterministic hash-derived embedding.
///
/// The 128 hex digits of the text's SHA-512 digest seed the vector, the
/// first 100 characters bump the component at their code point modulo 128,
/// and the result is L2-normalized. A pure function of the text: the same
/// input always yields a bit-identical vector.
pub fn fallback_embed(text: &str) -> Vec<f32> {
    let digest = Sha512::digest(text.as_bytes());

    let mut vector = vec![0.0f32; FALLBACK_DIMENSION];
    for (i, slot) in vector.iter_mut().enumerate() {
        let byte = digest[i / 2];
        let digit = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
        *slot = f32::from(digit) / 16.0;
    }

    for ch in text.chars().take(100) {
        vector[(ch as u32 as usize) % FALLBACK_DIMENSION] += 0.1;
    }

    l2_normalize(&mut vector);
    vector
}

#[cfg(test)]
mod embedding_test {
    use super::*;

    #[test]
    fn test_fallback_is_deterministic() {
        let a = fallback_embed("the quick brown fox");
        let b = fallback_embed("the quick brown fox");

        // Bit-identical, not merely close
        assert_eq!(a, b);
    }

    #[test]
    fn test_fallback_has_fixed_dimension() {
        assert_eq!(fallback_embed("").len(), FALLBACK_DIMENSION);
        assert_eq!(fallback_embed("x").len(), FALLBACK_DIMENSION);
        assert_eq!(fallback_embed(&"long ".repeat(100)).len(), FALLBACK_DIMENSION);
    }

    #[test]
    fn test_fallback_is_unit_length() {
        for text in ["cat", "dog", "car", "a much longer sentence about nothing"] {
            let vector = fallback_embed(text);
            let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-5, "norm for '{}' was {}", text, norm);
        }
    }

    #[test]
    fn test_fallback_distinguishes_texts() {
        let a = fallback_embed("cat");
        let b = fallback_embed("dog");

        assert_ne!(a, b);
    }

    #[test]
    fn test_fallback_empty_text_is_normalized_digest() {
        // No characters to bump, but the digest digits still produce a
        // non-zero vector
        let vector = fallback_embed("");
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_fallback_matches_reference_construction() {
        // Independent reconstruction of the documented algorithm: digest
        // digits over 16, a 0.1 bump per character code point, then L2
        // normalization.
        let text = "AAAA";
        let digest = Sha512::digest(text.as_bytes());

        let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();

        let mut expected = vec![0.0f32; FALLBACK_DIMENSION];
        for (i, digit) in hex.chars().enumerate().take(FALLBACK_DIMENSION) {
            expected[i] = digit.to_digit(16).unwrap() as f32 / 16.0;
        }
        for _ in 0..4 {
            expected[65] += 0.1; // 'A'
        }
        l2_normalize(&mut expected);

        assert_eq!(fallback_embed(text), expected);
    }

    #[test]
    fn test_embedder_construction() {
        let config = EmbeddingConfig::default();
        let embedder = Embedder::new(&config);
        assert_eq!(embedder.model, "text-embedding-ada-002");
    }
}
