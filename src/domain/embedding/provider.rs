//! Embedding provider trait definition

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::DomainError;

/// Turns text into a vector for similarity search
#[async_trait]
pub trait EmbeddingProvider: Send + Sync + Debug {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError>;

    /// Embedding model in use
    fn model(&self) -> &str;
}

#[cfg(test)]
pub mod mock {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use super::*;

    /// Deterministic embeddings: explicit vectors for known texts, otherwise a
    /// bag-of-words hash so that texts sharing words score as similar
    #[derive(Debug)]
    pub struct MockEmbeddingProvider {
        dimensions: usize,
        fixed: Mutex<HashMap<String, Vec<f32>>>,
        failing: AtomicBool,
        calls: AtomicUsize,
    }

    impl MockEmbeddingProvider {
        pub fn new(dimensions: usize) -> Self {
            Self {
                dimensions,
                fixed: Mutex::new(HashMap::new()),
                failing: AtomicBool::new(false),
                calls: AtomicUsize::new(0),
            }
        }

        /// Return `vector` whenever the embedded text contains `needle`
        pub fn with_vector(self, needle: impl Into<String>, vector: Vec<f32>) -> Self {
            self.fixed.lock().unwrap().insert(needle.into(), vector);
            self
        }

        pub fn failing(self) -> Self {
            self.set_failing(true);
            self
        }

        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn hashed(&self, text: &str) -> Vec<f32> {
            let mut vector = vec![0.0; self.dimensions];
            for word in text.split_whitespace() {
                let hash = word
                    .to_lowercase()
                    .bytes()
                    .fold(0xcbf29ce484222325u64, |acc, b| {
                        (acc ^ b as u64).wrapping_mul(0x100000001b3)
                    });
                vector[(hash % self.dimensions as u64) as usize] += 1.0;
            }
            vector
        }
    }

    #[async_trait]
    impl EmbeddingProvider for MockEmbeddingProvider {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            if self.failing.load(Ordering::SeqCst) {
                return Err(DomainError::provider("mock-embedding", "embedding service down"));
            }

            let fixed = self.fixed.lock().unwrap();
            let mut needles: Vec<&String> = fixed.keys().collect();
            needles.sort();

            match needles.into_iter().find(|needle| text.contains(needle.as_str())) {
                Some(needle) => Ok(fixed[needle].clone()),
                None => Ok(self.hashed(text)),
            }
        }

        fn model(&self) -> &str {
            "mock-embedding"
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::domain::embedding::cosine_similarity;

        #[tokio::test]
        async fn test_mock_is_deterministic() {
            let provider = MockEmbeddingProvider::new(64);

            let first = provider.embed("hello world").await.unwrap();
            let second = provider.embed("hello world").await.unwrap();

            assert_eq!(first, second);
            assert_eq!(first.len(), 64);
            assert_eq!(provider.call_count(), 2);
        }

        #[tokio::test]
        async fn test_mock_fixed_vectors() {
            let provider = MockEmbeddingProvider::new(3).with_vector("weather", vec![1.0, 0.0, 0.0]);

            let vector = provider.embed("user: what's the weather").await.unwrap();

            assert_eq!(vector, vec![1.0, 0.0, 0.0]);
        }

        #[tokio::test]
        async fn test_mock_shared_words_are_similar() {
            let provider = MockEmbeddingProvider::new(256);

            let a = provider.embed("summarize the quarterly report").await.unwrap();
            let b = provider.embed("summarize the quarterly report please").await.unwrap();

            assert!(cosine_similarity(&a, &b) > 0.8);
        }

        #[tokio::test]
        async fn test_mock_error() {
            let provider = MockEmbeddingProvider::new(8).failing();
            assert!(provider.embed("x").await.is_err());
        }
    }
}
