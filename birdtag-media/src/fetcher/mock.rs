use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use super::{FetchedImage, ImageFetcher};
use crate::ConversionError;

/// In-memory fetcher with canned responses per URL.
///
/// Unknown URLs fail with a network error, like an unreachable host.
///
/// # Examples
///
/// ```
/// use birdtag_media::MockImageFetcher;
///
/// let fetcher = MockImageFetcher::new()
///     .with_image("https://birds.test/crow.png", "image/png", vec![0x89, b'P', b'N', b'G'])
///     .with_status("https://birds.test/missing.png", 404);
/// assert_eq!(fetcher.call_count(), 0);
/// ```
#[derive(Clone, Default)]
pub struct MockImageFetcher {
    responses: Arc<RwLock<HashMap<String, Result<FetchedImage, ConversionError>>>>,
    call_count: Arc<AtomicUsize>,
}

impl MockImageFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(self, url: &str, content_type: &str, bytes: Vec<u8>) -> Self {
        self.with_response(url, Ok(FetchedImage::new(Some(content_type), bytes)))
    }

    pub fn with_status(self, url: &str, status: u16) -> Self {
        self.with_response(url, Err(ConversionError::Status(status)))
    }

    /// Panics if another thread panicked while holding the response table.
    pub fn with_response(self, url: &str, response: Result<FetchedImage, ConversionError>) -> Self {
        self.responses
            .write()
            .expect("mock responses lock poisoned")
            .insert(url.to_string(), response);
        self
    }

    /// Number of `fetch` calls made so far, across all URLs.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.call_count.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl ImageFetcher for MockImageFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, ConversionError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        let responses = self
            .responses
            .read()
            .map_err(|e| ConversionError::Network(e.to_string()))?;

        responses
            .get(url)
            .cloned()
            .unwrap_or_else(|| Err(ConversionError::Network(format!("connection refused: {url}"))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_canned_responses_and_counts_calls() {
        let fetcher = MockImageFetcher::new()
            .with_image("https://birds.test/a.png", "image/png", vec![1, 2, 3])
            .with_status("https://birds.test/b.png", 500);

        let fetched = fetcher.fetch("https://birds.test/a.png").await.unwrap();
        assert_eq!(fetched, FetchedImage::new(Some("image/png"), vec![1, 2, 3]));
        assert_eq!(
            fetcher.fetch("https://birds.test/b.png").await,
            Err(ConversionError::Status(500))
        );
        assert!(matches!(
            fetcher.fetch("https://birds.test/c.png").await,
            Err(ConversionError::Network(_))
        ));
        assert_eq!(fetcher.call_count(), 3);
    }

    #[test]
    #[should_panic(expected = "mock responses lock poisoned")]
    fn registering_on_a_poisoned_table_panics() {
        let fetcher = MockImageFetcher::new();
        let responses = Arc::clone(&fetcher.responses);
        let _ = std::thread::spawn(move || {
            let _guard = responses.write().unwrap();
            panic!("poison the table");
        })
        .join();

        let _ = fetcher.with_status("https://birds.test/a.png", 404);
    }
}
