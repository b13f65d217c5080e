//! Source image fetching with bounded concurrency.

use async_trait::async_trait;
use bytes::Bytes;
use sheetforge_compose::SourceImages;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("source image not found: {0}")]
    NotFound(String),

    #[error("failed to fetch {reference}: {reason}")]
    Failed { reference: String, reason: String },
}

#[async_trait]
pub trait SourceImageFetcher: Send + Sync {
    /// Fetch the raw encoded bytes behind one source image reference.
    async fn fetch(&self, reference: &str) -> Result<Bytes, FetchError>;
}

/// Fetcher for references that are plain HTTP(S) URLs, or paths relative to
/// a configured base URL.
#[derive(Clone)]
pub struct HttpImageFetcher {
    client: reqwest::Client,
    base_url: Option<String>,
}

impl HttpImageFetcher {
    pub fn new(client: reqwest::Client, base_url: Option<String>) -> Self {
        Self { client, base_url }
    }

    fn resolve(&self, reference: &str) -> String {
        if reference.starts_with("http://") || reference.starts_with("https://") {
            return reference.to_string();
        }
        match &self.base_url {
            Some(base) => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                reference.trim_start_matches('/')
            ),
            None => reference.to_string(),
        }
    }
}

#[async_trait]
impl SourceImageFetcher for HttpImageFetcher {
    async fn fetch(&self, reference: &str) -> Result<Bytes, FetchError> {
        let url = self.resolve(reference);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Failed {
                reference: reference.to_string(),
                reason: e.to_string(),
            })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(reference.to_string()));
        }

        let response = response.error_for_status().map_err(|e| FetchError::Failed {
            reference: reference.to_string(),
            reason: e.to_string(),
        })?;

        response.bytes().await.map_err(|e| FetchError::Failed {
            reference: reference.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Fetch every distinct reference, at most `concurrency` in flight at once.
/// The first failure aborts the whole batch.
pub async fn fetch_all(
    fetcher: Arc<dyn SourceImageFetcher>,
    references: Vec<String>,
    concurrency: usize,
) -> Result<SourceImages, FetchError> {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));

    let mut distinct = references;
    distinct.sort();
    distinct.dedup();

    let mut handles = Vec::with_capacity(distinct.len());
    for reference in distinct {
        let fetcher = Arc::clone(&fetcher);
        let semaphore = Arc::clone(&semaphore);
        handles.push(tokio::spawn(async move {
            // Closed only when the batch is dropped, which aborts the task.
            let _permit = semaphore
                .acquire()
                .await
                .map_err(|e| FetchError::Failed {
                    reference: reference.clone(),
                    reason: e.to_string(),
                })?;
            let bytes = fetcher.fetch(&reference).await?;
            Ok::<(String, Bytes), FetchError>((reference, bytes))
        }));
    }

    let mut images = SourceImages::new();
    for handle in handles {
        let (reference, bytes) = handle.await.map_err(|e| FetchError::Failed {
            reference: "<join>".to_string(),
            reason: e.to_string(),
        })??;
        images.insert(reference, bytes);
    }

    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MapFetcher {
        images: HashMap<String, Bytes>,
        in_flight: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SourceImageFetcher for MapFetcher {
        async fn fetch(&self, reference: &str) -> Result<Bytes, FetchError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            self.images
                .get(reference)
                .cloned()
                .ok_or_else(|| FetchError::NotFound(reference.to_string()))
        }
    }

    fn fetcher(refs: &[&str]) -> (Arc<MapFetcher>, Arc<AtomicUsize>) {
        let peak = Arc::new(AtomicUsize::new(0));
        let images = refs
            .iter()
            .map(|r| (r.to_string(), Bytes::from_static(b"img")))
            .collect();
        (
            Arc::new(MapFetcher {
                images,
                in_flight: Arc::new(AtomicUsize::new(0)),
                peak: Arc::clone(&peak),
            }),
            peak,
        )
    }

    #[tokio::test]
    async fn test_fetch_all_dedupes_references() {
        let (fetcher, _) = fetcher(&["a", "b"]);
        let refs = vec!["a".to_string(), "b".to_string(), "a".to_string()];

        let images = fetch_all(fetcher, refs, 4).await.unwrap();
        assert_eq!(images.len(), 2);
        assert!(images.contains_key("a"));
        assert!(images.contains_key("b"));
    }

    #[tokio::test]
    async fn test_fetch_all_bounds_concurrency() {
        let (fetcher, peak) = fetcher(&["a", "b", "c", "d", "e", "f"]);
        let refs = ["a", "b", "c", "d", "e", "f"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        fetch_all(fetcher, refs, 2).await.unwrap();
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_fetch_all_propagates_missing() {
        let (fetcher, _) = fetcher(&["a"]);
        let refs = vec!["a".to_string(), "missing".to_string()];

        let err = fetch_all(fetcher, refs, 4).await.unwrap_err();
        assert!(matches!(err, FetchError::NotFound(r) if r == "missing"));
    }

    #[test]
    fn test_http_fetcher_resolves_relative_refs() {
        let fetcher = HttpImageFetcher::new(
            reqwest::Client::new(),
            Some("http://designs.local/files/".to_string()),
        );

        assert_eq!(
            fetcher.resolve("abc/design.png"),
            "http://designs.local/files/abc/design.png"
        );
        assert_eq!(
            fetcher.resolve("https://cdn.example.com/d.png"),
            "https://cdn.example.com/d.png"
        );
    }
}
