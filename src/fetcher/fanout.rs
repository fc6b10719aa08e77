use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::app::Result;
use crate::domain::Image;
use crate::fetcher::ImageFetcher;

/// Fetch a chapter's images concurrently, bounded by `concurrency`.
///
/// Each job carries the index of the question that referenced the image, and
/// the result is rejoined to that index, never to completion order, which
/// is arbitrary under concurrency.
pub async fn fetch_indexed(
    fetcher: Arc<dyn ImageFetcher>,
    jobs: Vec<(usize, String)>,
    concurrency: usize,
) -> Vec<(usize, Result<Image>)> {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut handles = Vec::new();

    for (index, url) in jobs {
        let fetcher = fetcher.clone();
        let semaphore = semaphore.clone();

        let handle = tokio::spawn(async move {
            let _permit = semaphore.acquire().await.expect("Semaphore closed");
            let result = fetcher.fetch_base64(&url).await;
            (index, result)
        });

        handles.push(handle);
    }

    let mut results = Vec::new();
    for handle in handles {
        match handle.await {
            Ok(result) => results.push(result),
            Err(e) => {
                tracing::error!("Task join error: {}", e);
            }
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::app::SignpostError;

    /// Fetcher that resolves slowly for some URLs and fails for others, so
    /// completion order differs from submission order.
    struct ScriptedFetcher {
        slow: HashSet<String>,
        failing: HashSet<String>,
    }

    #[async_trait]
    impl ImageFetcher for ScriptedFetcher {
        async fn fetch_base64(&self, url: &str) -> Result<Image> {
            if self.slow.contains(url) {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            if self.failing.contains(url) {
                return Err(SignpostError::ImageFetch(format!("GET {} timed out", url)));
            }
            Ok(Image::new(url, "aGVsbG8=".to_string()))
        }
    }

    #[tokio::test]
    async fn test_results_rejoin_by_index_not_completion_order() {
        let fetcher = Arc::new(ScriptedFetcher {
            slow: ["https://example.com/0.png".to_string()].into(),
            failing: HashSet::new(),
        });

        let jobs = vec![
            (0, "https://example.com/0.png".to_string()),
            (1, "https://example.com/1.png".to_string()),
            (2, "https://example.com/2.png".to_string()),
        ];

        let results = fetch_indexed(fetcher, jobs, 3).await;
        assert_eq!(results.len(), 3);

        for (index, result) in results {
            let image = result.unwrap();
            assert_eq!(
                image.source_url,
                format!("https://example.com/{}.png", index)
            );
        }
    }

    #[tokio::test]
    async fn test_failures_surface_per_job() {
        let fetcher = Arc::new(ScriptedFetcher {
            slow: HashSet::new(),
            failing: ["https://example.com/1.png".to_string()].into(),
        });

        let jobs = vec![
            (0, "https://example.com/0.png".to_string()),
            (1, "https://example.com/1.png".to_string()),
        ];

        let mut results = fetch_indexed(fetcher, jobs, 2).await;
        results.sort_by_key(|(index, _)| *index);

        assert!(results[0].1.is_ok());
        assert!(results[1].1.is_err());
    }

    #[tokio::test]
    async fn test_empty_jobs() {
        let fetcher = Arc::new(ScriptedFetcher {
            slow: HashSet::new(),
            failing: HashSet::new(),
        });

        let results = fetch_indexed(fetcher, Vec::new(), 4).await;
        assert!(results.is_empty());
    }
}
