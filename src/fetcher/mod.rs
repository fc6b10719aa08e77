pub mod fanout;
pub mod http_fetcher;

pub use fanout::fetch_indexed;
pub use http_fetcher::HttpImageFetcher;

use async_trait::async_trait;

use crate::app::Result;
use crate::domain::Image;

/// Fetches an image over HTTP and encodes it to base64.
///
/// One attempt with a bounded timeout, no retries. Callers treat failure
/// as non-fatal and persist the question without an image.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch_base64(&self, url: &str) -> Result<Image>;
}
