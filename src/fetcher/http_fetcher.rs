use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;

use crate::app::{Result, SignpostError};
use crate::config::ScrapeConfig;
use crate::domain::Image;
use crate::fetcher::ImageFetcher;

pub struct HttpImageFetcher {
    client: Client,
}

impl HttpImageFetcher {
    pub fn new(config: &ScrapeConfig) -> Self {
        let client = Client::builder()
            .timeout(config.image_timeout())
            .gzip(true)
            .brotli(true)
            .user_agent(
                config
                    .user_agent
                    .clone()
                    .unwrap_or_else(|| format!("signpost/{}", env!("CARGO_PKG_VERSION"))),
            )
            .build()
            .expect("Failed to build HTTP client");

        Self { client }
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch_base64(&self, url: &str) -> Result<Image> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SignpostError::ImageFetch(format!("GET {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(SignpostError::ImageFetch(format!(
                "GET {} returned {}",
                url,
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SignpostError::ImageFetch(format!("Reading body of {} failed: {}", url, e)))?;

        Ok(Image::new(url, STANDARD.encode(&bytes)))
    }
}
