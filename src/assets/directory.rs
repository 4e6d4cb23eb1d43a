//! HTTP client for the public verified-assets directory

use super::{filter_displayable, AssetDirectory, VerifiedAsset};
use crate::config::AssetsConfig;
use crate::error::DirectoryError;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct DirectoryPage {
    #[serde(default)]
    next: Option<String>,
    #[serde(default)]
    results: Vec<serde_json::Value>,
}

/// Reads the verified-assets endpoint, following `next` links up to a page limit
pub struct PeraAssetDirectory {
    url: String,
    max_pages: usize,
    http: Client,
}

impl PeraAssetDirectory {
    pub fn new(config: &AssetsConfig) -> Self {
        Self {
            url: config.directory_url.clone(),
            max_pages: config.max_pages.max(1),
            http: Client::new(),
        }
    }

    async fn fetch_page(&self, url: &str) -> Result<DirectoryPage, DirectoryError> {
        let unavailable = |message: String| DirectoryError::Unavailable { message };

        let response = self
            .http
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(format!("HTTP error! status: {}", status.as_u16())));
        }

        response
            .json::<DirectoryPage>()
            .await
            .map_err(|e| unavailable(e.to_string()))
    }
}

#[async_trait]
impl AssetDirectory for PeraAssetDirectory {
    async fn verified_assets(&self) -> Result<Vec<VerifiedAsset>, DirectoryError> {
        let mut assets = Vec::new();
        let mut next = Some(self.url.clone());
        let mut pages = 0;

        while let Some(url) = next.take() {
            if pages == self.max_pages {
                debug!("Stopping at {} directory pages", pages);
                break;
            }

            let page = match self.fetch_page(&url).await {
                Ok(page) => page,
                Err(e) => {
                    warn!("Error fetching verified assets from {}: {:?}", url, e);
                    return Err(e);
                }
            };
            pages += 1;

            // Records that do not match the expected shape are skipped, not fatal
            for record in page.results {
                match serde_json::from_value::<VerifiedAsset>(record) {
                    Ok(asset) => assets.push(asset),
                    Err(e) => debug!("Skipping directory record: {}", e),
                }
            }
            next = page.next;
        }

        let total = assets.len();
        let assets = filter_displayable(assets);
        debug!("Directory returned {} assets, {} displayable", total, assets.len());
        Ok(assets)
    }
}
