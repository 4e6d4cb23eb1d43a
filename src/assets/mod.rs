//! Verified asset directory and the listing shown to the user

mod directory;

pub use directory::PeraAssetDirectory;

use crate::error::DirectoryError;
use crate::tx::AssetId;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

/// Trust classification assigned by the directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustTier {
    Trusted,
    Verified,
    Unverified,
    Suspicious,
    #[serde(other)]
    Unknown,
}

impl TrustTier {
    /// Only trusted and verified assets are offered to the user
    pub fn is_displayable(&self) -> bool {
        matches!(self, TrustTier::Trusted | TrustTier::Verified)
    }
}

/// Token metadata as published by the directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedAsset {
    #[serde(default)]
    pub asset_id: Option<AssetId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "unitName")]
    pub unit_name: Option<String>,
    #[serde(default, deserialize_with = "logo_url")]
    pub logo: Option<String>,
    pub verification_tier: TrustTier,
}

impl VerifiedAsset {
    pub fn display_name(&self) -> String {
        match (&self.name, self.asset_id) {
            (Some(name), _) if !name.is_empty() => name.clone(),
            (_, Some(id)) => format!("Asset {}", id),
            _ => "Unknown Asset".to_string(),
        }
    }

    /// Single-letter placeholder when there is no logo
    pub fn badge(&self) -> char {
        self.unit_name
            .as_deref()
            .and_then(|unit| unit.chars().next())
            .unwrap_or('A')
    }
}

/// Logos are either a URL or an object of URLs per format
fn logo_url<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(url)) => Some(url),
        Some(serde_json::Value::Object(map)) => map
            .get("png")
            .or_else(|| map.get("svg"))
            .and_then(|v| v.as_str())
            .map(str::to_string),
        _ => None,
    })
}

/// Keep only assets that may be shown
pub fn filter_displayable(assets: Vec<VerifiedAsset>) -> Vec<VerifiedAsset> {
    assets
        .into_iter()
        .filter(|asset| asset.verification_tier.is_displayable())
        .collect()
}

/// Source of verified asset metadata
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssetDirectory: Send + Sync {
    /// Displayable assets only
    async fn verified_assets(&self) -> Result<Vec<VerifiedAsset>, DirectoryError>;
}

/// Assets shown to the user: the first page, or everything after "See More"
#[derive(Debug, Clone, Default)]
pub struct AssetListing {
    assets: Vec<VerifiedAsset>,
    page_size: usize,
    expanded: bool,
    selected: Option<AssetId>,
}

impl AssetListing {
    pub fn new(assets: Vec<VerifiedAsset>, page_size: usize) -> Self {
        Self {
            assets,
            page_size,
            expanded: false,
            selected: None,
        }
    }

    pub fn all(&self) -> &[VerifiedAsset] {
        &self.assets
    }

    pub fn visible(&self) -> &[VerifiedAsset] {
        if self.expanded {
            &self.assets
        } else {
            &self.assets[..self.page_size.min(self.assets.len())]
        }
    }

    /// More assets exist than fit on the first page
    pub fn has_more(&self) -> bool {
        self.assets.len() > self.page_size
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Switch between the first page and the full list
    pub fn toggle_expanded(&mut self) {
        if self.has_more() {
            self.expanded = !self.expanded;
        }
    }

    /// Select an asset for transfers; only listed assets can be selected
    pub fn select(&mut self, asset_id: AssetId) -> bool {
        let listed = self.assets.iter().any(|a| a.asset_id == Some(asset_id));
        if listed {
            self.selected = Some(asset_id);
        }
        listed
    }

    pub fn selected(&self) -> Option<AssetId> {
        self.selected
    }
}
