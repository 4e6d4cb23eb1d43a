//! Configuration management for wallet actions
//!
//! Loads configuration from TOML files with environment variable substitution.
//! Every section is optional; omitted values fall back to the public endpoints
//! and the lifecycle defaults.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

/// Public MainNet node
pub const MAINNET_ALGOD_URL: &str = "https://mainnet-api.algonode.cloud";
/// Public TestNet node
pub const TESTNET_ALGOD_URL: &str = "https://testnet-api.algonode.cloud";
/// Verified asset directory
pub const VERIFIED_ASSETS_URL: &str = "https://mainnet.api.perawallet.app/v1/public/verified-assets/";

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "WALLET_ACTIONS_CONFIG";

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub network: Network,
    pub networks: NetworksConfig,
    pub lifecycle: LifecycleConfig,
    pub assets: AssetsConfig,
    pub api: ApiConfig,
    pub metrics: MetricsConfig,
}

/// The two ledgers the wallet can act on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, serde::Serialize)]
pub enum Network {
    #[serde(alias = "mainnet")]
    MainNet,
    #[default]
    #[serde(alias = "testnet")]
    TestNet,
}

impl Network {
    pub const ALL: [Network; 2] = [Network::MainNet, Network::TestNet];

    pub fn as_str(&self) -> &'static str {
        match self {
            Network::MainNet => "MainNet",
            Network::TestNet => "TestNet",
        }
    }

    pub fn default_algod_url(&self) -> &'static str {
        match self {
            Network::MainNet => MAINNET_ALGOD_URL,
            Network::TestNet => TESTNET_ALGOD_URL,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworksConfig {
    pub mainnet: NodeConfig,
    pub testnet: NodeConfig,
}

impl Default for NetworksConfig {
    fn default() -> Self {
        Self {
            mainnet: NodeConfig::for_network(Network::MainNet),
            testnet: NodeConfig::for_network(Network::TestNet),
        }
    }
}

impl NetworksConfig {
    pub fn get(&self, network: Network) -> &NodeConfig {
        match network {
            Network::MainNet => &self.mainnet,
            Network::TestNet => &self.testnet,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    pub algod_urls: Vec<String>,
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl NodeConfig {
    pub fn for_network(network: Network) -> Self {
        Self {
            algod_urls: vec![network.default_algod_url().to_string()],
            api_token: None,
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

/// What a failed balance lookup means while validating a transfer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceFetchPolicy {
    /// Treat the balance as zero, so the user sees "insufficient balance"
    #[default]
    TreatAsZero,
    /// Report the lookup failure as its own error
    Surface,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Rounds to wait for confirmation after submission
    pub max_confirmation_rounds: u64,
    pub balance_fetch_policy: BalanceFetchPolicy,
    /// Delay before a completed widget returns to idle; 0 keeps it completed
    pub completed_reset_ms: u64,
    /// Capacity of the transition event channel
    pub event_capacity: usize,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            max_confirmation_rounds: 4,
            balance_fetch_policy: BalanceFetchPolicy::TreatAsZero,
            completed_reset_ms: 3000,
            event_capacity: 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    pub directory_url: String,
    /// Assets shown before "See More"
    pub page_size: usize,
    /// Directory pages followed through `next` links
    pub max_pages: usize,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            directory_url: VERIFIED_ASSETS_URL.to_string(),
            page_size: 6,
            max_pages: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
}

impl Settings {
    /// Load settings from the file named by `WALLET_ACTIONS_CONFIG`,
    /// or `config/default.toml`
    pub fn load() -> Result<Self> {
        let config_path = env::var(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/default.toml"));

        Self::load_from(&config_path)
    }

    /// Load settings from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        Self::from_toml_str(&config_str)
    }

    /// Parse settings from TOML text
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        // Substitute environment variables
        let config_str = substitute_env_vars(config_str);

        let settings: Settings =
            toml::from_str(&config_str).with_context(|| "Failed to parse configuration")?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.lifecycle.max_confirmation_rounds == 0 {
            anyhow::bail!("lifecycle.max_confirmation_rounds must be at least 1");
        }
        if self.lifecycle.event_capacity == 0 {
            anyhow::bail!("lifecycle.event_capacity must be at least 1");
        }

        for network in Network::ALL {
            let node = self.networks.get(network);
            if node.algod_urls.is_empty() {
                anyhow::bail!("Network {} has no node URLs configured", network);
            }
            for url in &node.algod_urls {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    anyhow::bail!("Network {} node URL {} is not http(s)", network, url);
                }
            }
        }

        if self.assets.page_size == 0 {
            tracing::warn!("assets.page_size is 0 - listings start collapsed to nothing");
        }

        Ok(())
    }

    /// Node settings for the currently selected network
    pub fn active_node(&self) -> &NodeConfig {
        self.networks.get(self.network)
    }
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> String {
    let mut result = input.to_string();
    let re = regex::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();

    for cap in re.captures_iter(input) {
        let var_name = &cap[1];
        let var_value = env::var(var_name).unwrap_or_default();
        result = result.replace(&cap[0], &var_value);
    }

    result
}
