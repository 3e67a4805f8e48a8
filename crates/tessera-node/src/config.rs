//! Node configuration file.
//!
//! Read from `$TESSERA_HOME/config.toml` (default `~/.tessera`). Every
//! section is optional and falls back to its defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tessera_fees::FeeParams;
use tessera_math::Dec;
use tessera_oracle::{MaStrategy, OracleParams, PriceStamp};
use tessera_settlement::FeeConfig;
use tessera_types::{Coin, NATIVE_DENOM, NATIVE_SYMBOL};

/// Complete node configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub oracle: OracleParams,
    #[serde(default)]
    pub fees: FeeParams,
    /// Fixed feeder rates for single-node networks, keyed by symbol.
    #[serde(default)]
    pub feeder: BTreeMap<String, Dec>,
    #[serde(default)]
    pub genesis: GenesisConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Chain denominations and the fee pricing strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Denom taxes are charged in.
    #[serde(default = "default_native_denom")]
    pub native_denom: String,
    /// Oracle symbol of the native denom.
    #[serde(default = "default_symbol")]
    pub symbol: String,
    /// `"sma"` | `"ema"` | `"wma"`.
    #[serde(default = "default_ma_type")]
    pub ma_type: String,
    /// `"RECENT"` | `"OLDEST"` | `"BALANCED"` | `"CUSTOM"`; `wma` only.
    #[serde(default = "default_wma_strategy")]
    pub wma_strategy: Option<String>,
    /// Weights for `CUSTOM`, oldest first.
    #[serde(default)]
    pub custom_weights: Option<Vec<u64>>,
}

/// Initial balances and price stamps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisConfig {
    #[serde(default)]
    pub accounts: Vec<GenesisAccount>,
    #[serde(default)]
    pub stamps: Vec<PriceStamp>,
}

/// A funded account, addressed by the seed its address derives from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAccount {
    pub name: String,
    pub coins: Vec<Coin>,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace" | "debug" | "info" | "warn" | "error".
    /// `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions

fn default_native_denom() -> String {
    NATIVE_DENOM.to_string()
}

fn default_symbol() -> String {
    NATIVE_SYMBOL.to_string()
}

fn default_ma_type() -> String {
    "wma".to_string()
}

fn default_wma_strategy() -> Option<String> {
    Some("BALANCED".to_string())
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            native_denom: default_native_denom(),
            symbol: default_symbol(),
            ma_type: default_ma_type(),
            wma_strategy: default_wma_strategy(),
            custom_weights: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ChainConfig {
    /// Parse the configured pricing strategy.
    pub fn strategy(&self) -> tessera_oracle::Result<MaStrategy> {
        MaStrategy::parse(
            &self.ma_type,
            self.wma_strategy.as_deref(),
            self.custom_weights.clone(),
        )
    }
}

impl NodeConfig {
    /// Load configuration from the default config file location.
    ///
    /// Falls back to defaults if the file does not exist.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, or defaults if it does not exist.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: NodeConfig =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Fee engine settings: the `[chain]` section plus the native exponent
    /// from the oracle accept list.
    pub fn fee_config(&self) -> anyhow::Result<FeeConfig> {
        let native_denom = &self.chain.native_denom;
        let entry = self
            .oracle
            .accept_list
            .iter()
            .find(|e| e.base_denom == *native_denom)
            .with_context(|| {
                format!("[chain] native_denom {native_denom} is not on the oracle accept list")
            })?;
        Ok(FeeConfig {
            native_denom: native_denom.clone(),
            native_exponent: entry.exponent,
            price_denom: self.chain.symbol.clone(),
            strategy: self.chain.strategy().context("[chain] pricing strategy")?,
        })
    }

    /// Check every section for consistency.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.oracle.validate().context("[oracle]")?;
        self.fees
            .validate(&self.chain.native_denom)
            .context("[fees]")?;

        let strategy = self.chain.strategy().context("[chain] pricing strategy")?;
        if let MaStrategy::Wma(tessera_oracle::WmaKind::Custom(weights)) = &strategy {
            let window = self.oracle.window_len();
            anyhow::ensure!(
                weights.len() == window,
                "[chain] custom_weights has {} entries, averaging window is {window}",
                weights.len()
            );
        }

        let symbol = &self.chain.symbol;
        anyhow::ensure!(
            self.oracle.find_denom(symbol).is_some(),
            "[chain] symbol {symbol} is not on the oracle accept list"
        );
        let native_denom = &self.chain.native_denom;
        let native = self
            .oracle
            .accept_list
            .iter()
            .find(|e| e.base_denom == *native_denom)
            .with_context(|| {
                format!("[chain] native_denom {native_denom} is not on the oracle accept list")
            })?;
        anyhow::ensure!(
            native.symbol_denom.eq_ignore_ascii_case(symbol),
            "[chain] native_denom {native_denom} is quoted as {}, not {symbol}",
            native.symbol_denom
        );
        Ok(())
    }

    /// Directory holding the config file.
    pub fn home_dir() -> PathBuf {
        if let Ok(dir) = std::env::var("TESSERA_HOME") {
            return PathBuf::from(dir);
        }
        std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".tessera"))
            .unwrap_or_else(|_| PathBuf::from("/tmp/tessera"))
    }

    fn config_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NodeConfig::default();
        assert_eq!(config.chain.native_denom, "ncheq");
        assert_eq!(config.chain.symbol, "CHEQ");
        assert_eq!(config.logging.level, "info");
        assert_eq!(
            config.chain.strategy().expect("strategy"),
            MaStrategy::default()
        );
        config.validate().expect("defaults validate");
    }

    #[test]
    fn test_config_serialization() {
        let config = NodeConfig::default();
        let toml_str = toml::to_string(&config).expect("serialize");
        let parsed: NodeConfig = toml::from_str(&toml_str).expect("parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_file() {
        let toml_str = r#"
            [chain]
            ma_type = "ema"

            [oracle]
            averaging_window = 5

            [feeder]
            CHEQ = "0.02"

            [[genesis.accounts]]
            name = "alice"
            coins = [{ denom = "ncheq", amount = "1000000000000" }]
        "#;
        let config: NodeConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.chain.strategy().expect("strategy"), MaStrategy::Ema);
        assert_eq!(config.chain.native_denom, "ncheq");
        assert_eq!(config.oracle.averaging_window, 5);
        assert_eq!(config.oracle.vote_period, 10);
        assert_eq!(config.feeder["CHEQ"], "0.02".parse().expect("dec"));
        assert_eq!(config.genesis.accounts[0].coins[0].amount, 1_000_000_000_000);
        assert_eq!(config.fees, FeeParams::default());
        config.validate().expect("valid");
    }

    #[test]
    fn test_validate_rejects() {
        let mut config = NodeConfig::default();
        config.chain.ma_type = "hma".into();
        assert!(config.validate().is_err());

        let mut config = NodeConfig::default();
        config.chain.wma_strategy = Some("CUSTOM".into());
        config.chain.custom_weights = Some(vec![1, 2, 3]);
        assert!(config.validate().is_err());

        let mut config = NodeConfig::default();
        config.chain.symbol = "ATOM".into();
        assert!(config.validate().is_err());

        let mut config = NodeConfig::default();
        config.chain.native_denom = "uatom".into();
        assert!(config.validate().is_err());
        assert!(config.fee_config().is_err());
    }

    #[test]
    fn test_native_exponent_from_accept_list() {
        let toml_str = r#"
            [chain]
            native_denom = "ucheq"

            [[oracle.accept_list]]
            base_denom = "ucheq"
            symbol_denom = "CHEQ"
            exponent = 6

            [fees]
            create_did = [
                { denom = "ucheq", min_amount = "50000000", max_amount = "100000000" },
                { denom = "usd", min_amount = "1200000000000000000", max_amount = "2000000000000000000" },
            ]
            update_did = [{ denom = "ucheq", min_amount = "25000000", max_amount = "25000000" }]
            deactivate_did = [{ denom = "ucheq", min_amount = "10000000", max_amount = "20000000" }]
            create_resource_image = [{ denom = "ucheq", min_amount = "20000000", max_amount = "30000000" }]
            create_resource_json = [{ denom = "ucheq", min_amount = "3500000", max_amount = "60000000" }]
            create_resource_default = [{ denom = "ucheq", min_amount = "6000000", max_amount = "20000000" }]
        "#;
        let config: NodeConfig = toml::from_str(toml_str).expect("parse");
        config.validate().expect("valid");

        let fee_config = config.fee_config().expect("fee config");
        assert_eq!(fee_config.native_denom, "ucheq");
        assert_eq!(fee_config.native_exponent, 6);
        assert_eq!(NodeConfig::default().fee_config().expect("fee config").native_exponent, 9);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("tessera-missing-dir/config.toml");
        let config = NodeConfig::load_from(&path).expect("load");
        assert_eq!(config, NodeConfig::default());
    }
}
