// 7.0 config.rs: every tunable in one place. oracle smoothing, spread constants, assets.
// values are Decimal here so config files stay readable; they become Wad once, in
// to_model / alfa_wad, and the core never sees a Decimal again.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::math::Wad;
use crate::spread::SpreadModel;
use crate::types::AssetId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleParams {
    // smoothing factor shared by the ema and ewmv, in [0, 1]
    pub alfa: Decimal,
}

impl Default for OracleParams {
    fn default() -> Self {
        Self { alfa: dec!(0.01) }
    }
}

/** 7.1: spread constants. rates are plain fractions, 0.003 = 30 bps */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadParams {
    pub spread_max_value: Decimal,
    pub kf: Decimal,
    pub k_omega: Decimal,
    // opposite leg weight in the adjusted utilization
    pub lambda: Decimal,
    // utilization ceiling, the kf term saturates here
    pub max_liquidity_redemption_value: Decimal,
    pub k_vol: Decimal,
    pub k_hist: Decimal,
}

impl Default for SpreadParams {
    fn default() -> Self {
        Self {
            spread_max_value: dec!(0.003),
            kf: dec!(0.00001),
            k_omega: dec!(0.00005),
            lambda: dec!(0.01),
            max_liquidity_redemption_value: dec!(1),
            k_vol: dec!(0.00003),
            k_hist: dec!(0.0003),
        }
    }
}

impl SpreadParams {
    pub fn to_model(&self) -> Result<SpreadModel, ConfigError> {
        Ok(SpreadModel {
            spread_max_value: to_wad("spread_max_value", self.spread_max_value)?,
            kf: to_wad("kf", self.kf)?,
            k_omega: to_wad("k_omega", self.k_omega)?,
            lambda: to_wad("lambda", self.lambda)?,
            max_liquidity_redemption_value: to_wad(
                "max_liquidity_redemption_value",
                self.max_liquidity_redemption_value,
            )?,
            k_vol: to_wad("k_vol", self.k_vol)?,
            k_hist: to_wad("k_hist", self.k_hist)?,
        })
    }
}

fn to_wad(field: &'static str, value: Decimal) -> Result<Wad, ConfigError> {
    Wad::from_decimal(value).ok_or(ConfigError::InvalidSpread {
        reason: format!("{} must be a non-negative value, got {}", field, value),
    })
}

// 7.2: stablecoin assets. decimals is what the token transfers in (6 or 18).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetConfig {
    pub id: AssetId,
    pub symbol: String,
    pub decimals: u32,
}

impl AssetConfig {
    pub fn usdt() -> Self {
        Self { id: AssetId(1), symbol: "USDT".to_string(), decimals: 6 }
    }

    pub fn usdc() -> Self {
        Self { id: AssetId(2), symbol: "USDC".to_string(), decimals: 6 }
    }

    pub fn dai() -> Self {
        Self { id: AssetId(3), symbol: "DAI".to_string(), decimals: 18 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingConfig {
    #[serde(default)]
    pub oracle: OracleParams,
    #[serde(default)]
    pub spread: SpreadParams,
    #[serde(default = "default_assets")]
    pub assets: Vec<AssetConfig>,
    #[serde(default = "default_swap_tenor_secs")]
    pub swap_tenor_secs: u64,
}

fn default_assets() -> Vec<AssetConfig> {
    vec![AssetConfig::usdt(), AssetConfig::usdc(), AssetConfig::dai()]
}

fn default_swap_tenor_secs() -> u64 {
    28 * 86_400 // 28 days
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            oracle: OracleParams::default(),
            spread: SpreadParams::default(),
            assets: default_assets(),
            swap_tenor_secs: default_swap_tenor_secs(),
        }
    }
}

impl PricingConfig {
    // wider ceiling, cheaper terms. for poking at saturation by hand
    pub fn testnet() -> Self {
        let mut config = Self::default();
        config.spread.spread_max_value = dec!(0.01);
        config.spread.kf = dec!(0.000001);
        config.swap_tenor_secs = 7 * 86_400;
        config
    }

    // slower statistics and a stronger pull from the opposite leg
    pub fn mainnet() -> Self {
        let mut config = Self::default();
        config.oracle.alfa = dec!(0.005);
        config.spread.lambda = dec!(0.1);
        config.spread.max_liquidity_redemption_value = dec!(0.9);
        config
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.oracle.alfa < Decimal::ZERO || self.oracle.alfa > Decimal::ONE {
            return Err(ConfigError::InvalidOracle {
                reason: format!("alfa must be within [0, 1], got {}", self.oracle.alfa),
            });
        }

        // every spread constant has to fit a Wad, which also rules out negatives
        self.spread.to_model()?;
        if self.spread.max_liquidity_redemption_value <= Decimal::ZERO {
            return Err(ConfigError::InvalidSpread {
                reason: "max_liquidity_redemption_value must be positive".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for asset in &self.assets {
            if asset.decimals > 18 {
                return Err(ConfigError::InvalidAsset {
                    reason: format!("{} has {} decimals, at most 18 supported", asset.symbol, asset.decimals),
                });
            }
            if !seen.insert(asset.id) {
                return Err(ConfigError::InvalidAsset {
                    reason: format!("duplicate asset id {}", asset.id),
                });
            }
        }

        if self.swap_tenor_secs == 0 {
            return Err(ConfigError::InvalidTenor);
        }

        Ok(())
    }

    pub fn alfa_wad(&self) -> Result<Wad, ConfigError> {
        Wad::from_decimal(self.oracle.alfa).ok_or(ConfigError::InvalidOracle {
            reason: format!("alfa must be within [0, 1], got {}", self.oracle.alfa),
        })
    }

    pub fn asset(&self, id: AssetId) -> Option<&AssetConfig> {
        self.assets.iter().find(|a| a.id == id)
    }

    /// Parses and validates. Missing sections fall back to the defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: PricingConfig = toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&contents)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid oracle params: {reason}")]
    InvalidOracle { reason: String },

    #[error("Invalid spread params: {reason}")]
    InvalidSpread { reason: String },

    #[error("Invalid asset: {reason}")]
    InvalidAsset { reason: String },

    #[error("Swap tenor must be positive")]
    InvalidTenor,

    #[error("Failed to read config file {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),
}

// Environment presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Development,
    Testnet,
    Mainnet,
}

impl Environment {
    pub fn config(&self) -> PricingConfig {
        match self {
            Environment::Development => PricingConfig::default(),
            Environment::Testnet => PricingConfig::testnet(),
            Environment::Mainnet => PricingConfig::mainnet(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = PricingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.assets.len(), 3);
        assert_eq!(config.asset(AssetId(3)).map(|a| a.decimals), Some(18));
    }

    #[test]
    fn test_environment_presets() {
        assert!(Environment::Development.config().validate().is_ok());
        assert!(Environment::Testnet.config().validate().is_ok());
        assert!(Environment::Mainnet.config().validate().is_ok());
        assert_eq!(Environment::Mainnet.config().oracle.alfa, dec!(0.005));
    }

    #[test]
    fn test_default_params_match_model_default() {
        let model = SpreadParams::default().to_model().unwrap();
        assert_eq!(model, SpreadModel::default());
        assert_eq!(PricingConfig::default().alfa_wad().unwrap(), Wad::from_decimal(dec!(0.01)).unwrap());
    }

    #[test]
    fn test_alfa_out_of_range() {
        let mut config = PricingConfig::default();
        config.oracle.alfa = dec!(1.5);
        assert!(matches!(config.validate(), Err(ConfigError::InvalidOracle { .. })));
        config.oracle.alfa = dec!(-0.1);
        assert!(matches!(config.validate(), Err(ConfigError::InvalidOracle { .. })));
    }

    #[test]
    fn test_negative_spread_param() {
        let mut config = PricingConfig::default();
        config.spread.k_hist = dec!(-0.0001);
        assert!(matches!(config.validate(), Err(ConfigError::InvalidSpread { .. })));
    }

    #[test]
    fn test_zero_ceiling() {
        let mut config = PricingConfig::default();
        config.spread.max_liquidity_redemption_value = Decimal::ZERO;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidSpread { .. })));
    }

    #[test]
    fn test_duplicate_asset() {
        let mut config = PricingConfig::default();
        config.assets.push(AssetConfig::dai());
        assert!(matches!(config.validate(), Err(ConfigError::InvalidAsset { .. })));
    }

    #[test]
    fn test_too_many_decimals() {
        let mut config = PricingConfig::default();
        config.assets = vec![AssetConfig { id: AssetId(9), symbol: "XYZ".to_string(), decimals: 24 }];
        assert!(matches!(config.validate(), Err(ConfigError::InvalidAsset { .. })));
    }

    #[test]
    fn test_zero_tenor() {
        let mut config = PricingConfig::default();
        config.swap_tenor_secs = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidTenor));
    }

    #[test]
    fn test_from_toml() {
        let toml = r#"
            swap_tenor_secs = 5184000

            [oracle]
            alfa = "0.02"

            [spread]
            spread_max_value = "0.005"
            kf = "0.00001"
            k_omega = "0.00005"
            lambda = "0.5"
            max_liquidity_redemption_value = "0.8"
            k_vol = "0.00003"
            k_hist = "0.0003"

            [[assets]]
            id = 2
            symbol = "USDC"
            decimals = 6
        "#;
        let config = PricingConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.oracle.alfa, dec!(0.02));
        assert_eq!(config.spread.lambda, dec!(0.5));
        assert_eq!(config.assets, vec![AssetConfig::usdc()]);
        assert_eq!(config.swap_tenor_secs, 60 * 86_400);
    }

    #[test]
    fn test_toml_defaults_missing_sections() {
        let config = PricingConfig::from_toml_str("").unwrap();
        assert_eq!(config, PricingConfig::default());
    }

    #[test]
    fn test_toml_rejects_invalid() {
        let result = PricingConfig::from_toml_str("[oracle]\nalfa = \"2\"\n");
        assert!(matches!(result, Err(ConfigError::InvalidOracle { .. })));
        assert!(matches!(PricingConfig::from_toml_str("oracle = 3"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = PricingConfig::load("/nonexistent/ipor-core.toml");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_config_serialization() {
        let config = PricingConfig::mainnet();
        let json = serde_json::to_string(&config).unwrap();
        let back: PricingConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
