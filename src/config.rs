//! Runtime settings.
//!
//! Built-in defaults, then an optional TOML file, then `ARION__`-prefixed
//! environment variables (e.g. `ARION__RISK__MAX_LIQUIDATION_RISK=0.05`).

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::models::Direction;

pub const DEFAULT_CONFIG_PATH: &str = "config/arion.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub exchange: ExchangeConfig,
    pub monitor: MonitorConfig,
    pub signals: SignalConfig,
    pub risk: RiskConfig,
    pub account: AccountConfig,
    pub screener: ScreenerConfig,
    pub positions: Vec<PositionSeed>,
    pub ledger: Vec<LedgerSeed>,
}

/// Exchange candle endpoint
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExchangeConfig {
    pub base_url: String,
    /// Per-request timeout (seconds)
    pub timeout_secs: u64,
    pub candle_limit: usize,
    pub requests_per_minute: u32,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.arion.exchange".to_string(),
            timeout_secs: 10,
            candle_limit: 100,
            requests_per_minute: 120,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Seconds between evaluation passes
    pub poll_interval_secs: u64,
    /// Allocation reported with each partial-exit signal
    pub partial_exit_allocation_usdt: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 300,
            partial_exit_allocation_usdt: 8.0,
        }
    }
}

/// Windows, multipliers and thresholds used by the signal detectors
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SignalConfig {
    pub stabilization_window: usize,
    pub small_body_ratio: f64,
    pub min_small_bodies: usize,
    pub volume_window: usize,
    pub volume_multiplier: f64,
    pub sma_fast: usize,
    pub sma_slow: usize,
    pub rsi_period: usize,
    pub bullish_rsi: f64,
    pub bearish_rsi: f64,
    pub exit_rsi: f64,
    /// Multiplier applied to quantity by the 3x scale-in (1x held + 3x added)
    pub scale_in_factor: f64,
    /// Fraction of quantity kept after a partial exit
    pub partial_exit_retain: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            stabilization_window: 15,
            small_body_ratio: 0.6,
            min_small_bodies: 8,
            volume_window: 5,
            volume_multiplier: 2.0,
            sma_fast: 8,
            sma_slow: 21,
            rsi_period: 14,
            bullish_rsi: 55.0,
            bearish_rsi: 45.0,
            exit_rsi: 50.0,
            scale_in_factor: 4.0,
            partial_exit_retain: 0.2,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RiskConfig {
    pub max_liquidation_risk: f64,
    /// Subtract trimmed profit from the ledger (off: trims are only reported)
    pub deduct_from_ledger: bool,
    /// Fixed risk metric; when unset the simulated estimator is used
    pub fixed_risk: Option<f64>,
    pub simulated_min: f64,
    pub simulated_max: f64,
    pub simulated_seed: Option<u64>,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_liquidation_risk: 0.07,
            deduct_from_ledger: false,
            fixed_risk: None,
            simulated_min: 0.05,
            simulated_max: 0.10,
            simulated_seed: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AccountConfig {
    pub total_equity: f64,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            total_equity: 100.0,
        }
    }
}

/// Phase-1 entry screening
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScreenerConfig {
    pub reference_symbol: String,
    pub assets: Vec<String>,
    pub oversold_rsi: f64,
    pub overbought_rsi: f64,
    pub allocation_usdt: f64,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            reference_symbol: "BTCUSDT".to_string(),
            assets: vec![
                "SOLUSDT".to_string(),
                "ETHUSDT".to_string(),
                "BNBUSDT".to_string(),
            ],
            oversold_rsi: 35.0,
            overbought_rsi: 65.0,
            allocation_usdt: 10.0,
        }
    }
}

/// Position opened at start-up
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PositionSeed {
    pub symbol: String,
    pub entry_price: f64,
    pub quantity: f64,
    pub leverage: u32,
    pub direction: Direction,
}

/// Profit recorded for a symbol at start-up
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LedgerSeed {
    pub symbol: String,
    pub profit: f64,
}

impl Settings {
    /// Settings matching the reference deployment: one SOLUSDT long and two
    /// recorded winners
    pub fn reference() -> Self {
        Self {
            positions: vec![PositionSeed {
                symbol: "SOLUSDT".to_string(),
                entry_price: 110.0,
                quantity: 0.5,
                leverage: 20,
                direction: Direction::Buy,
            }],
            ledger: vec![
                LedgerSeed {
                    symbol: "ETHUSDT".to_string(),
                    profit: 6.0,
                },
                LedgerSeed {
                    symbol: "BNBUSDT".to_string(),
                    profit: 4.0,
                },
            ],
            ..Default::default()
        }
    }

    /// Load settings from a file (if present) and the environment
    ///
    /// A missing file is not an error; the reference positions and ledger are
    /// used unless the file or environment provides their own.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let defaults = config::Config::try_from(&Self::reference())?;

        let builder = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("ARION")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        let settings: Self = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load_default() -> Result<Self, config::ConfigError> {
        Self::load(DEFAULT_CONFIG_PATH)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.account.total_equity <= 0.0 {
            return Err(config::ConfigError::Message(format!(
                "account.total_equity must be positive, got {}",
                self.account.total_equity
            )));
        }
        if !(0.0..1.0).contains(&self.risk.max_liquidation_risk) {
            return Err(config::ConfigError::Message(format!(
                "risk.max_liquidation_risk must be in [0, 1), got {}",
                self.risk.max_liquidation_risk
            )));
        }
        if self.risk.simulated_min >= self.risk.simulated_max {
            return Err(config::ConfigError::Message(
                "risk.simulated_min must be below risk.simulated_max".to_string(),
            ));
        }
        if let Some(seed) = self.positions.iter().find(|p| p.quantity < 0.0) {
            return Err(config::ConfigError::Message(format!(
                "position {} has negative quantity",
                seed.symbol
            )));
        }
        Ok(())
    }
}
