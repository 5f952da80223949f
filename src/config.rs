// Bot configuration
//
// Layered: built-in defaults, then an optional TOML file, then environment
// variables (`PATTERNBOT__RISK__LEVERAGE=5`). API credentials are never part
// of the file; they come from BYBIT_API_KEY / BYBIT_API_SECRET.

use crate::error::{ConfigError, ExchangeError};
use crate::indicators::IndicatorConfig;
use crate::patterns::PatternConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config/patternbot.toml";
pub const ENV_PREFIX: &str = "PATTERNBOT";

pub const MAINNET_URL: &str = "https://api.bybit.com";
pub const TESTNET_URL: &str = "https://api-testnet.bybit.com";

/// Kline intervals (minutes) the venue accepts
pub const SUPPORTED_INTERVALS: &[u32] = &[1, 3, 5, 15, 30, 60, 120, 240, 360, 720];

/// Largest kline page the venue returns
pub const MAX_CANDLE_LIMIT: usize = 1000;

/// Complete, validated bot configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BotConfig {
    pub exchange: ExchangeConfig,
    pub trading: TradingConfig,
    pub risk: RiskConfig,
    pub indicators: IndicatorConfig,
    pub patterns: PatternConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExchangeConfig {
    /// Overrides the mainnet/testnet endpoint when set
    pub base_url: Option<String>,
    pub testnet: bool,
    pub category: String,
    pub recv_window_ms: u64,
    pub timeout_secs: u64,
    pub requests_per_second: u32,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            testnet: false,
            category: "linear".to_string(),
            recv_window_ms: 5000,
            timeout_secs: 10,
            requests_per_second: 10,
        }
    }
}

impl ExchangeConfig {
    pub fn endpoint(&self) -> &str {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/'),
            None if self.testnet => TESTNET_URL,
            None => MAINNET_URL,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TradingConfig {
    /// Symbols to scan; empty means every tradable USDT perpetual
    pub symbols: Vec<String>,
    pub interval_minutes: u32,
    pub candle_limit: usize,
    pub max_positions: usize,
    pub cycle_delay_secs: u64,
    pub post_order_delay_secs: u64,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            symbols: Vec::new(),
            interval_minutes: 15,   // 15m candles
            candle_limit: 500,      // history per fetch
            max_positions: 50,      // concurrent open positions
            cycle_delay_secs: 120,  // 2 minutes between sweeps
            post_order_delay_secs: 5,
        }
    }
}

impl TradingConfig {
    /// Venue spelling of the kline interval ("15")
    pub fn interval(&self) -> String {
        self.interval_minutes.to_string()
    }

    pub fn cycle_delay(&self) -> Duration {
        Duration::from_secs(self.cycle_delay_secs)
    }

    pub fn post_order_delay(&self) -> Duration {
        Duration::from_secs(self.post_order_delay_secs)
    }
}

/// Per-order risk parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RiskConfig {
    pub leverage: u32,
    /// USDT committed per order
    pub order_notional: f64,
    /// Fraction of the pattern target used for the take-profit
    pub pattern_target_pct: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            leverage: 10,
            order_notional: 50.0,
            pattern_target_pct: 0.8, // exit before the pattern completes
        }
    }
}

impl BotConfig {
    /// Load defaults, then `path` (or the default path if it exists), then the environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::from(Path::new(DEFAULT_CONFIG_PATH)).required(false),
        };

        let settings = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("trading.symbols"),
            )
            .build()?;

        let config: BotConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would trade with nonsensical risk
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_indicators()?;

        let risk = &self.risk;
        if !(risk.pattern_target_pct > 0.0 && risk.pattern_target_pct <= 1.0) {
            return Err(invalid(
                "risk.pattern_target_pct",
                format!("must be in (0, 1], got {}", risk.pattern_target_pct),
            ));
        }
        if !(risk.order_notional.is_finite() && risk.order_notional > 0.0) {
            return Err(invalid(
                "risk.order_notional",
                format!("must be positive, got {}", risk.order_notional),
            ));
        }
        if risk.leverage < 1 {
            return Err(invalid("risk.leverage", "must be at least 1"));
        }

        let trading = &self.trading;
        if !SUPPORTED_INTERVALS.contains(&trading.interval_minutes) {
            return Err(invalid(
                "trading.interval_minutes",
                format!(
                    "{} is not one of {:?}",
                    trading.interval_minutes, SUPPORTED_INTERVALS
                ),
            ));
        }
        if trading.max_positions < 1 {
            return Err(invalid("trading.max_positions", "must be at least 1"));
        }
        let required = self.indicators.min_candles_required();
        if trading.candle_limit < required || trading.candle_limit > MAX_CANDLE_LIMIT {
            return Err(invalid(
                "trading.candle_limit",
                format!(
                    "must be between {} and {}, got {}",
                    required, MAX_CANDLE_LIMIT, trading.candle_limit
                ),
            ));
        }

        if self.patterns.pivot_span == 0 {
            return Err(invalid("patterns.pivot_span", "must be at least 1"));
        }
        if !(self.patterns.tolerance_pct >= 0.0 && self.patterns.tolerance_pct < 1.0) {
            return Err(invalid(
                "patterns.tolerance_pct",
                format!("must be in [0, 1), got {}", self.patterns.tolerance_pct),
            ));
        }

        if self.exchange.requests_per_second == 0 {
            return Err(invalid("exchange.requests_per_second", "must be at least 1"));
        }

        Ok(())
    }
}

impl BotConfig {
    /// Windows must be non-empty before any lookback is derived from them
    fn validate_indicators(&self) -> Result<(), ConfigError> {
        let indicators = &self.indicators;
        let windows = [
            ("indicators.volume_window", indicators.volume_window),
            ("indicators.bollinger_window", indicators.bollinger_window),
            ("indicators.macd_fast", indicators.macd_fast),
            ("indicators.macd_slow", indicators.macd_slow),
            ("indicators.macd_signal", indicators.macd_signal),
            ("indicators.rsi_period", indicators.rsi_period),
        ];
        for (field, window) in windows {
            if window == 0 {
                return Err(invalid(field, "must be at least 1"));
            }
        }

        if indicators.macd_fast >= indicators.macd_slow {
            return Err(invalid(
                "indicators.macd_fast",
                format!(
                    "must be below macd_slow ({} >= {})",
                    indicators.macd_fast, indicators.macd_slow
                ),
            ));
        }
        if !(indicators.bollinger_std.is_finite() && indicators.bollinger_std > 0.0) {
            return Err(invalid(
                "indicators.bollinger_std",
                format!("must be positive, got {}", indicators.bollinger_std),
            ));
        }

        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// API key pair for signed endpoints
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// Read BYBIT_API_KEY / BYBIT_API_SECRET
    pub fn from_env() -> Result<Self, ExchangeError> {
        let read = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ExchangeError::MissingCredentials(format!("{} not set", name)))
        };

        Ok(Self::new(read("BYBIT_API_KEY")?, read("BYBIT_API_SECRET")?))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"***")
            .finish()
    }
}
