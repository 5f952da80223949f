use thiserror::Error;

/// Failures of the exchange collaborator (market data, account reads, orders)
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("API error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("Missing API credentials: {0}")]
    MissingCredentials(String),
}

impl From<reqwest::Error> for ExchangeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ExchangeError::Parse(err.to_string())
        } else {
            ExchangeError::Network(err.to_string())
        }
    }
}

/// Indicator / confirmation failures
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SignalError {
    #[error("Insufficient data for {indicator}: {available} candles, need {required}")]
    InsufficientData {
        indicator: &'static str,
        required: usize,
        available: usize,
    },
}

/// Why an order attempt was abandoned
#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("Market data unavailable: {0}")]
    DataFetch(#[source] ExchangeError),

    #[error("Invalid mark price: {0}")]
    InvalidMarkPrice(f64),

    #[error("Quantity rounds to zero ({notional} USDT @ {mark_price}, {precision} dp)")]
    QuantityTooSmall {
        notional: f64,
        mark_price: f64,
        precision: u32,
    },

    #[error("Take profit {0} is not a valid price")]
    InvalidTakeProfit(f64),

    #[error("Order rejected: {0}")]
    Exchange(#[source] ExchangeError),
}

/// Configuration loading / validation failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SignalError::InsufficientData {
            indicator: "macd",
            required: 34,
            available: 10,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient data for macd: 10 candles, need 34"
        );

        let err = ExchangeError::Api {
            code: 10001,
            message: "params error".to_string(),
        };
        assert_eq!(err.to_string(), "API error 10001: params error");
    }
}
