//! Bybit v5 REST client (USDT linear perpetuals)
//!
//! Public market endpoints are unsigned. Private endpoints are signed with
//! HMAC-SHA256 over `timestamp + api_key + recv_window + payload`, where the
//! payload is the query string for GET and the JSON body for POST.

use super::ExchangeGateway;
use crate::config::{Credentials, ExchangeConfig};
use crate::error::ExchangeError;
use crate::models::{Candle, OpenPosition, OrderAck, OrderRequest, Precisions, Side};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use governor::{Quota, RateLimiter};
use hmac::{Hmac, Mac};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::Sha256;
use std::num::NonZeroU32;
use std::str::FromStr;
use std::sync::Arc;

type HmacSha256 = Hmac<Sha256>;

type BybitRateLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// "leverage not modified" is returned when the requested value is already set
pub const LEVERAGE_NOT_MODIFIED: i64 = 110043;

const SETTLE_COIN: &str = "USDT";
const ACCOUNT_TYPE: &str = "UNIFIED";
const POSITION_PAGE_LIMIT: &str = "200";

// ============== Response Types ==============

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    ret_code: i64,
    #[serde(default)]
    ret_msg: String,
    #[serde(default)]
    result: Value,
}

#[derive(Debug, Deserialize)]
struct ListResult<T> {
    list: Vec<T>,
    #[serde(rename = "nextPageCursor", default)]
    next_page_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TickerRaw {
    symbol: String,
    #[serde(default)]
    mark_price: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstrumentRaw {
    price_filter: PriceFilter,
    lot_size_filter: LotSizeFilter,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceFilter {
    tick_size: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LotSizeFilter {
    qty_step: String,
}

#[derive(Debug, Deserialize)]
struct WalletRaw {
    coin: Vec<CoinBalanceRaw>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CoinBalanceRaw {
    coin: String,
    wallet_balance: String,
}

#[derive(Debug, Deserialize)]
struct PositionRaw {
    symbol: String,
    #[serde(default)]
    side: String,
    size: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderCreatedRaw {
    order_id: String,
    order_link_id: String,
}

// ============== Implementation ==============

/// Cloneable; clones share the HTTP pool and the rate limiter
#[derive(Clone)]
pub struct BybitClient {
    client: Client,
    base_url: String,
    category: String,
    recv_window_ms: u64,
    credentials: Option<Credentials>,
    rate_limiter: Arc<BybitRateLimiter>,
}

impl BybitClient {
    /// Client for public endpoints only; signed calls fail with `MissingCredentials`
    pub fn new(config: &ExchangeConfig) -> Result<Self, ExchangeError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ExchangeError::Network(format!("Failed to build HTTP client: {}", e)))?;

        let rps = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_second(rps)));

        Ok(Self {
            client,
            base_url: config.endpoint().to_string(),
            category: config.category.clone(),
            recv_window_ms: config.recv_window_ms,
            credentials: None,
            rate_limiter,
        })
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn credentials(&self) -> Result<&Credentials, ExchangeError> {
        self.credentials.as_ref().ok_or_else(|| {
            ExchangeError::MissingCredentials("signed endpoint called without API keys".to_string())
        })
    }

    /// Hex HMAC-SHA256 of `timestamp + api_key + recv_window + payload`
    fn sign(&self, timestamp: i64, payload: &str) -> Result<String, ExchangeError> {
        let credentials = self.credentials()?;
        sign_request(
            &credentials.api_secret,
            timestamp,
            &credentials.api_key,
            self.recv_window_ms,
            payload,
        )
    }

    async fn public_get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ExchangeError> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}{}", self.base_url, path);
        let response = self.client.get(&url).query(params).send().await?;
        Self::unwrap_envelope(response, &[]).await
    }

    async fn signed_get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ExchangeError> {
        self.rate_limiter.until_ready().await;

        let query = build_query(params);
        let timestamp = Utc::now().timestamp_millis();
        let signature = self.sign(timestamp, &query)?;
        let credentials = self.credentials()?;

        let url = if query.is_empty() {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}{}?{}", self.base_url, path, query)
        };

        let response = self
            .client
            .get(&url)
            .header("X-BAPI-API-KEY", &credentials.api_key)
            .header("X-BAPI-TIMESTAMP", timestamp.to_string())
            .header("X-BAPI-RECV-WINDOW", self.recv_window_ms.to_string())
            .header("X-BAPI-SIGN", signature)
            .send()
            .await?;

        Self::unwrap_envelope(response, &[]).await
    }

    async fn signed_post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
        accepted_codes: &[i64],
    ) -> Result<T, ExchangeError> {
        self.rate_limiter.until_ready().await;

        let body = body.to_string();
        let timestamp = Utc::now().timestamp_millis();
        let signature = self.sign(timestamp, &body)?;
        let credentials = self.credentials()?;

        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .header("X-BAPI-API-KEY", &credentials.api_key)
            .header("X-BAPI-TIMESTAMP", timestamp.to_string())
            .header("X-BAPI-RECV-WINDOW", self.recv_window_ms.to_string())
            .header("X-BAPI-SIGN", signature)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await?;

        Self::unwrap_envelope(response, accepted_codes).await
    }

    /// Check HTTP status and `retCode`, then decode `result`
    ///
    /// Codes in `accepted_codes` are treated like `retCode == 0`.
    async fn unwrap_envelope<T: DeserializeOwned>(
        response: reqwest::Response,
        accepted_codes: &[i64],
    ) -> Result<T, ExchangeError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ExchangeError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: Envelope = serde_json::from_str(&body)
            .map_err(|e| ExchangeError::Parse(format!("Invalid response envelope: {}", e)))?;

        if envelope.ret_code != 0 && !accepted_codes.contains(&envelope.ret_code) {
            return Err(ExchangeError::Api {
                code: envelope.ret_code,
                message: envelope.ret_msg,
            });
        }

        // "not modified" answers carry an empty result
        let result = match envelope.result {
            Value::Null => Value::Object(Default::default()),
            other => other,
        };
        serde_json::from_value(result).map_err(|e| ExchangeError::Parse(e.to_string()))
    }
}

#[async_trait]
impl ExchangeGateway for BybitClient {
    async fn candles(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, ExchangeError> {
        let result: ListResult<Vec<String>> = self
            .public_get(
                "/v5/market/kline",
                &[
                    ("category", self.category.clone()),
                    ("symbol", symbol.to_string()),
                    ("interval", interval.to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;

        // venue returns newest first
        let mut candles = result
            .list
            .iter()
            .map(|row| parse_kline(row))
            .collect::<Result<Vec<_>, _>>()?;
        candles.reverse();

        tracing::debug!("[{}] Fetched {} candles", symbol, candles.len());
        Ok(candles)
    }

    async fn mark_price(&self, symbol: &str) -> Result<f64, ExchangeError> {
        let result: ListResult<TickerRaw> = self
            .public_get(
                "/v5/market/tickers",
                &[
                    ("category", self.category.clone()),
                    ("symbol", symbol.to_string()),
                ],
            )
            .await?;

        let ticker = result
            .list
            .into_iter()
            .next()
            .ok_or_else(|| ExchangeError::SymbolNotFound(symbol.to_string()))?;
        parse_number(&ticker.mark_price, "markPrice")
    }

    async fn precisions(&self, symbol: &str) -> Result<Precisions, ExchangeError> {
        let result: ListResult<InstrumentRaw> = self
            .public_get(
                "/v5/market/instruments-info",
                &[
                    ("category", self.category.clone()),
                    ("symbol", symbol.to_string()),
                ],
            )
            .await?;

        let instrument = result
            .list
            .into_iter()
            .next()
            .ok_or_else(|| ExchangeError::SymbolNotFound(symbol.to_string()))?;

        Ok(Precisions {
            price: decimal_places(&instrument.price_filter.tick_size)?,
            quantity: decimal_places(&instrument.lot_size_filter.qty_step)?,
        })
    }

    async fn balance(&self) -> Result<f64, ExchangeError> {
        let result: ListResult<WalletRaw> = self
            .signed_get(
                "/v5/account/wallet-balance",
                &[
                    ("accountType", ACCOUNT_TYPE.to_string()),
                    ("coin", SETTLE_COIN.to_string()),
                ],
            )
            .await?;

        let coin = result
            .list
            .iter()
            .flat_map(|wallet| wallet.coin.iter())
            .find(|c| c.coin == SETTLE_COIN)
            .ok_or_else(|| ExchangeError::Parse("USDT balance missing from wallet".to_string()))?;

        parse_number(&coin.wallet_balance, "walletBalance")
    }

    async fn open_positions(&self) -> Result<Vec<OpenPosition>, ExchangeError> {
        let mut positions = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut params = vec![
                ("category", self.category.clone()),
                ("settleCoin", SETTLE_COIN.to_string()),
                ("limit", POSITION_PAGE_LIMIT.to_string()),
            ];
            if let Some(c) = &cursor {
                params.push(("cursor", c.clone()));
            }

            let page: ListResult<PositionRaw> =
                self.signed_get("/v5/position/list", &params).await?;

            for raw in page.list {
                positions.push(OpenPosition {
                    side: parse_side(&raw.side),
                    size: parse_number(&raw.size, "size")?,
                    symbol: raw.symbol,
                });
            }

            match page.next_page_cursor.filter(|c| !c.is_empty()) {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        Ok(positions)
    }

    async fn tradable_symbols(&self) -> Result<Vec<String>, ExchangeError> {
        let result: ListResult<TickerRaw> = self
            .public_get("/v5/market/tickers", &[("category", self.category.clone())])
            .await?;

        Ok(result
            .list
            .into_iter()
            .map(|t| t.symbol)
            .filter(|s| s.contains("USDT") && !s.contains("USDC"))
            .collect())
    }

    async fn set_leverage(&self, symbol: &str, leverage: u32) -> Result<(), ExchangeError> {
        let body = json!({
            "category": self.category,
            "symbol": symbol,
            "buyLeverage": leverage.to_string(),
            "sellLeverage": leverage.to_string(),
        });

        let _: Value = self
            .signed_post("/v5/position/set-leverage", &body, &[LEVERAGE_NOT_MODIFIED])
            .await?;
        Ok(())
    }

    async fn place_order(&self, order: &OrderRequest) -> Result<OrderAck, ExchangeError> {
        let body = json!({
            "category": self.category,
            "symbol": order.symbol,
            "side": order.side.as_str(),
            "orderType": "Market",
            "qty": order.quantity.to_string(),
            "takeProfit": order.take_profit.to_string(),
            "stopLoss": order.stop_loss.to_string(),
            "tpTriggerBy": "MarkPrice",
            "slTriggerBy": "MarkPrice",
            "orderLinkId": order.link_id,
        });

        let created: OrderCreatedRaw = self.signed_post("/v5/order/create", &body, &[]).await?;
        Ok(OrderAck {
            order_id: created.order_id,
            link_id: created.order_link_id,
        })
    }
}

// ============== Helpers ==============

pub fn sign_request(
    secret: &str,
    timestamp: i64,
    api_key: &str,
    recv_window_ms: u64,
    payload: &str,
) -> Result<String, ExchangeError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ExchangeError::MissingCredentials(format!("Invalid API secret: {}", e)))?;
    mac.update(format!("{}{}{}{}", timestamp, api_key, recv_window_ms, payload).as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn build_query(params: &[(&str, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// `[startTime, open, high, low, close, volume, turnover]`, all strings
fn parse_kline(row: &[String]) -> Result<Candle, ExchangeError> {
    let [start, open, high, low, close, volume, turnover, ..] = row else {
        return Err(ExchangeError::Parse(format!(
            "kline row has {} fields, expected 7",
            row.len()
        )));
    };

    let millis = start
        .parse::<i64>()
        .map_err(|e| ExchangeError::Parse(format!("kline start time {:?}: {}", start, e)))?;
    let timestamp = Utc
        .timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| ExchangeError::Parse(format!("kline start time out of range: {}", millis)))?;

    Ok(Candle {
        timestamp,
        open: parse_number(open, "open")?,
        high: parse_number(high, "high")?,
        low: parse_number(low, "low")?,
        close: parse_number(close, "close")?,
        volume: parse_number(volume, "volume")?,
        turnover: parse_number(turnover, "turnover")?,
    })
}

fn parse_number(value: &str, field: &str) -> Result<f64, ExchangeError> {
    value
        .parse::<f64>()
        .map_err(|e| ExchangeError::Parse(format!("{} {:?}: {}", field, value, e)))
}

fn parse_side(value: &str) -> Option<Side> {
    match value {
        "Buy" => Some(Side::Buy),
        "Sell" => Some(Side::Sell),
        _ => None,
    }
}

/// Significant digits after the decimal point of a step string
///
/// Trailing zeros do not count: a tick of "0.010" allows 2 dp, not 3, so
/// rounded prices stay on the tick grid.
pub fn decimal_places(step: &str) -> Result<u32, ExchangeError> {
    Decimal::from_str(step)
        .map(|d| d.normalize().scale())
        .map_err(|e| ExchangeError::Parse(format!("step {:?}: {}", step, e)))
}
