// Bittrex public REST API client

use std::time::Duration;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;
use crate::clients::{BookType, Candle, MarketDataClient, RawLevel, Ticker};
use crate::config::{ApiConfig, CandleInterval};
use crate::error::{TradingError, TradingResult};

/// Every Bittrex response wraps its payload the same way.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    result: Option<T>,
}

#[derive(Debug, Clone)]
pub struct BittrexClient {
    client: reqwest::Client,
    rest_url: String,
    history_url: String,
    depth: usize,
}

impl BittrexClient {
    pub fn new(config: &ApiConfig) -> TradingResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            rest_url: config.rest_url.trim_end_matches('/').to_string(),
            history_url: config.history_url.trim_end_matches('/').to_string(),
            depth: config.order_book_depth,
        })
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        url: &str,
        params: &[(&str, String)],
    ) -> TradingResult<T> {
        debug!("📡 GET {} {:?}", url, params);

        let response = self.client.get(url).query(params).send().await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(TradingError::ApiRateLimit(format!("{} returned HTTP 429", method)));
        }
        let body = response.error_for_status()?.text().await?;

        let envelope: Envelope<T> = serde_json::from_str(&body)
            .map_err(|e| TradingError::ApiResponse(format!("{}: unexpected payload: {}", method, e)))?;

        if !envelope.success {
            let message = envelope.message.unwrap_or_default();
            return Err(classify_failure(method, &message));
        }

        envelope
            .result
            .ok_or_else(|| TradingError::ApiResponse(format!("{}: response has no result", method)))
    }
}

fn classify_failure(method: &str, message: &str) -> TradingError {
    let detail = format!("{}: {}", method, message);
    match message {
        "APIKEY_INVALID" | "INVALID_SIGNATURE" | "APISIGN_NOT_PROVIDED" | "INVALID_PERMISSION" => {
            TradingError::ApiAuthentication(detail)
        }
        m if m.contains("THROTTLED") || m.contains("RATE_LIMIT") => TradingError::ApiRateLimit(detail),
        _ => TradingError::ApiResponse(detail),
    }
}

#[async_trait]
impl MarketDataClient for BittrexClient {
    async fn get_ticker(&self, market: &str) -> TradingResult<Ticker> {
        let url = format!("{}/public/getticker", self.rest_url);
        self.request("getticker", &url, &[("market", market.to_string())]).await
    }

    async fn get_order_book(&self, market: &str, book: BookType) -> TradingResult<Vec<RawLevel>> {
        let url = format!("{}/public/getorderbook", self.rest_url);
        let params = [
            ("market", market.to_string()),
            ("type", book.as_str().to_string()),
            ("depth", self.depth.to_string()),
        ];
        self.request("getorderbook", &url, &params).await
    }

    async fn get_historical_candles(
        &self,
        market: &str,
        interval: CandleInterval,
    ) -> TradingResult<Vec<Candle>> {
        let url = format!("{}/pub/market/GetTicks", self.history_url);
        let params = [
            ("marketName", market.to_string()),
            ("tickInterval", interval.as_str().to_string()),
        ];
        self.request("GetTicks", &url, &params).await
    }
}
