//! Native asset price feed with a short-lived cache.

use crate::cache::TtlCell;
use crate::config::ServerConfig;
use crate::fallback::or_sentinel;

use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Price lookup error types.
#[derive(Error, Debug)]
pub enum PriceError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("quote source returned HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed quote: {0}")]
    Malformed(String),
}

/// Simple-price client for one asset/fiat pair.
pub struct PriceFeed {
    http: reqwest::Client,
    url: String,
    asset_id: String,
    currency: String,
    cell: TtlCell<f64>,
}

impl PriceFeed {
    pub fn new(
        url: &str,
        asset_id: &str,
        currency: &str,
        timeout: Duration,
        ttl: Duration,
    ) -> Result<Self, PriceError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.to_string(),
            asset_id: asset_id.to_string(),
            currency: currency.to_string(),
            cell: TtlCell::new(ttl),
        })
    }

    pub fn from_config(cfg: &ServerConfig) -> Result<Self, PriceError> {
        Self::new(
            &cfg.price_api_url,
            &cfg.price_asset_id,
            &cfg.price_currency,
            Duration::from_secs(cfg.price_timeout_secs),
            Duration::from_secs(cfg.price_cache_ttl_secs),
        )
    }

    pub fn ttl(&self) -> Duration {
        self.cell.ttl()
    }

    /// Cached price, or `0.0` when the quote source is unavailable.
    ///
    /// The `0.0` sentinel is cached like a real quote.
    pub async fn get_price(&self) -> f64 {
        self.cell
            .get_or_refresh(|| or_sentinel("price fetch", self.fetch(), 0.0))
            .await
    }

    async fn fetch(&self) -> Result<f64, PriceError> {
        let response = self
            .http
            .get(&self.url)
            .query(&[
                ("ids", self.asset_id.as_str()),
                ("vs_currencies", self.currency.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PriceError::Status(status));
        }

        let body = response.text().await?;
        let json: Value =
            serde_json::from_str(&body).map_err(|e| PriceError::Malformed(e.to_string()))?;

        let price = json
            .get(&self.asset_id)
            .and_then(|asset| asset.get(&self.currency))
            .and_then(Value::as_f64)
            .ok_or_else(|| {
                PriceError::Malformed(format!("missing {}.{}", self.asset_id, self.currency))
            })?;

        if !price.is_finite() {
            return Err(PriceError::Malformed(format!("non-finite price {}", price)));
        }

        tracing::debug!("Fetched {} price: {} {}", self.asset_id, price, self.currency);
        Ok(price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn feed(url: &str) -> PriceFeed {
        PriceFeed::new(
            url,
            "ethereum",
            "usd",
            Duration::from_secs(2),
            Duration::from_secs(60),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_reads_price_for_asset() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("ids", "ethereum"))
            .and(query_param("vs_currencies", "usd"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "ethereum": { "usd": 3120.55 } })),
            )
            .mount(&server)
            .await;

        assert_eq!(feed(&server.uri()).get_price().await, 3120.55);
    }

    #[tokio::test]
    async fn test_malformed_body_yields_sentinel() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .mount(&server)
            .await;

        assert_eq!(feed(&server.uri()).get_price().await, 0.0);
    }

    #[tokio::test]
    async fn test_missing_field_yields_sentinel() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "bitcoin": { "usd": 1.0 } })))
            .mount(&server)
            .await;

        assert_eq!(feed(&server.uri()).get_price().await, 0.0);
    }

    #[tokio::test]
    async fn test_error_status_yields_sentinel() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        assert_eq!(feed(&server.uri()).get_price().await, 0.0);
    }

    #[tokio::test]
    async fn test_price_cached_within_ttl() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ethereum": { "usd": 2000 } })))
            .expect(1)
            .mount(&server)
            .await;

        let feed = feed(&server.uri());
        assert_eq!(feed.get_price().await, 2000.0);
        assert_eq!(feed.get_price().await, 2000.0);
    }

    #[tokio::test]
    async fn test_failure_is_cached_too() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let feed = feed(&server.uri());
        assert_eq!(feed.get_price().await, 0.0);
        assert_eq!(feed.get_price().await, 0.0);
    }
}
