//! Base → quote currency conversion rate.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::error::ExchangeRateError;
use crate::metrics;

/// Response of the `latest/{base}` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RatesResponse {
    /// Currency code → units per one base unit.
    #[serde(default)]
    pub rates: HashMap<String, Decimal>,
}

impl RatesResponse {
    /// Positive rate for `quote`.
    pub fn rate_for(&self, quote: &str) -> Result<Decimal, ExchangeRateError> {
        let rate = *self
            .rates
            .get(quote)
            .ok_or_else(|| ExchangeRateError::MissingRate(quote.to_string()))?;

        if rate <= Decimal::ZERO {
            return Err(ExchangeRateError::NonPositive(rate));
        }
        Ok(rate)
    }
}

/// Exchange rate service client.
#[derive(Debug, Clone)]
pub struct ExchangeRateClient {
    http: reqwest::Client,
    base_url: String,
}

impl ExchangeRateClient {
    /// Create a client with the configured timeout.
    pub fn new(config: &Config) -> Result<Self, ExchangeRateError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: config.exchange_rate_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the live `base → quote` rate.
    #[instrument(skip(self))]
    pub async fn fetch_rate(&self, base: &str, quote: &str) -> Result<Decimal, ExchangeRateError> {
        let url = format!("{}/{}", self.base_url, base);
        let response = self.http.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(ExchangeRateError::Status(response.status().as_u16()));
        }

        let body: RatesResponse = response.json().await?;
        body.rate_for(quote)
    }
}

/// Rate for this run: the live rate, or the configured fallback when the
/// lookup fails for any reason.
pub async fn resolve_conversion_rate(config: &Config) -> Decimal {
    let rate = match ExchangeRateClient::new(config) {
        Ok(client) => {
            client
                .fetch_rate(&config.base_currency, &config.quote_currency)
                .await
        }
        Err(e) => Err(e),
    };
    or_fallback(rate, config)
}

fn or_fallback(rate: Result<Decimal, ExchangeRateError>, config: &Config) -> Decimal {
    match rate {
        Ok(rate) => {
            info!(
                base = %config.base_currency,
                quote = %config.quote_currency,
                rate = %rate,
                "Using live conversion rate"
            );
            rate
        }
        Err(e) => {
            warn!(
                error = %e,
                fallback = %config.fallback_conversion_rate,
                "Exchange rate lookup failed, using fallback"
            );
            metrics::inc_exchange_rate_fallbacks();
            config.fallback_conversion_rate
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn reads_quote_rate() {
        let body: RatesResponse =
            serde_json::from_str(r#"{"base": "CAD", "rates": {"CAD": 1, "USD": 0.7215}}"#).unwrap();
        assert_eq!(body.rate_for("USD").unwrap(), dec!(0.7215));
    }

    #[test]
    fn missing_or_bad_rate_is_an_error() {
        let body: RatesResponse =
            serde_json::from_str(r#"{"rates": {"EUR": 0.68, "USD": 0}}"#).unwrap();
        assert!(matches!(body.rate_for("GBP"), Err(ExchangeRateError::MissingRate(_))));
        assert!(matches!(body.rate_for("USD"), Err(ExchangeRateError::NonPositive(_))));
    }

    #[test]
    fn failure_falls_back_to_configured_rate() {
        let config = Config::default();
        let rate = or_fallback(Err(ExchangeRateError::Status(503)), &config);
        assert_eq!(rate, dec!(0.73));
        assert_eq!(or_fallback(Ok(dec!(0.71)), &config), dec!(0.71));
    }

    #[tokio::test]
    async fn unreachable_service_falls_back() {
        let config = Config {
            exchange_rate_url: "http://127.0.0.1:1/v4/latest".to_string(),
            http_timeout_ms: 500,
            fallback_conversion_rate: dec!(0.7),
            ..Config::default()
        };
        assert_eq!(resolve_conversion_rate(&config).await, dec!(0.7));
    }
}
