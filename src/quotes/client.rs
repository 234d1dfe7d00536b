use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::error::QuoteError;

const QUOTE_URL: &str = "https://finnhub.io/api/v1/quote";

/// Finnhub quote payload. Unknown symbols come back zeroed with `dp` null.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Quote {
    #[serde(default)]
    pub c: f64, // current price
    pub d: Option<f64>,
    pub dp: Option<f64>, // percent change
    #[serde(default)]
    pub h: f64,
    #[serde(default)]
    pub l: f64,
    #[serde(default)]
    pub o: f64,
    #[serde(default)]
    pub pc: f64, // previous close
    #[serde(default)]
    pub t: i64,
}

impl Quote {
    pub fn abs_change(&self) -> f64 {
        self.dp.unwrap_or_default().abs()
    }
}

/// Interpret one response body. `Ok(None)` marks a symbol without a usable change.
pub fn parse_quote(body: Value) -> Result<Option<Quote>, QuoteError> {
    if let Some(err) = body.get("error") {
        let msg = err
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| err.to_string());
        return Err(QuoteError::Api(msg));
    }
    let quote: Quote = serde_json::from_value(body)
        .map_err(|e| QuoteError::Api(format!("malformed quote: {e}")))?;
    Ok(quote.dp.filter(|dp| *dp != 0.0).map(|_| quote))
}

pub struct FinnhubClient {
    client: reqwest::Client,
    symbols: Vec<(String, String)>,
    token: String,
}

impl FinnhubClient {
    /// `symbols` are `(name, ticker)` pairs, queried in order.
    pub fn new(symbols: Vec<(String, String)>, token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            symbols,
            token: token.into(),
        }
    }

    pub async fn quote(&self, symbol: &str) -> Result<Option<Quote>, QuoteError> {
        let body: Value = self
            .client
            .get(QUOTE_URL)
            .query(&[("symbol", symbol), ("token", self.token.as_str())])
            .send()
            .await?
            .json()
            .await?;
        debug!(symbol, "quote fetched");
        parse_quote(body)
    }

    /// Quotes for every configured ticker, skipping the ones without data.
    pub async fn quotes(&self) -> Result<Vec<(String, Quote)>, QuoteError> {
        let mut out = Vec::with_capacity(self.symbols.len());
        for (name, ticker) in &self.symbols {
            match self.quote(ticker).await? {
                Some(quote) => out.push((ticker.clone(), quote)),
                None => warn!(symbol = %ticker, company = %name, "skipping invalid symbol"),
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn error_payload_is_an_api_error() {
        let err = parse_quote(json!({ "error": "Invalid API key." })).unwrap_err();
        match err {
            QuoteError::Api(msg) => assert_eq!(msg, "Invalid API key."),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn zeroed_or_missing_change_is_skipped() {
        let unknown = json!({ "c": 0, "d": null, "dp": null, "h": 0, "l": 0, "o": 0, "pc": 0, "t": 0 });
        assert!(parse_quote(unknown).unwrap().is_none());
        let flat = json!({ "c": 10.0, "d": 0.0, "dp": 0.0, "pc": 10.0 });
        assert!(parse_quote(flat).unwrap().is_none());
    }

    #[test]
    fn full_quote_parses() {
        let body = json!({
            "c": 113.67, "d": -0.89, "dp": -0.7769, "h": 116.25,
            "l": 112.43, "o": 115.1, "pc": 114.56, "t": 1665432004
        });
        let quote = parse_quote(body).unwrap().unwrap();
        assert_eq!(quote.c, 113.67);
        assert_eq!(quote.abs_change(), 0.7769);
    }
}
