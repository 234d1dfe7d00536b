use std::fs::File;

use shopfront::{
    logging,
    quotes::{most_volatile, write_report, FinnhubClient, QuoteError, SYMBOLS},
};
use tracing::{error, info};

async fn run(token: String, output: &str) -> Result<(), QuoteError> {
    let symbols = SYMBOLS
        .iter()
        .map(|(name, ticker)| (name.to_string(), ticker.to_string()))
        .collect();
    let client = FinnhubClient::new(symbols, token);
    let quotes = client.quotes().await?;
    let (symbol, quote) = most_volatile(&quotes).ok_or(QuoteError::NoQuotes)?;
    write_report(File::create(output)?, symbol, quote)?;
    info!(%symbol, change = quote.abs_change(), output, "report written");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init("shopfront=info,most_volatile=info");

    let token = std::env::var("FINNHUB_TOKEN")?;
    let output =
        std::env::var("QUOTES_OUTPUT").unwrap_or_else(|_| "most_volatile_stock.csv".into());

    if let Err(e) = run(token, &output).await {
        error!(error = %e, "most volatile stock report failed");
        return Err(e.into());
    }
    Ok(())
}
