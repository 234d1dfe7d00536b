use std::io::Write;

use super::{client::Quote, error::QuoteError};

pub const HEADER: [&str; 4] = [
    "stock_symbol",
    "percentage_change",
    "current_price",
    "last_close_price",
];

/// The quote with the largest absolute percent change. The earliest wins a tie.
pub fn most_volatile(quotes: &[(String, Quote)]) -> Option<&(String, Quote)> {
    quotes.iter().fold(None, |best, candidate| match best {
        Some(current) if candidate.1.abs_change() <= current.1.abs_change() => Some(current),
        _ => Some(candidate),
    })
}

/// Header row plus one data row for `symbol`.
pub fn write_report<W: Write>(writer: W, symbol: &str, quote: &Quote) -> Result<(), QuoteError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(HEADER)?;
    csv.write_record([
        symbol.to_string(),
        quote.abs_change().to_string(),
        quote.c.to_string(),
        quote.pc.to_string(),
    ])?;
    csv.flush()?;
    Ok(())
}
