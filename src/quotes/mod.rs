//! Stock-quote tool: fetch quotes for a fixed set of tickers and report the
//! one that moved the most.

pub mod client;
pub mod error;
pub mod report;

pub use client::{FinnhubClient, Quote};
pub use error::QuoteError;
pub use report::{most_volatile, write_report};

/// Company name to ticker, in reporting order.
pub const SYMBOLS: [(&str, &str); 5] = [
    ("apple", "AAPL"),
    ("amazon", "AMZN"),
    ("netflix", "NFLX"),
    ("facebook", "META"),
    ("google", "GOOGL"),
];
