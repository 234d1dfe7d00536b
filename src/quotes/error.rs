#[derive(Debug, thiserror::Error)]
pub enum QuoteError {
    /// The API answered with an `error` payload.
    #[error("quote api error: {0}")]
    Api(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("no valid quotes were returned")]
    NoQuotes,
}
