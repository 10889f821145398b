use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonetaryError {
    #[error("Monetary error: {0}")]
    InvalidFormat(String),
    #[error("Monetary error: [{0}] has more decimal places than the currency minor unit")]
    TooPrecise(String)
}
