use std::io::Error as IO_ERROR;

use reqwest::Error as REQWEST_ERROR;
use serde_json::Error as JSON_ERROR;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Network error: {0}")]
    Network(#[source] REQWEST_ERROR),

    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Decode error: {0}")]
    Decode(#[from] JSON_ERROR),

    #[error("Persistence error: {0}")]
    Persistence(#[from] IO_ERROR),

    #[error("Invalid quantity {quantity} for {asset_id}")]
    InvalidQuantity { asset_id: String, quantity: f64 },

    #[error("Invalid url: {0}")]
    Url(String),

    #[error("Engine stopped")]
    EngineStopped,
}

impl From<REQWEST_ERROR> for Error {
    fn from(err: REQWEST_ERROR) -> Self {
        match err.status() {
            Some(status) => Error::Status {
                status: status.as_u16(),
                url: err.url().map(|url| url.to_string()).unwrap_or_default(),
            },
            None => Error::Network(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
