use thiserror::Error;

use crate::transport::TransportError;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("connection failed after {attempts} attempts: {last_error}")]
    ConnectionExhausted { attempts: u32, last_error: String },

    #[error("connection attempt aborted")]
    Aborted,

    #[error("unable to parse ticket expiry from \"{status}\"")]
    ExpiryParse { status: String },

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}
