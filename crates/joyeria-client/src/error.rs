use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ClientError {
    /// Non-2xx answer. `message` is the server's own message when it sent one.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid base URL: {0}")]
    BaseUrl(#[from] url::ParseError),

    /// Rejected locally before any request was sent.
    #[error("{0}")]
    Invalid(String),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    #[error("No hay stock disponible para este producto.")]
    OutOfStock { id: Uuid },

    #[error("Producto no encontrado: {0}")]
    UnknownProduct(Uuid),
}
