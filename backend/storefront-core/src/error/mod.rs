pub mod cart;
pub mod config;
pub mod logger;
pub mod session;
pub mod storage;
pub mod transport;
pub mod validation;

pub use cart::CartError;
pub use config::ConfigError;
pub use logger::LoggerError;
pub use session::SessionError;
pub use storage::StorageError;
pub use transport::{ApiError, TransportError};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Logger(#[from] LoggerError),
}

impl CoreError {
    /// Numeric storefront error code, when the failure carries one.
    ///
    /// Presentation layers feed this into [`crate::error_catalog::translate`].
    pub fn error_code(&self) -> Option<u32> {
        match self {
            CoreError::Validation(e) => Some(e.error_code()),
            CoreError::Transport(e) => e.error_code(),
            CoreError::Session(e) => e.error_code(),
            _ => None,
        }
    }

    /// True when the caller has to send the user back to the login screen.
    pub fn requires_login(&self) -> bool {
        matches!(self, CoreError::Session(e) if e.is_terminal())
    }
}
