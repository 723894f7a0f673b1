pub mod cart;
pub mod config;
pub mod error;
pub mod error_catalog;
pub mod logger;
pub mod session;
pub mod storage;
pub mod storefront;
pub mod tokens;
pub mod transport;
pub mod updater;

pub use error::CoreError;
pub use storefront::Storefront;

#[cfg(test)]
mod tests;

pub const STOREFRONT_API_HOSTNAME: &str = "127.0.0.1";
pub const STOREFRONT_API_PORT: u16 = 8080;
pub const DEFAULT_API_BASE_URL: &str = const_format::concatcp!(
    "http://",
    STOREFRONT_API_HOSTNAME,
    ":",
    STOREFRONT_API_PORT,
    "/api/"
);
