//! Configuration model loaded from external sources.

use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
/// Basic configuration shared across handlers.
pub struct ServerConfig {
    pub address: String,
    pub port: u16,
    pub database_url: String,
    /// Root directory for the filesystem-backed document store.
    pub storage_dir: String,
    /// Public base URL under which stored documents are served.
    pub storage_public_url: String,
    /// Base URL of the hosted payment page; reference and amount are
    /// appended as query parameters.
    pub payment_page_url: String,
}
