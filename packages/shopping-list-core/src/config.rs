//! Service configuration.

/// Shopping list service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Store location (`memory`, `file://<path>` or a bare path)
    pub database_url: String,
    /// Request body read timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Maximum retry attempts for transient I/O errors
    pub persistence_max_retries: u32,
    /// Delay between retry attempts in milliseconds
    pub persistence_retry_delay_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            database_url: "memory://".to_string(),
            request_timeout_ms: 5000,        // 5 seconds default
            persistence_max_retries: 3,      // Default retry attempts
            persistence_retry_delay_ms: 100, // 100ms delay between retries
        }
    }
}
