use std::time::Duration;

/// Default number of SQL bytes kept when logging a statement.
pub const DEFAULT_MAX_SQL_LENGTH: usize = 200;

/// Execution settings shared by every query issued through a
/// [`Connection`](crate::Connection).
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Query timeout duration. `None` means no timeout (default).
    pub query_timeout: Option<Duration>,
    /// Statements slower than this are logged at `WARN`.
    pub slow_query_threshold: Option<Duration>,
    /// Truncate logged SQL (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            query_timeout: None,
            slow_query_threshold: None,
            max_sql_length: Some(DEFAULT_MAX_SQL_LENGTH),
        }
    }
}

impl ConnectionConfig {
    /// Create a new configuration with defaults (no timeout, 200 byte SQL logs).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the query timeout duration.
    ///
    /// Store calls exceeding this duration are abandoned and return
    /// [`OrmError::Timeout`](crate::OrmError::Timeout).
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }

    /// Set the slow query threshold.
    pub fn with_slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.slow_query_threshold = Some(threshold);
        self
    }

    /// Set maximum SQL length to log.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation in logs.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }
}
