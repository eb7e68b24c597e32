//! Error types for graphorm

use thiserror::Error;

/// Result type alias for graphorm operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for finder and association operations
#[derive(Debug, Error)]
pub enum OrmError {
    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Association metadata could not be resolved for a model
    #[error("Association error: {0}")]
    Discovery(String),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),

    /// Query timeout error
    #[error("Query timeout after {0:?}")]
    Timeout(std::time::Duration),

    /// An error annotated with the operation that produced it
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<OrmError>,
    },

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl OrmError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a discovery error
    pub fn discovery(message: impl Into<String>) -> Self {
        Self::Discovery(message.into())
    }

    /// Wrap this error with the name of the operation that failed.
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, looking through [`OrmError::Context`] wrappers.
    pub fn root(&self) -> &OrmError {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), Self::NotFound(_))
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self.root(), Self::Timeout(_))
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for OrmError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_keeps_classification() {
        let err = OrmError::not_found("no rows").context("unable to fetch records");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "unable to fetch records: Not found: no rows");
    }

    #[test]
    fn root_of_plain_error_is_itself() {
        let err = OrmError::discovery("no association named 'books'");
        assert!(matches!(err.root(), OrmError::Discovery(_)));
        assert!(!err.is_timeout());
    }

    #[test]
    fn timeout_is_classified_through_context() {
        let err = OrmError::Timeout(std::time::Duration::from_millis(5)).context("unable to fetch records");
        assert!(err.is_timeout());
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "unable to fetch records: Query timeout after 5ms");
    }
}
