//! Error types for the poster engine

use thiserror::Error;

/// Result type alias for poster operations
pub type Result<T> = std::result::Result<T, Error>;

/// Which sliding-window quota rejected a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaScope {
    /// The per-caller window
    Local,
    /// The cluster-wide window behind the atomic store
    Global,
}

impl std::fmt::Display for QuotaScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuotaScope::Local => write!(f, "per-user"),
            QuotaScope::Global => write!(f, "global"),
        }
    }
}

/// Errors that can occur while generating a poster
#[derive(Error, Debug)]
pub enum Error {
    /// No events remained after filtering for the requested subject
    #[error("No events in the selected interval")]
    NoEventsInRange,

    /// A download quota was exhausted
    #[error("The {scope} limit of {limit} downloads per hour has been reached")]
    RateLimited { scope: QuotaScope, limit: u32 },

    /// Failed to build the layout or draw the poster
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// The raster backend refused to encode the finished bitmap
    #[error("Image encoding failed: {0}")]
    EncodingError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// A quota store transaction could not be carried out
    #[error("Store error: {0}")]
    StoreError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_message_names_the_scope() {
        let err = Error::RateLimited {
            scope: QuotaScope::Global,
            limit: 40,
        };
        let msg = err.to_string();
        assert!(msg.contains("global"));
        assert!(msg.contains("40"));
    }
}
