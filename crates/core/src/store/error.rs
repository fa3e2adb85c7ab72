//! Data-store error types.

use thiserror::Error;

/// Errors raised by a data-store collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The request never produced a response.
    #[error("request to {table} failed: {message}")]
    Transport {
        /// Table being queried.
        table: String,
        /// Underlying error.
        message: String,
    },

    /// The store answered with an error status.
    #[error("{table} query rejected with status {status}: {message}")]
    Rejected {
        /// Table being queried.
        table: String,
        /// HTTP-style status code.
        status: u16,
        /// Response body or reason.
        message: String,
    },

    /// The response could not be decoded into rows.
    #[error("could not decode {table} rows: {message}")]
    Decode {
        /// Table being queried.
        table: String,
        /// Decoder error.
        message: String,
    },

    /// The table does not exist in this store.
    #[error("unknown table: {0}")]
    UnknownTable(String),
}

impl StoreError {
    /// Create a transport error.
    #[must_use]
    pub fn transport(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create a rejected error.
    #[must_use]
    pub fn rejected(table: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            table: table.into(),
            status,
            message: message.into(),
        }
    }

    /// Create a decode error.
    #[must_use]
    pub fn decode(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            table: table.into(),
            message: message.into(),
        }
    }
}
