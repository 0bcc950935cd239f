//! Error taxonomy shared by the ledger client, the tracker and the facade.

use std::fmt;

use thiserror::Error;

use crate::tx::events::EventKind;
use crate::tx::operation::Operation;

/// Message the ledger sends back while a transaction is still in the mempool.
pub const PENDING_MESSAGE: &str = "pending";

/// Failure classes reported by the ledger RPC layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    ApiError,
    WebRequestError,
    FailedParsingJson,
    MalformedResponse,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            ErrorKind::ApiError => "API_ERROR",
            ErrorKind::WebRequestError => "WEB_REQUEST_ERROR",
            ErrorKind::FailedParsingJson => "FAILED_PARSING_JSON",
            ErrorKind::MalformedResponse => "MALFORMED_RESPONSE",
        };
        f.write_str(tag)
    }
}

/// Error returned by every [`crate::ledger::Ledger`] call.
///
/// Displays as `"{kind} - {message}"`, which is also what the UI shows.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{kind} - {message}")]
pub struct LedgerError {
    pub kind: ErrorKind,
    pub message: String,
}

impl LedgerError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn api(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ApiError, message)
    }

    pub fn pending() -> Self {
        Self::api(PENDING_MESSAGE)
    }

    /// The transaction is known but not yet confirmed. Only an API error
    /// carrying exactly the pending message counts.
    pub fn is_pending(&self) -> bool {
        self.kind == ErrorKind::ApiError && self.message == PENDING_MESSAGE
    }
}

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    RemoteApi(#[from] LedgerError),

    #[error("malformed payload: {0}")]
    Decode(String),

    #[error("confirmed transaction carries no matching {kind} event")]
    OutcomeNotFound { kind: EventKind },

    #[error("operation '{}' is already being processed and cannot be canceled", .operation.description())]
    AlreadyFinalized { operation: Operation },

    #[error("no operation is being tracked")]
    NoActiveOperation,

    #[error("no account is logged in")]
    NotLoggedIn,
}

impl From<hex::FromHexError> for TrackerError {
    fn from(e: hex::FromHexError) -> Self {
        TrackerError::Decode(format!("invalid hex: {e}"))
    }
}

impl From<std::io::Error> for TrackerError {
    fn from(e: std::io::Error) -> Self {
        TrackerError::Decode(e.to_string())
    }
}
