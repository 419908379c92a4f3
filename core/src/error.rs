//! Error types for the bin client.
//!
//! # Design
//! The service reports failures inside otherwise well-formed JSON bodies
//! (`{"error": "..."}`), often with a 200 status. Those become
//! `BinError::Service` with the service's message. Anything that stops a
//! request from producing a usable JSON body is a `TransportError`. A
//! connection-level failure keeps the HTTP library's error as its source.

use thiserror::Error;

/// Errors returned by `BinApi` parse methods and `BinClient` operations.
#[derive(Debug, Error)]
pub enum BinError {
    /// The response carried a truthy `error` field.
    #[error("service error: {0}")]
    Service(String),

    /// The request could not be completed or the response was unusable.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A bin id that cannot be placed in a URL path segment.
    #[error("invalid bin id: {0:?}")]
    InvalidBinId(String),
}

impl BinError {
    /// The service's own message, if this is a service error.
    pub fn service_message(&self) -> Option<&str> {
        match self {
            BinError::Service(message) => Some(message),
            _ => None,
        }
    }
}

/// Failures below the service's own error reporting.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection-level failure reported by the HTTP library. The cause is
    /// kept as the error's `source`.
    #[error("request failed: {0}")]
    Request(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Non-success status whose body carried no service error.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The body was not JSON, or not the JSON shape the operation expects.
    #[error("could not decode response (HTTP {status}): {message}")]
    Decode { status: u16, message: String },

    /// The request payload could not be serialized.
    #[error("could not encode request: {0}")]
    Encode(String),
}
