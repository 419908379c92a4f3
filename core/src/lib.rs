//! Client library for the JS Bin HTTP API.
//!
//! # Overview
//! Lists, reads, creates, updates, saves and removes bins on a pastebin-style
//! REST endpoint (`https://jsbin.com/api/` by default).
//!
//! # Design
//! - `BinApi` is sans-IO: `build_*` produces an `HttpRequest`, `parse_*`
//!   consumes an `HttpResponse`. Header rules, URL construction, embedded
//!   error detection and list shaping all live there.
//! - `BinClient` pairs a `BinApi` with a `Transport` (reqwest by default) and
//!   exposes one async method per operation, each issuing exactly one request.
//! - `ClientConfig` is immutable once a client is built, so a client can be
//!   shared across concurrent calls without coordination.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;

pub use api::BinApi;
pub use client::BinClient;
pub use config::{ClientConfig, DEFAULT_ENDPOINT};
pub use error::{BinError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{ReqwestTransport, Transport};
pub use types::{BinContent, BinRecord, BinSettings, BinSnapshot, RemoveResult, SaveRequest, SaveResult};
