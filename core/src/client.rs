//! Async client that executes `BinApi` requests over a `Transport`.
//!
//! Each operation builds one request, sends it, and parses the response.
//! Nothing is cached and nothing is retried; concurrent calls on one client
//! are independent.

use tracing::{debug, instrument};

use crate::api::BinApi;
use crate::config::ClientConfig;
use crate::error::BinError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{BinContent, BinRecord, RemoveResult, SaveRequest, SaveResult};

/// High-level client for the bin service.
#[derive(Debug, Clone)]
pub struct BinClient<T = ReqwestTransport> {
    api: BinApi,
    transport: T,
}

impl BinClient<ReqwestTransport> {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, ReqwestTransport::new())
    }
}

impl Default for BinClient<ReqwestTransport> {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

impl<T: Transport + Sync> BinClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            api: BinApi::new(config),
            transport,
        }
    }

    /// The underlying request builder, for callers doing their own IO.
    pub fn api(&self) -> &BinApi {
        &self.api
    }

    /// Every live bin, newest snapshot first, with older snapshots in `history`.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<BinRecord>, BinError> {
        let response = self.dispatch(self.api.build_list()).await?;
        self.api.parse_list(response)
    }

    /// Content of the latest snapshot, or of `snapshot` when given.
    #[instrument(skip(self))]
    pub async fn read(&self, bin_id: &str, snapshot: Option<u32>) -> Result<BinContent, BinError> {
        let request = self.api.build_read(bin_id, snapshot)?;
        let response = self.dispatch(request).await?;
        self.api.parse_read(response)
    }

    /// Create a new bin. `data.url` is ignored.
    #[instrument(skip_all)]
    pub async fn create(&self, data: &SaveRequest) -> Result<SaveResult, BinError> {
        let request = self.api.build_create(data)?;
        self.send_save(request).await
    }

    /// New snapshot of `data.url` if set, else a new bin.
    #[instrument(skip_all, fields(bin_id = data.url.as_deref().unwrap_or_default()))]
    pub async fn save(&self, data: &SaveRequest) -> Result<SaveResult, BinError> {
        let request = self.api.build_save(data)?;
        self.send_save(request).await
    }

    /// New snapshot of `bin_id`, whatever `data.url` says.
    #[instrument(skip(self, data))]
    pub async fn update(&self, bin_id: &str, data: &SaveRequest) -> Result<SaveResult, BinError> {
        let request = self.api.build_update(bin_id, data)?;
        self.send_save(request).await
    }

    /// Remove a whole bin, or one snapshot of it.
    #[instrument(skip(self))]
    pub async fn remove(&self, bin_id: &str, snapshot: Option<u32>) -> Result<RemoveResult, BinError> {
        let request = self.api.build_remove(bin_id, snapshot)?;
        let response = self.dispatch(request).await?;
        self.api.parse_remove(response)
    }

    async fn send_save(&self, request: HttpRequest) -> Result<SaveResult, BinError> {
        let response = self.dispatch(request).await?;
        self.api.parse_save(response)
    }

    async fn dispatch(&self, request: HttpRequest) -> Result<HttpResponse, BinError> {
        debug!(method = %request.method, url = %request.url, "sending request");
        let response = self.transport.send(request).await?;
        debug!(status = response.status, "received response");
        Ok(response)
    }
}
