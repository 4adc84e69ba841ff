//! HTTP client for the hosted backend.
//!
//! One [`ApiClient`] implements every outbound seam the core crates define:
//! the pricing RPC, the offline queue's action executor, the sync worker's
//! connectivity probe, and the dispatcher's report submitter.

use async_trait::async_trait;
use serde::Serialize;

use binflow_pricing::{PricingRpc, PricingZone, RpcError, ZoneQuery};
use binflow_sync::{Action, ActionExecutor, ConnectivityProbe, SyncError};
use binflow_worker::{DispatchError, ReportSubmitter, StoredReport};

use crate::config::ClientConfig;

const HEALTH_PATH: &str = "/health";
const REPORTS_PATH: &str = "/rest/v1/dumping_reports";
const PICKUPS_PATH: &str = "/rest/v1/pickups";
const REDEEM_RPC_PATH: &str = "/rest/v1/rpc/redeem_points";
const NEAREST_ZONE_RPC_PATH: &str = "/rest/v1/rpc/find_nearest_pricing_zone";

/// REST/RPC client for the backend gateway.
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_url, path)
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let mut builder = builder.timeout(self.config.request_timeout);
        if let Some(key) = &self.config.anon_key {
            builder = builder.header("apikey", key);
        }
        if let Some(token) = &self.config.access_token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    /// Check connectivity by hitting the health endpoint.
    pub async fn check_connectivity(&self) -> bool {
        let req = self.request(self.http.get(self.url(HEALTH_PATH)));
        match req.send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    pub async fn submit_report(&self, payload: &impl Serialize) -> Result<(), SyncError> {
        self.post_json(REPORTS_PATH, payload).await
    }

    pub async fn schedule_pickup(&self, payload: &impl Serialize) -> Result<(), SyncError> {
        self.post_json(PICKUPS_PATH, payload).await
    }

    pub async fn redeem_reward(&self, payload: &impl Serialize) -> Result<(), SyncError> {
        self.post_json(REDEEM_RPC_PATH, payload).await
    }

    async fn post_json(&self, path: &str, payload: &impl Serialize) -> Result<(), SyncError> {
        let req = self.request(self.http.post(self.url(path)).json(payload));

        let resp = req
            .send()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;

        if resp.status().is_success() {
            Ok(())
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            Err(SyncError::Api(status, body))
        }
    }
}

#[async_trait]
impl ActionExecutor for ApiClient {
    async fn execute(&self, action: &Action) -> Result<(), SyncError> {
        match action {
            Action::SubmitReport { report } => self.submit_report(report).await,
            Action::SchedulePickup { pickup } => self.schedule_pickup(pickup).await,
            Action::RedeemReward { redemption } => self.redeem_reward(redemption).await,
        }
    }
}

#[async_trait]
impl ConnectivityProbe for ApiClient {
    async fn check(&self) -> bool {
        self.check_connectivity().await
    }
}

#[async_trait]
impl PricingRpc for ApiClient {
    async fn find_nearest_zone(&self, query: &ZoneQuery) -> Result<Vec<PricingZone>, RpcError> {
        let req = self.request(self.http.post(self.url(NEAREST_ZONE_RPC_PATH)).json(query));

        let resp = req
            .send()
            .await
            .map_err(|e| RpcError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(RpcError::Api(status, body));
        }

        resp.json::<Vec<PricingZone>>()
            .await
            .map_err(|e| RpcError::Parse(e.to_string()))
    }
}

#[async_trait]
impl ReportSubmitter for ApiClient {
    async fn submit(&self, report: &StoredReport) -> Result<(), DispatchError> {
        self.submit_report(&report.payload)
            .await
            .map_err(|e| DispatchError::Submit(e.to_string()))
    }
}
