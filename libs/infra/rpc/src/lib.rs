//! Binary, schema-versioned RPC contract between `logflux-gateway` and the
//! external Auth collaborator (out of scope: account/project/API-key
//! CRUD). Messages are MessagePack-encoded with named fields, matching
//! the encoding the rest of the workspace uses for the notification bus
//! and the queue, so a single mental model (and decode failure mode)
//! covers all three.
//!
//! Field numbering stability across implementations is expressed here as
//! "never remove or repurpose a struct field without bumping
//! `SCHEMA_VERSION`" — MessagePack's named-field encoding means adding an
//! optional field is backward compatible by construction.

use std::time::Duration;

use async_trait::async_trait;
use logflux_models::CredentialRecord;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{instrument, warn};

/// Bumped whenever a request/response struct's field set changes in a way
/// that isn't purely additive.
pub const SCHEMA_VERSION: u16 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialLookupRequest {
    pub schema_version: u16,
    pub credential_hash: String,
}

impl CredentialLookupRequest {
    pub fn new(credential_hash: impl Into<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            credential_hash: credential_hash.into(),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, RpcError> {
        rmp_serde::to_vec_named(self).map_err(|e| RpcError::Encode(e.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "data")]
pub enum CredentialLookupOutcome {
    Found(CredentialRecord),
    NotFound,
    Revoked,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialLookupResponse {
    pub schema_version: u16,
    pub outcome: CredentialLookupOutcome,
}

impl CredentialLookupResponse {
    pub fn decode(bytes: &[u8]) -> Result<Self, RpcError> {
        let response: Self = rmp_serde::from_slice(bytes).map_err(|e| RpcError::Decode(e.to_string()))?;
        if response.schema_version > SCHEMA_VERSION {
            warn!(
                received = response.schema_version,
                supported = SCHEMA_VERSION,
                "Auth collaborator responded with a newer RPC schema version than this build understands"
            );
        }
        Ok(response)
    }
}

#[derive(Error, Debug, Clone)]
pub enum RpcError {
    #[error("failed to encode RPC payload: {0}")]
    Encode(String),
    #[error("failed to decode RPC payload: {0}")]
    Decode(String),
    #[error("transient failure reaching the Auth collaborator: {0}")]
    Transient(String),
    #[error("credential not found")]
    NotFound,
    #[error("credential revoked")]
    Revoked,
}

/// Narrow seam onto the external Auth collaborator: everything this
/// workspace needs from account/API-key management, expressed as one
/// async method so C1 can be unit-tested against a fake.
#[async_trait]
pub trait AuthCollaborator: Send + Sync {
    async fn lookup_credential(&self, credential_hash: &str) -> Result<CredentialRecord, RpcError>;
}

/// Production implementation: POSTs the MessagePack-encoded request to a
/// configured Auth endpoint and decodes the MessagePack response body.
pub struct HttpAuthCollaborator {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAuthCollaborator {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .expect("reqwest client construction should never fail with these options");
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl AuthCollaborator for HttpAuthCollaborator {
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn lookup_credential(&self, credential_hash: &str) -> Result<CredentialRecord, RpcError> {
        let request = CredentialLookupRequest::new(credential_hash);
        let body = request.encode()?;

        let response = self
            .client
            .post(&self.endpoint)
            .header("content-type", "application/msgpack")
            .body(body)
            .send()
            .await
            .map_err(|e| RpcError::Transient(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RpcError::Transient(format!(
                "Auth collaborator returned HTTP {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RpcError::Transient(e.to_string()))?;
        let decoded = CredentialLookupResponse::decode(&bytes)?;

        match decoded.outcome {
            CredentialLookupOutcome::Found(record) => Ok(record),
            CredentialLookupOutcome::NotFound => Err(RpcError::NotFound),
            CredentialLookupOutcome::Revoked => Err(RpcError::Revoked),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn request_round_trips_through_messagepack() {
        let request = CredentialLookupRequest::new("abc123");
        let bytes = request.encode().unwrap();
        let decoded: CredentialLookupRequest = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(decoded.credential_hash, "abc123");
        assert_eq!(decoded.schema_version, SCHEMA_VERSION);
    }

    #[test]
    fn response_round_trips_for_each_outcome() {
        let found = CredentialLookupResponse {
            schema_version: SCHEMA_VERSION,
            outcome: CredentialLookupOutcome::Found(CredentialRecord {
                project_id: "proj_1".to_string(),
                account_id: Some("acct_1".to_string()),
                daily_quota: 100_000,
                retention_days: 30,
                rate_limit_per_minute: Some(60),
                rate_limit_per_hour: Some(1000),
                issued_at: Utc::now(),
            }),
        };
        let bytes = rmp_serde::to_vec_named(&found).unwrap();
        let decoded = CredentialLookupResponse::decode(&bytes).unwrap();
        match decoded.outcome {
            CredentialLookupOutcome::Found(record) => assert_eq!(record.project_id, "proj_1"),
            _ => panic!("expected Found"),
        }
    }
}
