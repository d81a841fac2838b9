//! HTTP client for the roster backend.
//!
//! This module provides the `ApiClient` struct, the reqwest-backed
//! `Gateway` implementation. All responses are unwrapped from the
//! `{ "data": ... }` envelope and translated to the canonical models.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::models::{
    Position, PositionDraft, PositionPatch, RecordId, Teacher, TeacherDraft, TeacherPatch,
};

use super::wire::{Envelope, NewPositionPayload, NewTeacherPayload, PositionRecord, TeacherRecord};
use super::{ApiError, Gateway};

// ============================================================================
// Constants
// ============================================================================

/// Base URL used when nothing is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// HTTP request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

const TEACHERS_PATH: &str = "/teachers";
const POSITIONS_PATH: &str = "/teacher-positions";

/// Roster API client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    initial_backoff: Duration,
}

impl ApiClient {
    /// Create a new API client for `base_url` (e.g. `http://localhost:5000/api`).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::RemoteUnavailable(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        })
    }

    /// Override the first rate-limit backoff delay (doubled on each retry).
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(response: Response) -> Result<Option<Response>, ApiError> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Send the request produced by `build`, retrying with exponential
    /// backoff while the server answers 429.
    async fn send<F>(&self, url: &str, build: F) -> Result<Response, ApiError>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let mut retries = 0;
        let mut backoff = self.initial_backoff;

        loop {
            let response = build()
                .header(header::ACCEPT, "application/json")
                .send()
                .await
                .map_err(|e| ApiError::RemoteUnavailable(format!("{}: {}", url, e)))?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => return Ok(response),
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited);
                    }
                    warn!(url = url, retry = retries, backoff_ms = backoff.as_millis() as u64, "Rate limited, backing off");
                    tokio::time::sleep(backoff).await;
                    backoff *= 2; // Exponential backoff
                }
            }
        }
    }

    async fn read_data<T: DeserializeOwned>(response: Response, url: &str) -> Result<Option<T>, ApiError> {
        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", url, e)))?;
        Ok(envelope.data)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ApiError> {
        let url = self.url(path);
        let response = self.send(&url, || self.client.get(&url)).await?;
        Self::read_data(response, &url).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let url = self.url(path);
        let response = self.send(&url, || self.client.post(&url).json(body)).await?;
        Self::read_data(response, &url)
            .await?
            .ok_or_else(|| ApiError::InvalidResponse(format!("{}: response has no data", url)))
    }

    /// PATCH `path`, mapping 404 to `Ok(None)`.
    async fn patch<T: DeserializeOwned, B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<Option<T>, ApiError> {
        let url = self.url(path);
        match self.send(&url, || self.client.patch(&url).json(body)).await {
            Ok(response) => Self::read_data(response, &url).await,
            Err(ApiError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Convert raw teacher records, fetching the position catalog once if
    /// any record only references its positions by identifier.
    async fn resolve_teachers(&self, records: Vec<TeacherRecord>) -> Vec<Teacher> {
        let catalog = if records.iter().any(TeacherRecord::has_unresolved_positions) {
            match self.fetch_positions().await {
                Ok(positions) => positions,
                Err(e) => {
                    warn!(error = %e, "Could not fetch positions to resolve teacher references");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        records
            .into_iter()
            .filter_map(|r| {
                let teacher = r.into_teacher(&catalog);
                if teacher.is_none() {
                    warn!("Skipping teacher record without an identifier");
                }
                teacher
            })
            .collect()
    }

    fn positions_from_records(records: Vec<PositionRecord>) -> Vec<Position> {
        records
            .into_iter()
            .filter_map(|r| {
                let position = r.into_position();
                if position.is_none() {
                    warn!("Skipping position record without an identifier");
                }
                position
            })
            .collect()
    }
}

#[async_trait]
impl Gateway for ApiClient {
    async fn fetch_teachers(&self) -> Result<Vec<Teacher>, ApiError> {
        let records: Vec<TeacherRecord> = self.get(TEACHERS_PATH).await?.unwrap_or_default();
        let teachers = self.resolve_teachers(records).await;
        debug!(count = teachers.len(), "Fetched teachers");
        Ok(teachers)
    }

    async fn fetch_positions(&self) -> Result<Vec<Position>, ApiError> {
        let records: Vec<PositionRecord> = self.get(POSITIONS_PATH).await?.unwrap_or_default();
        let positions = Self::positions_from_records(records);
        debug!(count = positions.len(), "Fetched positions");
        Ok(positions)
    }

    async fn add_teacher(&self, draft: &TeacherDraft) -> Result<Teacher, ApiError> {
        let payload = NewTeacherPayload::from(draft);
        let record: TeacherRecord = self.post(TEACHERS_PATH, &payload).await?;
        let created = self
            .resolve_teachers(vec![record])
            .await
            .pop()
            .ok_or_else(|| ApiError::InvalidResponse("created teacher was not returned".to_string()))?;
        debug!(teacher_id = %created.id, "Created teacher");
        Ok(created)
    }

    async fn add_position(&self, draft: &PositionDraft) -> Result<Position, ApiError> {
        let record: PositionRecord = self.post(POSITIONS_PATH, &NewPositionPayload::from(draft)).await?;
        let created = record
            .into_position()
            .ok_or_else(|| ApiError::InvalidResponse("created position has no identifier".to_string()))?;
        debug!(position_id = %created.id, code = %created.code, "Created position");
        Ok(created)
    }

    async fn update_teacher(
        &self,
        id: &RecordId,
        patch: &TeacherPatch,
    ) -> Result<Option<Teacher>, ApiError> {
        let path = format!("{}/{}", TEACHERS_PATH, id);
        let record: Option<TeacherRecord> = self.patch(&path, patch).await?;
        match record {
            Some(record) => self
                .resolve_teachers(vec![record])
                .await
                .pop()
                .map(Some)
                .ok_or_else(|| ApiError::InvalidResponse("updated teacher has no identifier".to_string())),
            None => {
                debug!(teacher_id = %id, "Teacher not found on server");
                Ok(None)
            }
        }
    }

    async fn update_position(
        &self,
        id: &RecordId,
        patch: &PositionPatch,
    ) -> Result<Option<Position>, ApiError> {
        let path = format!("{}/{}", POSITIONS_PATH, id);
        let record: Option<PositionRecord> = self.patch(&path, patch).await?;
        match record {
            Some(record) => record
                .into_position()
                .map(Some)
                .ok_or_else(|| ApiError::InvalidResponse("updated position has no identifier".to_string())),
            None => {
                debug!(position_id = %id, "Position not found on server");
                Ok(None)
            }
        }
    }

    async fn delete_teacher(&self, id: &RecordId) -> Result<bool, ApiError> {
        let url = self.url(&format!("{}/{}", TEACHERS_PATH, id));
        match self.send(&url, || self.client.delete(&url)).await {
            Ok(_) => {
                debug!(teacher_id = %id, "Deleted teacher");
                Ok(true)
            }
            Err(ApiError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
