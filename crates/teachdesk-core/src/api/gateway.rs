use async_trait::async_trait;

use crate::models::{
    Position, PositionDraft, PositionPatch, RecordId, Teacher, TeacherDraft, TeacherPatch,
};

use super::ApiError;

/// Remote source of truth for teachers and positions.
///
/// `ApiClient` is the HTTP implementation; the store only depends on this
/// trait so it can run against an in-memory fake.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// All teachers known to the server, with positions resolved into
    /// summaries.
    async fn fetch_teachers(&self) -> Result<Vec<Teacher>, ApiError>;

    async fn fetch_positions(&self) -> Result<Vec<Position>, ApiError>;

    /// Create a teacher and return the server-assigned record.
    async fn add_teacher(&self, draft: &TeacherDraft) -> Result<Teacher, ApiError>;

    async fn add_position(&self, draft: &PositionDraft) -> Result<Position, ApiError>;

    /// `Ok(None)` when the server does not know `id`.
    async fn update_teacher(
        &self,
        id: &RecordId,
        patch: &TeacherPatch,
    ) -> Result<Option<Teacher>, ApiError>;

    /// `Ok(None)` when the server does not know `id`.
    async fn update_position(
        &self,
        id: &RecordId,
        patch: &PositionPatch,
    ) -> Result<Option<Position>, ApiError>;

    /// Returns `false` when the server did not know `id`.
    async fn delete_teacher(&self, id: &RecordId) -> Result<bool, ApiError>;
}
