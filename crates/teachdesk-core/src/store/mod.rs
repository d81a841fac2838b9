//! Reconciling store: the single source of truth the front end observes.
//!
//! The store owns the in-memory teacher and position collections, merges
//! remote results with the cached snapshot, and writes every change to the
//! teacher list through to the cache.
//!
//! Read operations (`fetch_teachers`, `fetch_positions`) never fail; they
//! degrade to cached or empty data and record the failure in
//! `StoreState::error`. Write operations record the failure and also return
//! it.
//!
//! All operations take `&self` and may be called concurrently. Each commit
//! is atomic with respect to the cache write-through; overlapping fetches
//! resolve last-write-wins.

mod error;
mod merge;
mod state;


use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::{ApiError, Gateway};
use crate::cache::{KeyValueStore, TeacherCache};
use crate::models::{
    Position, PositionDraft, PositionPatch, PositionSummary, RecordId, Teacher, TeacherDraft,
    TeacherPatch,
};

pub use error::StoreError;
pub use merge::merge_teachers;
pub use state::StoreState;

use state::LoadingGuard;

pub struct Store<G, C> {
    gateway: G,
    cache: TeacherCache<C>,
    state: watch::Sender<StoreState>,
}

impl<G: Gateway, C: KeyValueStore> Store<G, C> {
    /// Create the store, seeding the teacher list from the cached snapshot.
    pub fn new(gateway: G, store: C) -> Self {
        let cache = TeacherCache::new(store);
        let teachers = cache.read().unwrap_or_default();
        debug!(count = teachers.len(), "Store seeded from cache");
        let (state, _) = watch::channel(StoreState::with_teachers(teachers));
        Self {
            gateway,
            cache,
            state,
        }
    }

    // ===== Observation =====

    /// Snapshot of the current state.
    pub fn state(&self) -> StoreState {
        self.state.borrow().clone()
    }

    /// Receiver notified each time a new state is committed.
    pub fn subscribe(&self) -> watch::Receiver<StoreState> {
        self.state.subscribe()
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn cache(&self) -> &TeacherCache<C> {
        &self.cache
    }

    // ===== Local state =====

    fn begin_loading(&self) -> LoadingGuard<'_> {
        LoadingGuard::new(&self.state)
    }

    fn set_error(&self, error: Option<String>) {
        self.state.send_modify(|s| s.error = error);
    }

    /// Apply `f` to the teacher list and write the result through to the
    /// cache in the same commit.
    fn update_teachers(&self, f: impl FnOnce(&mut Vec<Teacher>)) {
        self.state.send_modify(|s| {
            f(&mut s.teachers);
            self.cache.write(&s.teachers);
        });
    }

    /// Replace the teacher list (write-through).
    pub fn set_teachers(&self, teachers: Vec<Teacher>) {
        self.update_teachers(|list| *list = teachers);
    }

    pub fn set_positions(&self, positions: Vec<Position>) {
        self.state.send_modify(|s| s.positions = positions);
    }

    /// Append a teacher (write-through).
    pub fn add_teacher_to_list(&self, teacher: Teacher) {
        self.update_teachers(|list| list.push(teacher));
    }

    /// Drop every teacher with identifier `id` (write-through). Returns how
    /// many entries were removed.
    pub fn remove_teacher_from_list(&self, id: &str) -> usize {
        let mut removed = 0;
        self.update_teachers(|list| {
            let before = list.len();
            list.retain(|t| t.id != id);
            removed = before - list.len();
        });
        removed
    }

    fn email_exists(&self, email: &str) -> bool {
        let email = email.trim();
        !email.is_empty()
            && self
                .state
                .borrow()
                .teachers
                .iter()
                .any(|t| t.person.email.trim().eq_ignore_ascii_case(email))
    }

    /// Build display summaries for `ids` from the loaded positions.
    fn resolve_positions(&self, ids: &[RecordId]) -> Vec<PositionSummary> {
        let state = self.state.borrow();
        ids.iter()
            .map(|id| match state.positions.iter().find(|p| &p.id == id) {
                Some(position) => PositionSummary::from(position),
                None => {
                    warn!(position_id = %id, "Unknown position referenced by draft");
                    PositionSummary::unresolved(id.clone())
                }
            })
            .collect()
    }

    // ===== Reads =====

    /// Refresh teachers from the server, merged with the cached snapshot.
    ///
    /// Falls back to the cached snapshot when the server is unreachable.
    pub async fn fetch_teachers(&self) {
        let _loading = self.begin_loading();

        match self.gateway.fetch_teachers().await {
            Ok(remote) => {
                let cached = self.cache.read().unwrap_or_default();
                let remote_count = remote.len();
                let merged = merge_teachers(remote, cached);
                debug!(remote = remote_count, merged = merged.len(), "Merged teachers");
                self.state.send_modify(|s| {
                    s.teachers = merged;
                    s.error = None;
                    self.cache.write(&s.teachers);
                });
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch teachers, using cached data");
                let cached = self.cache.read().unwrap_or_default();
                self.state.send_modify(|s| {
                    s.teachers = cached;
                    s.error = Some(e.to_string());
                });
            }
        }
    }

    /// Refresh the position list. Positions are not cached, so a failure
    /// leaves the current list in place.
    pub async fn fetch_positions(&self) {
        let _loading = self.begin_loading();

        match self.gateway.fetch_positions().await {
            Ok(positions) => {
                debug!(count = positions.len(), "Loaded positions");
                self.state.send_modify(|s| {
                    s.positions = positions;
                    s.error = None;
                });
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch positions");
                self.set_error(Some(e.to_string()));
            }
        }
    }

    // ===== Writes =====

    /// Create a teacher.
    ///
    /// The record is added locally (and cached) under a generated
    /// identifier before the server is contacted, then the list is
    /// reconciled whatever the outcome. If the server leg fails the local
    /// record stays and the error is returned.
    pub async fn add_teacher(&self, draft: TeacherDraft) -> Result<Teacher, StoreError> {
        draft.validate().map_err(StoreError::InvalidDraft)?;
        if self.email_exists(&draft.person.email) {
            return Err(StoreError::DuplicateEmail(draft.person.email.trim().to_string()));
        }

        let _loading = self.begin_loading();

        let local_id = RecordId::generate_local();
        let summaries = self.resolve_positions(&draft.position_ids);
        let local = Teacher::from_draft(local_id.clone(), &draft, summaries);
        self.add_teacher_to_list(local.clone());
        info!(teacher_id = %local_id, code = %local.code, "Added teacher locally");

        let result = self.gateway.add_teacher(&draft).await;
        match &result {
            Ok(created) => {
                let created = fill_from_local(created.clone(), &local);
                self.update_teachers(|list| {
                    if let Some(slot) = list.iter_mut().find(|t| t.id == local_id) {
                        *slot = created;
                    }
                });
            }
            Err(ApiError::DuplicateEmail(_)) => {
                // The server will never accept this record.
                self.remove_teacher_from_list(local_id.as_str());
            }
            Err(_) => {}
        }

        self.fetch_teachers().await;

        match result {
            Ok(created) => {
                info!(teacher_id = %created.id, "Teacher saved on server");
                Ok(created)
            }
            Err(e) => {
                warn!(teacher_id = %local_id, error = %e, "Failed to save teacher on server");
                self.set_error(Some(format!("Failed to add teacher: {}", e)));
                Err(e.into())
            }
        }
    }

    /// Create a position and reload the position list.
    ///
    /// The code is trimmed and uppercased, and must not already be in use.
    /// Positions are loaded first if none are known yet.
    pub async fn add_position(&self, draft: PositionDraft) -> Result<Position, StoreError> {
        let draft = draft.normalized();
        draft.validate().map_err(StoreError::InvalidDraft)?;

        let loaded = !self.state.borrow().positions.is_empty();
        if !loaded {
            self.fetch_positions().await;
        }
        if self.state.borrow().positions.iter().any(|p| p.has_code(&draft.code)) {
            return Err(StoreError::DuplicatePositionCode(draft.code));
        }

        let _loading = self.begin_loading();

        match self.gateway.add_position(&draft).await {
            Ok(created) => {
                info!(position_id = %created.id, code = %created.code, "Added position");
                self.fetch_positions().await;
                Ok(created)
            }
            Err(e) => {
                warn!(code = %draft.code, error = %e, "Failed to add position");
                self.set_error(Some(format!("Failed to add position: {}", e)));
                Err(e.into())
            }
        }
    }

    /// Apply `patch` to teacher `id`. `Ok(None)` when the server does not
    /// know the teacher.
    pub async fn update_teacher(
        &self,
        id: &RecordId,
        patch: TeacherPatch,
    ) -> Result<Option<Teacher>, StoreError> {
        let _loading = self.begin_loading();

        match self.gateway.update_teacher(id, &patch).await {
            Ok(Some(updated)) => {
                let mut found = false;
                self.update_teachers(|list| {
                    if let Some(slot) = list.iter_mut().find(|t| &t.id == id) {
                        *slot = updated.clone();
                        found = true;
                    }
                });
                if !found {
                    self.fetch_teachers().await;
                }
                Ok(Some(updated))
            }
            Ok(None) => {
                debug!(teacher_id = %id, "Update skipped, teacher unknown to server");
                Ok(None)
            }
            Err(e) => {
                warn!(teacher_id = %id, error = %e, "Failed to update teacher");
                self.set_error(Some(format!("Failed to update teacher: {}", e)));
                Err(e.into())
            }
        }
    }

    /// Apply `patch` to position `id`. `Ok(None)` when the server does not
    /// know the position.
    pub async fn update_position(
        &self,
        id: &RecordId,
        patch: PositionPatch,
    ) -> Result<Option<Position>, StoreError> {
        let _loading = self.begin_loading();

        match self.gateway.update_position(id, &patch).await {
            Ok(Some(updated)) => {
                let mut found = false;
                self.state.send_modify(|s| {
                    if let Some(slot) = s.positions.iter_mut().find(|p| &p.id == id) {
                        *slot = updated.clone();
                        found = true;
                    }
                });
                if !found {
                    self.fetch_positions().await;
                }
                Ok(Some(updated))
            }
            Ok(None) => {
                debug!(position_id = %id, "Update skipped, position unknown to server");
                Ok(None)
            }
            Err(e) => {
                warn!(position_id = %id, error = %e, "Failed to update position");
                self.set_error(Some(format!("Failed to update position: {}", e)));
                Err(e.into())
            }
        }
    }

    /// Delete teacher `id` on the server, then locally.
    ///
    /// The local copy is only dropped once the server has confirmed. A
    /// teacher the server never knew (created while offline) is dropped
    /// locally as well.
    pub async fn delete_teacher(&self, id: &RecordId) -> Result<(), StoreError> {
        let _loading = self.begin_loading();

        match self.gateway.delete_teacher(id).await {
            Ok(known) => {
                if !known {
                    debug!(teacher_id = %id, "Teacher unknown to server, removing local copy");
                }
                let removed = self.remove_teacher_from_list(id.as_str());
                info!(teacher_id = %id, removed = removed, "Deleted teacher");
                self.fetch_teachers().await;
                Ok(())
            }
            Err(e) => {
                warn!(teacher_id = %id, error = %e, "Failed to delete teacher");
                self.fetch_teachers().await;
                self.set_error(Some(format!("Failed to delete teacher: {}", e)));
                Err(e.into())
            }
        }
    }
}

/// Fill the parts a terse server response may leave out (unpopulated person,
/// unresolved positions) from the optimistic local record.
fn fill_from_local(mut created: Teacher, local: &Teacher) -> Teacher {
    if created.person.email.is_empty() && created.person.name.is_empty() {
        let server_person_id = created.person.id.take();
        created.person = local.person.clone();
        if server_person_id.is_some() {
            created.person.id = server_person_id;
        }
    }
    if created.positions.iter().all(|p| p.name.is_empty()) && !local.positions.is_empty() {
        created.positions = local.positions.clone();
    }
    if created.degrees.is_empty() {
        created.degrees = local.degrees.clone();
    }
    created
}
