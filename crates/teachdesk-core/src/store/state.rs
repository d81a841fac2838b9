use tokio::sync::watch;

use crate::models::{Position, Teacher};

/// Observable state of the store.
///
/// Subscribers receive a fresh snapshot every time an operation commits.
#[derive(Debug, Clone, Default)]
pub struct StoreState {
    pub teachers: Vec<Teacher>,
    pub positions: Vec<Position>,
    /// True while at least one operation is in flight.
    pub loading: bool,
    /// Message from the most recent failure, cleared by the next successful
    /// fetch.
    pub error: Option<String>,
    in_flight: usize,
}

impl StoreState {
    pub(crate) fn with_teachers(teachers: Vec<Teacher>) -> Self {
        Self {
            teachers,
            ..Self::default()
        }
    }
}

/// Marks an operation as in flight for as long as it is alive.
///
/// Operations may interleave, so `loading` only drops back to false when
/// the last guard is released.
pub(crate) struct LoadingGuard<'a> {
    state: &'a watch::Sender<StoreState>,
}

impl<'a> LoadingGuard<'a> {
    pub(crate) fn new(state: &'a watch::Sender<StoreState>) -> Self {
        state.send_modify(|s| {
            s.in_flight += 1;
            s.loading = true;
        });
        Self { state }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|s| {
            s.in_flight = s.in_flight.saturating_sub(1);
            s.loading = s.in_flight > 0;
        });
    }
}
