use std::collections::HashSet;

use crate::models::{RecordId, Teacher};

/// Combine the server's teacher list with the cached snapshot.
///
/// The remote list is kept as given and wins on identifier collision;
/// cached entries the server does not know about are appended in cache
/// order, each cached identifier at most once.
pub fn merge_teachers(remote: Vec<Teacher>, cached: Vec<Teacher>) -> Vec<Teacher> {
    let mut seen: HashSet<RecordId> = remote.iter().map(|t| t.id.clone()).collect();
    let mut merged = remote;
    merged.reserve(cached.len());

    for teacher in cached {
        if seen.insert(teacher.id.clone()) {
            merged.push(teacher);
        }
    }
    merged
}
