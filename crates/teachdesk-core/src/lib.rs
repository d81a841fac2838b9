//! Core library for teachdesk.
//!
//! This crate holds the front-end-agnostic logic for the teacher roster:
//! - `api`: the remote gateway trait and its HTTP client
//! - `cache`: durable key-value storage and the cached teacher snapshot
//! - `models`: teachers, positions and their draft/patch types
//! - `store`: the reconciling store front ends observe
//! - `config`: file and environment configuration
//! - `utils`: display formatting helpers

pub mod api;
pub mod cache;
pub mod config;
pub mod models;
pub mod store;
pub mod utils;

pub use api::{ApiClient, ApiError, Gateway};
pub use cache::{CacheError, FileStore, KeyValueStore, MemoryStore, TeacherCache};
pub use config::Config;
pub use models::{
    Position, PositionDraft, PositionPatch, RecordId, Teacher, TeacherDraft, TeacherPatch,
};
pub use store::{merge_teachers, Store, StoreError, StoreState};
