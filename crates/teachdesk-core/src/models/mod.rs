//! Data models for the teacher roster.
//!
//! - `RecordId`: canonical identifier, parsed from either wire form
//! - `Teacher`, `Person`, `Degree`, `PositionSummary`: staff records
//! - `Position`: reference list of job positions
//! - Draft and patch types used by create/update operations

pub mod date;
pub mod id;
pub mod position;
pub mod teacher;

pub use id::RecordId;
pub use position::{Position, PositionDraft, PositionPatch};
pub use teacher::{
    Degree, DegreeDraft, Person, PersonDraft, PositionSummary, Teacher, TeacherDraft,
    TeacherPatch, TEACHER_ROLE,
};
