//! Teacher, person and degree models.
//!
//! These are the canonical in-memory shapes. They are also what the local
//! cache stores, so deserialization is lenient about legacy field names
//! (`_id`, `userId`) and identifier wrappers.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::date;
use super::{Position, RecordId};

/// Role recorded on every person managed here.
pub const TEACHER_ROLE: &str = "TEACHER";

fn default_true() -> bool {
    true
}

fn default_role() -> String {
    TEACHER_ROLE.to_string()
}

/// One staff member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Teacher {
    #[serde(alias = "_id")]
    pub id: RecordId,
    #[serde(default)]
    pub code: String,
    #[serde(default, alias = "startDate", deserialize_with = "date::deserialize_opt")]
    #[cfg_attr(feature = "ts", ts(type = "string | null"))]
    pub start_date: Option<NaiveDate>,
    #[serde(default = "default_true", alias = "isActive")]
    pub is_active: bool,
    #[serde(default, alias = "isDeleted")]
    pub is_deleted: bool,
    #[serde(default, alias = "userId")]
    pub person: Person,
    #[serde(default, alias = "teacherPositions")]
    pub positions: Vec<PositionSummary>,
    #[serde(default)]
    pub degrees: Vec<Degree>,
    /// Server fields this crate does not interpret, kept as-is.
    #[serde(flatten, default)]
    #[cfg_attr(feature = "ts", ts(skip))]
    pub extra: Map<String, Value>,
}

impl Teacher {
    /// Build a local record from a creation draft.
    ///
    /// `positions` are the already-resolved summaries for
    /// `draft.position_ids`.
    pub fn from_draft(id: RecordId, draft: &TeacherDraft, positions: Vec<PositionSummary>) -> Self {
        Self {
            id,
            code: draft.code.trim().to_string(),
            start_date: draft.start_date,
            is_active: true,
            is_deleted: false,
            person: Person {
                id: Some(RecordId::generate_local()),
                name: draft.person.name.trim().to_string(),
                email: draft.person.email.trim().to_string(),
                phone_number: draft.person.phone.trim().to_string(),
                address: draft.person.address.trim().to_string(),
                identity: draft.person.identity.trim().to_string(),
                date_of_birth: draft.person.date_of_birth,
                role: default_role(),
            },
            positions,
            degrees: draft
                .degrees
                .iter()
                .map(|d| Degree {
                    name: d.name.clone(),
                    institution: d.major.clone(),
                    graduation_year: d.graduation_year,
                    is_graduated: true,
                })
                .collect(),
            extra: Map::new(),
        }
    }

    /// Comma separated position names, for list display.
    pub fn position_names(&self) -> String {
        self.positions
            .iter()
            .map(|p| if p.name.is_empty() { p.id.as_str() } else { p.name.as_str() })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Personal information owned by exactly one teacher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Person {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, alias = "phoneNumber")]
    pub phone_number: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub identity: String,
    #[serde(default, alias = "dob", alias = "dateOfBirth", deserialize_with = "date::deserialize_opt")]
    #[cfg_attr(feature = "ts", ts(type = "string | null"))]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default = "default_role")]
    pub role: String,
}

impl Default for Person {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            email: String::new(),
            phone_number: String::new(),
            address: String::new(),
            identity: String::new(),
            date_of_birth: None,
            role: default_role(),
        }
    }
}

/// Denormalized view of a position, embedded in a teacher for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct PositionSummary {
    #[serde(alias = "_id")]
    pub id: RecordId,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "des")]
    pub description: String,
}

impl PositionSummary {
    /// Summary for a reference that could not be resolved.
    pub fn unresolved(id: RecordId) -> Self {
        Self {
            id,
            code: String::new(),
            name: String::new(),
            description: String::new(),
        }
    }
}

impl From<&Position> for PositionSummary {
    fn from(p: &Position) -> Self {
        Self {
            id: p.id.clone(),
            code: p.code.clone(),
            name: p.name.clone(),
            description: p.description.clone(),
        }
    }
}

/// One academic credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Degree {
    /// Credential name or type (e.g. "Master").
    #[serde(default)]
    pub name: String,
    /// Major or awarding institution.
    #[serde(default, alias = "major")]
    pub institution: String,
    #[serde(default, alias = "year", alias = "graduationYear")]
    pub graduation_year: Option<i32>,
    #[serde(default = "default_true", alias = "isGraduated")]
    pub is_graduated: bool,
}

// ===== Creation and update shapes =====

/// User-entered data for a new teacher.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct TeacherDraft {
    pub code: String,
    #[cfg_attr(feature = "ts", ts(type = "string | null"))]
    pub start_date: Option<NaiveDate>,
    pub position_ids: Vec<RecordId>,
    pub degrees: Vec<DegreeDraft>,
    pub person: PersonDraft,
}

impl TeacherDraft {
    /// Check the fields every new teacher must carry.
    pub fn validate(&self) -> Result<(), String> {
        if self.code.trim().is_empty() {
            return Err("teacher code is required".to_string());
        }
        if self.person.name.trim().is_empty() {
            return Err("name is required".to_string());
        }
        if self.person.email.trim().is_empty() {
            return Err("email is required".to_string());
        }
        if self.degrees.is_empty() {
            return Err("at least one degree is required".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct PersonDraft {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub identity: String,
    #[cfg_attr(feature = "ts", ts(type = "string | null"))]
    pub date_of_birth: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct DegreeDraft {
    pub name: String,
    pub major: String,
    pub graduation_year: Option<i32>,
}

/// Partial update for a teacher. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct TeacherPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "ts", ts(type = "string | null"))]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_deleted: Option<bool>,
    #[serde(rename = "teacherPositions", skip_serializing_if = "Option::is_none")]
    pub position_ids: Option<Vec<RecordId>>,
}

impl TeacherPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
