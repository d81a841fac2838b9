//! Job positions a teacher may hold.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::RecordId;

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Position {
    #[serde(alias = "_id")]
    pub id: RecordId,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "des")]
    pub description: String,
    #[serde(default = "default_true", alias = "isActive")]
    pub is_active: bool,
    #[serde(default, alias = "isDeleted")]
    pub is_deleted: bool,
    #[serde(flatten, default)]
    #[cfg_attr(feature = "ts", ts(skip))]
    pub extra: Map<String, Value>,
}

impl Position {
    /// Whether `code` names this position, ignoring case and padding.
    pub fn has_code(&self, code: &str) -> bool {
        self.code.trim().eq_ignore_ascii_case(code.trim())
    }
}

/// User-entered data for a new position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct PositionDraft {
    pub code: String,
    pub name: String,
    pub description: String,
}

impl PositionDraft {
    /// Trim all fields and uppercase the code.
    pub fn normalized(&self) -> Self {
        Self {
            code: self.code.trim().to_uppercase(),
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let code = self.code.trim();
        if code.is_empty() {
            return Err("position code is required".to_string());
        }
        if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(format!("position code '{}' may only contain letters and digits", code));
        }
        if self.name.trim().is_empty() {
            return Err("position name is required".to_string());
        }
        Ok(())
    }
}

/// Partial update for a position. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct PositionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_deleted: Option<bool>,
}

impl PositionPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
