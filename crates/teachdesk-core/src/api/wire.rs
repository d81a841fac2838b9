//! Backend wire shapes and their translation to the canonical models.
//!
//! Incoming teacher records may embed the person (`userId` populated) or
//! only reference it, and may carry positions as summaries or as bare
//! references. Everything is normalized into `Teacher` here.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::date;
use crate::models::{
    Degree, Person, Position, PositionDraft, PositionSummary, RecordId, Teacher, TeacherDraft,
    TEACHER_ROLE,
};

fn default_true() -> bool {
    true
}

/// Every response body is wrapped as `{ "data": ... }`.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub data: Option<T>,
}

/// Keys the canonical `Teacher` reads or writes. Pass-through fields with
/// these names would collide with the real fields in the cache snapshot.
const TEACHER_KEYS: &[&str] = &[
    "id",
    "_id",
    "code",
    "start_date",
    "startDate",
    "is_active",
    "isActive",
    "is_deleted",
    "isDeleted",
    "person",
    "userId",
    "positions",
    "teacherPositions",
    "degrees",
];

/// Same for `Position`.
const POSITION_KEYS: &[&str] = &[
    "id",
    "_id",
    "code",
    "name",
    "description",
    "des",
    "is_active",
    "isActive",
    "is_deleted",
    "isDeleted",
];

/// Records may carry `_id`, a virtual `id`, or both. `_id` wins.
fn pick_id(mongo_id: Option<RecordId>, id: Option<RecordId>) -> Option<RecordId> {
    mongo_id
        .filter(|id| !id.is_empty())
        .or_else(|| id.filter(|id| !id.is_empty()))
}

fn strip_reserved(mut extra: Map<String, Value>, reserved: &[&str]) -> Map<String, Value> {
    extra.retain(|key, _| !reserved.contains(&key.as_str()));
    extra
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum PersonRef {
    Reference(RecordId),
    Populated(PersonRecord),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum PositionRef {
    Reference(RecordId),
    Summary(PositionRecord),
}

/// Populated `userId` of a teacher record.
#[derive(Debug, Deserialize)]
pub(crate) struct PersonRecord {
    #[serde(rename = "_id", default)]
    mongo_id: Option<RecordId>,
    #[serde(default)]
    id: Option<RecordId>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(rename = "phoneNumber", default)]
    phone_number: String,
    #[serde(default)]
    address: String,
    #[serde(default)]
    identity: String,
    #[serde(default, deserialize_with = "date::deserialize_opt")]
    dob: Option<NaiveDate>,
    #[serde(rename = "dateOfBirth", default, deserialize_with = "date::deserialize_opt")]
    date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    role: Option<String>,
}

impl From<PersonRecord> for Person {
    fn from(r: PersonRecord) -> Self {
        Person {
            id: pick_id(r.mongo_id, r.id),
            name: r.name,
            email: r.email,
            phone_number: r.phone_number,
            address: r.address,
            identity: r.identity,
            date_of_birth: r.dob.or(r.date_of_birth),
            role: r.role.unwrap_or_else(|| TEACHER_ROLE.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PositionRecord {
    #[serde(rename = "_id", default)]
    mongo_id: Option<RecordId>,
    #[serde(default)]
    id: Option<RecordId>,
    #[serde(default)]
    code: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    des: Option<String>,
    #[serde(rename = "isActive", default = "default_true")]
    is_active: bool,
    #[serde(rename = "isDeleted", default)]
    is_deleted: bool,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl PositionRecord {
    /// `None` when the record carries no identifier at all.
    pub fn into_position(self) -> Option<Position> {
        Some(Position {
            id: pick_id(self.mongo_id, self.id)?,
            code: self.code,
            name: self.name,
            description: self.description.or(self.des).unwrap_or_default(),
            is_active: self.is_active,
            is_deleted: self.is_deleted,
            extra: strip_reserved(self.extra, POSITION_KEYS),
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TeacherRecord {
    #[serde(rename = "_id", default)]
    mongo_id: Option<RecordId>,
    #[serde(default)]
    id: Option<RecordId>,
    #[serde(default)]
    code: String,
    #[serde(rename = "startDate", default, deserialize_with = "date::deserialize_opt")]
    start_date: Option<NaiveDate>,
    #[serde(rename = "isActive", default = "default_true")]
    is_active: bool,
    #[serde(rename = "isDeleted", default)]
    is_deleted: bool,
    #[serde(rename = "userId", default)]
    user: Option<PersonRef>,
    #[serde(rename = "teacherPositions", default)]
    positions: Vec<PositionRef>,
    #[serde(rename = "teacherPositionsId", default)]
    position_ids: Vec<RecordId>,
    #[serde(default)]
    degrees: Vec<Degree>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl TeacherRecord {
    /// Whether any position is only referenced by identifier.
    pub fn has_unresolved_positions(&self) -> bool {
        !self.position_ids.is_empty()
            || self
                .positions
                .iter()
                .any(|p| matches!(p, PositionRef::Reference(_)))
    }

    /// Convert to the canonical model, resolving position references
    /// against `catalog`. References missing from the catalog are kept as
    /// identifier-only summaries. `None` when the record has no identifier.
    pub fn into_teacher(self, catalog: &[Position]) -> Option<Teacher> {
        let id = pick_id(self.mongo_id, self.id)?;

        let resolve = |id: RecordId| {
            catalog
                .iter()
                .find(|p| p.id == id)
                .map(PositionSummary::from)
                .unwrap_or_else(|| PositionSummary::unresolved(id))
        };

        let mut positions: Vec<PositionSummary> = Vec::new();
        let refs = self
            .positions
            .into_iter()
            .chain(self.position_ids.into_iter().map(PositionRef::Reference));
        for r in refs {
            let summary = match r {
                PositionRef::Summary(record) => match record.into_position() {
                    Some(position) => PositionSummary::from(&position),
                    None => continue,
                },
                PositionRef::Reference(id) => resolve(id),
            };
            if !positions.iter().any(|p| p.id == summary.id) {
                positions.push(summary);
            }
        }

        let person = match self.user {
            Some(PersonRef::Populated(record)) => Person::from(record),
            Some(PersonRef::Reference(id)) => Person {
                id: Some(id),
                ..Person::default()
            },
            None => Person::default(),
        };

        Some(Teacher {
            id,
            code: self.code,
            start_date: self.start_date,
            is_active: self.is_active,
            is_deleted: self.is_deleted,
            person,
            positions,
            degrees: self.degrees,
            extra: strip_reserved(self.extra, TEACHER_KEYS),
        })
    }
}

// ===== Outgoing payloads =====

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NewUserPayload<'a> {
    name: &'a str,
    email: &'a str,
    phone_number: &'a str,
    address: &'a str,
    identity: &'a str,
    dob: Option<NaiveDate>,
    role: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NewDegreePayload<'a> {
    name: &'a str,
    institution: &'a str,
    graduation_year: Option<i32>,
}

/// Composite body for `POST /teachers`: person fields nested under `user`,
/// teacher fields at the top level.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NewTeacherPayload<'a> {
    user: NewUserPayload<'a>,
    code: &'a str,
    start_date: Option<NaiveDate>,
    is_active: bool,
    teacher_positions: &'a [RecordId],
    degrees: Vec<NewDegreePayload<'a>>,
}

impl<'a> From<&'a TeacherDraft> for NewTeacherPayload<'a> {
    fn from(draft: &'a TeacherDraft) -> Self {
        Self {
            user: NewUserPayload {
                name: draft.person.name.trim(),
                email: draft.person.email.trim(),
                phone_number: draft.person.phone.trim(),
                address: draft.person.address.trim(),
                identity: draft.person.identity.trim(),
                dob: draft.person.date_of_birth,
                role: TEACHER_ROLE,
            },
            code: draft.code.trim(),
            start_date: draft.start_date,
            is_active: true,
            teacher_positions: &draft.position_ids,
            degrees: draft
                .degrees
                .iter()
                .map(|d| NewDegreePayload {
                    name: &d.name,
                    institution: &d.major,
                    graduation_year: d.graduation_year,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NewPositionPayload<'a> {
    code: &'a str,
    name: &'a str,
    description: &'a str,
    is_active: bool,
}

impl<'a> From<&'a PositionDraft> for NewPositionPayload<'a> {
    fn from(draft: &'a PositionDraft) -> Self {
        Self {
            code: &draft.code,
            name: &draft.name,
            description: &draft.description,
            is_active: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DegreeDraft, PersonDraft};

    fn catalog() -> Vec<Position> {
        serde_json::from_str(
            r#"[{"_id": "p1", "code": "GV", "name": "Giao vien", "description": "Teaching staff"},
                {"_id": "p2", "code": "TG", "name": "Tro giang", "des": "Assistant"}]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_parse_populated_teacher_envelope() {
        let json = r#"{"data": [{
            "_id": "65f0a1",
            "code": "GV0001",
            "startDate": "2024-09-01T00:00:00.000Z",
            "isActive": true,
            "isDeleted": false,
            "userId": {"_id": "u1", "name": "Tran Thi B", "email": "b@example.com",
                       "phoneNumber": "0912", "identity": "0012", "dob": "1988-02-03T00:00:00.000Z",
                       "address": "Da Nang", "role": "TEACHER"},
            "teacherPositions": [{"_id": "p2", "code": "TG", "name": "Tro giang", "des": "Assistant"}],
            "degrees": [{"name": "Master", "type": "Thac si", "school": "HUST", "major": "CS", "year": 2012, "isGraduated": true}],
            "__v": 0
        }]}"#;
        let env: Envelope<Vec<TeacherRecord>> = serde_json::from_str(json).unwrap();
        let records = env.data.unwrap();
        assert_eq!(records.len(), 1);
        assert!(!records[0].has_unresolved_positions());

        let t = records.into_iter().next().unwrap().into_teacher(&[]).unwrap();
        assert_eq!(t.id, "65f0a1");
        assert_eq!(t.start_date, NaiveDate::from_ymd_opt(2024, 9, 1));
        assert_eq!(t.person.email, "b@example.com");
        assert_eq!(t.person.phone_number, "0912");
        assert_eq!(t.positions.len(), 1);
        assert_eq!(t.positions[0].description, "Assistant");
        assert_eq!(t.degrees[0].name, "Master");
        assert_eq!(t.degrees[0].institution, "CS");
        assert_eq!(t.extra.get("__v"), Some(&serde_json::json!(0)));
    }

    #[test]
    fn test_resolve_position_references() {
        let json = r#"{
            "_id": {"$oid": "t7"},
            "code": "GV7",
            "userId": {"$oid": "u7"},
            "teacherPositionsId": [{"$oid": "p1"}, "p9"],
            "teacherPositions": ["p1"]
        }"#;
        let record: TeacherRecord = serde_json::from_str(json).unwrap();
        assert!(record.has_unresolved_positions());

        let t = record.into_teacher(&catalog()).unwrap();
        assert_eq!(t.id, "t7");
        assert_eq!(t.person.id, Some(RecordId::new("u7")));
        assert!(t.person.name.is_empty());
        // p1 appears twice but is kept once; p9 is unknown.
        assert_eq!(t.positions.len(), 2);
        assert_eq!(t.positions[0].name, "Giao vien");
        assert_eq!(t.positions[1], PositionSummary::unresolved(RecordId::new("p9")));
    }

    #[test]
    fn test_records_with_both_id_keys() {
        let json = r#"{
            "_id": "t1",
            "id": "t1",
            "code": "GV1",
            "userId": {"_id": "u1", "id": "u1", "name": "Ngo D", "email": "d@example.com",
                       "dateOfBirth": "1991-04-05"},
            "teacherPositions": [{"_id": "p1", "id": "p1", "code": "GV", "name": "Giao vien",
                                  "description": "Teaching staff", "des": "old"}],
            "person": "stray",
            "is_active": false,
            "__v": 3
        }"#;
        let record: TeacherRecord = serde_json::from_str(json).unwrap();
        let t = record.into_teacher(&[]).unwrap();

        assert_eq!(t.id, "t1");
        assert!(t.is_active);
        assert_eq!(t.person.id, Some(RecordId::new("u1")));
        assert_eq!(t.person.email, "d@example.com");
        assert_eq!(t.person.date_of_birth, NaiveDate::from_ymd_opt(1991, 4, 5));
        assert_eq!(t.positions[0].id, "p1");
        assert_eq!(t.positions[0].description, "Teaching staff");
        // Only fields with no canonical counterpart are passed through.
        assert_eq!(t.extra.len(), 1);
        assert_eq!(t.extra.get("__v"), Some(&serde_json::json!(3)));
    }

    #[test]
    fn test_teacher_with_both_id_keys_survives_cache() {
        use crate::cache::{MemoryStore, TeacherCache};

        let record: TeacherRecord =
            serde_json::from_str(r#"{"_id": "t1", "id": "t1", "code": "GV1", "__v": 0}"#).unwrap();
        let teacher = record.into_teacher(&[]).unwrap();

        let cache = TeacherCache::new(MemoryStore::new());
        cache.write(std::slice::from_ref(&teacher));
        assert_eq!(cache.read(), Some(vec![teacher]));
    }

    #[test]
    fn test_position_with_both_id_keys() {
        let env: Envelope<Vec<PositionRecord>> = serde_json::from_str(
            r#"{"data": [{"_id": "p1", "id": "p1", "code": "GV", "name": "Giao vien", "des": "Staff"},
                         {"id": "p2", "code": "TG", "name": "Tro giang"},
                         {"code": "XX"}]}"#,
        )
        .unwrap();
        let positions: Vec<Position> = env
            .data
            .unwrap()
            .into_iter()
            .filter_map(PositionRecord::into_position)
            .collect();

        assert_eq!(positions.len(), 2);
        assert_eq!(positions[0].id, "p1");
        assert_eq!(positions[0].description, "Staff");
        assert!(positions[0].extra.is_empty());
        assert_eq!(positions[1].id, "p2");
    }

    #[test]
    fn test_teacher_without_id_is_skipped() {
        let record: TeacherRecord = serde_json::from_str(r#"{"code": "GV1"}"#).unwrap();
        assert!(record.into_teacher(&[]).is_none());
    }

    #[test]
    fn test_missing_data_is_none() {
        let env: Envelope<Vec<Position>> = serde_json::from_str("{}").unwrap();
        assert!(env.data.is_none());
        let env: Envelope<Vec<Position>> = serde_json::from_str(r#"{"data": null}"#).unwrap();
        assert!(env.data.is_none());
    }

    #[test]
    fn test_new_teacher_payload_shape() {
        let draft = TeacherDraft {
            code: "GV2".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 8),
            position_ids: vec![RecordId::new("p1")],
            degrees: vec![DegreeDraft {
                name: "Bachelor".to_string(),
                major: "Chemistry".to_string(),
                graduation_year: Some(2010),
            }],
            person: PersonDraft {
                name: "Le C".to_string(),
                email: "c@example.com".to_string(),
                phone: "0987".to_string(),
                address: "Hue".to_string(),
                identity: "0456".to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(1987, 7, 7),
            },
        };
        let json = serde_json::to_value(NewTeacherPayload::from(&draft)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "user": {
                    "name": "Le C",
                    "email": "c@example.com",
                    "phoneNumber": "0987",
                    "address": "Hue",
                    "identity": "0456",
                    "dob": "1987-07-07",
                    "role": "TEACHER"
                },
                "code": "GV2",
                "startDate": "2024-01-08",
                "isActive": true,
                "teacherPositions": ["p1"],
                "degrees": [{"name": "Bachelor", "institution": "Chemistry", "graduationYear": 2010}]
            })
        );
    }

    #[test]
    fn test_new_position_payload_shape() {
        let draft = PositionDraft {
            code: "GS".to_string(),
            name: "Giao su".to_string(),
            description: "Professor".to_string(),
        };
        let json = serde_json::to_value(NewPositionPayload::from(&draft)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"code": "GS", "name": "Giao su", "description": "Professor", "isActive": true})
        );
    }
}
