// File: ./src/model/record.rs
// Records read from the planning store. The pipeline never writes these.
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedActivity {
    pub id: String,
    pub owner: String,
    pub date: NaiveDate,
    /// Minutes after midnight.
    pub start_minute: i32,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Comma separated list typed in by the teacher.
    #[serde(default)]
    pub materials: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    pub owner: String,
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    #[serde(default)]
    pub all_day: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    TeacherAbsence,
    StudentPullOut,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBlock {
    pub id: String,
    pub owner: String,
    pub date: NaiveDate,
    pub kind: BlockKind,
    pub start_minute: i32,
    pub end_minute: i32,
    pub reason: String,
    #[serde(default)]
    pub student: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TeacherPreferences {
    pub owner: String,
    pub teacher_name: Option<String>,
    pub class_name: Option<String>,
    pub email: Option<String>,
    pub procedures: String,
    pub student_notes: String,
    pub emergency_contacts: String,
    pub fallback_plan: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRoutine {
    pub owner: String,
    pub category: String,
    pub title: String,
    pub time_of_day: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentGoal {
    pub owner: String,
    #[serde(default)]
    pub student_name: Option<String>,
    pub text: String,
    #[serde(default = "active_default")]
    pub active: bool,
}

fn active_default() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurriculumOutcome {
    pub id: String,
    pub code: String,
    pub description: String,
    pub subject: String,
    /// Activities that address this outcome.
    #[serde(default)]
    pub activity_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: String,
    pub activity_id: String,
    pub title: String,
    /// Declared type, e.g. "worksheet", "video", "link".
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactCategory {
    Administration,
    Office,
    Health,
    Support,
    EmergencyServices,
    Other,
}

impl ContactCategory {
    pub const ORDER: [ContactCategory; 6] = [
        ContactCategory::Administration,
        ContactCategory::Office,
        ContactCategory::Health,
        ContactCategory::Support,
        ContactCategory::EmergencyServices,
        ContactCategory::Other,
    ];

    pub fn heading(self) -> &'static str {
        match self {
            ContactCategory::Administration => "Administration",
            ContactCategory::Office => "Front Office",
            ContactCategory::Health => "Health",
            ContactCategory::Support => "Support Staff",
            ContactCategory::EmergencyServices => "Emergency Services",
            ContactCategory::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolContact {
    pub owner: String,
    pub role: String,
    #[serde(default)]
    pub name: Option<String>,
    pub phone: String,
    #[serde(default)]
    pub extension: Option<String>,
    #[serde(default)]
    pub availability: Option<String>,
    pub category: ContactCategory,
    #[serde(default)]
    pub emergency: bool,
}

/// Audit entry stored by the collaborator when a pack is saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackRecord {
    pub id: uuid::Uuid,
    pub owner: String,
    pub date: NaiveDate,
    pub days: u32,
    pub generated_at: DateTime<Utc>,
    #[serde(default)]
    pub emailed_to: Option<String>,
}
