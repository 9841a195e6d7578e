// File: ./src/model/item.rs
// Output shapes produced by the pipeline.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ScheduleEntry {
    pub fn activity(time: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            time: time.into(),
            activity: Some(title.into()),
            note: None,
        }
    }

    pub fn note(time: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            time: time.into(),
            activity: None,
            note: Some(text.into()),
        }
    }

    /// The activity text, only for planned items (entries without a note).
    pub fn planned_activity(&self) -> Option<&str> {
        match (&self.activity, &self.note) {
            (Some(a), None) => Some(a.as_str()),
            _ => None,
        }
    }

    pub fn label(&self) -> &str {
        self.activity
            .as_deref()
            .or(self.note.as_deref())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullOut {
    pub time: String,
    pub reason: String,
}

/// Merged, time-ordered view of one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySchedule {
    pub date: NaiveDate,
    pub schedule: Vec<ScheduleEntry>,
    pub pull_outs: Vec<PullOut>,
    pub contacts: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub procedures: Option<String>,
    /// Number of entries that share a time with an earlier entry.
    #[serde(default)]
    pub overlaps: usize,
}

impl DaySchedule {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            schedule: Vec::new(),
            pull_outs: Vec::new(),
            contacts: BTreeMap::new(),
            procedures: None,
            overlaps: 0,
        }
    }

    pub fn planned_activities(&self) -> impl Iterator<Item = (&str, &str)> {
        self.schedule
            .iter()
            .filter_map(|e| e.planned_activity().map(|a| (e.time.as_str(), a)))
    }

    pub fn is_empty(&self) -> bool {
        self.schedule.is_empty() && self.pull_outs.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinuityNote {
    pub day: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_day: Option<NaiveDate>,
    pub connections: Vec<String>,
    pub preparations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupPlan {
    pub subject: String,
    pub activities: Vec<String>,
    pub materials: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyPlan {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: Vec<DaySchedule>,
    pub weekly_overview: String,
    pub continuity_notes: Vec<ContinuityNote>,
    pub emergency_backup_plans: Vec<BackupPlan>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialCategory {
    Physical,
    Digital,
    Printable,
    Supplies,
    Equipment,
}

impl MaterialCategory {
    pub const ALL: [MaterialCategory; 5] = [
        MaterialCategory::Physical,
        MaterialCategory::Digital,
        MaterialCategory::Printable,
        MaterialCategory::Supplies,
        MaterialCategory::Equipment,
    ];

    /// Minutes of setup each item of this category adds.
    pub fn setup_weight(self) -> f64 {
        match self {
            MaterialCategory::Equipment => 3.0,
            MaterialCategory::Digital => 2.0,
            MaterialCategory::Supplies => 1.0,
            _ => 0.5,
        }
    }
}

impl fmt::Display for MaterialCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MaterialCategory::Physical => "Physical",
            MaterialCategory::Digital => "Digital",
            MaterialCategory::Printable => "Printable",
            MaterialCategory::Supplies => "Supplies",
            MaterialCategory::Equipment => "Equipment",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialPriority {
    Essential,
    Recommended,
    Optional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialSource {
    Activity,
    Resource,
    Inferred,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialItem {
    pub id: String,
    pub name: String,
    pub category: MaterialCategory,
    pub priority: MaterialPriority,
    pub source: MaterialSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preparation: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<String>,
}

impl MaterialItem {
    pub fn new(
        name: impl Into<String>,
        category: MaterialCategory,
        priority: MaterialPriority,
        source: MaterialSource,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            category,
            priority,
            source,
            quantity: None,
            location: None,
            preparation: None,
            alternatives: Vec::new(),
        }
    }

    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }
}

/// Lowercase with every non-alphanumeric character removed.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// "Jamie Lee" -> "J.L."
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|w| w.chars().next())
        .flat_map(|c| c.to_uppercase())
        .map(|c| format!("{}.", c))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub number: String,
    pub when: String,
}
