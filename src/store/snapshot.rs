// File: ./src/store/snapshot.rs
use crate::config::Config;
use crate::journal::Journal;
use crate::model::adapter::events_from_ics;
use crate::model::{
    CalendarEvent, ClassRoutine, CurriculumOutcome, PackRecord, PlannedActivity, Resource,
    SchoolContact, StudentGoal, TeacherPreferences, TimeBlock,
};
use crate::storage::LocalStorage;
use crate::store::PlanningStore;
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

/// Everything the planning system exports, as one JSON document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlanningSnapshot {
    pub activities: Vec<PlannedActivity>,
    pub events: Vec<CalendarEvent>,
    pub blocks: Vec<TimeBlock>,
    pub preferences: Vec<TeacherPreferences>,
    pub routines: Vec<ClassRoutine>,
    pub goals: Vec<StudentGoal>,
    pub resources: Vec<Resource>,
    pub outcomes: Vec<CurriculumOutcome>,
    pub contacts: Vec<SchoolContact>,
}

/// Store over an in-memory snapshot, optionally loaded from disk.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    snapshot: PlanningSnapshot,
    /// Raw ICS feed; recurring events are expanded per queried day.
    calendar_ics: Option<String>,
    audit_file: Option<PathBuf>,
    records: Mutex<Vec<PackRecord>>,
}

impl SnapshotStore {
    pub fn new(snapshot: PlanningSnapshot) -> Self {
        Self {
            snapshot,
            ..Self::default()
        }
    }

    /// Opens the files named in `config`. Missing files mean "no data";
    /// unreadable or malformed ones are errors.
    pub fn open(config: &Config) -> Result<Self> {
        let snapshot = match config.data_file() {
            Some(path) => {
                let loaded = LocalStorage::load_json::<PlanningSnapshot>(&path)?;
                if loaded.is_none() {
                    info!(path = %path.display(), "no planning data file, starting empty");
                }
                loaded.unwrap_or_default()
            }
            None => PlanningSnapshot::default(),
        };
        let mut store = Self::new(snapshot);
        if let Some(ics) = &config.calendar_ics {
            store = store.with_calendar_file(ics)?;
        }
        if let Some(audit) = config.audit_file() {
            store = store.with_audit_file(audit);
        }
        Ok(store)
    }

    pub fn with_calendar_ics(mut self, raw: impl Into<String>) -> Self {
        self.calendar_ics = Some(raw.into());
        self
    }

    pub fn with_calendar_file(self, path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading calendar feed {}", path.display()))?;
        Ok(self.with_calendar_ics(raw))
    }

    pub fn with_audit_file(mut self, path: PathBuf) -> Self {
        self.audit_file = Some(path);
        self
    }

    pub fn snapshot(&self) -> &PlanningSnapshot {
        &self.snapshot
    }

    /// Records kept in memory (those not written to an audit file).
    pub fn records(&self) -> Vec<PackRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl PlanningStore for SnapshotStore {
    async fn activities_on(&self, owner: &str, date: NaiveDate) -> Result<Vec<PlannedActivity>> {
        Ok(self
            .snapshot
            .activities
            .iter()
            .filter(|a| a.owner == owner && a.date == date)
            .cloned()
            .collect())
    }

    async fn events_on(&self, owner: &str, date: NaiveDate) -> Result<Vec<CalendarEvent>> {
        let mut events: Vec<CalendarEvent> = self
            .snapshot
            .events
            .iter()
            .filter(|e| e.owner == owner && e.start.date() == date)
            .cloned()
            .collect();
        // The ICS feed belongs to whoever is asking.
        if let Some(raw) = &self.calendar_ics
            && let Some(day_start) = date.and_hms_opt(0, 0, 0)
        {
            let from_feed = events_from_ics(raw, owner, day_start, day_start + Duration::days(1))?;
            debug!(%date, count = from_feed.len(), "calendar feed events");
            events.extend(from_feed);
        }
        Ok(events)
    }

    async fn blocks_on(&self, owner: &str, date: NaiveDate) -> Result<Vec<TimeBlock>> {
        Ok(self
            .snapshot
            .blocks
            .iter()
            .filter(|b| b.owner == owner && b.date == date)
            .cloned()
            .collect())
    }

    async fn preferences(&self, owner: &str) -> Result<Option<TeacherPreferences>> {
        Ok(self
            .snapshot
            .preferences
            .iter()
            .find(|p| p.owner == owner)
            .cloned())
    }

    async fn routines(&self, owner: &str) -> Result<Vec<ClassRoutine>> {
        Ok(self
            .snapshot
            .routines
            .iter()
            .filter(|r| r.owner == owner)
            .cloned()
            .collect())
    }

    async fn goals(&self, owner: &str) -> Result<Vec<StudentGoal>> {
        Ok(self
            .snapshot
            .goals
            .iter()
            .filter(|g| g.owner == owner && g.active)
            .cloned()
            .collect())
    }

    async fn resources_for(&self, activity_id: &str) -> Result<Vec<Resource>> {
        Ok(self
            .snapshot
            .resources
            .iter()
            .filter(|r| r.activity_id == activity_id)
            .cloned()
            .collect())
    }

    async fn outcomes_for(&self, activity_ids: &[String]) -> Result<Vec<CurriculumOutcome>> {
        let wanted: HashSet<&str> = activity_ids.iter().map(String::as_str).collect();
        Ok(self
            .snapshot
            .outcomes
            .iter()
            .filter(|o| o.activity_ids.iter().any(|id| wanted.contains(id.as_str())))
            .cloned()
            .collect())
    }

    async fn contacts(&self, owner: &str) -> Result<Vec<SchoolContact>> {
        Ok(self
            .snapshot
            .contacts
            .iter()
            .filter(|c| c.owner == owner)
            .cloned()
            .collect())
    }

    async fn last_planning_update(&self, owner: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .snapshot
            .activities
            .iter()
            .filter(|a| a.owner == owner)
            .filter_map(|a| a.updated_at)
            .max())
    }

    async fn record_pack(&self, record: PackRecord) -> Result<()> {
        match &self.audit_file {
            Some(path) => Journal::append(path, record),
            None => {
                self.records
                    .lock()
                    .map_err(|_| anyhow::anyhow!("record lock poisoned"))?
                    .push(record);
                Ok(())
            }
        }
    }
}
