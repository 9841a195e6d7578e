// File: ./src/store/mod.rs
//! Read-only view of the planning system of record.
//!
//! The pipeline never mutates planning data. The only write is the optional
//! audit record of a generated pack, which the store owns.
pub mod snapshot;

pub use snapshot::{PlanningSnapshot, SnapshotStore};

use crate::model::{
    CalendarEvent, ClassRoutine, CurriculumOutcome, PackRecord, PlannedActivity, Resource,
    SchoolContact, StudentGoal, TeacherPreferences, TimeBlock,
};
use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};

/// Queries return empty collections when nothing is on record. `Err` is
/// reserved for genuine failures (unreachable or corrupt store).
#[allow(async_fn_in_trait)]
pub trait PlanningStore {
    async fn activities_on(&self, owner: &str, date: NaiveDate) -> Result<Vec<PlannedActivity>>;

    /// Calendar events that start on `date`.
    async fn events_on(&self, owner: &str, date: NaiveDate) -> Result<Vec<CalendarEvent>>;

    /// Absence and pull-out blocks on `date`.
    async fn blocks_on(&self, owner: &str, date: NaiveDate) -> Result<Vec<TimeBlock>>;

    async fn preferences(&self, owner: &str) -> Result<Option<TeacherPreferences>>;

    async fn routines(&self, owner: &str) -> Result<Vec<ClassRoutine>>;

    async fn goals(&self, owner: &str) -> Result<Vec<StudentGoal>>;

    async fn resources_for(&self, activity_id: &str) -> Result<Vec<Resource>>;

    /// Outcomes linked to any of the given activities, each once.
    async fn outcomes_for(&self, activity_ids: &[String]) -> Result<Vec<CurriculumOutcome>>;

    async fn contacts(&self, owner: &str) -> Result<Vec<SchoolContact>>;

    /// Most recent edit to any of the owner's planned activities.
    async fn last_planning_update(&self, owner: &str) -> Result<Option<DateTime<Utc>>>;

    async fn record_pack(&self, record: PackRecord) -> Result<()>;
}
