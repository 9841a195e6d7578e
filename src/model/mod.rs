// File: ./src/model/mod.rs
// Aggregates the split model files
pub mod adapter;
pub mod item;
pub mod record;
pub mod time;

pub use item::{
    BackupPlan, Contact, ContinuityNote, DaySchedule, MaterialCategory, MaterialItem,
    MaterialPriority, MaterialSource, PullOut, ScheduleEntry, WeeklyPlan, initials, normalize_name,
};
pub use record::{
    BlockKind, CalendarEvent, ClassRoutine, ContactCategory, CurriculumOutcome, PackRecord,
    PlannedActivity, Resource, SchoolContact, StudentGoal, TeacherPreferences, TimeBlock,
};
pub use time::{minutes_to_time, time_to_minutes};
