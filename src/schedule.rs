// File: ./src/schedule.rs
//! Merges planned activities, calendar events and time blocks into one
//! time-ordered [`DaySchedule`].
//!
//! Sources are concatenated without reconciliation: two entries at the same
//! time from different sources are both kept. Overlaps are only counted.
use crate::contacts::ContactDirectory;
use crate::model::time::{is_valid_minute, minute_of, minutes_to_time};
use crate::model::{BlockKind, DaySchedule, PullOut, ScheduleEntry, initials};
use crate::store::PlanningStore;
use anyhow::Result;
use chrono::{Duration, NaiveDate};
use futures::future::try_join3;
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateOptions {
    pub include_plans: bool,
    pub include_events: bool,
    pub include_absences: bool,
    pub anonymize: bool,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            include_plans: true,
            include_events: true,
            include_absences: true,
            anonymize: false,
        }
    }
}

pub struct ScheduleAggregator<'a, S> {
    store: &'a S,
}

impl<'a, S: PlanningStore> ScheduleAggregator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub async fn build_day(
        &self,
        owner: &str,
        date: NaiveDate,
        opts: AggregateOptions,
    ) -> Result<DaySchedule> {
        let activities = async {
            if opts.include_plans {
                self.store.activities_on(owner, date).await
            } else {
                Ok(Vec::new())
            }
        };
        let events = async {
            if opts.include_events {
                self.store.events_on(owner, date).await
            } else {
                Ok(Vec::new())
            }
        };
        let blocks = self.store.blocks_on(owner, date);
        let (activities, events, blocks) = try_join3(activities, events, blocks).await?;

        let mut day = DaySchedule::empty(date);

        for a in &activities {
            day.schedule
                .push(ScheduleEntry::activity(entry_time(a.start_minute, &a.title), &a.title));
        }
        for e in &events {
            let minute = if e.all_day { 0 } else { minute_of(e.start.time()) };
            day.schedule.push(ScheduleEntry::note(minutes_to_time(minute), &e.title));
        }
        for b in &blocks {
            match b.kind {
                BlockKind::TeacherAbsence if opts.include_absences => {
                    day.schedule
                        .push(ScheduleEntry::note(entry_time(b.start_minute, &b.reason), &b.reason));
                }
                BlockKind::TeacherAbsence => {}
                BlockKind::StudentPullOut => {
                    let reason = match &b.student {
                        Some(s) if opts.anonymize => format!("{} ({})", b.reason, initials(s)),
                        Some(s) => format!("{} ({})", b.reason, s),
                        None => b.reason.clone(),
                    };
                    day.pull_outs.push(PullOut {
                        time: entry_time(b.start_minute, &b.reason),
                        reason,
                    });
                }
            }
        }

        // Stable: entries at equal times keep source order.
        day.schedule.sort_by(|a, b| a.time.cmp(&b.time));
        day.pull_outs.sort_by(|a, b| a.time.cmp(&b.time));
        day.overlaps = day
            .schedule
            .windows(2)
            .filter(|w| w[0].time == w[1].time)
            .count();
        if day.overlaps > 0 {
            debug!(%date, overlaps = day.overlaps, "schedule entries share a start time");
        }

        self.attach_context(owner, &mut day).await?;
        Ok(day)
    }

    /// One schedule per consecutive date, in date order. Days are built
    /// concurrently, at most `concurrency` at a time.
    pub async fn build_days(
        &self,
        owner: &str,
        start: NaiveDate,
        days: u32,
        opts: AggregateOptions,
        concurrency: usize,
    ) -> Result<Vec<DaySchedule>> {
        let dates = (0..days).map(|i| start + Duration::days(i64::from(i)));
        stream::iter(dates)
            .map(move |date| self.build_day(owner, date, opts))
            .buffered(concurrency.max(1))
            .try_collect()
            .await
    }

    async fn attach_context(&self, owner: &str, day: &mut DaySchedule) -> Result<()> {
        let (prefs, contacts) =
            futures::try_join!(self.store.preferences(owner), self.store.contacts(owner))?;
        if let Some(p) = prefs
            && !p.procedures.trim().is_empty()
        {
            day.procedures = Some(p.procedures);
        }
        let directory = ContactDirectory::new(contacts);
        for c in directory.emergency() {
            day.contacts.insert(c.role.clone(), c.number.clone());
        }
        Ok(())
    }
}

fn entry_time(minute: i32, what: &str) -> String {
    if !is_valid_minute(minute) {
        warn!(minute, entry = what, "minute offset outside the day, clamping");
    }
    minutes_to_time(minute)
}
