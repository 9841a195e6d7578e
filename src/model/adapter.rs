// File: ./src/model/adapter.rs
// Handles ICS import of calendar events and ICS export of a day schedule
use crate::model::item::DaySchedule;
use crate::model::record::CalendarEvent;
use crate::model::time::time_to_minutes;
use anyhow::{Result, anyhow};
use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use icalendar::{Calendar, CalendarComponent, Component, Event};
use rrule::RRuleSet;
use std::str::FromStr;
use tracing::warn;

// Upper bound on occurrences of one recurring event inside the window.
const MAX_OCCURRENCES: u16 = 1000;
const ENTRY_MINUTES: i32 = 30;

/// Parses every VEVENT in `raw_ics`, expanding RRULEs into one event per
/// occurrence that starts inside `[window_start, window_end)`.
pub fn events_from_ics(
    raw_ics: &str,
    owner: &str,
    window_start: NaiveDateTime,
    window_end: NaiveDateTime,
) -> Result<Vec<CalendarEvent>> {
    let calendar: Calendar = raw_ics.parse().map_err(|e| anyhow!("Parse: {}", e))?;
    let mut events = Vec::new();

    for component in &calendar.components {
        let CalendarComponent::Event(event) = component else {
            continue;
        };
        let Some((start, all_day)) = event
            .properties()
            .get("DTSTART")
            .and_then(|p| parse_ics_datetime(p.value()))
        else {
            continue;
        };
        let end = event
            .properties()
            .get("DTEND")
            .and_then(|p| parse_ics_datetime(p.value()))
            .map(|(dt, _)| dt)
            .unwrap_or_else(|| {
                if all_day {
                    start + Duration::days(1)
                } else {
                    start + Duration::hours(1)
                }
            });
        let length = end - start;
        let uid = event.get_uid().unwrap_or_default().to_string();
        let title = event.get_summary().unwrap_or("Untitled event").to_string();

        let starts = match event.properties().get("RRULE") {
            Some(rule) => expand_rrule(start, rule.value(), window_start, window_end)?,
            None => vec![start],
        };

        for (n, occurrence) in starts
            .into_iter()
            .filter(|s| *s >= window_start && *s < window_end)
            .enumerate()
        {
            events.push(CalendarEvent {
                id: if n == 0 { uid.clone() } else { format!("{}#{}", uid, n) },
                owner: owner.to_string(),
                title: title.clone(),
                start: occurrence,
                end: occurrence + length,
                all_day,
            });
        }
    }
    Ok(events)
}

/// Accepts `YYYYMMDD`, floating `YYYYMMDDTHHMMSS` and UTC `...Z` values.
/// UTC values are shifted to local wall-clock time.
fn parse_ics_datetime(val: &str) -> Option<(NaiveDateTime, bool)> {
    let val = val.trim();
    if val.len() == 8 {
        return NaiveDate::parse_from_str(val, "%Y%m%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| (dt, true));
    }
    if val.ends_with('Z') {
        let utc = NaiveDateTime::parse_from_str(val, "%Y%m%dT%H%M%SZ").ok()?;
        let local = Local.from_utc_datetime(&utc).naive_local();
        return Some((local, false));
    }
    NaiveDateTime::parse_from_str(val, "%Y%m%dT%H%M%S")
        .ok()
        .map(|dt| (dt, false))
}

// Wall-clock times are pushed through rrule as if they were UTC so that no
// timezone shifts leak into the expansion. Both window bounds are inclusive
// here; the caller drops occurrences at `until`.
fn expand_rrule(
    start: NaiveDateTime,
    rule: &str,
    from: NaiveDateTime,
    until: NaiveDateTime,
) -> Result<Vec<NaiveDateTime>> {
    let dtstart = start.format("%Y%m%dT%H%M%SZ").to_string();
    let rrule_string = format!("DTSTART:{}\nRRULE:{}", dtstart, rule);
    let rrule_set = RRuleSet::from_str(&rrule_string)
        .map_err(|e| anyhow!("Invalid RRULE '{}': {}", rule, e))?;
    let result = rrule_set
        .after(rrule::Tz::UTC.from_utc_datetime(&from))
        .before(rrule::Tz::UTC.from_utc_datetime(&until))
        .all(MAX_OCCURRENCES);
    if result.limited {
        warn!(
            "RRULE '{}' expanded to {} occurrences between {} and {}; later ones are dropped",
            rule,
            result.dates.len(),
            from,
            until
        );
    }
    Ok(result.dates.iter().map(|d| d.naive_utc()).collect())
}

/// Exports the schedule entries of one day as VEVENTs. Each entry runs
/// until the next entry starts, or for half an hour when nothing follows.
pub fn day_schedule_to_ics(day: &DaySchedule) -> String {
    let mut calendar = Calendar::new();
    let starts: Vec<i32> = day
        .schedule
        .iter()
        .map(|e| time_to_minutes(&e.time).unwrap_or(0))
        .collect();

    for (i, entry) in day.schedule.iter().enumerate() {
        let start = starts[i];
        let end = starts[i + 1..]
            .iter()
            .copied()
            .find(|next| *next > start)
            .unwrap_or(start + ENTRY_MINUTES);

        let mut event = Event::new();
        event.uid(&format!("{}-{}@subpack", day.date.format("%Y%m%d"), i));
        event.summary(entry.label());
        if entry.note.is_some() {
            event.description("Note");
        }
        event.timestamp(Utc::now());
        event.add_property("DTSTART", &format_local(day.date, start));
        event.add_property("DTEND", &format_local(day.date, end));
        calendar.push(event);
    }
    calendar.to_string()
}

// Minutes past the end of the day roll over into the next date.
fn format_local(date: NaiveDate, minute: i32) -> String {
    let dt = date.and_time(NaiveTime::MIN) + Duration::minutes(i64::from(minute));
    dt.format("%Y%m%dT%H%M%S").to_string()
}
