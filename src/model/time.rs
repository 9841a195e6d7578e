// File: ./src/model/time.rs
// Minute-of-day <-> "HH:MM" conversions shared by every component.
use chrono::{NaiveTime, Timelike};

pub const LAST_MINUTE_OF_DAY: i32 = 24 * 60 - 1;

/// Formats a minute-of-day offset as a zero-padded 24-hour `HH:MM` string.
///
/// Offsets outside `0..=1439` are clamped, so the result always sorts
/// correctly against other formatted times.
pub fn minutes_to_time(minutes: i32) -> String {
    let m = clamp_minutes(minutes);
    format!("{:02}:{:02}", m / 60, m % 60)
}

pub fn clamp_minutes(minutes: i32) -> i32 {
    minutes.clamp(0, LAST_MINUTE_OF_DAY)
}

pub fn is_valid_minute(minutes: i32) -> bool {
    (0..=LAST_MINUTE_OF_DAY).contains(&minutes)
}

/// Inverse of [`minutes_to_time`]. Rejects anything that is not `HH:MM`.
pub fn time_to_minutes(time: &str) -> Option<i32> {
    let (h, m) = time.split_once(':')?;
    if h.len() != 2 || m.len() != 2 {
        return None;
    }
    let hours = h.parse::<i32>().ok()?;
    let mins = m.parse::<i32>().ok()?;
    if !(0..24).contains(&hours) || !(0..60).contains(&mins) {
        return None;
    }
    Some(hours * 60 + mins)
}

pub fn minute_of(time: NaiveTime) -> i32 {
    (time.hour() * 60 + time.minute()) as i32
}
