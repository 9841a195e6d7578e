// File: ./src/continuity.rs
//! Cross-day notes: links each day's activities to the previous day's by
//! inferred subject, and suggests preparations.
//!
//! Subject inference is a keyword heuristic. A misclassified activity only
//! produces a less useful note.
use crate::model::{BackupPlan, ContinuityNote, DaySchedule};
use crate::rules::{KeywordRule, MatchMode, RuleTable};

pub const GENERAL: &str = "General";

pub static SUBJECT_RULES: RuleTable<&'static str> = RuleTable::new(MatchMode::Word, SUBJECTS);

const SUBJECTS: &[KeywordRule<&'static str>] = &[
    KeywordRule {
        keywords: &[
            "math", "number", "calculation", "addition", "subtraction", "multiplication",
            "division", "fraction", "count",
        ],
        value: "Mathematics",
    },
    KeywordRule {
        keywords: &["read", "writing", "write", "language", "spelling", "phonics", "grammar"],
        value: "Language Arts",
    },
    KeywordRule {
        keywords: &["science", "experiment", "nature"],
        value: "Science",
    },
    KeywordRule {
        keywords: &["social", "history", "geography"],
        value: "Social Studies",
    },
    KeywordRule {
        keywords: &["art", "arts", "draw", "paint"],
        value: "Arts",
    },
    KeywordRule {
        keywords: &["pe", "physical", "sport"],
        value: "Physical Education",
    },
];

pub const PROJECT_NOTE: &str =
    "Project work continues: keep in-progress student projects and their materials where students can reach them.";
pub const PRESENTATION_NOTE: &str =
    "Presentations are scheduled: check the projector or display and have student files ready.";
pub const TRANSITION_NOTE: &str =
    "Review the schedule and prepare transition materials between activities.";

pub fn infer_subject(activity: &str) -> &'static str {
    SUBJECT_RULES.first_match(activity).copied().unwrap_or(GENERAL)
}

/// One note per day, same order as `days`.
pub fn analyze(days: &[DaySchedule]) -> Vec<ContinuityNote> {
    days.iter()
        .enumerate()
        .map(|(i, day)| match i.checked_sub(1).map(|p| &days[p]) {
            Some(prev) => note_against(day, prev),
            None => first_day_note(day),
        })
        .collect()
}

fn first_day_note(day: &DaySchedule) -> ContinuityNote {
    let mut preparations = Vec::new();
    if day.planned_activities().next().is_some() {
        preparations.push(TRANSITION_NOTE.to_string());
    }
    ContinuityNote {
        day: day.date,
        previous_day: None,
        connections: Vec::new(),
        preparations,
    }
}

fn note_against(day: &DaySchedule, prev: &DaySchedule) -> ContinuityNote {
    let previous: Vec<(&'static str, &str)> = prev
        .planned_activities()
        .map(|(_, a)| (infer_subject(a), a))
        .collect();
    let current: Vec<&str> = day.planned_activities().map(|(_, a)| a).collect();

    let mut connections = Vec::new();
    let mut linked: Vec<&'static str> = Vec::new();
    for &activity in &current {
        let subject = infer_subject(activity);
        // Activities repeated verbatim from the previous day are not progress.
        if linked.contains(&subject) || previous.iter().any(|&(_, a)| a == activity) {
            continue;
        }
        let candidates: Vec<&str> = previous
            .iter()
            .filter(|&&(s, a)| s == subject && a != activity)
            .map(|&(_, a)| a)
            .collect();
        // Prefer a previous activity that did not carry over unchanged.
        let before = candidates
            .iter()
            .find(|a| !current.contains(a))
            .or(candidates.first());
        if let Some(before) = before {
            linked.push(subject);
            connections.push(format!(
                "{}: Continue from \"{}\" to \"{}\"",
                subject, before, activity
            ));
        }
    }

    let lowered: Vec<String> = day
        .planned_activities()
        .map(|(_, a)| a.to_lowercase())
        .collect();
    let mut preparations = Vec::new();
    if lowered.iter().any(|a| a.contains("project")) {
        preparations.push(PROJECT_NOTE.to_string());
    }
    if lowered.iter().any(|a| a.contains("presentation")) {
        preparations.push(PRESENTATION_NOTE.to_string());
    }
    if !lowered.is_empty() {
        preparations.push(TRANSITION_NOTE.to_string());
    }

    ContinuityNote {
        day: day.date,
        previous_day: Some(prev.date),
        connections,
        preparations,
    }
}

struct Backup {
    subject: &'static str,
    activities: &'static [&'static str],
    materials: &'static [&'static str],
}

static BACKUPS: &[Backup] = &[
    Backup {
        subject: "Mathematics",
        activities: &["Math fact practice", "Number games in pairs", "Word problem review"],
        materials: &["Math worksheets", "Dice", "Counters"],
    },
    Backup {
        subject: "Language Arts",
        activities: &["Independent reading", "Journal writing prompt", "Spelling review"],
        materials: &["Classroom library books", "Lined paper", "Writing prompts"],
    },
    Backup {
        subject: "Science",
        activities: &["Science reading passage", "Observation drawing", "Vocabulary review"],
        materials: &["Science reader", "Drawing paper"],
    },
    Backup {
        subject: "Social Studies",
        activities: &["Map skills worksheet", "Current events discussion"],
        materials: &["Maps", "Worksheets"],
    },
    Backup {
        subject: "Arts",
        activities: &["Free drawing", "Directed drawing"],
        materials: &["Drawing paper", "Crayons"],
    },
    Backup {
        subject: "Physical Education",
        activities: &["Indoor movement games", "Stretching routine"],
        materials: &["Open floor space"],
    },
    Backup {
        subject: GENERAL,
        activities: &["Review games", "Independent work packets", "Read-aloud"],
        materials: &["Work packets", "Picture books"],
    },
];

/// Backup plans for every subject seen across `days`, in order of first
/// appearance.
pub fn backup_plans(days: &[DaySchedule]) -> Vec<BackupPlan> {
    let mut subjects: Vec<&'static str> = Vec::new();
    for day in days {
        for (_, activity) in day.planned_activities() {
            let s = infer_subject(activity);
            if !subjects.contains(&s) {
                subjects.push(s);
            }
        }
    }
    subjects
        .into_iter()
        .filter_map(|s| BACKUPS.iter().find(|b| b.subject == s))
        .map(|b| BackupPlan {
            subject: b.subject.to_string(),
            activities: b.activities.iter().map(|s| s.to_string()).collect(),
            materials: b.materials.iter().map(|s| s.to_string()).collect(),
        })
        .collect()
}

pub fn weekly_overview(days: &[DaySchedule]) -> String {
    let (Some(first), Some(last)) = (days.first(), days.last()) else {
        return "No days requested.".to_string();
    };
    let activity_count: usize = days.iter().map(|d| d.planned_activities().count()).sum();
    let event_count: usize = days
        .iter()
        .map(|d| d.schedule.iter().filter(|e| e.note.is_some()).count())
        .sum();
    let subjects: Vec<String> = backup_plans(days).into_iter().map(|b| b.subject).collect();

    let mut overview = format!(
        "{} to {}: {} planned activities and {} notes or events across {} day(s).",
        first.date,
        last.date,
        activity_count,
        event_count,
        days.len()
    );
    if !subjects.is_empty() {
        overview.push_str(&format!(" Subjects: {}.", subjects.join(", ")));
    }
    overview
}
