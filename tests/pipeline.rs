use anyhow::{Result, anyhow};
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use std::sync::Mutex;
use subpack::config::Config;
use subpack::contacts::{ContactFormat, ContactsView};
use subpack::delivery::{MailTransport, OutgoingMail};
use subpack::model::{
    BlockKind, CalendarEvent, ClassRoutine, ContactCategory, CurriculumOutcome, PackRecord,
    PlannedActivity, Resource, ScheduleEntry, SchoolContact, StudentGoal, TeacherPreferences,
    TimeBlock,
};
use subpack::pipeline::{GenerateOptions, MaterialsRequest, MaterialsResult, PackGenerator};
use subpack::scenario::{Building, ScenarioConditions, ScenarioId, Weather};
use subpack::schedule::{AggregateOptions, ScheduleAggregator};
use subpack::store::{PlanningSnapshot, PlanningStore, SnapshotStore};
use subpack::PackError;

const OWNER: &str = "t1";

fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
}

fn activity(id: &str, day: &str, minute: i32, title: &str) -> PlannedActivity {
    PlannedActivity {
        id: id.to_string(),
        owner: OWNER.to_string(),
        date: date(day),
        start_minute: minute,
        title: title.to_string(),
        description: String::new(),
        materials: None,
        subject: None,
        updated_at: None,
    }
}

fn block(kind: BlockKind, day: &str, start: i32, end: i32, reason: &str) -> TimeBlock {
    TimeBlock {
        id: format!("{}-{}", day, start),
        owner: OWNER.to_string(),
        date: date(day),
        kind,
        start_minute: start,
        end_minute: end,
        reason: reason.to_string(),
        student: None,
    }
}

/// Lesson, assembly and pull-out on 2025-06-15.
fn june_snapshot() -> PlanningSnapshot {
    let day = date("2025-06-15");
    PlanningSnapshot {
        activities: vec![activity("a1", "2025-06-15", 540, "Count to 20")],
        events: vec![CalendarEvent {
            id: "e1".into(),
            owner: OWNER.into(),
            title: "Assembly".into(),
            start: day.and_hms_opt(9, 45, 0).unwrap(),
            end: day.and_hms_opt(10, 15, 0).unwrap(),
            all_day: false,
        }],
        blocks: vec![block(
            BlockKind::StudentPullOut,
            "2025-06-15",
            660,
            690,
            "Speech therapy",
        )],
        ..PlanningSnapshot::default()
    }
}

fn generator<T: MailTransport>(
    snapshot: PlanningSnapshot,
    transport: T,
) -> PackGenerator<SnapshotStore, T> {
    let config = Config {
        default_user: OWNER.to_string(),
        ..Config::default()
    };
    PackGenerator::new(config, SnapshotStore::new(snapshot), transport)
}

#[derive(Default)]
struct Recording {
    sent: Mutex<Vec<OutgoingMail>>,
}

impl MailTransport for Recording {
    async fn send(&self, mail: &OutgoingMail) -> Result<()> {
        self.sent.lock().unwrap().push(mail.clone());
        Ok(())
    }
}

struct Broken;

impl MailTransport for Broken {
    async fn send(&self, _mail: &OutgoingMail) -> Result<()> {
        Err(anyhow!("smtp unreachable"))
    }
}

/// Every query fails like a dropped database connection.
struct FailingStore;

impl PlanningStore for FailingStore {
    async fn activities_on(&self, _: &str, _: NaiveDate) -> Result<Vec<PlannedActivity>> {
        Err(anyhow!("connection refused"))
    }
    async fn events_on(&self, _: &str, _: NaiveDate) -> Result<Vec<CalendarEvent>> {
        Err(anyhow!("connection refused"))
    }
    async fn blocks_on(&self, _: &str, _: NaiveDate) -> Result<Vec<TimeBlock>> {
        Err(anyhow!("connection refused"))
    }
    async fn preferences(&self, _: &str) -> Result<Option<TeacherPreferences>> {
        Err(anyhow!("connection refused"))
    }
    async fn routines(&self, _: &str) -> Result<Vec<ClassRoutine>> {
        Err(anyhow!("connection refused"))
    }
    async fn goals(&self, _: &str) -> Result<Vec<StudentGoal>> {
        Err(anyhow!("connection refused"))
    }
    async fn resources_for(&self, _: &str) -> Result<Vec<Resource>> {
        Err(anyhow!("connection refused"))
    }
    async fn outcomes_for(&self, _: &[String]) -> Result<Vec<CurriculumOutcome>> {
        Err(anyhow!("connection refused"))
    }
    async fn contacts(&self, _: &str) -> Result<Vec<SchoolContact>> {
        Err(anyhow!("connection refused"))
    }
    async fn last_planning_update(&self, _: &str) -> Result<Option<DateTime<Utc>>> {
        Err(anyhow!("connection refused"))
    }
    async fn record_pack(&self, _: PackRecord) -> Result<()> {
        Err(anyhow!("connection refused"))
    }
}

#[tokio::test]
async fn merges_lesson_event_and_pull_out() {
    let store = SnapshotStore::new(june_snapshot());
    let day = ScheduleAggregator::new(&store)
        .build_day(OWNER, date("2025-06-15"), AggregateOptions::default())
        .await
        .unwrap();

    assert_eq!(
        day.schedule,
        vec![
            ScheduleEntry::activity("09:00", "Count to 20"),
            ScheduleEntry::note("09:45", "Assembly"),
        ]
    );
    assert_eq!(day.pull_outs.len(), 1);
    assert_eq!(day.pull_outs[0].time, "11:00");
    assert_eq!(day.pull_outs[0].reason, "Speech therapy");
    assert_eq!(day.overlaps, 0);
}

#[tokio::test]
async fn schedule_is_sorted_and_keeps_same_time_entries() {
    let mut snapshot = june_snapshot();
    snapshot
        .activities
        .push(activity("a2", "2025-06-15", 585, "Reading groups"));
    snapshot
        .activities
        .push(activity("a3", "2025-06-15", 480, "Morning meeting"));
    // Clamped to 23:59.
    snapshot
        .activities
        .push(activity("a4", "2025-06-15", 2000, "Late item"));
    snapshot.blocks.push(block(
        BlockKind::TeacherAbsence,
        "2025-06-15",
        780,
        900,
        "Teacher at training",
    ));

    let store = SnapshotStore::new(snapshot);
    let day = ScheduleAggregator::new(&store)
        .build_day(OWNER, date("2025-06-15"), AggregateOptions::default())
        .await
        .unwrap();

    let times: Vec<&str> = day.schedule.iter().map(|e| e.time.as_str()).collect();
    let mut sorted = times.clone();
    sorted.sort();
    assert_eq!(times, sorted);
    assert_eq!(times, vec!["08:00", "09:00", "09:45", "09:45", "13:00", "23:59"]);
    assert_eq!(day.overlaps, 1);
    assert!(day.schedule.iter().any(|e| e.note.as_deref() == Some("Teacher at training")));
}

#[tokio::test]
async fn pull_out_student_is_anonymized() {
    let mut snapshot = june_snapshot();
    snapshot.blocks[0].student = Some("Jamie Lee".into());
    let store = SnapshotStore::new(snapshot);
    let aggregator = ScheduleAggregator::new(&store);

    let named = aggregator
        .build_day(OWNER, date("2025-06-15"), AggregateOptions::default())
        .await
        .unwrap();
    assert_eq!(named.pull_outs[0].reason, "Speech therapy (Jamie Lee)");

    let anonymized = aggregator
        .build_day(
            OWNER,
            date("2025-06-15"),
            AggregateOptions {
                anonymize: true,
                ..AggregateOptions::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(anonymized.pull_outs[0].reason, "Speech therapy (J.L.)");
}

#[tokio::test]
async fn empty_day_still_renders() {
    let generator = generator(PlanningSnapshot::default(), Recording::default());
    let pack = generator
        .generate("2025-06-16", 1, &GenerateOptions::default())
        .await
        .unwrap();
    let text = pack.text();
    assert!(text.starts_with("SUBSTITUTE PLAN"));
    assert!(!text.contains("Today's Schedule"));
    assert!(!text.contains("Materials Checklist"));
    assert!(pack.delivery.is_none());
}

#[tokio::test]
async fn full_pack_has_sections_in_order() {
    let mut snapshot = june_snapshot();
    snapshot.preferences.push(TeacherPreferences {
        owner: OWNER.into(),
        teacher_name: Some("Ms. Rivera".into()),
        class_name: Some("Grade 2".into()),
        procedures: "Line up at the door after recess.".into(),
        fallback_plan: "Read aloud from the class library.".into(),
        ..TeacherPreferences::default()
    });
    snapshot.routines.push(ClassRoutine {
        owner: OWNER.into(),
        category: "Arrival".into(),
        title: "Unpack".into(),
        time_of_day: "8:30".into(),
        description: "Bags on hooks".into(),
    });
    snapshot.goals.push(StudentGoal {
        owner: OWNER.into(),
        student_name: Some("Jamie Lee".into()),
        text: "Raise hand before speaking".into(),
        active: true,
    });
    snapshot.outcomes.push(CurriculumOutcome {
        id: "o1".into(),
        code: "N1.2".into(),
        description: "Count forward to 20".into(),
        subject: "Math".into(),
        activity_ids: vec!["a1".into()],
    });

    let generator = generator(snapshot, Recording::default());
    let opts = GenerateOptions {
        anonymize: true,
        scenario: Some(ScenarioId::Lockdown),
        ..GenerateOptions::default()
    };
    let pack = generator.generate("2025-06-15", 1, &opts).await.unwrap();
    let text = pack.text();

    let order = [
        "Ms. Rivera",
        "Today's Schedule",
        "09:00  Count to 20",
        "09:45  Note: Assembly",
        "11:00  Speech therapy",
        "Classroom Procedures",
        "Class Routines",
        "Unpack (8:30) - Bags on hooks",
        "Current Student Goals",
        "J.L.: Raise hand before speaking",
        "Curriculum Outcomes",
        "N1.2 – Count forward to 20",
        "Fallback Plan",
        "Materials Checklist",
        "Emergency Procedures",
    ];
    let mut last = 0;
    for needle in order {
        let at = text[last..]
            .find(needle)
            .unwrap_or_else(|| panic!("'{}' missing or out of order in:\n{}", needle, text));
        last += at;
    }
    assert!(!text.contains("Jamie Lee"));
    assert!(!text.contains("{{"));
}

#[tokio::test]
async fn outcomes_heading_omitted_without_outcomes() {
    let generator = generator(june_snapshot(), Recording::default());
    let pack = generator
        .generate("2025-06-15", 1, &GenerateOptions::default())
        .await
        .unwrap();
    assert!(!pack.text().contains("Curriculum Outcomes"));
}

#[tokio::test]
async fn invalid_requests_are_client_errors() {
    let generator = generator(june_snapshot(), Recording::default());
    let opts = GenerateOptions::default();

    for bad in ["2025-6-15", "15/06/2025", "2025-02-30", "tomorrow"] {
        let err = generator.generate(bad, 1, &opts).await.unwrap_err();
        assert!(matches!(err, PackError::InvalidDate(_)), "{}", bad);
        assert!(err.is_client_error());
    }
    for days in [0, 15] {
        let err = generator.generate("2025-06-15", days, &opts).await.unwrap_err();
        assert!(matches!(err, PackError::InvalidDayCount { .. }));
        assert!(err.is_client_error());
    }
    let err = generator.get_scenario("earthquake", None, None).unwrap_err();
    assert!(matches!(err, PackError::UnknownScenario(_)));
}

#[tokio::test]
async fn store_failure_is_fatal() {
    let generator = PackGenerator::new(Config::default(), FailingStore, Recording::default());
    let err = generator
        .generate("2025-06-15", 1, &GenerateOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PackError::Store(_)));
    assert!(!err.is_client_error());
    assert!(err.to_string().contains("connection refused"));

    let err = generator
        .extract_contacts(None, ContactFormat::Card)
        .await
        .unwrap_err();
    assert!(matches!(err, PackError::Store(_)));
    assert!(generator.delivery().transport().sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn pack_is_mailed_with_attachments() {
    let generator = generator(june_snapshot(), Recording::default());
    let opts = GenerateOptions {
        email_to: Some("sub@school.example".into()),
        notes: Some("Fire drill at 10:30".into()),
        save_record: true,
        ..GenerateOptions::default()
    };
    let pack = generator.generate("2025-06-15", 1, &opts).await.unwrap();

    let report = pack.delivery.unwrap();
    assert!(report.sent);
    assert_eq!(report.recipient, "sub@school.example");

    let sent = generator.delivery().transport().sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    let mail = &sent[0];
    assert!(mail.body.contains("Fire drill at 10:30"));
    assert!(mail.body.contains("current student goals and class routines"));
    let names: Vec<&str> = mail.attachments.iter().map(|a| a.filename.as_str()).collect();
    assert_eq!(names, vec!["sub-plan-2025-06-15.txt", "schedule-2025-06-15.ics"]);
    assert_eq!(mail.attachments[0].data, pack.bytes);
    let ics = String::from_utf8_lossy(&mail.attachments[1].data);
    assert!(ics.contains("SUMMARY:Count to 20"));

    let records = generator.store().records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].emailed_to.as_deref(), Some("sub@school.example"));
    assert_eq!(pack.record_id, Some(records[0].id));
}

#[tokio::test]
async fn failed_delivery_still_returns_document() {
    let generator = generator(june_snapshot(), Broken);
    let opts = GenerateOptions {
        email_to: Some("sub@school.example".into()),
        save_record: true,
        ..GenerateOptions::default()
    };
    let pack = generator.generate("2025-06-15", 1, &opts).await.unwrap();
    assert!(pack.text().contains("Count to 20"));

    let report = pack.delivery.unwrap();
    assert!(!report.sent);
    assert!(report.error.unwrap().contains("smtp unreachable"));
    assert_eq!(generator.store().records()[0].emailed_to, None);
}

#[tokio::test]
async fn weekly_plan_links_subjects_across_days() {
    let snapshot = PlanningSnapshot {
        activities: vec![
            activity("a1", "2025-06-16", 540, "Addition Practice"),
            activity("a2", "2025-06-16", 600, "Reading groups"),
            activity("b1", "2025-06-17", 540, "Subtraction Practice"),
            activity("b2", "2025-06-17", 660, "Science project"),
        ],
        ..PlanningSnapshot::default()
    };
    let generator = generator(snapshot, Recording::default());
    let plan = generator
        .extract_weekly("2025-06-16", 3, &GenerateOptions::default())
        .await
        .unwrap();

    assert_eq!(plan.days.len(), 3);
    assert_eq!(plan.end_date, date("2025-06-18"));
    assert_eq!(plan.continuity_notes.len(), 3);

    let first = &plan.continuity_notes[0];
    assert!(first.connections.is_empty());
    assert_eq!(first.preparations.len(), 1);

    let second = &plan.continuity_notes[1];
    assert_eq!(
        second.connections,
        vec![r#"Mathematics: Continue from "Addition Practice" to "Subtraction Practice""#]
    );
    assert!(second.preparations.iter().any(|p| p.contains("projects")));

    // Empty third day: no activity, no notes.
    assert!(plan.continuity_notes[2].preparations.is_empty());

    let subjects: Vec<&str> = plan
        .emergency_backup_plans
        .iter()
        .map(|b| b.subject.as_str())
        .collect();
    assert_eq!(subjects, vec!["Mathematics", "Language Arts", "Science"]);
    assert!(plan.weekly_overview.contains("4 planned activities"));
}

#[tokio::test]
async fn materials_from_explicit_list_are_deduplicated() {
    let mut lesson = activity("a1", "2025-06-15", 540, "Measuring lengths");
    lesson.materials = Some("Ruler, ruler , worksheet".into());
    lesson.subject = Some("Math".into());
    let snapshot = PlanningSnapshot {
        activities: vec![lesson],
        resources: vec![Resource {
            id: "r1".into(),
            activity_id: "a1".into(),
            title: "Length worksheet".into(),
            kind: "worksheet".into(),
            filename: Some("length.pdf".into()),
            url: None,
        }],
        ..PlanningSnapshot::default()
    };
    let generator = generator(snapshot, Recording::default());
    let result = generator
        .extract_materials(&MaterialsRequest::Day("2025-06-15".into()), None)
        .await
        .unwrap();
    let MaterialsResult::Day(materials) = result else {
        panic!("expected a single day");
    };

    let rulers = materials
        .all_materials
        .iter()
        .filter(|m| m.normalized_name() == "ruler")
        .count();
    assert_eq!(rulers, 1);
    let sheet = materials
        .all_materials
        .iter()
        .find(|m| m.name == "Length worksheet")
        .unwrap();
    assert_eq!(sheet.location.as_deref(), Some("length.pdf"));
    assert_eq!(sheet.quantity.as_deref(), Some("One per student"));
    assert!(materials.all_materials.iter().any(|m| m.name == "Math manipulatives"));
    assert_eq!(materials.summary.total_items, materials.all_materials.len());

    let range = generator
        .extract_materials(
            &MaterialsRequest::Range {
                start: "2025-06-15".into(),
                days: 2,
            },
            None,
        )
        .await
        .unwrap();
    let MaterialsResult::Range(days) = range else {
        panic!("expected a range");
    };
    assert_eq!(days.len(), 2);
    assert!(days[1].materials.is_empty());
}

#[tokio::test]
async fn scenario_precedence_and_triggers() {
    let generator = generator(PlanningSnapshot::default(), Recording::default());
    let conditions = ScenarioConditions {
        building: Some(Building::Emergency),
        weather: Some(Weather::Severe),
        ..ScenarioConditions::default()
    };
    let selection = generator.extract_scenarios(Some(&conditions));
    assert_eq!(selection.recommended_scenario.id, ScenarioId::Lockdown);
    assert_eq!(selection.triggers, vec!["building: emergency", "weather: severe"]);
    assert_eq!(selection.scenarios.len(), 5);

    let none = generator.extract_scenarios(None);
    assert_eq!(none.recommended_scenario.id, ScenarioId::GeneralEmergency);
    assert!(none.triggers.is_empty());

    let content = generator
        .get_scenario("severe_weather", Some("Ms. Rivera"), None)
        .unwrap();
    assert!(content.generated_content.contains("Ms. Rivera"));
    assert!(content.generated_content.contains("[Class Name]"));
}

#[tokio::test]
async fn auto_detect_uses_recent_planning() {
    let mut lesson = activity("a1", "2025-06-16", 540, "Count to 20");
    lesson.updated_at = Some(Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap());
    let snapshot = PlanningSnapshot {
        activities: vec![lesson],
        ..PlanningSnapshot::default()
    };
    let generator = generator(snapshot, Recording::default());

    // Wednesday mornings, local time.
    let soon = Local.with_ymd_and_hms(2025, 6, 18, 10, 0, 0).unwrap();
    let later = Local.with_ymd_and_hms(2025, 7, 30, 10, 0, 0).unwrap();
    let weekend = Local.with_ymd_and_hms(2025, 7, 26, 10, 0, 0).unwrap();

    let s = generator.auto_detect_scenario_at(None, soon).await.unwrap();
    assert_eq!(s.id, ScenarioId::GeneralEmergency);
    let s = generator.auto_detect_scenario_at(None, later).await.unwrap();
    assert_eq!(s.id, ScenarioId::StaffShortage);
    let s = generator.auto_detect_scenario_at(None, weekend).await.unwrap();
    assert_eq!(s.id, ScenarioId::GeneralEmergency);
}

#[tokio::test]
async fn contacts_in_every_format() {
    let contact = |role: &str, category, emergency| SchoolContact {
        owner: OWNER.into(),
        role: role.into(),
        name: None,
        phone: "555-0100".into(),
        extension: None,
        availability: None,
        category,
        emergency,
    };
    let snapshot = PlanningSnapshot {
        contacts: vec![
            contact("Nurse", ContactCategory::Health, false),
            contact("Principal", ContactCategory::Administration, true),
            contact("Librarian", ContactCategory::Support, false),
        ],
        preferences: vec![TeacherPreferences {
            owner: OWNER.into(),
            emergency_contacts: "Buddy teacher: Room 12".into(),
            ..TeacherPreferences::default()
        }],
        ..PlanningSnapshot::default()
    };
    let generator = generator(snapshot, Recording::default());

    let ContactsView::Organized(groups) = generator
        .extract_contacts(None, ContactFormat::Organized)
        .await
        .unwrap()
    else {
        panic!("expected groups");
    };
    let headings: Vec<&str> = groups.iter().map(|g| g.heading).collect();
    assert_eq!(headings, vec!["Administration", "Health", "Support Staff"]);

    let ContactsView::Emergency(urgent) = generator
        .extract_contacts(None, ContactFormat::Emergency)
        .await
        .unwrap()
    else {
        panic!("expected contacts");
    };
    let roles: Vec<&str> = urgent.iter().map(|c| c.role.as_str()).collect();
    assert_eq!(roles, vec!["Nurse", "Principal"]);

    let ContactsView::Formatted(text) = generator
        .extract_contacts(None, ContactFormat::Formatted)
        .await
        .unwrap()
    else {
        panic!("expected text");
    };
    assert!(text.ends_with("Buddy teacher: Room 12"));
}

#[tokio::test]
async fn reminder_only_for_upcoming_absence() {
    let snapshot = PlanningSnapshot {
        blocks: vec![block(
            BlockKind::TeacherAbsence,
            "2025-06-17",
            480,
            930,
            "Conference",
        )],
        preferences: vec![TeacherPreferences {
            owner: OWNER.into(),
            email: Some("rivera@school.example".into()),
            ..TeacherPreferences::default()
        }],
        ..PlanningSnapshot::default()
    };
    let generator = generator(snapshot, Recording::default());

    let report = generator
        .send_reminder(None, None, date("2025-06-16"))
        .await
        .unwrap()
        .unwrap();
    assert!(report.sent);
    assert_eq!(report.recipient, "rivera@school.example");

    let nothing = generator
        .send_reminder(None, None, date("2025-06-17"))
        .await
        .unwrap();
    assert!(nothing.is_none());

    let sent = generator.delivery().transport().sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].body.contains("Conference"));
}
