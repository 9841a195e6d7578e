use chrono::NaiveDate;
use std::fs;
use subpack::config::Config;
use subpack::delivery::{MailTransport, OutboxTransport, OutgoingMail};
use subpack::journal::Journal;
use subpack::model::{PlannedActivity, ScheduleEntry};
use subpack::pipeline::{GenerateOptions, PackGenerator};
use subpack::schedule::{AggregateOptions, ScheduleAggregator};
use subpack::store::{PlanningSnapshot, SnapshotStore};
use tempfile::tempdir;

fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
}

fn lesson(day: &str) -> PlannedActivity {
    PlannedActivity {
        id: "a1".into(),
        owner: "teacher".into(),
        date: date(day),
        start_minute: 540,
        title: "Count to 20".into(),
        description: String::new(),
        materials: None,
        subject: None,
        updated_at: None,
    }
}

const FEED: &[&str] = &[
    "BEGIN:VCALENDAR",
    "VERSION:2.0",
    "PRODID:-//subpack//tests//EN",
    "BEGIN:VEVENT",
    "UID:library",
    "DTSTAMP:20250601T000000Z",
    "SUMMARY:Library visit",
    "DTSTART:20250602T133000",
    "DTEND:20250602T140000",
    "RRULE:FREQ=WEEKLY;BYDAY=MO",
    "END:VEVENT",
    "BEGIN:VEVENT",
    "UID:sports",
    "DTSTAMP:20250601T000000Z",
    "SUMMARY:Sports day",
    "DTSTART;VALUE=DATE:20250616",
    "DTEND;VALUE=DATE:20250617",
    "END:VEVENT",
    "END:VCALENDAR",
];

#[tokio::test]
async fn calendar_feed_expands_recurring_events() {
    let store = SnapshotStore::new(PlanningSnapshot::default()).with_calendar_ics(FEED.join("\r\n"));
    let aggregator = ScheduleAggregator::new(&store);

    let monday = aggregator
        .build_day("anyone", date("2025-06-16"), AggregateOptions::default())
        .await
        .unwrap();
    assert_eq!(
        monday.schedule,
        vec![
            ScheduleEntry::note("00:00", "Sports day"),
            ScheduleEntry::note("13:30", "Library visit"),
        ]
    );

    let tuesday = aggregator
        .build_day("anyone", date("2025-06-17"), AggregateOptions::default())
        .await
        .unwrap();
    assert!(tuesday.schedule.is_empty());
}

#[tokio::test]
async fn long_running_daily_event_still_shows_up() {
    let feed = [
        "BEGIN:VCALENDAR",
        "VERSION:2.0",
        "PRODID:-//subpack//tests//EN",
        "BEGIN:VEVENT",
        "UID:bell",
        "DTSTAMP:20220101T000000Z",
        "SUMMARY:Morning bell",
        "DTSTART:20220103T083000",
        "DTEND:20220103T084000",
        "RRULE:FREQ=DAILY",
        "END:VEVENT",
        "END:VCALENDAR",
    ];
    let store = SnapshotStore::new(PlanningSnapshot::default()).with_calendar_ics(feed.join("\r\n"));
    let day = ScheduleAggregator::new(&store)
        .build_day("anyone", date("2025-06-16"), AggregateOptions::default())
        .await
        .unwrap();
    assert_eq!(day.schedule, vec![ScheduleEntry::note("08:30", "Morning bell")]);
}

#[tokio::test]
async fn open_reads_snapshot_and_tolerates_missing_files() {
    let dir = tempdir().unwrap();
    let config = Config {
        data_file: Some(dir.path().join("missing.json")),
        audit_file: Some(dir.path().join("packs.json")),
        ..Config::default()
    };
    let store = SnapshotStore::open(&config).unwrap();
    assert_eq!(store.snapshot(), &PlanningSnapshot::default());

    let data = dir.path().join("planning.json");
    let snapshot = PlanningSnapshot {
        activities: vec![lesson("2025-06-16")],
        ..PlanningSnapshot::default()
    };
    fs::write(&data, serde_json::to_string_pretty(&snapshot).unwrap()).unwrap();
    let config = Config {
        data_file: Some(data.clone()),
        ..config
    };
    let store = SnapshotStore::open(&config).unwrap();
    assert_eq!(store.snapshot().activities.len(), 1);

    fs::write(&data, "{ not json").unwrap();
    assert!(SnapshotStore::open(&config).is_err());
}

#[tokio::test]
async fn saved_packs_are_appended_to_the_audit_file() {
    let dir = tempdir().unwrap();
    let audit = dir.path().join("audit").join("packs.json");
    let store = SnapshotStore::new(PlanningSnapshot {
        activities: vec![lesson("2025-06-16")],
        ..PlanningSnapshot::default()
    })
    .with_audit_file(audit.clone());
    let generator = PackGenerator::new(
        Config::default(),
        store,
        OutboxTransport::new(dir.path().join("outbox")),
    );
    let opts = GenerateOptions {
        save_record: true,
        ..GenerateOptions::default()
    };

    let first = generator.generate("2025-06-16", 1, &opts).await.unwrap();
    let second = generator.generate("2025-06-16", 2, &opts).await.unwrap();

    let journal = Journal::load(&audit).unwrap();
    assert_eq!(journal.records.len(), 2);
    assert_eq!(Some(journal.records[0].id), first.record_id);
    assert_eq!(Some(journal.records[1].id), second.record_id);
    assert_eq!(journal.records[1].days, 2);
    assert!(generator.store().records().is_empty());
}

#[tokio::test]
async fn outbox_writes_one_message_per_mail() {
    let dir = tempdir().unwrap();
    let outbox = OutboxTransport::new(dir.path().join("outbox"));
    let mail = OutgoingMail {
        from: "plans@school.example".into(),
        to: "sub@school.example".into(),
        subject: "Substitute plan".into(),
        body: "See attached.".into(),
        attachments: Vec::new(),
    };
    outbox.send(&mail).await.unwrap();
    outbox.send(&mail).await.unwrap();

    let files: Vec<_> = fs::read_dir(outbox.dir())
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().is_some_and(|x| x == "eml"))
        .collect();
    assert_eq!(files.len(), 2);
    let raw = fs::read_to_string(&files[0]).unwrap();
    assert!(raw.contains("To: sub@school.example"));
    assert!(raw.contains("See attached."));
}

#[test]
fn config_round_trips_through_toml() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let config = Config {
        default_user: "rivera".into(),
        max_days: 10,
        data_file: Some(dir.path().join("planning.json")),
        ..Config::default()
    };
    config.save_to(&path).unwrap();
    assert_eq!(Config::load_from(&path).unwrap(), config);

    // Unset fields fall back to defaults.
    fs::write(&path, "default_user = \"lee\"\n").unwrap();
    let partial = Config::load_from(&path).unwrap();
    assert_eq!(partial.default_user, "lee");
    assert_eq!(partial.max_days, 14);

    fs::write(&path, "max_days = \"many\"\n").unwrap();
    assert!(Config::load_from(&path).is_err());
}
