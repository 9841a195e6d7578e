// File: ./src/scenario.rs
//! Fixed catalog of emergency procedure templates and the rules that pick
//! one of them.
//!
//! The catalog is built once on first use and never mutated. Lookup by
//! [`ScenarioId`] indexes straight into it.
use crate::model::Contact;
use chrono::{Datelike, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioId {
    GeneralEmergency,
    TechnologyFailure,
    SevereWeather,
    Lockdown,
    StaffShortage,
}

impl ScenarioId {
    /// Catalog order. `CATALOG[id as usize]` relies on it.
    pub const ALL: [ScenarioId; 5] = [
        ScenarioId::GeneralEmergency,
        ScenarioId::TechnologyFailure,
        ScenarioId::SevereWeather,
        ScenarioId::Lockdown,
        ScenarioId::StaffShortage,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ScenarioId::GeneralEmergency => "general_emergency",
            ScenarioId::TechnologyFailure => "technology_failure",
            ScenarioId::SevereWeather => "severe_weather",
            ScenarioId::Lockdown => "lockdown",
            ScenarioId::StaffShortage => "staff_shortage",
        }
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScenarioId::ALL
            .into_iter()
            .find(|id| id.as_str() == s.trim())
            .ok_or_else(|| format!("unknown scenario '{}'", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioModifications {
    pub schedule: Vec<String>,
    pub activities: Vec<String>,
    pub safety: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmergencyScenario {
    pub id: ScenarioId,
    pub name: String,
    pub description: String,
    pub procedures: Vec<String>,
    pub materials: Vec<String>,
    pub contacts: Vec<Contact>,
    pub modifications: ScenarioModifications,
    /// Text with `{{TEACHER_NAME}}`, `{{CLASS_NAME}}`, `{{DATE}}` and
    /// `{{TIME}}` placeholders.
    pub template: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Weather {
    Normal,
    Severe,
    Extreme,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Technology {
    Working,
    Partial,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Staffing {
    Full,
    Short,
    Emergency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Building {
    Normal,
    Maintenance,
    Emergency,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConditions {
    pub weather: Option<Weather>,
    pub technology: Option<Technology>,
    pub staffing: Option<Staffing>,
    pub building: Option<Building>,
}

struct ConditionRule {
    scenario: ScenarioId,
    /// Trigger text when the rule applies.
    check: fn(&ScenarioConditions) -> Option<String>,
}

fn building_emergency(c: &ScenarioConditions) -> Option<String> {
    (c.building == Some(Building::Emergency)).then(|| "building: emergency".to_string())
}

fn bad_weather(c: &ScenarioConditions) -> Option<String> {
    match c.weather {
        Some(Weather::Severe) => Some("weather: severe".to_string()),
        Some(Weather::Extreme) => Some("weather: extreme".to_string()),
        _ => None,
    }
}

fn technology_down(c: &ScenarioConditions) -> Option<String> {
    (c.technology == Some(Technology::Down)).then(|| "technology: down".to_string())
}

fn short_staffed(c: &ScenarioConditions) -> Option<String> {
    match c.staffing {
        Some(Staffing::Short) => Some("staffing: short".to_string()),
        Some(Staffing::Emergency) => Some("staffing: emergency".to_string()),
        _ => None,
    }
}

/// Highest precedence first. Every applicable rule adds a trigger; the
/// first one decides the recommendation.
static CONDITION_RULES: &[ConditionRule] = &[
    ConditionRule {
        scenario: ScenarioId::Lockdown,
        check: building_emergency,
    },
    ConditionRule {
        scenario: ScenarioId::SevereWeather,
        check: bad_weather,
    },
    ConditionRule {
        scenario: ScenarioId::TechnologyFailure,
        check: technology_down,
    },
    ConditionRule {
        scenario: ScenarioId::StaffShortage,
        check: short_staffed,
    },
];

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioSelection {
    pub scenarios: &'static [EmergencyScenario],
    pub triggers: Vec<String>,
    pub recommended_scenario: &'static EmergencyScenario,
}

pub fn catalog() -> &'static [EmergencyScenario] {
    CATALOG.as_slice()
}

pub fn scenario(id: ScenarioId) -> &'static EmergencyScenario {
    &CATALOG[id as usize]
}

pub fn get_scenario_by_id(id: &str) -> Option<&'static EmergencyScenario> {
    id.parse::<ScenarioId>().ok().map(scenario)
}

pub fn recommend(conditions: &ScenarioConditions) -> (ScenarioId, Vec<String>) {
    let mut triggers = Vec::new();
    let mut recommended = None;
    for rule in CONDITION_RULES {
        if let Some(trigger) = (rule.check)(conditions) {
            triggers.push(trigger);
            recommended.get_or_insert(rule.scenario);
        }
    }
    (
        recommended.unwrap_or(ScenarioId::GeneralEmergency),
        triggers,
    )
}

pub fn select(conditions: Option<&ScenarioConditions>) -> ScenarioSelection {
    let (id, triggers) = match conditions {
        Some(c) => recommend(c),
        None => (ScenarioId::GeneralEmergency, Vec::new()),
    };
    ScenarioSelection {
        scenarios: catalog(),
        triggers,
        recommended_scenario: scenario(id),
    }
}

/// Picks a scenario when no conditions were supplied. Off-hours and
/// weekends get the general plan; a teacher with no recent planning
/// activity is treated as a staffing gap.
pub fn auto_detect(now: NaiveDateTime, has_recent_planning: bool) -> ScenarioId {
    let opens = NaiveTime::from_hms_opt(6, 0, 0).unwrap_or(NaiveTime::MIN);
    let closes = NaiveTime::from_hms_opt(20, 0, 0).unwrap_or(NaiveTime::MIN);
    let off_hours = now.time() < opens || now.time() > closes;
    let weekend = matches!(now.weekday(), Weekday::Sat | Weekday::Sun);
    if off_hours || weekend {
        ScenarioId::GeneralEmergency
    } else if !has_recent_planning {
        ScenarioId::StaffShortage
    } else {
        ScenarioId::GeneralEmergency
    }
}

/// Fills the scenario template. Missing names fall back to bracketed
/// placeholders a substitute can fill in by hand.
pub fn generate_content(
    scenario: &EmergencyScenario,
    teacher_name: Option<&str>,
    class_name: Option<&str>,
    now: NaiveDateTime,
) -> String {
    let date = now.format("%A, %B %-d, %Y").to_string();
    let time = now.format("%H:%M").to_string();
    fill_placeholders(&scenario.template, |key| match key {
        "TEACHER_NAME" => Some(teacher_name.unwrap_or("[Teacher Name]")),
        "CLASS_NAME" => Some(class_name.unwrap_or("[Class Name]")),
        "DATE" => Some(date.as_str()),
        "TIME" => Some(time.as_str()),
        _ => None,
    })
}

// One left-to-right pass: substituted values are never rescanned, and
// unknown `{{KEY}}` tokens are kept as they are.
fn fill_placeholders<'a>(template: &str, lookup: impl Fn(&str) -> Option<&'a str>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        match after.find("}}").and_then(|close| Some((close, lookup(&after[..close])?))) {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 2..];
            }
            None => {
                out.push_str("{{");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn contact(role: &str, number: &str, when: &str) -> Contact {
    Contact {
        role: role.to_string(),
        name: None,
        number: number.to_string(),
        when: when.to_string(),
    }
}

fn template(title: &str, steps: &[&str]) -> String {
    let mut t = format!(
        "{}\nClass: {{{{CLASS_NAME}}}}\nRegular teacher: {{{{TEACHER_NAME}}}}\nPrepared: {{{{DATE}}}} at {{{{TIME}}}}\n\n",
        title
    );
    for (i, step) in steps.iter().enumerate() {
        t.push_str(&format!("{}. {}\n", i + 1, step));
    }
    t
}

static CATALOG: LazyLock<Vec<EmergencyScenario>> = LazyLock::new(|| {
    ScenarioId::ALL.iter().map(|&id| build(id)).collect()
});

fn build(id: ScenarioId) -> EmergencyScenario {
    match id {
        ScenarioId::GeneralEmergency => {
            let procedures = [
                "Stay calm and keep students together in the classroom.",
                "Take attendance using the class list in the emergency folder.",
                "Follow instructions from the office or intercom.",
                "Do not release any student without office approval.",
            ];
            EmergencyScenario {
                id,
                name: "General Emergency".to_string(),
                description: "Default plan when the situation is unclear or no specific procedure applies.".to_string(),
                procedures: strings(&procedures),
                materials: strings(&["Emergency folder", "Class list", "First aid kit"]),
                contacts: vec![
                    contact("Main office", "Office line", "First call for anything unusual"),
                    contact("Emergency services", "911", "Immediate danger to life"),
                ],
                modifications: ScenarioModifications {
                    schedule: strings(&["Pause the current activity until the office gives the all clear"]),
                    activities: strings(&["Quiet reading or review work while waiting"]),
                    safety: strings(&["Know the nearest exit and the evacuation route posted by the door"]),
                },
                template: template("GENERAL EMERGENCY PLAN", &procedures),
            }
        }
        ScenarioId::TechnologyFailure => {
            let procedures = [
                "Switch to the printed backup copies in the substitute folder.",
                "Report the outage to the office so IT support can be contacted.",
                "Use the whiteboard for any content planned for the projector.",
                "Replace online activities with the paper alternatives listed in the plan.",
            ];
            EmergencyScenario {
                id,
                name: "Technology Failure".to_string(),
                description: "Devices, network or projector are unavailable for the day.".to_string(),
                procedures: strings(&procedures),
                materials: strings(&["Printed worksheets", "Whiteboard markers", "Textbooks"]),
                contacts: vec![
                    contact("IT support", "Via main office", "When devices or network are down"),
                    contact("Main office", "Office line", "To report the outage"),
                ],
                modifications: ScenarioModifications {
                    schedule: strings(&["Keep the same timetable; swap digital tasks for paper ones"]),
                    activities: strings(&[
                        "Read-aloud instead of video",
                        "Paper worksheets instead of online practice",
                    ]),
                    safety: strings(&["Do not let students handle faulty equipment or cables"]),
                },
                template: template("TECHNOLOGY FAILURE PLAN", &procedures),
            }
        }
        ScenarioId::SevereWeather => {
            let procedures = [
                "Move students away from windows to the designated shelter area.",
                "Take attendance once students are settled in the shelter area.",
                "Keep students seated and quiet so announcements can be heard.",
                "Stay in place until the office announces the all clear.",
            ];
            EmergencyScenario {
                id,
                name: "Severe Weather".to_string(),
                description: "Storms, tornado warnings or extreme heat and cold that keep students indoors or sheltered.".to_string(),
                procedures: strings(&procedures),
                materials: strings(&["Class list", "Flashlight", "Quiet indoor activities"]),
                contacts: vec![
                    contact("Main office", "Office line", "For shelter-in-place updates"),
                    contact("Emergency services", "911", "Injury or structural damage"),
                ],
                modifications: ScenarioModifications {
                    schedule: strings(&["Cancel outdoor recess and outdoor PE", "Dismissal may be delayed"]),
                    activities: strings(&["Indoor movement breaks", "Board games or quiet reading"]),
                    safety: strings(&["Stay away from windows and doors to the outside"]),
                },
                template: template("SEVERE WEATHER PLAN", &procedures),
            }
        }
        ScenarioId::Lockdown => {
            let procedures = [
                "Lock the classroom door and turn off the lights.",
                "Move students out of sight of the door and windows and keep them silent.",
                "Do not open the door for anyone until the all clear from administration or police.",
                "Take attendance quietly and report missing students when it is safe.",
            ];
            EmergencyScenario {
                id,
                name: "Lockdown".to_string(),
                description: "Threat inside or near the building. Overrides every other plan.".to_string(),
                procedures: strings(&procedures),
                materials: strings(&["Door key", "Class list", "Phone"]),
                contacts: vec![
                    contact("Emergency services", "911", "Immediately when a threat is seen"),
                    contact("Principal", "Office line", "Only when safe to communicate"),
                ],
                modifications: ScenarioModifications {
                    schedule: strings(&["All movement in the building stops until the all clear"]),
                    activities: strings(&["None; students remain silent and hidden"]),
                    safety: strings(&[
                        "Keep the door locked",
                        "Ignore fire alarms unless there is confirmed fire",
                    ]),
                },
                template: template("LOCKDOWN PROCEDURE", &procedures),
            }
        }
        ScenarioId::StaffShortage => {
            let procedures = [
                "Check in with the office for the current coverage plan.",
                "Use the simplified schedule and keep students in the classroom where possible.",
                "Combine with a neighboring class only if the office asks you to.",
                "Use the emergency backup activities when the planned lesson cannot run.",
            ];
            EmergencyScenario {
                id,
                name: "Staff Shortage".to_string(),
                description: "Not enough adults in the building; lessons may need to be simplified or classes combined.".to_string(),
                procedures: strings(&procedures),
                materials: strings(&["Backup activity folder", "Class list", "Independent work packets"]),
                contacts: vec![
                    contact("Main office", "Office line", "For the coverage plan"),
                    contact("Grade-level team lead", "Via main office", "When combining classes"),
                ],
                modifications: ScenarioModifications {
                    schedule: strings(&["Specials and pull-outs may be cancelled"]),
                    activities: strings(&["Independent work packets", "Review games"]),
                    safety: strings(&["Never leave students unsupervised, even briefly"]),
                },
                template: template("STAFF SHORTAGE PLAN", &procedures),
            }
        }
    }
}
