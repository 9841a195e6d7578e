// File: ./src/render.rs
//! Plain text rendering of a substitute pack.
//!
//! Sections come out in a fixed order and a section whose data is empty is
//! left out entirely, heading included.
use crate::error::{PackError, PackResult};
use crate::materials::ExtractedMaterials;
use crate::model::{
    ClassRoutine, ContinuityNote, CurriculumOutcome, DaySchedule, MaterialCategory, StudentGoal,
};
use chrono::NaiveDate;
use std::fmt::Write;

pub const SCHEDULE_HEADING: &str = "Today's Schedule";
pub const UPCOMING_HEADING: &str = "Upcoming Days";
pub const PROCEDURES_HEADING: &str = "Classroom Procedures";
pub const STUDENT_NOTES_HEADING: &str = "Student Notes";
pub const CONTACTS_HEADING: &str = "Emergency Contacts";
pub const ROUTINES_HEADING: &str = "Class Routines";
pub const GOALS_HEADING: &str = "Current Student Goals";
pub const OUTCOMES_HEADING: &str = "Curriculum Outcomes";
pub const FALLBACK_HEADING: &str = "Fallback Plan";
pub const MATERIALS_HEADING: &str = "Materials Checklist";
pub const CONTINUITY_HEADING: &str = "Continuity Notes";
pub const SCENARIO_HEADING: &str = "Emergency Procedures";

/// Everything that can appear in a pack. Empty fields are skipped.
#[derive(Debug, Clone, Default)]
pub struct PackContent {
    pub date: Option<NaiveDate>,
    pub teacher_name: Option<String>,
    pub class_name: Option<String>,
    pub today: Option<DaySchedule>,
    pub upcoming: Vec<DaySchedule>,
    pub procedures: String,
    pub student_notes: String,
    /// Pre-formatted contact block.
    pub emergency_contacts: String,
    pub routines: Vec<ClassRoutine>,
    pub goals: Vec<StudentGoal>,
    pub outcomes: Vec<CurriculumOutcome>,
    pub fallback_plan: String,
    pub materials: Option<ExtractedMaterials>,
    pub continuity: Vec<ContinuityNote>,
    /// Scenario text with placeholders already filled in.
    pub scenario: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentRenderer;

impl DocumentRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, content: &PackContent) -> PackResult<String> {
        self.write_document(content)
            .map_err(|e| PackError::Render(e.to_string()))
    }

    pub fn render_bytes(&self, content: &PackContent) -> PackResult<Vec<u8>> {
        self.render(content).map(String::into_bytes)
    }

    fn write_document(&self, c: &PackContent) -> Result<String, std::fmt::Error> {
        let mut out = String::new();
        write_title(&mut out, c)?;

        if let Some(today) = c.today.as_ref().filter(|d| !d.is_empty()) {
            heading(&mut out, SCHEDULE_HEADING)?;
            for entry in &today.schedule {
                match (&entry.activity, &entry.note) {
                    (_, Some(note)) => writeln!(out, "{}  Note: {}", entry.time, note)?,
                    (Some(activity), None) => writeln!(out, "{}  {}", entry.time, activity)?,
                    (None, None) => {}
                }
            }
            if !today.pull_outs.is_empty() {
                writeln!(out, "\nStudent pull-outs:")?;
                for p in &today.pull_outs {
                    writeln!(out, "{}  {}", p.time, p.reason)?;
                }
            }
        }

        if !c.upcoming.is_empty() {
            heading(&mut out, UPCOMING_HEADING)?;
            for day in &c.upcoming {
                writeln!(out, "{}: {}", day.date.format("%A %Y-%m-%d"), day_summary(day))?;
            }
        }

        text_section(&mut out, PROCEDURES_HEADING, &c.procedures)?;
        text_section(&mut out, STUDENT_NOTES_HEADING, &c.student_notes)?;
        text_section(&mut out, CONTACTS_HEADING, &c.emergency_contacts)?;

        if !c.routines.is_empty() {
            heading(&mut out, ROUTINES_HEADING)?;
            for (category, routines) in group_in_order(&c.routines, |r| r.category.as_str()) {
                writeln!(out, "{}:", category)?;
                for r in routines {
                    writeln!(out, "  {} ({}) - {}", r.title, r.time_of_day, r.description)?;
                }
            }
        }

        if !c.goals.is_empty() {
            heading(&mut out, GOALS_HEADING)?;
            for g in &c.goals {
                match &g.student_name {
                    Some(name) => writeln!(out, "- {}: {}", name, g.text)?,
                    None => writeln!(out, "- {}", g.text)?,
                }
            }
        }

        if !c.outcomes.is_empty() {
            heading(&mut out, OUTCOMES_HEADING)?;
            for (subject, outcomes) in group_in_order(&c.outcomes, |o| o.subject.as_str()) {
                writeln!(out, "{}:", subject)?;
                for o in outcomes {
                    writeln!(out, "  {} – {}", o.code, o.description)?;
                }
            }
        }

        text_section(&mut out, FALLBACK_HEADING, &c.fallback_plan)?;

        if let Some(materials) = c.materials.as_ref().filter(|m| !m.is_empty()) {
            write_materials(&mut out, materials)?;
        }

        let notes: Vec<&ContinuityNote> = c
            .continuity
            .iter()
            .filter(|n| !n.connections.is_empty() || !n.preparations.is_empty())
            .collect();
        if !notes.is_empty() {
            heading(&mut out, CONTINUITY_HEADING)?;
            for note in notes {
                writeln!(out, "{}:", note.day.format("%A %Y-%m-%d"))?;
                for line in note.connections.iter().chain(&note.preparations) {
                    writeln!(out, "  - {}", line)?;
                }
            }
        }

        if let Some(scenario) = c.scenario.as_deref() {
            text_section(&mut out, SCENARIO_HEADING, scenario)?;
        }

        Ok(out)
    }
}

fn write_title(out: &mut String, c: &PackContent) -> std::fmt::Result {
    writeln!(out, "SUBSTITUTE PLAN")?;
    if let Some(date) = c.date {
        writeln!(out, "{}", date.format("%A, %B %-d, %Y"))?;
    }
    if let Some(teacher) = &c.teacher_name {
        writeln!(out, "Teacher: {}", teacher)?;
    }
    if let Some(class) = &c.class_name {
        writeln!(out, "Class: {}", class)?;
    }
    Ok(())
}

fn heading(out: &mut String, title: &str) -> std::fmt::Result {
    writeln!(out, "\n{}\n{}", title, "-".repeat(title.chars().count()))
}

fn text_section(out: &mut String, title: &str, body: &str) -> std::fmt::Result {
    let body = body.trim();
    if body.is_empty() {
        return Ok(());
    }
    heading(out, title)?;
    writeln!(out, "{}", body)
}

fn write_materials(out: &mut String, m: &ExtractedMaterials) -> std::fmt::Result {
    heading(out, MATERIALS_HEADING)?;
    for category in MaterialCategory::ALL {
        let items = m.by_category.get(category);
        if items.is_empty() {
            continue;
        }
        writeln!(out, "{}:", category)?;
        for item in items {
            match &item.quantity {
                Some(q) => writeln!(out, "  [ ] {} ({})", item.name, q)?,
                None => writeln!(out, "  [ ] {}", item.name)?,
            }
        }
    }
    for line in &m.setup_instructions {
        writeln!(out, "* {}", line)?;
    }
    Ok(())
}

fn day_summary(day: &DaySchedule) -> String {
    let activities: Vec<&str> = day.planned_activities().map(|(_, a)| a).collect();
    if activities.is_empty() {
        return "No planned activities".to_string();
    }
    format!("{} activities: {}", activities.len(), activities.join(", "))
}

/// Groups by key, keeping the order in which each key first appears.
fn group_in_order<'a, T, F>(items: &'a [T], key: F) -> Vec<(&'a str, Vec<&'a T>)>
where
    F: Fn(&'a T) -> &'a str,
{
    let mut groups: Vec<(&str, Vec<&T>)> = Vec::new();
    for item in items {
        let k = key(item);
        match groups.iter_mut().find(|(g, _)| *g == k) {
            Some((_, members)) => members.push(item),
            None => groups.push((k, vec![item])),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn routine(category: &str, title: &str) -> ClassRoutine {
        ClassRoutine {
            owner: "t".into(),
            category: category.into(),
            title: title.into(),
            time_of_day: "Morning".into(),
            description: "desc".into(),
        }
    }

    #[test]
    fn groups_keep_first_occurrence_order() {
        let routines = vec![
            routine("Arrival", "Coats"),
            routine("Dismissal", "Line up"),
            routine("Arrival", "Attendance"),
        ];
        let groups = group_in_order(&routines, |r| r.category.as_str());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "Arrival");
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, "Dismissal");
    }

    #[test]
    fn empty_content_renders_only_the_title() {
        let text = DocumentRenderer::new()
            .render(&PackContent::default())
            .unwrap();
        assert_eq!(text.trim(), "SUBSTITUTE PLAN");
    }

    #[test]
    fn routine_line_format() {
        let content = PackContent {
            routines: vec![routine("Arrival", "Coats")],
            ..PackContent::default()
        };
        let text = DocumentRenderer::new().render(&content).unwrap();
        assert!(text.contains("Class Routines"));
        assert!(text.contains("Coats (Morning) - desc"));
    }
}
