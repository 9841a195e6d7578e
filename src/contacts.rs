// File: ./src/contacts.rs
// Read-only projections over the school contact list.
use crate::model::{Contact, ContactCategory, SchoolContact};
use serde::Serialize;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ContactFormat {
    Organized,
    Emergency,
    Card,
    Formatted,
}

impl FromStr for ContactFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "organized" => Ok(ContactFormat::Organized),
            "emergency" => Ok(ContactFormat::Emergency),
            "card" => Ok(ContactFormat::Card),
            "formatted" => Ok(ContactFormat::Formatted),
            other => Err(format!("unknown contact format '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactGroup {
    pub category: ContactCategory,
    pub heading: &'static str,
    pub contacts: Vec<Contact>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactCard {
    pub title: String,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ContactsView {
    Organized(Vec<ContactGroup>),
    Emergency(Vec<Contact>),
    Card(ContactCard),
    Formatted(String),
}

#[derive(Debug, Clone, Default)]
pub struct ContactDirectory {
    contacts: Vec<SchoolContact>,
    /// Free text the teacher keeps in their preferences.
    notes: Option<String>,
}

impl ContactDirectory {
    pub fn new(contacts: Vec<SchoolContact>) -> Self {
        Self {
            contacts,
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        let notes = notes.into();
        if !notes.trim().is_empty() {
            self.notes = Some(notes);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty() && self.notes.is_none()
    }

    /// Non-empty groups in fixed category order; stored order within a group.
    pub fn organized(&self) -> Vec<ContactGroup> {
        ContactCategory::ORDER
            .iter()
            .map(|&category| ContactGroup {
                category,
                heading: category.heading(),
                contacts: self
                    .contacts
                    .iter()
                    .filter(|c| c.category == category)
                    .map(to_contact)
                    .collect(),
            })
            .filter(|g| !g.contacts.is_empty())
            .collect()
    }

    pub fn emergency(&self) -> Vec<Contact> {
        self.contacts
            .iter()
            .filter(|c| is_emergency(c))
            .map(to_contact)
            .collect()
    }

    pub fn card(&self) -> ContactCard {
        let lines = self
            .emergency()
            .into_iter()
            .map(|c| match &c.name {
                Some(name) => format!("{}: {} {}", c.role, name, c.number),
                None => format!("{}: {}", c.role, c.number),
            })
            .collect();
        ContactCard {
            title: "Emergency Contacts".to_string(),
            lines,
        }
    }

    /// Prose block embedded in the rendered pack. Empty when there is
    /// nothing on record.
    pub fn formatted(&self) -> String {
        let mut out = String::new();
        for group in self.organized() {
            out.push_str(group.heading);
            out.push('\n');
            for c in &group.contacts {
                let who = match &c.name {
                    Some(name) => format!("{} ({})", c.role, name),
                    None => c.role.clone(),
                };
                out.push_str(&format!("  {}: {}, {}\n", who, c.number, c.when));
            }
        }
        if let Some(notes) = &self.notes {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(notes.trim());
            out.push('\n');
        }
        out.trim_end().to_string()
    }

    pub fn view(&self, format: ContactFormat) -> ContactsView {
        match format {
            ContactFormat::Organized => ContactsView::Organized(self.organized()),
            ContactFormat::Emergency => ContactsView::Emergency(self.emergency()),
            ContactFormat::Card => ContactsView::Card(self.card()),
            ContactFormat::Formatted => ContactsView::Formatted(self.formatted()),
        }
    }
}

fn is_emergency(c: &SchoolContact) -> bool {
    c.emergency
        || matches!(
            c.category,
            ContactCategory::Health | ContactCategory::EmergencyServices
        )
}

fn to_contact(c: &SchoolContact) -> Contact {
    let number = match &c.extension {
        Some(ext) if !ext.is_empty() => format!("{} ext. {}", c.phone, ext),
        _ => c.phone.clone(),
    };
    let when = c.availability.clone().unwrap_or_else(|| {
        if c.category == ContactCategory::EmergencyServices {
            "Any time".to_string()
        } else {
            "School hours".to_string()
        }
    });
    Contact {
        role: c.role.clone(),
        name: c.name.clone(),
        number,
        when,
    }
}
