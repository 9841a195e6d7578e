// File: ./src/delivery.rs
//! Sends finished packs and absence reminders by mail.
//!
//! A failed send never invalidates the pack: the outcome is captured in a
//! [`DeliveryReport`] that travels next to the document.
use crate::model::BlockKind;
use crate::storage::LocalStorage;
use crate::store::PlanningStore;
use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    pub sent: bool,
    pub recipient: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[allow(async_fn_in_trait)]
pub trait MailTransport {
    async fn send(&self, mail: &OutgoingMail) -> Result<()>;
}

/// Writes each mail as a MIME `.eml` file into a directory.
#[derive(Debug, Clone)]
pub struct OutboxTransport {
    dir: PathBuf,
}

impl OutboxTransport {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }
}

impl MailTransport for OutboxTransport {
    async fn send(&self, mail: &OutgoingMail) -> Result<()> {
        let name = format!(
            "{}-{}.eml",
            Utc::now().format("%Y%m%dT%H%M%S"),
            uuid::Uuid::new_v4().simple()
        );
        let path = self.dir.join(name);
        LocalStorage::atomic_write(&path, to_mime(mail))
            .with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), to = %mail.to, "mail written to outbox");
        Ok(())
    }
}

/// Attachments are text, so 8bit transfer encoding is enough.
pub fn to_mime(mail: &OutgoingMail) -> Vec<u8> {
    let boundary = format!("subpack-{}", uuid::Uuid::new_v4().simple());
    let mut out = String::new();
    out.push_str(&format!("From: {}\r\n", mail.from));
    out.push_str(&format!("To: {}\r\n", mail.to));
    out.push_str(&format!("Subject: {}\r\n", mail.subject));
    out.push_str(&format!("Date: {}\r\n", Utc::now().to_rfc2822()));
    out.push_str("MIME-Version: 1.0\r\n");
    out.push_str(&format!(
        "Content-Type: multipart/mixed; boundary=\"{}\"\r\n\r\n",
        boundary
    ));

    out.push_str(&format!("--{}\r\n", boundary));
    out.push_str("Content-Type: text/plain; charset=utf-8\r\n");
    out.push_str("Content-Transfer-Encoding: 8bit\r\n\r\n");
    out.push_str(&mail.body);
    out.push_str("\r\n");

    for a in &mail.attachments {
        out.push_str(&format!("--{}\r\n", boundary));
        out.push_str(&format!(
            "Content-Type: {}; charset=utf-8; name=\"{}\"\r\n",
            a.content_type, a.filename
        ));
        out.push_str("Content-Transfer-Encoding: 8bit\r\n");
        out.push_str(&format!(
            "Content-Disposition: attachment; filename=\"{}\"\r\n\r\n",
            a.filename
        ));
        out.push_str(&String::from_utf8_lossy(&a.data));
        out.push_str("\r\n");
    }
    out.push_str(&format!("--{}--\r\n", boundary));
    out.into_bytes()
}

/// What the pack contains, echoed in the mail body.
#[derive(Debug, Clone, Default)]
pub struct PackSummary<'a> {
    pub date: Option<NaiveDate>,
    pub days: u32,
    pub teacher_name: Option<&'a str>,
    pub include_goals: bool,
    pub include_routines: bool,
    pub notes: Option<&'a str>,
}

pub struct DeliveryService<T> {
    transport: T,
    from: String,
}

impl<T: MailTransport> DeliveryService<T> {
    pub fn new(transport: T, from: impl Into<String>) -> Self {
        Self {
            transport,
            from: from.into(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn compose_pack(
        &self,
        to: &str,
        summary: &PackSummary<'_>,
        document: &[u8],
        schedule_ics: Option<String>,
    ) -> OutgoingMail {
        let date = summary
            .date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        let subject = match summary.teacher_name {
            Some(t) => format!("Substitute plan for {} ({})", date, t),
            None => format!("Substitute plan for {}", date),
        };

        let mut body = format!(
            "Attached is the substitute plan starting {} covering {} day(s).\n",
            date, summary.days
        );
        let mut extras = Vec::new();
        if summary.include_goals {
            extras.push("current student goals");
        }
        if summary.include_routines {
            extras.push("class routines");
        }
        if !extras.is_empty() {
            body.push_str(&format!("It also includes {}.\n", extras.join(" and ")));
        }
        if let Some(notes) = summary.notes.map(str::trim).filter(|n| !n.is_empty()) {
            body.push_str(&format!("\nNotes:\n{}\n", notes));
        }

        let mut attachments = vec![Attachment {
            filename: format!("sub-plan-{}.txt", date),
            content_type: "text/plain".to_string(),
            data: document.to_vec(),
        }];
        if let Some(ics) = schedule_ics {
            attachments.push(Attachment {
                filename: format!("schedule-{}.ics", date),
                content_type: "text/calendar".to_string(),
                data: ics.into_bytes(),
            });
        }

        OutgoingMail {
            from: self.from.clone(),
            to: to.to_string(),
            subject,
            body,
            attachments,
        }
    }

    pub async fn deliver(&self, mail: &OutgoingMail) -> DeliveryReport {
        match self.transport.send(mail).await {
            Ok(()) => {
                info!(to = %mail.to, subject = %mail.subject, "mail sent");
                DeliveryReport {
                    sent: true,
                    recipient: mail.to.clone(),
                    error: None,
                }
            }
            Err(e) => {
                warn!(to = %mail.to, error = %format!("{:#}", e), "mail delivery failed");
                DeliveryReport {
                    sent: false,
                    recipient: mail.to.clone(),
                    error: Some(format!("{:#}", e)),
                }
            }
        }
    }

    /// Sends a prep reminder when the teacher has an absence on `target`.
    /// Returns `None` when there is nothing to remind about. Store errors
    /// propagate; send errors end up in the report.
    pub async fn remind<S: PlanningStore>(
        &self,
        store: &S,
        owner: &str,
        target: NaiveDate,
        to: &str,
    ) -> Result<Option<DeliveryReport>> {
        let blocks = store.blocks_on(owner, target).await?;
        let Some(absence) = blocks.iter().find(|b| b.kind == BlockKind::TeacherAbsence) else {
            return Ok(None);
        };
        let day = target.format("%A, %B %-d").to_string();
        let mail = OutgoingMail {
            from: self.from.clone(),
            to: to.to_string(),
            subject: format!("Reminder: prepare substitute plans for {}", day),
            body: format!(
                "You are marked absent on {} ({}).\n\
                 Check that lesson plans, materials and notes are up to date \
                 before the substitute pack is generated.\n",
                day, absence.reason
            ),
            attachments: Vec::new(),
        };
        Ok(Some(self.deliver(&mail).await))
    }
}
