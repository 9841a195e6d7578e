// File: ./src/pipeline.rs
//! Boundary operations of the pack generator.
//!
//! Every request is validated before any store call. Missing data yields
//! empty sections, store failures abort the request as [`PackError::Store`],
//! and delivery failures only show up in the returned report.
use crate::config::Config;
use crate::contacts::{ContactDirectory, ContactFormat, ContactsView};
use crate::continuity;
use crate::delivery::{DeliveryReport, DeliveryService, MailTransport, PackSummary};
use crate::error::{PackError, PackResult};
use crate::materials::{DatedMaterials, ExtractedMaterials, MaterialExtractor};
use crate::model::adapter::day_schedule_to_ics;
use crate::model::{PackRecord, StudentGoal, WeeklyPlan, initials};
use crate::render::{DocumentRenderer, PackContent};
use crate::scenario::{self, EmergencyScenario, ScenarioConditions, ScenarioId, ScenarioSelection};
use crate::schedule::{AggregateOptions, ScheduleAggregator};
use crate::store::PlanningStore;
use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, error, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateOptions {
    pub include_goals: bool,
    pub include_routines: bool,
    pub include_plans: bool,
    pub anonymize: bool,
    pub user_id: Option<String>,
    pub email_to: Option<String>,
    pub notes: Option<String>,
    pub save_record: bool,
    /// Emergency procedures appended to the pack.
    pub scenario: Option<ScenarioId>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            include_goals: true,
            include_routines: true,
            include_plans: true,
            anonymize: false,
            user_id: None,
            email_to: None,
            notes: None,
            save_record: false,
            scenario: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeneratedPack {
    pub date: NaiveDate,
    pub days: u32,
    pub bytes: Vec<u8>,
    pub delivery: Option<DeliveryReport>,
    pub record_id: Option<uuid::Uuid>,
}

impl GeneratedPack {
    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaterialsRequest {
    Day(String),
    Range { start: String, days: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MaterialsResult {
    Day(ExtractedMaterials),
    Range(Vec<DatedMaterials>),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioContent {
    pub scenario: &'static EmergencyScenario,
    pub generated_content: String,
}

/// Strict `YYYY-MM-DD`, and the date must exist.
pub fn parse_date(raw: &str) -> PackResult<NaiveDate> {
    let bytes = raw.as_bytes();
    let shaped = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shaped {
        return Err(PackError::InvalidDate(raw.to_string()));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| PackError::InvalidDate(raw.to_string()))
}

pub struct PackGenerator<S, T> {
    config: Config,
    store: S,
    delivery: DeliveryService<T>,
    renderer: DocumentRenderer,
}

impl<S: PlanningStore, T: MailTransport> PackGenerator<S, T> {
    pub fn new(config: Config, store: S, transport: T) -> Self {
        let delivery = DeliveryService::new(transport, config.mail_from.clone());
        Self {
            config,
            store,
            delivery,
            renderer: DocumentRenderer::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn delivery(&self) -> &DeliveryService<T> {
        &self.delivery
    }

    fn owner<'o>(&'o self, user_id: Option<&'o str>) -> &'o str {
        user_id.unwrap_or(&self.config.default_user)
    }

    fn check_days(&self, days: u32) -> PackResult<u32> {
        if days == 0 || days > self.config.max_days {
            return Err(PackError::InvalidDayCount {
                days,
                max: self.config.max_days,
            });
        }
        Ok(days)
    }

    pub async fn generate(
        &self,
        date: &str,
        days: u32,
        opts: &GenerateOptions,
    ) -> PackResult<GeneratedPack> {
        let start = parse_date(date)?;
        let days = self.check_days(days)?;
        let owner = self.owner(opts.user_id.as_deref());
        info!(owner, %start, days, "generating substitute pack");

        let content = self
            .collect(owner, start, days, opts)
            .await
            .map_err(|e| store_error(owner, e))?;
        let bytes = self.renderer.render_bytes(&content)?;

        let mut delivery = None;
        if let Some(to) = opts.email_to.as_deref() {
            let summary = PackSummary {
                date: Some(start),
                days,
                teacher_name: content.teacher_name.as_deref(),
                include_goals: opts.include_goals,
                include_routines: opts.include_routines,
                notes: opts.notes.as_deref(),
            };
            let ics = content.today.as_ref().map(day_schedule_to_ics);
            let mail = self.delivery.compose_pack(to, &summary, &bytes, ics);
            delivery = Some(self.delivery.deliver(&mail).await);
        }

        let mut record_id = None;
        if opts.save_record {
            let record = PackRecord {
                id: uuid::Uuid::new_v4(),
                owner: owner.to_string(),
                date: start,
                days,
                generated_at: Utc::now(),
                emailed_to: delivery
                    .as_ref()
                    .filter(|d| d.sent)
                    .map(|d| d.recipient.clone()),
            };
            let id = record.id;
            self.store
                .record_pack(record)
                .await
                .map_err(|e| store_error(owner, e))?;
            record_id = Some(id);
        }

        Ok(GeneratedPack {
            date: start,
            days,
            bytes,
            delivery,
            record_id,
        })
    }

    async fn collect(
        &self,
        owner: &str,
        start: NaiveDate,
        days: u32,
        opts: &GenerateOptions,
    ) -> anyhow::Result<PackContent> {
        let aggregate = AggregateOptions {
            include_plans: opts.include_plans,
            anonymize: opts.anonymize,
            ..AggregateOptions::default()
        };
        let schedules = ScheduleAggregator::new(&self.store)
            .build_days(owner, start, days, aggregate, self.config.day_concurrency)
            .await?;

        let routines = async {
            if opts.include_routines {
                self.store.routines(owner).await
            } else {
                Ok(Vec::new())
            }
        };
        let goals = async {
            if opts.include_goals {
                self.store.goals(owner).await
            } else {
                Ok(Vec::new())
            }
        };
        let outcomes = async {
            if !opts.include_plans {
                return Ok::<_, anyhow::Error>(Vec::new());
            }
            let ids: Vec<String> = self
                .store
                .activities_on(owner, start)
                .await?
                .into_iter()
                .map(|a| a.id)
                .collect();
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            self.store.outcomes_for(&ids).await
        };
        let materials = async {
            if opts.include_plans {
                MaterialExtractor::new(&self.store)
                    .extract_day(owner, start)
                    .await
                    .map(Some)
            } else {
                Ok(None)
            }
        };
        let (prefs, contacts, routines, goals, outcomes, materials) = futures::try_join!(
            self.store.preferences(owner),
            self.store.contacts(owner),
            routines,
            goals,
            outcomes,
            materials,
        )?;
        let prefs = prefs.unwrap_or_default();

        let goals = if opts.anonymize {
            goals.into_iter().map(anonymize_goal).collect()
        } else {
            goals
        };
        let continuity = if schedules.len() > 1 {
            continuity::analyze(&schedules)
        } else {
            Vec::new()
        };
        let scenario = opts.scenario.map(|id| {
            scenario::generate_content(
                scenario::scenario(id),
                prefs.teacher_name.as_deref(),
                prefs.class_name.as_deref(),
                Local::now().naive_local(),
            )
        });
        let emergency_contacts = ContactDirectory::new(contacts)
            .with_notes(prefs.emergency_contacts.clone())
            .formatted();

        let mut schedules = schedules.into_iter();
        let today = schedules.next();
        debug!(owner, %start, "pack content collected");
        Ok(PackContent {
            date: Some(start),
            teacher_name: prefs.teacher_name,
            class_name: prefs.class_name,
            today,
            upcoming: schedules.collect(),
            procedures: prefs.procedures,
            student_notes: prefs.student_notes,
            emergency_contacts,
            routines,
            goals,
            outcomes,
            fallback_plan: prefs.fallback_plan,
            materials,
            continuity,
            scenario,
        })
    }

    pub async fn extract_weekly(
        &self,
        start: &str,
        days: u32,
        opts: &GenerateOptions,
    ) -> PackResult<WeeklyPlan> {
        let start = parse_date(start)?;
        let days = self.check_days(days)?;
        let owner = self.owner(opts.user_id.as_deref());
        let aggregate = AggregateOptions {
            include_plans: opts.include_plans,
            anonymize: opts.anonymize,
            ..AggregateOptions::default()
        };
        let schedules = ScheduleAggregator::new(&self.store)
            .build_days(owner, start, days, aggregate, self.config.day_concurrency)
            .await
            .map_err(|e| store_error(owner, e))?;

        Ok(WeeklyPlan {
            start_date: start,
            end_date: start + Duration::days(i64::from(days) - 1),
            weekly_overview: continuity::weekly_overview(&schedules),
            continuity_notes: continuity::analyze(&schedules),
            emergency_backup_plans: continuity::backup_plans(&schedules),
            days: schedules,
        })
    }

    pub async fn extract_materials(
        &self,
        request: &MaterialsRequest,
        user_id: Option<&str>,
    ) -> PackResult<MaterialsResult> {
        let owner = self.owner(user_id);
        let extractor = MaterialExtractor::new(&self.store);
        match request {
            MaterialsRequest::Day(date) => {
                let date = parse_date(date)?;
                extractor
                    .extract_day(owner, date)
                    .await
                    .map(MaterialsResult::Day)
                    .map_err(|e| store_error(owner, e))
            }
            MaterialsRequest::Range { start, days } => {
                let start = parse_date(start)?;
                let days = self.check_days(*days)?;
                extractor
                    .extract_range(owner, start, days)
                    .await
                    .map(MaterialsResult::Range)
                    .map_err(|e| store_error(owner, e))
            }
        }
    }

    pub fn extract_scenarios(&self, conditions: Option<&ScenarioConditions>) -> ScenarioSelection {
        scenario::select(conditions)
    }

    pub fn get_scenario(
        &self,
        id: &str,
        teacher_name: Option<&str>,
        class_name: Option<&str>,
    ) -> PackResult<ScenarioContent> {
        let scenario = scenario::get_scenario_by_id(id)
            .ok_or_else(|| PackError::UnknownScenario(id.to_string()))?;
        Ok(ScenarioContent {
            scenario,
            generated_content: scenario::generate_content(
                scenario,
                teacher_name,
                class_name,
                Local::now().naive_local(),
            ),
        })
    }

    pub async fn auto_detect_scenario(
        &self,
        user_id: Option<&str>,
    ) -> PackResult<&'static EmergencyScenario> {
        self.auto_detect_scenario_at(user_id, Local::now()).await
    }

    pub async fn auto_detect_scenario_at(
        &self,
        user_id: Option<&str>,
        now: DateTime<Local>,
    ) -> PackResult<&'static EmergencyScenario> {
        let owner = self.owner(user_id);
        let last = self
            .store
            .last_planning_update(owner)
            .await
            .map_err(|e| store_error(owner, e))?;
        let window = Duration::days(self.config.recent_planning_days);
        let recent = last.is_some_and(|t| now.with_timezone(&Utc) - t <= window);
        let id = scenario::auto_detect(now.naive_local(), recent);
        debug!(owner, recent, scenario = %id, "auto-detected scenario");
        Ok(scenario::scenario(id))
    }

    pub async fn extract_contacts(
        &self,
        user_id: Option<&str>,
        format: ContactFormat,
    ) -> PackResult<ContactsView> {
        let owner = self.owner(user_id);
        let (contacts, prefs) =
            futures::try_join!(self.store.contacts(owner), self.store.preferences(owner))
                .map_err(|e| store_error(owner, e))?;
        let mut directory = ContactDirectory::new(contacts);
        if let Some(p) = prefs {
            directory = directory.with_notes(p.emergency_contacts);
        }
        Ok(directory.view(format))
    }

    /// Sends the prep reminder for an absence `reminder_lead_days` after
    /// `today`. The recipient defaults to the teacher's own address.
    pub async fn send_reminder(
        &self,
        user_id: Option<&str>,
        to: Option<&str>,
        today: NaiveDate,
    ) -> PackResult<Option<DeliveryReport>> {
        let owner = self.owner(user_id);
        let target = today + Duration::days(i64::from(self.config.reminder_lead_days));
        let recipient = match to {
            Some(to) => Some(to.to_string()),
            None => self
                .store
                .preferences(owner)
                .await
                .map_err(|e| store_error(owner, e))?
                .and_then(|p| p.email),
        };
        let Some(recipient) = recipient else {
            info!(owner, "no reminder recipient on record");
            return Ok(None);
        };
        self.delivery
            .remind(&self.store, owner, target, &recipient)
            .await
            .map_err(|e| store_error(owner, e))
    }
}

fn anonymize_goal(mut goal: StudentGoal) -> StudentGoal {
    goal.student_name = goal.student_name.map(|n| initials(&n));
    goal
}

fn store_error(owner: &str, e: anyhow::Error) -> PackError {
    error!(owner, error = %format!("{:#}", e), "planning store failed");
    PackError::Store(e)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_shape_is_strict() {
        assert!(parse_date("2025-06-15").is_ok());
        assert!(parse_date("2025-6-15").is_err());
        assert!(parse_date("2025/06/15").is_err());
        assert!(parse_date("2025-02-30").is_err());
        assert!(parse_date(" 2025-06-15").is_err());
        assert!(parse_date("").is_err());
    }
}
