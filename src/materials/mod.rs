// File: ./src/materials/mod.rs
//! Infers the material list a substitute needs for a day.
//!
//! Four sources are unioned per activity, in this order: linked resources,
//! a keyword scan of title and description, the teacher's explicit
//! materials field, and a subject baseline. Items are then deduplicated by
//! normalized name, keeping the first occurrence.
pub mod rules;

use crate::model::time::minutes_to_time;
use crate::model::{
    MaterialCategory, MaterialItem, MaterialPriority, MaterialSource, PlannedActivity, Resource,
};
use crate::store::PlanningStore;
use anyhow::Result;
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSlotMaterials {
    pub time: String,
    pub activity: String,
    pub materials: Vec<MaterialItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MaterialsByCategory {
    pub physical: Vec<MaterialItem>,
    pub digital: Vec<MaterialItem>,
    pub printable: Vec<MaterialItem>,
    pub supplies: Vec<MaterialItem>,
    pub equipment: Vec<MaterialItem>,
}

impl MaterialsByCategory {
    pub fn get(&self, category: MaterialCategory) -> &[MaterialItem] {
        match category {
            MaterialCategory::Physical => &self.physical,
            MaterialCategory::Digital => &self.digital,
            MaterialCategory::Printable => &self.printable,
            MaterialCategory::Supplies => &self.supplies,
            MaterialCategory::Equipment => &self.equipment,
        }
    }

    fn bucket_mut(&mut self, category: MaterialCategory) -> &mut Vec<MaterialItem> {
        match category {
            MaterialCategory::Physical => &mut self.physical,
            MaterialCategory::Digital => &mut self.digital,
            MaterialCategory::Printable => &mut self.printable,
            MaterialCategory::Supplies => &mut self.supplies,
            MaterialCategory::Equipment => &mut self.equipment,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialAlternative {
    pub material: String,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialSummary {
    pub total_items: usize,
    pub essential: usize,
    pub recommended: usize,
    pub optional: usize,
    pub estimated_setup_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedMaterials {
    pub date: NaiveDate,
    pub by_time_slot: Vec<TimeSlotMaterials>,
    pub by_category: MaterialsByCategory,
    /// Deduplicated across the whole day.
    pub all_materials: Vec<MaterialItem>,
    pub setup_instructions: Vec<String>,
    pub alternatives: Vec<MaterialAlternative>,
    pub summary: MaterialSummary,
}

impl ExtractedMaterials {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            by_time_slot: Vec::new(),
            by_category: MaterialsByCategory::default(),
            all_materials: Vec::new(),
            setup_instructions: Vec::new(),
            alternatives: Vec::new(),
            summary: MaterialSummary::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.all_materials.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatedMaterials {
    pub date: NaiveDate,
    pub materials: ExtractedMaterials,
}

/// Keeps the first item for each normalized name.
pub fn dedupe(items: Vec<MaterialItem>) -> Vec<MaterialItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.normalized_name()))
        .collect()
}

/// Sum of per-category weights, rounded, never negative.
pub fn estimate_setup_minutes(items: &[MaterialItem]) -> u32 {
    let total: f64 = items.iter().map(|i| i.category.setup_weight()).sum();
    total.round().max(0.0) as u32
}

pub fn categorize_item(name: &str) -> MaterialCategory {
    rules::ITEM_RULES
        .first_match(name)
        .copied()
        .unwrap_or(MaterialCategory::Physical)
}

pub fn categorize_resource(resource: &Resource) -> MaterialCategory {
    let text = format!(
        "{} {}",
        resource.kind,
        resource.filename.as_deref().unwrap_or("")
    );
    rules::RESOURCE_RULES
        .first_match(&text)
        .copied()
        .unwrap_or(MaterialCategory::Supplies)
}

/// Materials for one activity, deduplicated.
pub fn extract_for_activity(activity: &PlannedActivity, resources: &[Resource]) -> Vec<MaterialItem> {
    let mut items = Vec::new();

    for r in resources {
        let mut item = MaterialItem::new(
            &r.title,
            categorize_resource(r),
            MaterialPriority::Essential,
            MaterialSource::Resource,
        );
        item.location = r.url.clone().or_else(|| r.filename.clone());
        items.push(item);
    }

    let text = format!("{} {}", activity.title, activity.description);
    for inferred in rules::TEXT_RULES.all_matches(&text) {
        items.push(MaterialItem::new(
            inferred.name,
            inferred.category,
            MaterialPriority::Recommended,
            MaterialSource::Inferred,
        ));
    }

    if let Some(list) = &activity.materials {
        for token in list.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            items.push(MaterialItem::new(
                token,
                categorize_item(token),
                MaterialPriority::Essential,
                MaterialSource::Activity,
            ));
        }
    }

    let subject_items = activity
        .subject
        .as_deref()
        .and_then(|s| rules::SUBJECT_RULES.first_match(s))
        .copied()
        .unwrap_or(&[]);
    for b in rules::BASELINE.iter().chain(subject_items.iter()) {
        items.push(MaterialItem::new(
            b.name,
            b.category,
            b.priority,
            MaterialSource::Inferred,
        ));
    }

    dedupe(items).into_iter().map(decorate).collect()
}

fn decorate(mut item: MaterialItem) -> MaterialItem {
    match item.category {
        MaterialCategory::Printable => {
            item.quantity.get_or_insert_with(|| "One per student".to_string());
            item.preparation.get_or_insert_with(|| "Print before class".to_string());
        }
        MaterialCategory::Equipment => {
            item.preparation.get_or_insert_with(|| "Test before use".to_string());
        }
        MaterialCategory::Digital => {
            item.preparation
                .get_or_insert_with(|| "Check that it opens on the classroom device".to_string());
        }
        _ => {}
    }
    item.alternatives = rules::alternatives_for(&item.normalized_name())
        .iter()
        .map(|s| s.to_string())
        .collect();
    item
}

/// Groups per-activity material lists into the day-level result.
/// `slots` must already be in time order.
pub fn assemble(date: NaiveDate, slots: Vec<TimeSlotMaterials>) -> ExtractedMaterials {
    if slots.is_empty() {
        return ExtractedMaterials::empty(date);
    }
    let all_materials = dedupe(slots.iter().flat_map(|s| s.materials.clone()).collect());

    let mut by_category = MaterialsByCategory::default();
    for item in &all_materials {
        by_category.bucket_mut(item.category).push(item.clone());
    }

    let estimated_setup_minutes = estimate_setup_minutes(&all_materials);
    let summary = MaterialSummary {
        total_items: all_materials.len(),
        essential: count_priority(&all_materials, MaterialPriority::Essential),
        recommended: count_priority(&all_materials, MaterialPriority::Recommended),
        optional: count_priority(&all_materials, MaterialPriority::Optional),
        estimated_setup_minutes,
    };

    let alternatives = all_materials
        .iter()
        .filter(|i| !i.alternatives.is_empty())
        .map(|i| MaterialAlternative {
            material: i.name.clone(),
            options: i.alternatives.clone(),
        })
        .collect();

    ExtractedMaterials {
        date,
        by_time_slot: slots,
        setup_instructions: setup_instructions(&by_category, estimated_setup_minutes),
        by_category,
        all_materials,
        alternatives,
        summary,
    }
}

fn count_priority(items: &[MaterialItem], priority: MaterialPriority) -> usize {
    items.iter().filter(|i| i.priority == priority).count()
}

fn setup_instructions(by_category: &MaterialsByCategory, minutes: u32) -> Vec<String> {
    let mut out = Vec::new();
    for category in MaterialCategory::ALL {
        let items = by_category.get(category);
        if items.is_empty() {
            continue;
        }
        let names = items
            .iter()
            .map(|i| i.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let line = match category {
            MaterialCategory::Printable => format!("Print or copy (one per student): {}", names),
            MaterialCategory::Equipment => format!("Test before class: {}", names),
            MaterialCategory::Digital => format!("Open and check links/files: {}", names),
            MaterialCategory::Supplies => format!("Set out supplies: {}", names),
            MaterialCategory::Physical => format!("Gather: {}", names),
        };
        out.push(line);
    }
    if minutes > 0 {
        out.push(format!(
            "Allow about {} minutes for setup before students arrive.",
            minutes
        ));
    }
    out
}

pub struct MaterialExtractor<'a, S> {
    store: &'a S,
}

impl<'a, S: PlanningStore> MaterialExtractor<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub async fn extract_day(&self, owner: &str, date: NaiveDate) -> Result<ExtractedMaterials> {
        let mut activities = self.store.activities_on(owner, date).await?;
        if activities.is_empty() {
            debug!(%date, "no activities, empty material list");
            return Ok(ExtractedMaterials::empty(date));
        }
        activities.sort_by_key(|a| a.start_minute);

        let mut slots = Vec::with_capacity(activities.len());
        for activity in &activities {
            let resources = self.store.resources_for(&activity.id).await?;
            slots.push(TimeSlotMaterials {
                time: minutes_to_time(activity.start_minute),
                activity: activity.title.clone(),
                materials: extract_for_activity(activity, &resources),
            });
        }
        Ok(assemble(date, slots))
    }

    /// One result per date, in date order.
    pub async fn extract_range(
        &self,
        owner: &str,
        start: NaiveDate,
        days: u32,
    ) -> Result<Vec<DatedMaterials>> {
        let mut out = Vec::with_capacity(days as usize);
        for i in 0..days {
            let date = start + Duration::days(i64::from(i));
            out.push(DatedMaterials {
                date,
                materials: self.extract_day(owner, date).await?,
            });
        }
        Ok(out)
    }
}
