use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, anyhow};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::festival::{
    Festival, Region, ResolvedFestival, default_duration, default_shopping_period,
};
use crate::resolve::{self, DaysUntil};

const BUILTIN_CALENDAR: &str = include_str!("festivals.json");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEntry {
    pub name: String,

    #[serde(default)]
    pub dates: BTreeMap<i32, String>,

    #[serde(default)]
    pub regions: Vec<Region>,

    #[serde(default = "default_duration")]
    pub duration: u32,

    #[serde(default)]
    pub category: String,

    #[serde(default = "default_shopping_period")]
    pub shopping_period: u32,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub trending_keywords: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    DaysUntil,
    Name,
    Category,
}

impl std::str::FromStr for SortKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "days_until" | "days" => Ok(Self::DaysUntil),
            "name" => Ok(Self::Name),
            "category" => Ok(Self::Category),
            other => Err(anyhow!(
                "unknown sort key: {other} (expected days_until, name or category)"
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FestivalCalendar {
    entries: BTreeMap<String, CalendarEntry>,
}

impl FestivalCalendar {
    pub fn builtin() -> anyhow::Result<Self> {
        let entries = parse_calendar(BUILTIN_CALENDAR)
            .context("builtin festival calendar is malformed")?;
        Ok(Self { entries })
    }

    #[instrument(skip(extra))]
    pub fn load(extra: Option<&Path>) -> anyhow::Result<Self> {
        let mut calendar = Self::builtin()?;
        if let Some(path) = extra {
            calendar.merge_file(path)?;
        }
        Ok(calendar)
    }

    #[instrument(skip(self))]
    pub fn merge_file(&mut self, path: &Path) -> anyhow::Result<()> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read calendar file {}", path.display()))?;
        let entries = parse_calendar(&raw)
            .with_context(|| format!("malformed calendar file {}", path.display()))?;

        info!(file = %path.display(), entries = entries.len(), "merging calendar file");

        for (key, entry) in entries {
            if self.entries.insert(key.clone(), entry).is_some() {
                debug!(key = %key, "calendar entry overridden");
            }
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&CalendarEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn festival_for_year(&self, key: &str, year: i32) -> Option<Festival> {
        self.entries
            .get(key)
            .map(|entry| project(key, entry, year))
    }

    pub fn festivals_for_location(&self, region: &Region, year: i32) -> Vec<Festival> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry_is_relevant(entry, region))
            .map(|(key, entry)| project(key, entry, year))
            .collect()
    }

    #[instrument(skip(self, today))]
    pub fn resolve_for_location(&self, region: &Region, today: NaiveDate) -> Vec<ResolvedFestival> {
        self.festivals_for_location(region, today.year())
            .into_iter()
            .map(|festival| resolve::resolve_festival(festival, today))
            .collect()
    }

    #[instrument(skip(self, today))]
    pub fn upcoming(
        &self,
        region: &Region,
        today: NaiveDate,
        days_ahead: i64,
    ) -> Vec<ResolvedFestival> {
        let mut rows: Vec<ResolvedFestival> = self
            .resolve_for_location(region, today)
            .into_iter()
            .filter(|row| {
                matches!(row.days_until, DaysUntil::Known(count) if (0..=days_ahead).contains(&count))
            })
            .collect();

        rows.sort_by_key(|row| row.days_until);
        rows
    }

    #[instrument(skip(self, today))]
    pub fn all_festivals(
        &self,
        region: &Region,
        today: NaiveDate,
        sort: SortKey,
    ) -> Vec<ResolvedFestival> {
        let mut rows = self.resolve_for_location(region, today);

        match sort {
            SortKey::DaysUntil => rows.sort_by_key(|row| row.days_until),
            SortKey::Name => rows.sort_by(|a, b| a.festival.name.cmp(&b.festival.name)),
            SortKey::Category => rows.sort_by(|a, b| {
                a.festival
                    .category
                    .cmp(&b.festival.category)
                    .then(a.days_until.cmp(&b.days_until))
            }),
        }
        rows
    }

    pub fn regions(&self) -> BTreeSet<String> {
        self.entries
            .values()
            .flat_map(|entry| entry.regions.iter())
            .map(|region| region.as_str().to_string())
            .collect()
    }

    pub fn categories(&self) -> BTreeSet<String> {
        self.entries
            .values()
            .map(|entry| entry.category.clone())
            .filter(|category| !category.is_empty())
            .collect()
    }
}

fn parse_calendar(raw: &str) -> anyhow::Result<BTreeMap<String, CalendarEntry>> {
    let doc: BTreeMap<String, serde_json::Value> = serde_json::from_str(raw)
        .context("calendar payload is not a JSON object keyed by festival")?;

    let mut entries = BTreeMap::new();
    for (key, value) in doc {
        if key.trim().is_empty() {
            return Err(anyhow!("calendar entry with an empty key"));
        }
        let entry: CalendarEntry = serde_json::from_value(value)
            .with_context(|| format!("malformed festival entry: {key}"))?;
        entries.insert(key, entry);
    }
    Ok(entries)
}

fn entry_is_relevant(entry: &CalendarEntry, region: &Region) -> bool {
    entry.regions.contains(region) || entry.regions.iter().any(Region::is_all_india)
}

fn project(key: &str, entry: &CalendarEntry, year: i32) -> Festival {
    Festival {
        key: key.to_string(),
        name: entry.name.clone(),
        date: entry.dates.get(&year).cloned().unwrap_or_default(),
        regions: entry.regions.clone(),
        is_regional: !entry.regions.iter().any(Region::is_all_india),
        duration: entry.duration,
        category: entry.category.clone(),
        shopping_period: entry.shopping_period,
        description: entry.description.clone(),
        trending_keywords: entry.trending_keywords.clone(),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::NaiveDate;
    use tempfile::tempdir;

    use super::{FestivalCalendar, SortKey};
    use crate::festival::Region;
    use crate::resolve::DaysUntil;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 1).expect("valid date")
    }

    #[test]
    fn builtin_calendar_loads() {
        let calendar = FestivalCalendar::builtin().expect("builtin calendar");
        assert!(calendar.len() > 30);

        let diwali = calendar
            .festival_for_year("diwali", 2025)
            .expect("diwali entry");
        assert_eq!(diwali.date, "2025-10-23");
        assert!(!diwali.is_regional);
        assert!(diwali.is_national());

        let durga = calendar
            .festival_for_year("durga_puja", 2025)
            .expect("durga_puja entry");
        assert!(durga.is_regional);
        assert!(durga.has_region(&Region::new("west_bengal")));
    }

    #[test]
    fn missing_year_projects_empty_date() {
        let calendar = FestivalCalendar::builtin().expect("builtin calendar");
        let diwali = calendar
            .festival_for_year("diwali", 1999)
            .expect("diwali entry");
        assert!(diwali.date.is_empty());
    }

    #[test]
    fn unknown_region_sees_national_only() {
        let calendar = FestivalCalendar::builtin().expect("builtin calendar");
        let rows = calendar.resolve_for_location(&Region::all_india(), today());

        assert!(rows.iter().all(|row| row.festival.is_national()));
        assert!(
            rows.iter()
                .any(|row| row.festival.key == "independence_day")
        );
    }

    #[test]
    fn location_region_adds_its_festivals() {
        let calendar = FestivalCalendar::builtin().expect("builtin calendar");
        let rows = calendar.resolve_for_location(&Region::new("west_bengal"), today());

        assert!(rows.iter().any(|row| row.festival.key == "durga_puja"));
        assert!(rows.iter().all(|row| row.festival.key != "navratri"));
    }

    #[test]
    fn upcoming_is_windowed_and_ascending() {
        let calendar = FestivalCalendar::builtin().expect("builtin calendar");
        let rows = calendar.upcoming(&Region::new("west_bengal"), today(), 90);

        assert_eq!(rows[0].festival.key, "teachers_day");
        assert!(rows.iter().any(|row| row.festival.key == "durga_puja"));
        assert!(rows.iter().all(|row| row.festival.key != "christmas"));

        let days: Vec<i64> = rows
            .iter()
            .filter_map(|row| row.days_until.known())
            .collect();
        let mut sorted = days.clone();
        sorted.sort_unstable();
        assert_eq!(days, sorted);
    }

    #[test]
    fn all_festivals_sorts_by_requested_key() {
        let calendar = FestivalCalendar::builtin().expect("builtin calendar");
        let region = Region::new("kerala");

        let by_name = calendar.all_festivals(&region, today(), SortKey::Name);
        let names: Vec<&str> = by_name
            .iter()
            .map(|row| row.festival.name.as_str())
            .collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);

        let by_days = calendar.all_festivals(&region, today(), SortKey::DaysUntil);
        assert!(by_days[0].days_until.is_known());
    }

    #[test]
    fn user_file_overrides_by_key() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("festivals.json");
        fs::write(
            &path,
            r#"{
                "diwali": {
                    "name": "Diwali",
                    "dates": { "2025": "2025-10-20" },
                    "regions": ["all_india"],
                    "category": "religious"
                },
                "shop_anniversary": {
                    "name": "Shop Anniversary",
                    "dates": { "2025": "2025-09-10" },
                    "regions": ["west_bengal"],
                    "category": "cultural"
                }
            }"#,
        )
        .expect("write calendar");

        let calendar = FestivalCalendar::load(Some(&path)).expect("load calendar");
        let diwali = calendar
            .festival_for_year("diwali", 2025)
            .expect("diwali entry");
        assert_eq!(diwali.date, "2025-10-20");

        let rows = calendar.resolve_for_location(&Region::new("west_bengal"), today());
        let anniversary = rows
            .iter()
            .find(|row| row.festival.key == "shop_anniversary")
            .expect("merged entry");
        assert_eq!(anniversary.days_until, DaysUntil::Known(9));
        assert_eq!(anniversary.festival.shopping_period, 15);
    }

    #[test]
    fn malformed_user_file_names_file_and_key() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("broken.json");
        fs::write(&path, r#"{ "diwali": { "dates": "nope" } }"#).expect("write calendar");

        let err = FestivalCalendar::load(Some(&path))
            .expect_err("malformed calendar must fail");
        let text = format!("{err:#}");
        assert!(text.contains("malformed calendar file"));
        assert!(text.contains("broken.json"));
        assert!(text.contains("diwali"));
    }
}
