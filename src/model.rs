use crate::calendar::HijriMonth;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SOURCE_LABEL: &str = "spa.gov.sa";
pub const DEFAULT_HISTORY_LIMIT: usize = 365;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Weekday-prefixed date in the page header.
    Header,
    /// Bare `day month year` anywhere in the rendered text.
    Text,
    /// `"date_hijri"` field embedded in the markup.
    Json,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::Header => "header",
            ExtractionMethod::Text => "text",
            ExtractionMethod::Json => "json",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ExtractedDate {
    pub day: u32,
    pub month: u32,
    pub year: u32,
    pub month_name_ar: String,
    pub month_name_en: String,
    pub method: ExtractionMethod,
}

impl ExtractedDate {
    pub fn new(day: u32, month: &HijriMonth, year: u32, method: ExtractionMethod) -> Self {
        Self {
            day,
            month: month.number,
            year,
            month_name_ar: month.name_ar.to_string(),
            month_name_en: month.name_en.to_string(),
            method,
        }
    }

    pub fn enrich(self, now: NaiveDateTime) -> HijriDate {
        HijriDate {
            day: self.day,
            month: self.month,
            year: self.year,
            month_name_ar: self.month_name_ar,
            month_name_en: self.month_name_en,
            gregorian: now.date(),
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HijriDate {
    pub day: u32,
    pub month: u32,
    pub year: u32,
    pub month_name_ar: String,
    pub month_name_en: String,
    pub gregorian: NaiveDate,
    pub updated_at: NaiveDateTime,
}

impl HijriDate {
    pub fn same_day_as(&self, other: &HijriDate) -> bool {
        self.day == other.day && self.month == other.month
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Store {
    #[serde(default)]
    pub current: Option<HijriDate>,
    #[serde(default)]
    pub history: Vec<HijriDate>,
    #[serde(default = "default_source_label")]
    pub source: String,
}

impl Store {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            current: None,
            history: Vec::new(),
            source: source.into(),
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(DEFAULT_SOURCE_LABEL)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub appended: bool,
    pub evicted: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    NotFound,
    Updated {
        date: HijriDate,
        method: ExtractionMethod,
        merge: MergeOutcome,
        history_len: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub source_url: String,
    pub dry_run: bool,
    pub outcome: SyncOutcome,
}

impl SyncReport {
    /// One-line status printed by the `sync` command.
    pub fn status_line(&self) -> String {
        match &self.outcome {
            SyncOutcome::Updated { date, .. } => {
                format!("Updated: {} {} {}", date.day, date.month_name_en, date.year)
            }
            SyncOutcome::NotFound => FAILURE_STATUS.to_string(),
        }
    }
}

pub const FAILURE_STATUS: &str = "Failed to fetch date";

fn default_source_label() -> String {
    DEFAULT_SOURCE_LABEL.to_string()
}
