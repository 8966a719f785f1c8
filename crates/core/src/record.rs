//! Attribution record types.
//!
//! This module handles:
//! - The wire format for a submitted visit (`utm_*` fields, all optional)
//! - The stored record returned by the list endpoint
//! - Sentinel substitution and day truncation used for grouping
//! - Parsing a full record snapshot, skipping malformed entries

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use validator::Validate;

use crate::error::{Error, Result, ValidationErrorCode};

/// Label used for records without a timestamp.
pub const UNKNOWN_DATE: &str = "unknown-date";

/// The five UTM dimensions, in grouping order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UtmField {
    Source,
    Medium,
    Campaign,
    Term,
    Content,
}

impl UtmField {
    pub const ALL: [UtmField; 5] = [
        Self::Source,
        Self::Medium,
        Self::Campaign,
        Self::Term,
        Self::Content,
    ];

    /// Returns the short field name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Medium => "medium",
            Self::Campaign => "campaign",
            Self::Term => "term",
            Self::Content => "content",
        }
    }

    /// Returns the URL query / column name (`utm_source`, ...).
    pub fn param_name(&self) -> &'static str {
        match self {
            Self::Source => "utm_source",
            Self::Medium => "utm_medium",
            Self::Campaign => "utm_campaign",
            Self::Term => "utm_term",
            Self::Content => "utm_content",
        }
    }

    /// Returns the label substituted when the field is absent.
    pub fn sentinel(&self) -> &'static str {
        match self {
            Self::Source => "unknown-source",
            Self::Medium => "unknown-medium",
            Self::Campaign => "unknown-campaign",
            Self::Term => "unknown-term",
            Self::Content => "unknown-content",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

/// A visit submitted for storage. Any subset of fields may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct NewRecord {
    #[serde(default)]
    #[validate(length(max = 255))]
    pub utm_source: Option<String>,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub utm_medium: Option<String>,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub utm_campaign: Option<String>,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub utm_term: Option<String>,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub utm_content: Option<String>,
}

impl NewRecord {
    /// Parse and validate a submitted record from JSON bytes.
    ///
    /// Fields of the wrong type are rejected rather than coerced.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let record: NewRecord = serde_json::from_slice(bytes).map_err(|e| {
            Error::validation_code(ValidationErrorCode::InvalidFormat, format!("invalid record: {}", e))
        })?;
        record.checked()
    }

    /// Validate label lengths and normalize blank labels to absent.
    pub fn checked(self) -> Result<Self> {
        self.validate().map_err(|e| {
            Error::validation_code(ValidationErrorCode::FieldTooLong, format!("{}", e))
        })?;
        Ok(self.normalized())
    }

    /// Trim labels; empty labels become absent.
    pub fn normalized(self) -> Self {
        Self {
            utm_source: normalize_label(self.utm_source),
            utm_medium: normalize_label(self.utm_medium),
            utm_campaign: normalize_label(self.utm_campaign),
            utm_term: normalize_label(self.utm_term),
            utm_content: normalize_label(self.utm_content),
        }
    }

    /// True when no UTM field carries a value.
    pub fn is_empty(&self) -> bool {
        UtmField::ALL.iter().all(|f| self.get(*f).is_none())
    }

    /// Returns the value of a field, if present.
    pub fn get(&self, field: UtmField) -> Option<&str> {
        match field {
            UtmField::Source => self.utm_source.as_deref(),
            UtmField::Medium => self.utm_medium.as_deref(),
            UtmField::Campaign => self.utm_campaign.as_deref(),
            UtmField::Term => self.utm_term.as_deref(),
            UtmField::Content => self.utm_content.as_deref(),
        }
    }

    /// Sets a field value.
    pub fn set(&mut self, field: UtmField, value: Option<String>) {
        let slot = match field {
            UtmField::Source => &mut self.utm_source,
            UtmField::Medium => &mut self.utm_medium,
            UtmField::Campaign => &mut self.utm_campaign,
            UtmField::Term => &mut self.utm_term,
            UtmField::Content => &mut self.utm_content,
        };
        *slot = value;
    }
}

fn normalize_label(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// A stored attribution record, as returned by the list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributionRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub utm_source: Option<String>,
    #[serde(default)]
    pub utm_medium: Option<String>,
    #[serde(default)]
    pub utm_campaign: Option<String>,
    #[serde(default)]
    pub utm_term: Option<String>,
    #[serde(default)]
    pub utm_content: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl AttributionRecord {
    /// Build a stored record from a submission.
    pub fn from_new(id: impl Into<String>, record: NewRecord, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Some(id.into()),
            utm_source: record.utm_source,
            utm_medium: record.utm_medium,
            utm_campaign: record.utm_campaign,
            utm_term: record.utm_term,
            utm_content: record.utm_content,
            created_at: Some(created_at),
        }
    }

    /// Returns the raw value of a field, if present and non-empty.
    pub fn get(&self, field: UtmField) -> Option<&str> {
        let value = match field {
            UtmField::Source => self.utm_source.as_deref(),
            UtmField::Medium => self.utm_medium.as_deref(),
            UtmField::Campaign => self.utm_campaign.as_deref(),
            UtmField::Term => self.utm_term.as_deref(),
            UtmField::Content => self.utm_content.as_deref(),
        };
        value.filter(|v| !v.is_empty())
    }

    /// Returns the grouping label for a field, substituting the sentinel.
    pub fn label(&self, field: UtmField) -> &str {
        self.get(field).unwrap_or_else(|| field.sentinel())
    }

    /// Calendar day of `created_at` (UTC).
    pub fn day(&self) -> DayKey {
        self.created_at
            .map(|ts| DayKey::Date(ts.date_naive()))
            .unwrap_or(DayKey::Unknown)
    }

    /// Full grouping key with sentinel defaults applied.
    pub fn grouping_key(&self) -> GroupingKey<'_> {
        GroupingKey {
            day: self.day(),
            labels: UtmField::ALL.map(|f| self.label(f)),
        }
    }
}

/// Day bucket for grouping. Real dates sort before the unknown bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DayKey {
    Date(NaiveDate),
    Unknown,
}

impl DayKey {
    /// Display form used in the table body (`dd-mm-yyyy`).
    pub fn display_label(&self) -> String {
        match self {
            Self::Date(date) => date.format("%d-%m-%Y").to_string(),
            Self::Unknown => UNKNOWN_DATE.to_string(),
        }
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Self::Unknown => f.write_str(UNKNOWN_DATE),
        }
    }
}

/// The (day, source, medium, campaign, term, content) tuple of one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupingKey<'a> {
    pub day: DayKey,
    labels: [&'a str; 5],
}

impl<'a> GroupingKey<'a> {
    /// Label for one dimension.
    pub fn label(&self, field: UtmField) -> &'a str {
        self.labels[field.index()]
    }

    /// The first `levels` dimensions, in grouping order.
    pub fn path(&self, levels: usize) -> &[&'a str] {
        &self.labels[..levels.min(self.labels.len())]
    }
}

/// Parse a record snapshot (a JSON array of stored records).
///
/// Entries of the wrong shape or field types are skipped and reported
/// individually; only a body that is not an array at all fails the whole
/// call. Labels are taken as stored, without the submission length limit.
pub fn parse_snapshot(bytes: &[u8]) -> Result<(Vec<AttributionRecord>, Vec<Error>)> {
    let value: Value = serde_json::from_slice(bytes).map_err(|e| {
        Error::validation_code(ValidationErrorCode::InvalidFormat, format!("invalid JSON: {}", e))
    })?;

    let Value::Array(items) = value else {
        return Err(Error::validation_code(
            ValidationErrorCode::InvalidFormat,
            "snapshot must be an array of records",
        ));
    };

    let mut records = Vec::with_capacity(items.len());
    let mut errors = Vec::new();

    for (i, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<AttributionRecord>(item) {
            Ok(record) => records.push(record),
            Err(e) => errors.push(Error::validation(format!("record[{}]: {}", i, e))),
        }
    }

    Ok((records, errors))
}
