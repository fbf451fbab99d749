//! Conversion between events and the record shape of an external calendar
//! service (`summary`, `description`, `start`/`end` with `dateTime` or `date`).

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::SyncError;
use crate::event::{Color, Event, EventDraft, Source, Span};

const UNTITLED: &str = "Untitled event";
const LOCAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    /// All-day events carry a date only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub start: ExternalTime,
    #[serde(default)]
    pub end: ExternalTime,
}

impl ExternalTime {
    fn local(at: NaiveDateTime, time_zone: &str) -> Self {
        Self {
            date_time: Some(at.format(LOCAL_FORMAT).to_string()),
            date: None,
            time_zone: Some(time_zone.into()),
        }
    }

    /// Wall-clock time as written; an offset, if present, is kept as-is
    /// rather than converted.
    fn resolve(&self, summary: &str, field: &'static str) -> Result<NaiveDateTime, SyncError> {
        let invalid = |value: &str| SyncError::InvalidTime {
            summary: summary.into(),
            value: value.into(),
        };

        if let Some(raw) = &self.date_time {
            return DateTime::parse_from_rfc3339(raw)
                .map(|at| at.naive_local())
                .or_else(|_| NaiveDateTime::parse_from_str(raw, LOCAL_FORMAT))
                .map_err(|_| invalid(raw));
        }

        if let Some(raw) = &self.date {
            return NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map(|date| date.and_time(NaiveTime::MIN))
                .map_err(|_| invalid(raw));
        }

        Err(SyncError::MissingTime {
            summary: summary.into(),
            field,
        })
    }
}

impl ExternalEvent {
    /// Turns a fetched record into a draft tagged [`Source::External`].
    pub fn normalize(&self) -> Result<EventDraft, SyncError> {
        let title = self
            .summary
            .as_deref()
            .map(str::trim)
            .filter(|summary| !summary.is_empty())
            .unwrap_or(UNTITLED);

        let start = self.start.resolve(title, "start")?;
        let end = self.end.resolve(title, "end")?;

        let duration_minutes = u32::try_from((end - start).num_minutes())
            .ok()
            .filter(|minutes| *minutes > 0)
            .ok_or_else(|| SyncError::NonPositiveDuration {
                summary: title.into(),
            })?;

        let description = self
            .description
            .clone()
            .filter(|description| !description.is_empty());

        Ok(EventDraft::new(title, start, duration_minutes)
            .with_color(Color::Blue)
            .with_description(description)
            .with_source(Source::External))
    }

    /// Record to submit for `event`, in local time of `time_zone`.
    #[must_use]
    pub fn from_event(event: &Event, time_zone: &str) -> Self {
        Self {
            summary: Some(event.title.clone()),
            description: Some(event.description.clone().unwrap_or_default()),
            start: ExternalTime::local(event.start(), time_zone),
            end: ExternalTime::local(event.end(), time_zone),
        }
    }
}

/// Normalises a whole batch, failing on the first bad record so that a sync
/// is applied completely or not at all.
pub fn normalize_all(records: &[ExternalEvent]) -> Result<Vec<EventDraft>, SyncError> {
    records.iter().map(ExternalEvent::normalize).collect()
}
