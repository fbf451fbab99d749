use chrono::{Datelike, Days, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::event::{Color, EventDraft, Source, Span};
use crate::overlap::conflicts;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    EarlyMorning,
    Morning,
    Midday,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    #[must_use]
    pub fn hour(self) -> u32 {
        match self {
            TimeOfDay::EarlyMorning => 7,
            TimeOfDay::Morning => 9,
            TimeOfDay::Midday => 12,
            TimeOfDay::Afternoon => 15,
            TimeOfDay::Evening => 18,
            TimeOfDay::Night => 21,
        }
    }

    #[must_use]
    pub fn on(self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(NaiveTime::MIN) + Duration::hours(i64::from(self.hour()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "weekdays", rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekend,
    Weekly(Vec<Weekday>),
}

impl Frequency {
    #[must_use]
    pub fn includes(&self, weekday: Weekday) -> bool {
        match self {
            Frequency::Daily => true,
            Frequency::Weekend => matches!(weekday, Weekday::Sat | Weekday::Sun),
            Frequency::Weekly(weekdays) => weekdays.contains(&weekday),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub title: String,
    pub frequency: Frequency,
    pub preferred: TimeOfDay,
    #[serde(default = "default_duration")]
    pub duration_minutes: u32,
    #[serde(default)]
    pub color: Color,
    #[serde(default)]
    pub description: Option<String>,
}

fn default_duration() -> u32 {
    30
}

impl Activity {
    fn draft_on(&self, date: NaiveDate) -> EventDraft {
        EventDraft::new(&self.title, self.preferred.on(date), self.duration_minutes)
            .with_color(self.color)
            .with_description(self.description.clone())
            .with_source(Source::Suggested)
    }
}

/// Longest horizon suggestions are placed over; longer requests are clamped.
pub const MAX_HORIZON_DAYS: u32 = 366;

/// Places every activity on each eligible day of `[today, today + horizon_days)`.
/// A slot that overlaps an existing event, or a suggestion already placed in
/// this call, is dropped rather than moved.
#[must_use]
pub fn place_suggestions<E: Span>(
    activities: &[Activity],
    existing: &[E],
    today: NaiveDate,
    horizon_days: u32,
) -> Vec<EventDraft> {
    let mut accepted: Vec<EventDraft> = Vec::new();

    for activity in activities {
        if activity.duration_minutes == 0 {
            warn!("Skipping zero-length activity {:?}", activity.title);
            continue;
        }

        for offset in 0..horizon_days.min(MAX_HORIZON_DAYS) {
            let Some(date) = today.checked_add_days(Days::new(u64::from(offset))) else {
                break;
            };
            if !activity.frequency.includes(date.weekday()) {
                continue;
            }

            let candidate = activity.draft_on(date);
            if conflicts(&candidate, existing).next().is_some()
                || conflicts(&candidate, &accepted).next().is_some()
            {
                debug!("{:?} on {date} conflicts, dropping", activity.title);
                continue;
            }

            accepted.push(candidate);
        }
    }

    accepted
}
