use std::fmt;

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, Weekday};
use serde::{Serialize, Serializer};

use crate::event::Span;
use crate::time::{day_start, format_short_date};

/// Most events the upcoming list ever shows.
pub const UPCOMING_LIMIT: usize = 10;

/// Longest look-ahead the service accepts.
pub const MAX_WINDOW_DAYS: u32 = 366;

/// Events starting between the beginning of `reference`'s day and
/// `reference + window_days`, earliest first, capped at [`UPCOMING_LIMIT`].
#[must_use]
pub fn select_upcoming<E: Span>(
    events: &[E],
    reference: NaiveDateTime,
    window_days: u32,
) -> Vec<&E> {
    let from = day_start(reference);
    let until = reference
        .checked_add_days(Days::new(u64::from(window_days)))
        .unwrap_or(NaiveDateTime::MAX);

    let mut selected = events
        .iter()
        .filter(|event| event.start() >= from && event.start() < until)
        .collect::<Vec<_>>();

    selected.sort_by_key(|event| event.start());
    selected.truncate(UPCOMING_LIMIT);
    selected
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayLabel {
    Today,
    Tomorrow,
    Weekday(Weekday),
}

impl DayLabel {
    #[must_use]
    pub fn for_date(date: NaiveDate, today: NaiveDate) -> Self {
        if date == today {
            DayLabel::Today
        } else if today.succ_opt() == Some(date) {
            DayLabel::Tomorrow
        } else {
            DayLabel::Weekday(date.weekday())
        }
    }
}

impl fmt::Display for DayLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DayLabel::Today => "Today",
            DayLabel::Tomorrow => "Tomorrow",
            DayLabel::Weekday(Weekday::Mon) => "Monday",
            DayLabel::Weekday(Weekday::Tue) => "Tuesday",
            DayLabel::Weekday(Weekday::Wed) => "Wednesday",
            DayLabel::Weekday(Weekday::Thu) => "Thursday",
            DayLabel::Weekday(Weekday::Fri) => "Friday",
            DayLabel::Weekday(Weekday::Sat) => "Saturday",
            DayLabel::Weekday(Weekday::Sun) => "Sunday",
        };
        f.write_str(label)
    }
}

impl Serialize for DayLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayGroup<'a, E> {
    pub date: NaiveDate,
    pub label: DayLabel,
    pub date_label: String,
    pub events: Vec<&'a E>,
}

/// Groups events by calendar day. Days come out in date order and each day
/// keeps its events ordered by start.
#[must_use]
pub fn group_by_day<'a, E: Span>(
    selected: Vec<&'a E>,
    today: NaiveDate,
) -> Vec<DayGroup<'a, E>> {
    let mut groups: Vec<DayGroup<'a, E>> = Vec::new();

    for event in selected {
        let date = event.start().date();
        match groups.iter_mut().find(|group| group.date == date) {
            Some(group) => group.events.push(event),
            None => groups.push(DayGroup {
                date,
                label: DayLabel::for_date(date, today),
                date_label: format_short_date(date),
                events: vec![event],
            }),
        }
    }

    groups.sort_by_key(|group| group.date);
    for group in &mut groups {
        group.events.sort_by_key(|event| event.start());
    }

    groups
}

#[must_use]
pub fn upcoming<E: Span>(
    events: &[E],
    reference: NaiveDateTime,
    window_days: u32,
) -> Vec<DayGroup<'_, E>> {
    group_by_day(select_upcoming(events, reference, window_days), reference.date())
}
