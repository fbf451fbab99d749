//! Day boundaries, week grids and display labels.
//!
//! The week grid starts on Sunday and shows hour slots from 08:00 through the
//! 18:00 slot. All arithmetic is plain local wall-clock time.

use chrono::{Datelike, Days, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use serde::Serialize;

use crate::event::Span;

pub const FIRST_SLOT_HOUR: u32 = 8;
pub const LAST_SLOT_HOUR: u32 = 18;

const GRID_HOURS: f64 = (LAST_SLOT_HOUR - FIRST_SLOT_HOUR + 1) as f64;

#[must_use]
pub fn day_start(at: NaiveDateTime) -> NaiveDateTime {
    at.date().and_time(NaiveTime::MIN)
}

#[must_use]
pub fn end_of(start: NaiveDateTime, duration_minutes: u32) -> NaiveDateTime {
    start
        .checked_add_signed(Duration::minutes(i64::from(duration_minutes)))
        .unwrap_or(NaiveDateTime::MAX)
}

/// The same weekday `weeks` weeks away, or `None` past the calendar's range.
#[must_use]
pub fn shift_week(reference: NaiveDate, weeks: i64) -> Option<NaiveDate> {
    Duration::try_weeks(weeks).and_then(|offset| reference.checked_add_signed(offset))
}

/// Sunday of `reference`'s week, clamped to the first representable date.
#[must_use]
pub fn week_start(reference: NaiveDate) -> NaiveDate {
    let offset = Days::new(u64::from(reference.weekday().num_days_from_sunday()));
    reference.checked_sub_days(offset).unwrap_or(NaiveDate::MIN)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekDay {
    pub date: NaiveDate,
    pub day_name: String,
    pub day_number: u32,
    pub is_today: bool,
    pub is_weekend: bool,
    pub full_date: String,
}

impl WeekDay {
    fn new(date: NaiveDate, today: NaiveDate) -> Self {
        Self {
            date,
            day_name: date.format("%a").to_string(),
            day_number: date.day(),
            is_today: date == today,
            is_weekend: matches!(date.weekday(), Weekday::Sat | Weekday::Sun),
            full_date: date.format("%Y-%m-%d").to_string(),
        }
    }
}

/// The seven days of the Sunday-based week containing `reference`. The
/// last representable week is cut short at the calendar's end.
#[must_use]
pub fn week_of(reference: NaiveDate, today: NaiveDate) -> Vec<WeekDay> {
    let sunday = week_start(reference);
    (0..7)
        .map_while(|offset| sunday.checked_add_days(Days::new(offset)))
        .map(|date| WeekDay::new(date, today))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeSlot {
    pub hour: u32,
    pub display: String,
    pub time: String,
}

#[must_use]
pub fn time_slots() -> Vec<TimeSlot> {
    (FIRST_SLOT_HOUR..=LAST_SLOT_HOUR)
        .map(|hour| TimeSlot {
            hour,
            display: hour_label(hour),
            time: format!("{hour:02}:00"),
        })
        .collect()
}

fn hour_label(hour: u32) -> String {
    match hour {
        0 => "12 AM".into(),
        1..=11 => format!("{hour} AM"),
        12 => "12 PM".into(),
        _ => format!("{} PM", hour - 12),
    }
}

pub fn events_on<E: Span>(events: &[E], date: NaiveDate) -> impl Iterator<Item = &E> {
    events
        .iter()
        .filter(move |event| event.start().date() == date)
}

/// Events on `date` whose start hour falls into the slot `[hour, hour + 1)`.
pub fn events_in_slot<E: Span>(
    events: &[E],
    date: NaiveDate,
    hour: u32,
) -> impl Iterator<Item = &E> {
    events_on(events, date).filter(move |event| event.start().hour() == hour)
}

/// Vertical placement of an event inside the day column, in percent of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EventLayout {
    pub top_percent: f64,
    pub height_percent: f64,
}

#[must_use]
pub fn layout<E: Span>(event: &E) -> EventLayout {
    let start = event.start();
    let start_hour = f64::from(start.hour()) + f64::from(start.minute()) / 60.0;
    let hours = f64::from(event.duration_minutes()) / 60.0;

    EventLayout {
        top_percent: (start_hour - f64::from(FIRST_SLOT_HOUR)) / GRID_HOURS * 100.0,
        height_percent: hours / GRID_HOURS * 100.0,
    }
}

/// `1:05 PM`
#[must_use]
pub fn format_clock(time: NaiveTime) -> String {
    time.format("%-I:%M %p").to_string()
}

/// `Oct 2025`
#[must_use]
pub fn format_month(date: NaiveDate) -> String {
    date.format("%b %Y").to_string()
}

/// `Oct 6`
#[must_use]
pub fn format_short_date(date: NaiveDate) -> String {
    date.format("%b %-d").to_string()
}

/// `HH:MM` (de)serialization for times of day.
pub mod hhmm {
    use chrono::{NaiveTime, Timelike};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        let formatted_time = format!("{:02}:{:02}", time.hour(), time.minute());
        serializer.serialize_str(&formatted_time)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, "%H:%M").map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventDraft;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn day_start_is_midnight() {
        let at = date(2025, 3, 4).and_hms_opt(17, 45, 12).unwrap();
        assert_eq!(day_start(at), date(2025, 3, 4).and_hms_opt(0, 0, 0).unwrap());
    }

    #[test]
    fn week_starts_on_sunday() {
        // 2025-10-08 is a Wednesday.
        let week = week_of(date(2025, 10, 8), date(2025, 10, 9));

        assert_eq!(week.len(), 7);
        assert_eq!(week[0].full_date, "2025-10-05");
        assert_eq!(week[0].day_name, "Sun");
        assert!(week[0].is_weekend);
        assert!(week[6].is_weekend);
        assert!(!week[3].is_weekend);

        let today = week.iter().filter(|day| day.is_today).collect::<Vec<_>>();
        assert_eq!(today.len(), 1);
        assert_eq!(today[0].day_number, 9);
    }

    #[test]
    fn shifting_weeks_keeps_weekday() {
        let wednesday = date(2025, 10, 8);
        assert_eq!(shift_week(wednesday, 1), Some(date(2025, 10, 15)));
        assert_eq!(shift_week(wednesday, -2), Some(date(2025, 9, 24)));
    }

    #[test]
    fn calendar_edges_do_not_overflow() {
        assert_eq!(shift_week(NaiveDate::MAX, 1), None);
        assert_eq!(shift_week(NaiveDate::MIN, -1), None);
        assert_eq!(shift_week(date(2025, 1, 1), i64::MAX), None);

        assert_eq!(week_start(NaiveDate::MIN), NaiveDate::MIN);
        let last_week = week_of(NaiveDate::MAX, date(2025, 1, 1));
        assert!(!last_week.is_empty() && last_week.len() <= 7);
        assert_eq!(last_week.last().map(|day| day.date), Some(NaiveDate::MAX));

        let late = NaiveDateTime::MAX - Duration::minutes(10);
        assert_eq!(end_of(late, u32::MAX), NaiveDateTime::MAX);
    }

    #[test]
    fn slots_cover_eight_to_six() {
        let slots = time_slots();
        let displays = slots.iter().map(|slot| slot.display.as_str()).collect::<Vec<_>>();

        assert_eq!(slots.len(), 11);
        assert_eq!(slots[0].time, "08:00");
        assert_eq!(
            displays,
            [
                "8 AM", "9 AM", "10 AM", "11 AM", "12 PM", "1 PM", "2 PM", "3 PM", "4 PM",
                "5 PM", "6 PM"
            ]
        );
    }

    #[test]
    fn buckets_by_start_hour() {
        let day = date(2025, 10, 6);
        let events = [
            EventDraft::new("a", day.and_hms_opt(9, 0, 0).unwrap(), 30),
            EventDraft::new("b", day.and_hms_opt(9, 59, 0).unwrap(), 30),
            EventDraft::new("c", day.and_hms_opt(10, 0, 0).unwrap(), 30),
            EventDraft::new("d", date(2025, 10, 7).and_hms_opt(9, 0, 0).unwrap(), 30),
        ];

        let titles = events_in_slot(&events, day, 9)
            .map(|event| event.title.as_str())
            .collect::<Vec<_>>();
        assert_eq!(titles, ["a", "b"]);
        assert_eq!(events_on(&events, day).count(), 3);
    }

    #[test]
    fn layout_spans_the_grid() {
        let event = EventDraft::new("x", date(2025, 1, 1).and_hms_opt(13, 30, 0).unwrap(), 66);
        let layout = layout(&event);

        assert!((layout.top_percent - 50.0).abs() < 1e-9);
        assert!((layout.height_percent - 10.0).abs() < 1e-9);
    }

    #[test]
    fn labels() {
        assert_eq!(format_clock(NaiveTime::from_hms_opt(13, 5, 0).unwrap()), "1:05 PM");
        assert_eq!(format_clock(NaiveTime::from_hms_opt(0, 30, 0).unwrap()), "12:30 AM");
        assert_eq!(format_month(date(2025, 10, 6)), "Oct 2025");
        assert_eq!(format_short_date(date(2025, 10, 6)), "Oct 6");
    }
}
