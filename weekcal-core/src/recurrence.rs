use std::mem;

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::RecurrenceError;
use crate::event::Span;
use crate::time::hhmm;

/// Longest `[range_start, range_end)` a template may span.
pub const MAX_RANGE_DAYS: i64 = 731;

pub const ALL_WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Weekly template: the same time of day on every listed weekday within
/// `[range_start, range_end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceSpec {
    pub weekdays: Vec<Weekday>,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub range_start: NaiveDate,
    pub range_end: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Occurrence {
    pub start: NaiveDateTime,
    pub duration_minutes: u32,
}

impl Span for Occurrence {
    fn start(&self) -> NaiveDateTime {
        self.start
    }

    fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }
}

/// Every seventh day from a first date, stopping before an exclusive end.
pub struct WeekRange(NaiveDate, NaiveDate);

impl WeekRange {
    pub fn new(first: NaiveDate, end: NaiveDate) -> Self {
        Self(first, end)
    }
}

impl Iterator for WeekRange {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<Self::Item> {
        if self.0 < self.1 {
            let next = self.0.checked_add_days(Days::new(7)).unwrap_or(self.1);
            Some(mem::replace(&mut self.0, next))
        } else {
            None
        }
    }
}

/// First date on or after `from` that falls on `weekday`, if the calendar
/// reaches that far.
#[must_use]
pub fn first_on_or_after(from: NaiveDate, weekday: Weekday) -> Option<NaiveDate> {
    let wanted = weekday.num_days_from_monday();
    let current = from.weekday().num_days_from_monday();
    from.checked_add_days(Days::new(u64::from((7 + wanted - current) % 7)))
}

impl RecurrenceSpec {
    pub fn weekly(
        weekdays: Vec<Weekday>,
        start_time: NaiveTime,
        end_time: NaiveTime,
        range_start: NaiveDate,
        range_end: NaiveDate,
    ) -> Self {
        Self {
            weekdays,
            start_time,
            end_time,
            range_start,
            range_end,
        }
    }

    pub fn daily(
        start_time: NaiveTime,
        end_time: NaiveTime,
        range_start: NaiveDate,
        range_end: NaiveDate,
    ) -> Self {
        Self::weekly(
            ALL_WEEKDAYS.to_vec(),
            start_time,
            end_time,
            range_start,
            range_end,
        )
    }

    /// Length of one occurrence. Both times are read on the same calendar day.
    pub fn duration_minutes(&self) -> Result<u32, RecurrenceError> {
        let minutes = (self.end_time - self.start_time).num_minutes();

        u32::try_from(minutes)
            .ok()
            .filter(|minutes| *minutes > 0)
            .ok_or(RecurrenceError::EndNotAfterStart {
                start: self.start_time,
                end: self.end_time,
            })
    }

    /// All occurrences, grouped by weekday in the order the weekdays were
    /// listed. Sort by start if chronological order is needed.
    pub fn expand(&self) -> Result<Vec<Occurrence>, RecurrenceError> {
        let duration_minutes = self.duration_minutes()?;

        let days = (self.range_end - self.range_start).num_days();
        if days > MAX_RANGE_DAYS {
            return Err(RecurrenceError::RangeTooLong {
                days,
                max: MAX_RANGE_DAYS,
            });
        }

        let mut weekdays = Vec::with_capacity(7);
        for weekday in &self.weekdays {
            if !weekdays.contains(weekday) {
                weekdays.push(*weekday);
            }
        }

        Ok(weekdays
            .into_iter()
            .filter_map(|weekday| first_on_or_after(self.range_start, weekday))
            .flat_map(|first| WeekRange::new(first, self.range_end))
            .map(|date| Occurrence {
                start: date.and_time(self.start_time),
                duration_minutes,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn time(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    fn fall_lectures() -> RecurrenceSpec {
        RecurrenceSpec::weekly(
            vec![Weekday::Mon, Weekday::Wed],
            time(13, 0),
            time(14, 15),
            date(2025, 8, 25),
            date(2025, 12, 17),
        )
    }

    #[test]
    fn expands_monday_wednesday_term() {
        let occurrences = fall_lectures().expand().unwrap();

        // 17 Mondays from Aug 25 and 16 Wednesdays up to (excluding) Dec 17.
        assert_eq!(occurrences.len(), 33);
        assert!(occurrences.iter().all(|occurrence| {
            matches!(occurrence.start.weekday(), Weekday::Mon | Weekday::Wed)
                && occurrence.duration_minutes == 75
                && occurrence.start.time() == time(13, 0)
                && occurrence.start.date() >= date(2025, 8, 25)
                && occurrence.start.date() < date(2025, 12, 17)
        }));

        let weeks = (date(2025, 12, 17) - date(2025, 8, 25)).num_weeks() as usize;
        assert!(occurrences.len().abs_diff(2 * weeks) <= 2);
    }

    #[test]
    fn range_end_is_exclusive() {
        let schedule = RecurrenceSpec::weekly(
            vec![Weekday::Wed],
            time(9, 0),
            time(10, 0),
            date(2025, 12, 3),
            date(2025, 12, 17),
        );
        let dates = schedule
            .expand()
            .unwrap()
            .into_iter()
            .map(|occurrence| occurrence.start.date())
            .collect::<Vec<_>>();

        assert_eq!(dates, [date(2025, 12, 3), date(2025, 12, 10)]);
    }

    #[test]
    fn finds_first_matching_weekday() {
        // 2025-08-25 is a Monday.
        let first = |from, weekday| first_on_or_after(from, weekday).unwrap();
        assert_eq!(first(date(2025, 8, 25), Weekday::Mon), date(2025, 8, 25));
        assert_eq!(first(date(2025, 8, 25), Weekday::Sun), date(2025, 8, 31));
        assert_eq!(first(date(2025, 8, 26), Weekday::Mon), date(2025, 9, 1));
    }

    #[test]
    fn rejects_end_before_or_at_start() {
        let mut schedule = fall_lectures();
        schedule.end_time = time(13, 0);
        assert_eq!(
            schedule.expand(),
            Err(RecurrenceError::EndNotAfterStart {
                start: time(13, 0),
                end: time(13, 0),
            })
        );

        schedule.end_time = time(1, 0);
        assert!(schedule.expand().is_err());
    }

    #[test]
    fn repeated_weekdays_are_expanded_once() {
        let mut schedule = fall_lectures();
        schedule.weekdays = vec![Weekday::Mon, Weekday::Mon];
        assert_eq!(schedule.expand().unwrap().len(), 17);
    }

    #[test]
    fn empty_range_yields_nothing() {
        let mut schedule = fall_lectures();
        schedule.range_end = schedule.range_start;
        assert!(schedule.expand().unwrap().is_empty());
    }

    #[test]
    fn daily_covers_every_day() {
        let schedule =
            RecurrenceSpec::daily(time(7, 0), time(7, 30), date(2025, 1, 1), date(2025, 1, 15));
        let mut occurrences = schedule.expand().unwrap();
        occurrences.sort_by_key(|occurrence| occurrence.start);

        assert_eq!(occurrences.len(), 14);
        assert_eq!(occurrences[0].start.date(), date(2025, 1, 1));
        assert_eq!(occurrences[13].start.date(), date(2025, 1, 14));
    }

    #[test]
    fn overlong_ranges_are_rejected() {
        let mut schedule = fall_lectures();
        schedule.range_end = date(2035, 8, 25);
        assert!(matches!(
            schedule.expand(),
            Err(RecurrenceError::RangeTooLong { max: MAX_RANGE_DAYS, .. })
        ));

        schedule.range_start = NaiveDate::MIN;
        schedule.range_end = NaiveDate::MAX;
        assert!(schedule.expand().is_err());
    }

    #[test]
    fn expansion_stops_at_the_calendar_end() {
        let last = NaiveDate::MAX;
        let schedule = RecurrenceSpec::daily(time(7, 0), time(7, 30), last - Days::new(20), last);
        assert_eq!(schedule.expand().unwrap().len(), 20);

        assert_eq!(first_on_or_after(last, last.weekday().succ()), None);
        let dates = WeekRange::new(last - Days::new(3), last).collect::<Vec<_>>();
        assert_eq!(dates, [last - Days::new(3)]);
    }

    #[test]
    fn expansion_is_repeatable() {
        let schedule = fall_lectures();
        assert_eq!(schedule.expand(), schedule.expand());
    }
}
