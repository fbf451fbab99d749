//! Pattern-based extraction of class and exam events from syllabus text.
//!
//! Extraction never fails: each [`Matcher`] contributes whatever it recognises
//! and text without any known pattern yields no candidates.

use chrono::{NaiveDate, NaiveTime, Weekday};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;

use crate::config::{ExamLabel, TermConfig};
use crate::event::{Color, EventDraft, EventKind, Source};
use crate::recurrence::RecurrenceSpec;

macro_rules! regex {
    ($pattern:expr) => {{
        static REGEX: Lazy<Regex> = Lazy::new(|| Regex::new($pattern).unwrap());
        &REGEX
    }};
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "event", rename_all = "lowercase")]
pub enum EventCandidate {
    Class(EventDraft),
    Exam(EventDraft),
}

impl EventCandidate {
    #[must_use]
    pub fn draft(&self) -> &EventDraft {
        match self {
            EventCandidate::Class(draft) | EventCandidate::Exam(draft) => draft,
        }
    }

    #[must_use]
    pub fn into_draft(self) -> EventDraft {
        match self {
            EventCandidate::Class(draft) | EventCandidate::Exam(draft) => draft,
        }
    }
}

pub trait Matcher: Send + Sync {
    fn name(&self) -> &'static str;
    fn extract(&self, text: &str) -> Vec<EventCandidate>;
}

pub struct SyllabusExtractor {
    matchers: Vec<Box<dyn Matcher>>,
}

impl SyllabusExtractor {
    pub fn new(term: &TermConfig) -> Self {
        Self::with_matchers(vec![
            Box::new(LectureMatcher::new(term)),
            Box::new(ExamMatcher::new(term)),
        ])
    }

    pub fn with_matchers(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }

    #[must_use]
    pub fn extract(&self, text: &str) -> Vec<EventCandidate> {
        self.matchers
            .iter()
            .flat_map(|matcher| {
                let candidates = matcher.extract(text);
                debug!("{} matcher found {} candidates", matcher.name(), candidates.len());
                candidates
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Meridiem {
    Am,
    Pm,
}

impl Meridiem {
    fn parse(raw: &str) -> Option<Self> {
        match raw.chars().next()?.to_ascii_lowercase() {
            'a' => Some(Meridiem::Am),
            'p' => Some(Meridiem::Pm),
            _ => None,
        }
    }
}

/// `h:mm` on a 12-hour clock. Hours above 12 are taken as already 24-hour.
fn clock_time(raw: &str, meridiem: Meridiem) -> Option<NaiveTime> {
    let (hours, minutes) = raw.split_once(':')?;
    let hours = hours.parse::<u32>().ok()?;
    let minutes = minutes.parse::<u32>().ok()?;

    let hour = match (meridiem, hours) {
        (Meridiem::Am, 12) => 0,
        (Meridiem::Pm, 1..=11) => hours + 12,
        _ => hours,
    };

    NaiveTime::from_hms_opt(hour, minutes, 0)
}

/// Maps a day token such as `M`, `Tu`, `Thurs` or `Friday` to a weekday.
/// Unknown tokens are retried by their first two letters.
fn weekday_from_token(token: &str) -> Option<Weekday> {
    let lower = token.trim_end_matches('.').to_ascii_lowercase();

    let weekday = match lower.as_str() {
        "m" | "mon" | "monday" => Weekday::Mon,
        "t" | "tue" | "tues" | "tuesday" => Weekday::Tue,
        "w" | "wed" | "wednesday" => Weekday::Wed,
        "r" | "thu" | "thur" | "thurs" | "thursday" => Weekday::Thu,
        "f" | "fri" | "friday" => Weekday::Fri,
        "sat" | "saturday" => Weekday::Sat,
        "sun" | "sunday" => Weekday::Sun,
        _ => match lower.get(..2)? {
            "mo" => Weekday::Mon,
            "tu" => Weekday::Tue,
            "we" => Weekday::Wed,
            "th" => Weekday::Thu,
            "fr" => Weekday::Fri,
            "sa" => Weekday::Sat,
            "su" => Weekday::Sun,
            _ => return None,
        },
    };

    Some(weekday)
}

fn parse_days(raw: &str) -> Vec<Weekday> {
    let mut weekdays = Vec::new();

    for token in raw
        .split(|c: char| c == ',' || c == '/' || c == '&' || c.is_whitespace())
        .filter(|token| !token.is_empty() && !token.eq_ignore_ascii_case("and"))
    {
        match weekday_from_token(token) {
            Some(weekday) if !weekdays.contains(&weekday) => weekdays.push(weekday),
            Some(_) => {}
            None => debug!("Ignoring unknown day token {token:?}"),
        }
    }

    weekdays
}

/// `Lecture: M, W 1:00 – 2:15 pm`, expanded weekly over the term.
pub struct LectureMatcher {
    title: String,
    description: Option<String>,
    color: Color,
    start: NaiveDate,
    end: NaiveDate,
}

impl LectureMatcher {
    pub fn new(term: &TermConfig) -> Self {
        Self {
            title: format!("{} Lecture", term.course),
            description: term.lecture_description.clone(),
            color: term.lecture_color,
            start: term.start,
            end: term.end,
        }
    }

    fn schedule(&self, captures: &Captures) -> Option<RecurrenceSpec> {
        let weekdays = parse_days(captures.name("days")?.as_str());
        if weekdays.is_empty() {
            return None;
        }

        let end_meridiem = Meridiem::parse(captures.name("end_period")?.as_str())?;
        let end_time = clock_time(captures.name("end")?.as_str(), end_meridiem)?;

        let start_raw = captures.name("start")?.as_str();
        let start_time = match captures.name("start_period") {
            Some(period) => clock_time(start_raw, Meridiem::parse(period.as_str())?)?,
            None => {
                // `11:00 – 12:15 pm` starts in the morning.
                let time = clock_time(start_raw, end_meridiem)?;
                if time >= end_time {
                    clock_time(start_raw, Meridiem::Am)?
                } else {
                    time
                }
            }
        };

        Some(RecurrenceSpec::weekly(
            weekdays, start_time, end_time, self.start, self.end,
        ))
    }
}

impl Matcher for LectureMatcher {
    fn name(&self) -> &'static str {
        "lecture"
    }

    fn extract(&self, text: &str) -> Vec<EventCandidate> {
        let pattern = regex!(
            r"(?i)lecture:[ \t]*(?P<days>[a-z][a-z.,/& \t]*?)[ \t]+(?P<start>\d{1,2}:\d{2})[ \t]*(?P<start_period>[ap]\.?m\.?)?[ \t]*[-–—]+[ \t]*(?P<end>\d{1,2}:\d{2})[ \t]*(?P<end_period>[ap]\.?m\.?)"
        );

        let mut candidates = Vec::new();

        for captures in pattern.captures_iter(text) {
            let Some(schedule) = self.schedule(&captures) else {
                debug!("Unusable lecture line {:?}", &captures[0]);
                continue;
            };

            let occurrences = match schedule.expand() {
                Ok(occurrences) => occurrences,
                Err(err) => {
                    warn!("Skipping lecture line {:?}: {err}", &captures[0]);
                    continue;
                }
            };

            candidates.extend(occurrences.into_iter().map(|occurrence| {
                EventCandidate::Class(
                    EventDraft::new(&self.title, occurrence.start, occurrence.duration_minutes)
                        .with_color(self.color)
                        .with_description(self.description.clone())
                        .with_source(Source::Imported)
                        .with_kind(EventKind::Class),
                )
            }));
        }

        candidates
    }
}

/// Configured exam labels followed on the same line by an `MM/DD` date.
pub struct ExamMatcher {
    course: String,
    year: i32,
    time: NaiveTime,
    duration_minutes: u32,
    description: Option<String>,
    exams: Vec<(ExamLabel, Regex)>,
}

impl ExamMatcher {
    pub fn new(term: &TermConfig) -> Self {
        let exams = term
            .exams
            .iter()
            .filter_map(|exam| {
                let pattern = format!(
                    r"(?i){}[^\n]*?(\d{{1,2}})/(\d{{1,2}})",
                    regex::escape(exam.label.trim())
                );
                match Regex::new(&pattern) {
                    Ok(regex) => Some((exam.clone(), regex)),
                    Err(err) => {
                        warn!("Ignoring exam label {:?}: {err}", exam.label);
                        None
                    }
                }
            })
            .collect();

        Self {
            course: term.course.clone(),
            year: term.year,
            time: term.exam_time,
            duration_minutes: term.exam_duration_minutes,
            description: term.exam_description.clone(),
            exams,
        }
    }
}

impl Matcher for ExamMatcher {
    fn name(&self) -> &'static str {
        "exam"
    }

    fn extract(&self, text: &str) -> Vec<EventCandidate> {
        let mut candidates = Vec::new();

        for (exam, regex) in &self.exams {
            let Some(captures) = regex.captures(text) else {
                continue;
            };

            let date = captures[1]
                .parse::<u32>()
                .ok()
                .zip(captures[2].parse::<u32>().ok())
                .and_then(|(month, day)| NaiveDate::from_ymd_opt(self.year, month, day));

            let Some(date) = date else {
                warn!("Skipping {:?}: impossible date {:?}", exam.label, &captures[0]);
                continue;
            };

            candidates.push(EventCandidate::Exam(
                EventDraft::new(
                    format!("{} - {}", self.course, exam.label),
                    date.and_time(self.time),
                    self.duration_minutes,
                )
                .with_color(exam.color)
                .with_description(self.description.clone())
                .with_source(Source::Imported)
                .with_kind(EventKind::Exam),
            ));
        }

        candidates
    }
}
