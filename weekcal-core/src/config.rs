use std::fs;
use std::path::Path;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::event::Color;
use crate::recurrence::MAX_RANGE_DAYS;
use crate::time::hhmm;

/// Academic term the syllabus extractor works against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TermConfig {
    pub course: String,
    pub lecture_description: Option<String>,
    pub lecture_color: Color,
    /// First day lectures may take place.
    pub start: NaiveDate,
    /// Lectures stop before this day.
    pub end: NaiveDate,
    /// Year for `MM/DD` exam dates.
    pub year: i32,
    #[serde(with = "hhmm")]
    pub exam_time: NaiveTime,
    pub exam_duration_minutes: u32,
    pub exam_description: Option<String>,
    pub exams: Vec<ExamLabel>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamLabel {
    pub label: String,
    #[serde(default)]
    pub color: Color,
}

impl ExamLabel {
    pub fn new<S: Into<String>>(label: S, color: Color) -> Self {
        Self {
            label: label.into(),
            color,
        }
    }
}

impl Default for TermConfig {
    fn default() -> Self {
        Self {
            course: "CMPE 306".into(),
            lecture_description: Some(
                "Introductory Circuit Theory - Performance Arts & Humanity 132".into(),
            ),
            lecture_color: Color::Blue,
            start: NaiveDate::from_ymd_opt(2025, 8, 25).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 12, 17).unwrap(),
            year: 2025,
            exam_time: NaiveTime::from_hms_opt(13, 0, 0).unwrap(),
            exam_duration_minutes: 75,
            exam_description: Some("Exam - In Class".into()),
            exams: vec![
                ExamLabel::new("midterm exam 1", Color::Orange),
                ExamLabel::new("midterm exam 2", Color::Orange),
                ExamLabel::new("final exam", Color::Pink),
            ],
        }
    }
}

impl TermConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: TermConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(ConfigError::Read)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.end <= self.start {
            return Err(ConfigError::Invalid(format!(
                "term ends ({}) before it starts ({})",
                self.end, self.start
            )));
        }

        let days = (self.end - self.start).num_days();
        if days > MAX_RANGE_DAYS {
            return Err(ConfigError::Invalid(format!(
                "term spans {days} days, more than the {MAX_RANGE_DAYS} allowed"
            )));
        }

        if self.exam_duration_minutes == 0 {
            return Err(ConfigError::Invalid("exam duration must be positive".into()));
        }

        if let Some(exam) = self.exams.iter().find(|exam| exam.label.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "exam label {:?} is blank",
                exam.label
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_term_is_valid() {
        assert!(TermConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config = TermConfig::from_json(
            r##"{
                "course": "MATH 221",
                "start": "2026-01-20",
                "end": "2026-05-08",
                "year": 2026,
                "exam_time": "09:30",
                "exams": [{ "label": "quiz 1" }, { "label": "final", "color": "#ff2d55" }]
            }"##,
        )
        .unwrap();

        assert_eq!(config.course, "MATH 221");
        assert_eq!(config.exam_time, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert_eq!(config.exam_duration_minutes, 75);
        assert_eq!(
            config.exams,
            [
                ExamLabel::new("quiz 1", Color::Blue),
                ExamLabel::new("final", Color::Pink)
            ]
        );
    }

    #[test]
    fn rejects_inverted_term() {
        let err = TermConfig::from_json(r#"{ "start": "2026-05-08", "end": "2026-01-20" }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_overlong_term() {
        let err = TermConfig::from_json(r#"{ "start": "2025-08-25", "end": "2035-08-25" }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(message) if message.contains("3652 days")));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = TermConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
