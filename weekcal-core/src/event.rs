use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::EventError;
use crate::time::end_of;

/// Anything occupying the half-open range `[start, start + duration)`.
pub trait Span {
    fn start(&self) -> NaiveDateTime;
    fn duration_minutes(&self) -> u32;

    fn end(&self) -> NaiveDateTime {
        end_of(self.start(), self.duration_minutes())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    #[default]
    #[serde(rename = "#007aff")]
    Blue,
    #[serde(rename = "#34c759")]
    Green,
    #[serde(rename = "#ff9500")]
    Orange,
    #[serde(rename = "#af52de")]
    Purple,
    #[serde(rename = "#ff2d55")]
    Pink,
    #[serde(rename = "#5856d6")]
    Indigo,
}

impl Color {
    pub const PALETTE: [Color; 6] = [
        Color::Blue,
        Color::Green,
        Color::Orange,
        Color::Purple,
        Color::Pink,
        Color::Indigo,
    ];

    #[must_use]
    pub fn hex(self) -> &'static str {
        match self {
            Color::Blue => "#007aff",
            Color::Green => "#34c759",
            Color::Orange => "#ff9500",
            Color::Purple => "#af52de",
            Color::Pink => "#ff2d55",
            Color::Indigo => "#5856d6",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Color::Blue => "Blue",
            Color::Green => "Green",
            Color::Orange => "Orange",
            Color::Purple => "Purple",
            Color::Pink => "Pink",
            Color::Indigo => "Indigo",
        }
    }
}

/// Where an event came from. `External` events are never exported again.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    #[default]
    Manual,
    Imported,
    External,
    Suggested,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    #[default]
    Event,
    Class,
    Exam,
}

impl EventKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Event => "event",
            EventKind::Class => "class",
            EventKind::Exam => "exam",
        }
    }
}

/// An event that has not been committed to a collection yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDraft {
    pub title: String,
    pub start: NaiveDateTime,
    pub duration_minutes: u32,
    #[serde(default)]
    pub color: Color,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub source: Source,
    #[serde(default)]
    pub kind: EventKind,
}

impl EventDraft {
    pub fn new<S: Into<String>>(title: S, start: NaiveDateTime, duration_minutes: u32) -> Self {
        Self {
            title: title.into(),
            start,
            duration_minutes,
            color: Color::default(),
            description: None,
            source: Source::default(),
            kind: EventKind::default(),
        }
    }

    #[must_use]
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    #[must_use]
    pub fn with_description<S: Into<String>>(mut self, description: Option<S>) -> Self {
        self.description = description.map(Into::into);
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: Source) -> Self {
        self.source = source;
        self
    }

    #[must_use]
    pub fn with_kind(mut self, kind: EventKind) -> Self {
        self.kind = kind;
        self
    }
}

impl Span for EventDraft {
    fn start(&self) -> NaiveDateTime {
        self.start
    }

    fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }
}

/// Manual entry as submitted by a form.
#[derive(Debug, Clone, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub start: NaiveDateTime,
    #[serde(default = "default_duration")]
    pub duration_minutes: u32,
    #[serde(default)]
    pub color: Color,
    #[serde(default)]
    pub description: Option<String>,
}

fn default_duration() -> u32 {
    60
}

impl TryFrom<NewEvent> for EventDraft {
    type Error = EventError;

    fn try_from(new_event: NewEvent) -> Result<Self, Self::Error> {
        let title = new_event.title.trim();
        if title.is_empty() {
            return Err(EventError::EmptyTitle);
        }

        if new_event.duration_minutes == 0 {
            return Err(EventError::ZeroDuration);
        }

        let description = new_event
            .description
            .filter(|description| !description.trim().is_empty());

        Ok(EventDraft::new(title, new_event.start, new_event.duration_minutes)
            .with_color(new_event.color)
            .with_description(description)
            .with_source(Source::Manual))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: u64,
    pub title: String,
    pub start: NaiveDateTime,
    pub duration_minutes: u32,
    pub color: Color,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub source: Source,
    pub kind: EventKind,
}

impl Event {
    fn from_draft(id: u64, draft: EventDraft) -> Self {
        Self {
            id,
            title: draft.title,
            start: draft.start,
            duration_minutes: draft.duration_minutes,
            color: draft.color,
            description: draft.description,
            source: draft.source,
            kind: draft.kind,
        }
    }
}

impl Span for Event {
    fn start(&self) -> NaiveDateTime {
        self.start
    }

    fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }
}

/// The session's events. Operations consume the collection and hand back the
/// updated value; there is no removal.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventCollection {
    events: Vec<Event>,
}

impl EventCollection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: u64) -> Option<&Event> {
        self.events.iter().find(|event| event.id == id)
    }

    fn next_id(&self) -> u64 {
        self.events.iter().map(|event| event.id).max().unwrap_or(0) + 1
    }

    /// Commits drafts in order, giving each the next free id.
    #[must_use]
    pub fn append<I>(mut self, drafts: I) -> Self
    where
        I: IntoIterator<Item = EventDraft>,
    {
        let mut id = self.next_id();
        for draft in drafts {
            self.events.push(Event::from_draft(id, draft));
            id += 1;
        }
        self
    }

    /// Validates a manual entry and appends it.
    pub fn create(self, new_event: NewEvent) -> Result<Self, EventError> {
        let draft = EventDraft::try_from(new_event)?;
        Ok(self.append([draft]))
    }

    /// Events that may be pushed to an external calendar.
    pub fn exportable(&self) -> impl Iterator<Item = &Event> {
        self.events
            .iter()
            .filter(|event| event.source != Source::External)
    }
}

impl<'a> IntoIterator for &'a EventCollection {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 9, 1)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn new_event(title: &str, duration_minutes: u32) -> NewEvent {
        NewEvent {
            title: title.into(),
            start: at(10, 0),
            duration_minutes,
            color: Color::Green,
            description: Some("  ".into()),
        }
    }

    #[test]
    fn rejects_blank_titles() {
        assert_eq!(
            EventDraft::try_from(new_event("   ", 60)),
            Err(EventError::EmptyTitle)
        );
    }

    #[test]
    fn rejects_zero_duration() {
        assert_eq!(
            EventDraft::try_from(new_event("Standup", 0)),
            Err(EventError::ZeroDuration)
        );
    }

    #[test]
    fn manual_entry_is_trimmed_and_tagged() {
        let draft = EventDraft::try_from(new_event("  Standup ", 15)).unwrap();
        assert_eq!(draft.title, "Standup");
        assert_eq!(draft.description, None);
        assert_eq!(draft.source, Source::Manual);
        assert_eq!(draft.color, Color::Green);
    }

    #[test]
    fn append_assigns_increasing_ids() {
        let collection = EventCollection::new()
            .append([
                EventDraft::new("A", at(9, 0), 30),
                EventDraft::new("B", at(11, 0), 30),
            ])
            .append([EventDraft::new("C", at(13, 0), 30)]);

        let ids = collection.iter().map(|event| event.id).collect::<Vec<_>>();
        assert_eq!(ids, [1, 2, 3]);
        assert_eq!(collection.get(3).map(|event| event.title.as_str()), Some("C"));
    }

    #[test]
    fn create_validates_before_appending() {
        let collection = EventCollection::new()
            .create(new_event("Standup", 15))
            .unwrap();
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.events()[0].id, 1);

        assert_eq!(
            collection.create(new_event(" ", 15)),
            Err(EventError::EmptyTitle)
        );
    }

    #[test]
    fn external_events_are_not_exportable() {
        let collection = EventCollection::new().append([
            EventDraft::new("Mine", at(9, 0), 30),
            EventDraft::new("Theirs", at(10, 0), 30).with_source(Source::External),
        ]);

        let titles = collection
            .exportable()
            .map(|event| event.title.as_str())
            .collect::<Vec<_>>();
        assert_eq!(titles, ["Mine"]);
    }

    #[test]
    fn colors_serialize_as_hex() {
        let json = serde_json::to_string(&Color::PALETTE).unwrap();
        let expected = format!(
            "[{}]",
            Color::PALETTE
                .iter()
                .map(|color| format!("\"{}\"", color.hex()))
                .collect::<Vec<_>>()
                .join(",")
        );
        assert_eq!(json, expected);
    }
}
