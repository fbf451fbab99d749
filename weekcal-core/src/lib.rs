//! Scheduling core of a week-view calendar: overlap checks, weekly recurrence
//! expansion, syllabus extraction, upcoming-event selection and conflict-free
//! suggestion placement.

mod config;
mod error;
mod event;

#[cfg(feature = "ics")]
mod ics;

pub mod overlap;
pub mod recurrence;
pub mod suggest;
pub mod syllabus;
pub mod sync;
pub mod time;
pub mod upcoming;

pub use config::{ExamLabel, TermConfig};
pub use error::{ConfigError, Error, EventError, RecurrenceError, Result, SyncError};
pub use event::{Color, Event, EventCollection, EventDraft, EventKind, NewEvent, Source, Span};
pub use overlap::overlaps;
pub use recurrence::{Occurrence, RecurrenceSpec, MAX_RANGE_DAYS};
pub use suggest::{place_suggestions, Activity, Frequency, TimeOfDay, MAX_HORIZON_DAYS};
pub use syllabus::{EventCandidate, SyllabusExtractor};
pub use sync::ExternalEvent;
pub use upcoming::{
    select_upcoming, upcoming, DayGroup, DayLabel, MAX_WINDOW_DAYS, UPCOMING_LIMIT,
};
