use ics::{
    escape_text,
    properties::{Categories, Description, DtEnd, DtStart, Summary},
};

use crate::event::{Event, EventCollection, Span};

const ICS_FORMAT: &str = "%Y%m%dT%H%M%S";

impl EventCollection {
    /// Floating local times; calendar clients place them in their own zone.
    #[must_use]
    pub fn to_ics<'a>(&'a self, name: &'a str) -> ics::ICalendar<'a> {
        let mut icalendar = ics::ICalendar::new("2.0", name);

        for event in self {
            icalendar.add_event(event.to_ics());
        }

        icalendar
    }
}

impl Event {
    #[must_use]
    pub fn to_ics(&self) -> ics::Event<'_> {
        let start = self.start().format(ICS_FORMAT).to_string();
        let end = self.end().format(ICS_FORMAT).to_string();

        let id = format!("{}_{}@weekcal", start, self.id);

        let mut ics_event = ics::Event::new(id, start.clone());

        ics_event.push(DtStart::new(start));
        ics_event.push(DtEnd::new(end));
        ics_event.push(Summary::new(escape_text(self.title.as_str())));
        ics_event.push(Categories::new(self.kind.as_str().to_uppercase()));

        if let Some(description) = &self.description {
            ics_event.push(Description::new(escape_text(description.as_str())));
        }

        ics_event
    }
}
