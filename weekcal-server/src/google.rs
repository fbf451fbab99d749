use chrono::{DateTime, Utc};
use log::debug;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use weekcal_core::{ExternalEvent, SyncError};

const UPSTREAM: &str = "https://www.googleapis.com/calendar/v3";
const CALENDAR_ID: &str = "primary";

#[derive(Error, Debug)]
pub enum GoogleError {
    #[error("Request to Google Calendar failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Google Calendar answered {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error(transparent)]
    Record(#[from] SyncError),
}

#[derive(Deserialize)]
struct EventList {
    #[serde(default)]
    items: Vec<ExternalEvent>,
}

pub struct GoogleCalendar {
    client: Client,
    upstream: String,
}

impl GoogleCalendar {
    pub fn new(client: Client) -> Self {
        Self::with_upstream(client, UPSTREAM)
    }

    pub fn with_upstream<S: Into<String>>(client: Client, upstream: S) -> Self {
        Self {
            client,
            upstream: upstream.into(),
        }
    }

    fn events_url(&self) -> String {
        format!("{}/calendars/{CALENDAR_ID}/events", self.upstream)
    }

    pub async fn list(
        &self,
        token: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
        max_results: u32,
    ) -> Result<Vec<ExternalEvent>, GoogleError> {
        debug!("Listing Google Calendar events between {time_min} and {time_max}");

        let response = self
            .client
            .get(self.events_url())
            .bearer_auth(token)
            .query(&[
                ("timeMin", time_min.to_rfc3339()),
                ("timeMax", time_max.to_rfc3339()),
                ("maxResults", max_results.to_string()),
                ("singleEvents", "true".into()),
                ("orderBy", "startTime".into()),
            ])
            .send()
            .await?;

        let list: EventList = ensure_success(response).await?.json().await?;
        Ok(list.items)
    }

    pub async fn insert(&self, token: &str, event: &ExternalEvent) -> Result<(), GoogleError> {
        let response = self
            .client
            .post(self.events_url())
            .bearer_auth(token)
            .json(event)
            .send()
            .await?;

        ensure_success(response).await?;
        Ok(())
    }
}

async fn ensure_success(response: Response) -> Result<Response, GoogleError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(GoogleError::Status { status, body })
}
