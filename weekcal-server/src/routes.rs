use std::mem;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Duration, Local, Months, NaiveDate, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;
use weekcal_core::{
    place_suggestions,
    sync::normalize_all,
    time::{self, EventLayout, TimeSlot, WeekDay},
    upcoming, Activity, Color, Event, EventDraft, EventError, EventKind, ExternalEvent, NewEvent,
    RecurrenceError, RecurrenceSpec, Source, SyllabusExtractor, MAX_HORIZON_DAYS, MAX_WINDOW_DAYS,
};

use crate::google::{GoogleCalendar, GoogleError};
use crate::session::{Session, Sessions};

const PRODUCT_ID: &str = concat!("-//", env!("CARGO_PKG_NAME"), "//EN");
const IMPORT_LIMIT: u32 = 20;

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<Sessions>,
    pub extractor: Arc<SyllabusExtractor>,
    pub google: Arc<GoogleCalendar>,
    pub time_zone: Arc<str>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/sessions/:session/events",
            get(list_events).post(create_event),
        )
        .route("/sessions/:session/week", get(week))
        .route("/sessions/:session/syllabus", post(parse_syllabus))
        .route("/sessions/:session/recurrence", post(expand_recurrence))
        .route("/sessions/:session/upcoming", get(upcoming_events))
        .route("/sessions/:session/suggestions", post(suggest))
        .route("/sessions/:session/calendar.ics", get(calendar_ics))
        .route("/sessions/:session/google/import", post(google_import))
        .route("/sessions/:session/google/export", post(google_export))
        .fallback(|| async { ApiError(StatusCode::NOT_FOUND, "Unknown route".into()) })
        .with_state(state)
}

struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "error": self.1 }))).into_response()
    }
}

impl From<EventError> for ApiError {
    fn from(err: EventError) -> Self {
        ApiError(StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
    }
}

impl From<RecurrenceError> for ApiError {
    fn from(err: RecurrenceError) -> Self {
        ApiError(StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
    }
}

impl From<GoogleError> for ApiError {
    fn from(err: GoogleError) -> Self {
        let status = match &err {
            GoogleError::Status { status, .. } if status.as_u16() == 401 => {
                StatusCode::UNAUTHORIZED
            }
            _ => StatusCode::BAD_GATEWAY,
        };
        ApiError(status, err.to_string())
    }
}

fn at_most(name: &str, days: u32, max: u32) -> Result<u32, ApiError> {
    if days > max {
        return Err(ApiError(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("{name} must be at most {max} days, got {days}"),
        ));
    }
    Ok(days)
}

async fn commit(session: &Session, drafts: Vec<EventDraft>) -> usize {
    let count = drafts.len();
    let mut events = session.write().await;
    *events = mem::take(&mut *events).append(drafts);
    count
}

#[derive(Deserialize)]
struct CommitQuery {
    #[serde(default)]
    commit: bool,
}

#[derive(Serialize)]
struct Proposed<T> {
    events: Vec<T>,
    committed: usize,
}

async fn list_events(State(state): State<AppState>, Path(session): Path<String>) -> Response {
    let session = state.sessions.get_or_create(&session);
    let events = session.read().await;
    Json(&*events).into_response()
}

async fn create_event(
    State(state): State<AppState>,
    Path(session): Path<String>,
    Json(new_event): Json<NewEvent>,
) -> Result<Response, ApiError> {
    let draft = EventDraft::try_from(new_event)?;

    let session = state.sessions.get_or_create(&session);
    let mut events = session.write().await;
    *events = mem::take(&mut *events).append([draft]);

    Ok((StatusCode::CREATED, Json(events.events().last())).into_response())
}

#[derive(Deserialize)]
struct WeekQuery {
    date: Option<NaiveDate>,
}

#[derive(Serialize)]
struct PlacedEvent<'a> {
    #[serde(flatten)]
    event: &'a Event,
    color_name: &'static str,
    time_label: String,
    layout: EventLayout,
}

#[derive(Serialize)]
struct DayColumn<'a> {
    #[serde(flatten)]
    day: WeekDay,
    events: Vec<PlacedEvent<'a>>,
}

#[derive(Serialize)]
struct WeekView<'a> {
    month: String,
    previous: Option<NaiveDate>,
    next: Option<NaiveDate>,
    slots: Vec<TimeSlot>,
    days: Vec<DayColumn<'a>>,
}

async fn week(
    State(state): State<AppState>,
    Path(session): Path<String>,
    Query(query): Query<WeekQuery>,
) -> Response {
    let today = Local::now().date_naive();
    let reference = query.date.unwrap_or(today);

    let session = state.sessions.get_or_create(&session);
    let events = session.read().await;

    let days = time::week_of(reference, today)
        .into_iter()
        .map(|day| {
            let mut placed = time::events_on(events.events(), day.date)
                .map(|event| PlacedEvent {
                    event,
                    color_name: event.color.label(),
                    time_label: time::format_clock(event.start.time()),
                    layout: time::layout(event),
                })
                .collect::<Vec<_>>();
            placed.sort_by_key(|placed| placed.event.start);
            DayColumn {
                day,
                events: placed,
            }
        })
        .collect();

    Json(WeekView {
        month: time::format_month(reference),
        previous: time::shift_week(reference, -1),
        next: time::shift_week(reference, 1),
        slots: time::time_slots(),
        days,
    })
    .into_response()
}

async fn parse_syllabus(
    State(state): State<AppState>,
    Path(session): Path<String>,
    Query(query): Query<CommitQuery>,
    text: String,
) -> Response {
    let candidates = state.extractor.extract(&text);
    info!("Found {} candidates in syllabus for session {session}", candidates.len());

    let committed = if query.commit {
        let session = state.sessions.get_or_create(&session);
        let drafts = candidates.iter().map(|candidate| candidate.draft().clone());
        commit(&session, drafts.collect()).await
    } else {
        0
    };

    Json(Proposed {
        events: candidates,
        committed,
    })
    .into_response()
}

#[derive(Deserialize)]
struct RecurrenceRequest {
    #[serde(flatten)]
    schedule: RecurrenceSpec,
    title: String,
    #[serde(default)]
    color: Color,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    kind: EventKind,
}

async fn expand_recurrence(
    State(state): State<AppState>,
    Path(session): Path<String>,
    Query(query): Query<CommitQuery>,
    Json(request): Json<RecurrenceRequest>,
) -> Result<Response, ApiError> {
    let title = request.title.trim();
    if title.is_empty() {
        return Err(EventError::EmptyTitle.into());
    }

    let drafts = request
        .schedule
        .expand()?
        .into_iter()
        .map(|occurrence| {
            EventDraft::new(title, occurrence.start, occurrence.duration_minutes)
                .with_color(request.color)
                .with_description(request.description.clone())
                .with_kind(request.kind)
                .with_source(Source::Manual)
        })
        .collect::<Vec<_>>();

    let committed = if query.commit {
        let session = state.sessions.get_or_create(&session);
        commit(&session, drafts.clone()).await
    } else {
        0
    };

    Ok(Json(Proposed {
        events: drafts,
        committed,
    })
    .into_response())
}

#[derive(Deserialize)]
struct UpcomingQuery {
    #[serde(default = "default_window")]
    days: u32,
}

fn default_window() -> u32 {
    7
}

async fn upcoming_events(
    State(state): State<AppState>,
    Path(session): Path<String>,
    Query(query): Query<UpcomingQuery>,
) -> Result<Response, ApiError> {
    let days = at_most("days", query.days, MAX_WINDOW_DAYS)?;
    let now = Local::now().naive_local();

    let session = state.sessions.get_or_create(&session);
    let events = session.read().await;

    Ok(Json(upcoming(events.events(), now, days)).into_response())
}

#[derive(Deserialize)]
struct SuggestionRequest {
    activities: Vec<Activity>,
    #[serde(default = "default_window")]
    horizon_days: u32,
}

async fn suggest(
    State(state): State<AppState>,
    Path(session): Path<String>,
    Query(query): Query<CommitQuery>,
    Json(request): Json<SuggestionRequest>,
) -> Result<Response, ApiError> {
    let horizon_days = at_most("horizon_days", request.horizon_days, MAX_HORIZON_DAYS)?;
    let today = Local::now().date_naive();

    let session = state.sessions.get_or_create(&session);
    let mut events = session.write().await;

    let placed = place_suggestions(
        &request.activities,
        events.events(),
        today,
        horizon_days,
    );

    let committed = if query.commit {
        *events = mem::take(&mut *events).append(placed.iter().cloned());
        placed.len()
    } else {
        0
    };

    Ok(Json(Proposed {
        events: placed,
        committed,
    })
    .into_response())
}

async fn calendar_ics(State(state): State<AppState>, Path(session): Path<String>) -> Response {
    let session = state.sessions.get_or_create(&session);
    let events = session.read().await;

    (
        [(header::CONTENT_TYPE, "text/calendar")],
        events.to_ics(PRODUCT_ID).to_string(),
    )
        .into_response()
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError(StatusCode::UNAUTHORIZED, "Missing bearer token".into()))
}

async fn google_import(
    State(state): State<AppState>,
    Path(session): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let token = bearer_token(&headers)?;

    let now = Utc::now();
    let until = now
        .checked_add_months(Months::new(1))
        .unwrap_or(now + Duration::days(30));

    let records = state.google.list(token, now, until, IMPORT_LIMIT).await?;
    let drafts = normalize_all(&records).map_err(GoogleError::from)?;

    let session_events = state.sessions.get_or_create(&session);
    let imported = commit(&session_events, drafts).await;
    info!("Imported {imported} events into session {session}");

    Ok(Json(json!({ "imported": imported })).into_response())
}

async fn google_export(
    State(state): State<AppState>,
    Path(session): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let token = bearer_token(&headers)?;

    let records = {
        let session = state.sessions.get_or_create(&session);
        let events = session.read().await;
        events
            .exportable()
            .map(|event| ExternalEvent::from_event(event, &state.time_zone))
            .collect::<Vec<_>>()
    };

    let mut exported = 0;
    for record in &records {
        if let Err(err) = state.google.insert(token, record).await {
            warn!("Export for session {session} stopped after {exported} events: {err}");
            let ApiError(status, message) = err.into();
            return Err(ApiError(
                status,
                format!("{message} (exported {exported} of {})", records.len()),
            ));
        }
        exported += 1;
    }

    info!("Exported {exported} events from session {session}");
    Ok(Json(json!({ "exported": exported })).into_response())
}
