/// Event endpoints
///
/// # Endpoints
///
/// - `GET    /api/events` - List events (`search`, `category`, `when`, paging)
/// - `POST   /api/events` - Create event
/// - `GET    /api/events/:id` - Get event
/// - `PUT    /api/events/:id` - Replace event
/// - `DELETE /api/events/:id` - Delete event and its registrations
/// - `POST   /api/events/:id/register` - Register an attendee
/// - `GET    /api/events/:id/registrations` - List the event's registrations
/// - `GET    /api/events/:id/analytics` - Per-event analytics

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiQuery, PathId, ValidatedJson},
    response::{self, Created, JsonResponse},
    routes::{calendar_date, clean, empty_as_none, require},
};
use axum::{extract::State, Json};
use chrono::NaiveDate;
use hearth_shared::{
    analytics,
    models::{
        event::{DateRange, Event, EventFilter, EventInput, Speaker},
        registration::{RegisterOutcome, Registration, RegistrationFilter, RegistrationStatus},
    },
    pagination::PageRequest,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::registrations::AttendeeRequest;

/// Create / replace event request
#[derive(Debug, Deserialize, Validate)]
pub struct EventRequest {
    #[validate(length(max = 255, message = "Title must be at most 255 characters"))]
    pub title: String,

    pub description: String,

    #[validate(length(max = 255, message = "Location must be at most 255 characters"))]
    pub location: String,

    #[serde(deserialize_with = "calendar_date")]
    pub date: NaiveDate,

    pub start_time: String,
    pub end_time: String,

    #[validate(length(max = 100, message = "Category must be at most 100 characters"))]
    pub category: String,

    /// 0 means unlimited
    #[serde(default)]
    #[validate(range(min = 0, message = "Capacity cannot be negative"))]
    pub capacity: i32,

    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(url(message = "Image URL must be a valid URL"))]
    pub image_url: Option<String>,

    #[serde(default)]
    pub speakers: Vec<Speaker>,

    #[serde(default)]
    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: f64,

    pub created_by: Option<Uuid>,
}

impl EventRequest {
    fn check(&self) -> ApiResult<()> {
        require(&[
            ("title", &self.title),
            ("description", &self.description),
            ("location", &self.location),
            ("start_time", &self.start_time),
            ("end_time", &self.end_time),
            ("category", &self.category),
        ])?;

        if self.speakers.iter().any(|s| s.name.trim().is_empty()) {
            return Err(ApiError::invalid("speakers", "Every speaker needs a name"));
        }
        Ok(())
    }

    fn into_input(self) -> EventInput {
        EventInput {
            title: clean(&self.title),
            description: self.description.trim().to_string(),
            location: clean(&self.location),
            date: self.date,
            start_time: clean(&self.start_time),
            end_time: clean(&self.end_time),
            category: clean(&self.category),
            capacity: self.capacity,
            image_url: self.image_url,
            speakers: self
                .speakers
                .into_iter()
                .map(|s| Speaker {
                    name: clean(&s.name),
                    ..s
                })
                .collect(),
            price: self.price,
            created_by: self.created_by,
        }
    }
}

/// Seat counts returned with a new registration
#[derive(Debug, Serialize)]
struct SeatSummary {
    id: Uuid,
    capacity: i32,
    registered_attendees: i32,
    remaining_spots: Option<i32>,
}

const DUPLICATE: &str = "An event with this title already exists on this date";

fn not_found() -> ApiError {
    ApiError::NotFound("Event not found".to_string())
}

pub async fn list_events(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<EventFilter>,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> ApiResult<JsonResponse> {
    let events = Event::list(&state.db, &filter, &page).await?;
    response::page("events", events)
}

pub async fn create_event(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<EventRequest>,
) -> ApiResult<Created> {
    req.check()?;

    if Event::find_duplicate(&state.db, &req.title, req.date, None)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(DUPLICATE.to_string()));
    }

    let event = Event::create(&state.db, req.into_input()).await?;
    response::created("event", event)
}

pub async fn get_event(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> ApiResult<JsonResponse> {
    let event = Event::find_by_id(&state.db, id).await?.ok_or_else(not_found)?;
    response::ok("event", event)
}

pub async fn update_event(
    State(state): State<AppState>,
    PathId(id): PathId,
    ValidatedJson(req): ValidatedJson<EventRequest>,
) -> ApiResult<JsonResponse> {
    req.check()?;

    if Event::find_by_id(&state.db, id).await?.is_none() {
        return Err(not_found());
    }

    if Event::find_duplicate(&state.db, &req.title, req.date, Some(id))
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(DUPLICATE.to_string()));
    }

    let event = Event::update(&state.db, id, req.into_input())
        .await?
        .ok_or_else(not_found)?;

    tracing::info!(event_id = %id, "Event updated");
    response::ok("event", event)
}

pub async fn delete_event(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> ApiResult<JsonResponse> {
    if !Event::delete(&state.db, id).await? {
        return Err(not_found());
    }

    tracing::info!(event_id = %id, "Event deleted");
    Ok(response::message("Event deleted successfully"))
}

/// Registers an attendee
///
/// Status codes: 201 registered, 404 unknown event, 400 event full,
/// 409 same email or name already registered.
pub async fn register_for_event(
    State(state): State<AppState>,
    PathId(id): PathId,
    ValidatedJson(req): ValidatedJson<AttendeeRequest>,
) -> ApiResult<Created> {
    req.check()?;

    match Registration::register(&state.db, id, req.into_details()).await? {
        RegisterOutcome::Registered {
            registration,
            event,
        } => {
            let (status, Json(mut body)) = response::created("registration", registration)?;
            body["event"] = serde_json::to_value(SeatSummary {
                id: event.id,
                capacity: event.capacity,
                registered_attendees: event.registered_attendees,
                remaining_spots: event.remaining_spots(),
            })?;
            Ok((status, Json(body)))
        }
        RegisterOutcome::EventNotFound => Err(not_found()),
        RegisterOutcome::EventFull => {
            Err(ApiError::BadRequest("Event is at full capacity".to_string()))
        }
        RegisterOutcome::AlreadyRegistered => Err(ApiError::Conflict(
            "You are already registered for this event".to_string(),
        )),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct EventRegistrationsQuery {
    pub status: Option<RegistrationStatus>,
    pub search: Option<String>,
}

pub async fn list_event_registrations(
    State(state): State<AppState>,
    PathId(id): PathId,
    ApiQuery(query): ApiQuery<EventRegistrationsQuery>,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> ApiResult<JsonResponse> {
    if Event::find_by_id(&state.db, id).await?.is_none() {
        return Err(not_found());
    }

    let filter = RegistrationFilter {
        event_id: Some(id),
        status: query.status,
        search: query.search,
    };
    let registrations = Registration::list(&state.db, &filter, &page).await?;
    response::page("registrations", registrations)
}

pub async fn event_analytics(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> ApiResult<JsonResponse> {
    let event = Event::find_by_id(&state.db, id).await?.ok_or_else(not_found)?;
    let registrations =
        Registration::list_for_analytics(&state.db, Some(id), &DateRange::default()).await?;

    tracing::debug!(event_id = %id, count = registrations.len(), "Computing event analytics");
    response::ok("analytics", analytics::event_summary(&event, &registrations))
}
