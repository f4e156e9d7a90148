/// Registration management endpoints
///
/// New registrations are created through `POST /api/events/:id/register`;
/// everything after that lives here.
///
/// # Endpoints
///
/// - `GET    /api/registrations` - List (`event_id`, `status`, `search`, paging)
/// - `GET    /api/registrations/:id` - Get registration
/// - `PUT    /api/registrations/:id` - Edit contact details and status
/// - `DELETE /api/registrations/:id` - Delete and free the seat
/// - `POST   /api/registrations/:id/check-in` - Check the attendee in
/// - `DELETE /api/registrations/:id/check-in` - Undo check-in

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiQuery, PathId, ValidatedJson},
    response::{self, JsonResponse},
    routes::{clean, empty_as_none, require},
};
use axum::extract::State;
use hearth_shared::{
    models::registration::{
        AttendeeDetails, CheckInOutcome, Registration, RegistrationFilter, RegistrationStatus,
        UpdateOutcome,
    },
    pagination::PageRequest,
};
use serde::Deserialize;
use validator::{Validate, ValidationErrors};

/// Attendee contact details, shared by register and update
#[derive(Debug, Deserialize, Validate)]
pub struct AttendeeRequest {
    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(max = 50, message = "Phone must be at most 50 characters"))]
    pub phone: String,

    #[serde(default, deserialize_with = "empty_as_none")]
    pub gender: Option<String>,

    #[validate(range(min = 0, max = 150, message = "Age must be between 0 and 150"))]
    pub age: Option<i32>,

    #[serde(default, deserialize_with = "empty_as_none")]
    pub dietary_restrictions: Option<String>,

    #[serde(default, deserialize_with = "empty_as_none")]
    pub emergency_contact: Option<String>,

    #[serde(default, deserialize_with = "empty_as_none")]
    pub notes: Option<String>,
}

impl AttendeeRequest {
    pub(crate) fn check(&self) -> ApiResult<()> {
        require(&[
            ("name", &self.name),
            ("email", &self.email),
            ("phone", &self.phone),
        ])
    }

    pub(crate) fn into_details(self) -> AttendeeDetails {
        AttendeeDetails {
            name: clean(&self.name),
            email: clean(&self.email),
            phone: clean(&self.phone),
            gender: self.gender,
            age: self.age,
            dietary_restrictions: self.dietary_restrictions,
            emergency_contact: self.emergency_contact,
            notes: self.notes,
        }
    }
}

/// Update request; `status` defaults to the current one
#[derive(Debug, Deserialize)]
pub struct UpdateRegistrationRequest {
    #[serde(flatten)]
    pub attendee: AttendeeRequest,

    pub status: Option<RegistrationStatus>,
}

// Attendee errors are reported as top-level fields rather than nested
impl Validate for UpdateRegistrationRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        self.attendee.validate()
    }
}

fn not_found() -> ApiError {
    ApiError::NotFound("Registration not found".to_string())
}

pub async fn list_registrations(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<RegistrationFilter>,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> ApiResult<JsonResponse> {
    let registrations = Registration::list(&state.db, &filter, &page).await?;
    response::page("registrations", registrations)
}

pub async fn get_registration(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> ApiResult<JsonResponse> {
    let registration = Registration::find_by_id(&state.db, id)
        .await?
        .ok_or_else(not_found)?;
    response::ok("registration", registration)
}

/// Edits a registration
///
/// Cancelling frees the seat; un-cancelling takes one again and fails with
/// 400 when the event has filled up in the meantime.
pub async fn update_registration(
    State(state): State<AppState>,
    PathId(id): PathId,
    ValidatedJson(req): ValidatedJson<UpdateRegistrationRequest>,
) -> ApiResult<JsonResponse> {
    req.attendee.check()?;

    let status = match req.status {
        Some(status) => status,
        None => {
            Registration::find_by_id(&state.db, id)
                .await?
                .ok_or_else(not_found)?
                .status
        }
    };

    match Registration::update(&state.db, id, req.attendee.into_details(), status).await? {
        UpdateOutcome::Updated(registration) => response::ok("registration", registration),
        UpdateOutcome::NotFound => Err(not_found()),
        UpdateOutcome::EventFull => {
            Err(ApiError::BadRequest("Event is at full capacity".to_string()))
        }
        UpdateOutcome::AlreadyRegistered => Err(ApiError::Conflict(
            "Another registration for this event uses this email or name".to_string(),
        )),
    }
}

pub async fn delete_registration(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> ApiResult<JsonResponse> {
    let deleted = Registration::delete(&state.db, id)
        .await?
        .ok_or_else(not_found)?;

    tracing::info!(
        registration_id = %id,
        event_id = %deleted.event_id,
        "Registration deleted"
    );
    Ok(response::message("Registration deleted successfully"))
}

pub async fn check_in(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> ApiResult<JsonResponse> {
    match Registration::check_in(&state.db, id).await? {
        CheckInOutcome::CheckedIn(registration) => response::ok("registration", registration),
        CheckInOutcome::NotFound => Err(not_found()),
        CheckInOutcome::AlreadyCheckedIn => {
            Err(ApiError::Conflict("Attendee is already checked in".to_string()))
        }
        CheckInOutcome::Cancelled => Err(ApiError::BadRequest(
            "Cannot check in a cancelled registration".to_string(),
        )),
    }
}

pub async fn undo_check_in(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> ApiResult<JsonResponse> {
    let registration = Registration::undo_check_in(&state.db, id)
        .await?
        .ok_or_else(not_found)?;
    response::ok("registration", registration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attendee_request_optional_fields() {
        let req: AttendeeRequest = serde_json::from_value(json!({
            "name": " Kim ",
            "email": "kim@example.org",
            "phone": "555-0101",
            "gender": "",
            "notes": "  "
        }))
        .unwrap();

        assert!(req.validate().is_ok());
        assert!(req.check().is_ok());

        let details = req.into_details();
        assert_eq!(details.name, "Kim");
        assert_eq!(details.gender, None);
        assert_eq!(details.notes, None);
        assert_eq!(details.age, None);
    }

    #[test]
    fn test_invalid_email_and_age() {
        let req: AttendeeRequest = serde_json::from_value(json!({
            "name": "Kim",
            "email": "not-an-email",
            "phone": "555-0101",
            "age": 200
        }))
        .unwrap();

        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("age"));
    }

    #[test]
    fn test_update_request_status() {
        let req: UpdateRegistrationRequest = serde_json::from_value(json!({
            "name": "Kim",
            "email": "kim@example.org",
            "phone": "555-0101",
            "status": "cancelled"
        }))
        .unwrap();
        assert_eq!(req.status, Some(RegistrationStatus::Cancelled));

        let bad = serde_json::from_value::<UpdateRegistrationRequest>(json!({
            "name": "Kim",
            "email": "kim@example.org",
            "phone": "555-0101",
            "status": "maybe"
        }));
        assert!(bad.is_err());
    }
}
