/// Position application endpoints
///
/// Applications are submitted through `POST /api/exec-positions/:id/applications`.
///
/// # Endpoints
///
/// - `GET    /api/applications` - List (`position_id`, `status`, `search`, paging)
/// - `GET    /api/applications/:id` - Get application
/// - `PUT    /api/applications/:id` - Edit contact details and review status
/// - `DELETE /api/applications/:id` - Delete application

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiQuery, PathId, ValidatedJson},
    response::{self, JsonResponse},
    routes::{clean, require},
};
use axum::extract::State;
use hearth_shared::{
    models::exec_application::{
        ApplicantDetails, ApplicationFilter, ApplicationStatus, ExecApplication, ReviewOutcome,
    },
    pagination::PageRequest,
};
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct ReviewRequest {
    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(max = 50, message = "Phone must be at most 50 characters"))]
    pub phone: String,

    pub status: ApplicationStatus,
}

fn not_found() -> ApiError {
    ApiError::NotFound("Application not found".to_string())
}

pub async fn list_applications(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<ApplicationFilter>,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> ApiResult<JsonResponse> {
    let applications = ExecApplication::list(&state.db, &filter, &page).await?;
    response::page("applications", applications)
}

pub async fn get_application(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> ApiResult<JsonResponse> {
    let application = ExecApplication::find_by_id(&state.db, id)
        .await?
        .ok_or_else(not_found)?;
    response::ok("application", application)
}

pub async fn update_application(
    State(state): State<AppState>,
    PathId(id): PathId,
    ValidatedJson(req): ValidatedJson<ReviewRequest>,
) -> ApiResult<JsonResponse> {
    require(&[
        ("name", &req.name),
        ("email", &req.email),
        ("phone", &req.phone),
    ])?;

    let applicant = ApplicantDetails {
        name: clean(&req.name),
        email: clean(&req.email),
        phone: clean(&req.phone),
    };

    match ExecApplication::update(&state.db, id, applicant, req.status).await? {
        ReviewOutcome::Updated(application) => response::ok("application", application),
        ReviewOutcome::NotFound => Err(not_found()),
        ReviewOutcome::AlreadyApplied => Err(ApiError::Conflict(
            "An application with this email already exists for this position".to_string(),
        )),
    }
}

pub async fn delete_application(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> ApiResult<JsonResponse> {
    if !ExecApplication::delete(&state.db, id).await? {
        return Err(not_found());
    }

    tracing::info!(application_id = %id, "Application deleted");
    Ok(response::message("Application deleted successfully"))
}
