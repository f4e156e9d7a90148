/// Executive / volunteer position endpoints
///
/// # Endpoints
///
/// - `GET    /api/exec-positions` - List positions (`search`, `active`, paging)
/// - `POST   /api/exec-positions` - Create position
/// - `GET    /api/exec-positions/:id` - Get position
/// - `PUT    /api/exec-positions/:id` - Replace position
/// - `DELETE /api/exec-positions/:id` - Delete position and its applications
/// - `GET    /api/exec-positions/:id/applications` - List applications to it
/// - `POST   /api/exec-positions/:id/applications` - Apply

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiQuery, PathId, ValidatedJson},
    response::{self, Created, JsonResponse},
    routes::{clean, require},
};
use axum::extract::State;
use hearth_shared::{
    models::{
        exec_application::{
            ApplicantDetails, ApplicationFilter, ApplicationStatus, ExecApplication,
            SubmitOutcome,
        },
        exec_position::{
            validate_questions, Answer, ExecPosition, ExecPositionFilter, ExecPositionInput,
            Question,
        },
    },
    pagination::PageRequest,
};
use serde::Deserialize;
use validator::Validate;

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
pub struct PositionRequest {
    #[validate(length(max = 255, message = "Title must be at most 255 characters"))]
    pub title: String,

    pub description: String,

    #[serde(default)]
    pub questions: Vec<Question>,

    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl PositionRequest {
    fn check(&self) -> ApiResult<()> {
        require(&[("title", &self.title), ("description", &self.description)])?;
        validate_questions(&self.questions)
            .map_err(|e| ApiError::invalid("questions", e.to_string()))
    }

    fn into_input(self) -> ExecPositionInput {
        ExecPositionInput {
            title: clean(&self.title),
            description: self.description.trim().to_string(),
            questions: self.questions.into_iter().map(tidy_question).collect(),
            is_active: self.is_active,
        }
    }
}

/// Stored form of a question; answers are matched against these exact strings
fn tidy_question(question: Question) -> Question {
    Question {
        id: clean(&question.id),
        label: clean(&question.label),
        options: question
            .options
            .iter()
            .map(|o| clean(o))
            .filter(|o| !o.is_empty())
            .collect(),
        ..question
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ApplicationRequest {
    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(max = 50, message = "Phone must be at most 50 characters"))]
    pub phone: String,

    #[serde(default)]
    pub answers: Vec<Answer>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PositionApplicationsQuery {
    pub status: Option<ApplicationStatus>,
    pub search: Option<String>,
}

const DUPLICATE: &str = "A position with this title already exists";

fn not_found() -> ApiError {
    ApiError::NotFound("Position not found".to_string())
}

pub async fn list_positions(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<ExecPositionFilter>,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> ApiResult<JsonResponse> {
    let positions = ExecPosition::list(&state.db, &filter, &page).await?;
    response::page("positions", positions)
}

pub async fn create_position(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<PositionRequest>,
) -> ApiResult<Created> {
    req.check()?;

    if ExecPosition::find_duplicate(&state.db, &req.title, None)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(DUPLICATE.to_string()));
    }

    let position = ExecPosition::create(&state.db, req.into_input()).await?;
    tracing::info!(position_id = %position.id, "Position created");
    response::created("position", position)
}

pub async fn get_position(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> ApiResult<JsonResponse> {
    let position = ExecPosition::find_by_id(&state.db, id)
        .await?
        .ok_or_else(not_found)?;
    response::ok("position", position)
}

pub async fn update_position(
    State(state): State<AppState>,
    PathId(id): PathId,
    ValidatedJson(req): ValidatedJson<PositionRequest>,
) -> ApiResult<JsonResponse> {
    req.check()?;

    if ExecPosition::find_by_id(&state.db, id).await?.is_none() {
        return Err(not_found());
    }

    if ExecPosition::find_duplicate(&state.db, &req.title, Some(id))
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(DUPLICATE.to_string()));
    }

    let position = ExecPosition::update(&state.db, id, req.into_input())
        .await?
        .ok_or_else(not_found)?;
    response::ok("position", position)
}

pub async fn delete_position(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> ApiResult<JsonResponse> {
    if !ExecPosition::delete(&state.db, id).await? {
        return Err(not_found());
    }

    tracing::info!(position_id = %id, "Position deleted");
    Ok(response::message("Position deleted successfully"))
}

pub async fn list_position_applications(
    State(state): State<AppState>,
    PathId(id): PathId,
    ApiQuery(query): ApiQuery<PositionApplicationsQuery>,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> ApiResult<JsonResponse> {
    if ExecPosition::find_by_id(&state.db, id).await?.is_none() {
        return Err(not_found());
    }

    let filter = ApplicationFilter {
        position_id: Some(id),
        status: query.status,
        search: query.search,
    };
    let applications = ExecApplication::list(&state.db, &filter, &page).await?;
    response::page("applications", applications)
}

/// Submits an application
///
/// Status codes: 201 submitted, 404 unknown position, 400 position closed
/// or answers invalid, 409 email already applied to this position.
pub async fn apply(
    State(state): State<AppState>,
    PathId(id): PathId,
    ValidatedJson(req): ValidatedJson<ApplicationRequest>,
) -> ApiResult<Created> {
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

    let answers = req
        .answers
        .into_iter()
        .map(|a| Answer {
            question_id: clean(&a.question_id),
            ..a
        })
        .collect();

    match ExecApplication::submit(&state.db, id, applicant, answers).await? {
        SubmitOutcome::Submitted(application) => response::created("application", application),
        SubmitOutcome::PositionNotFound => Err(not_found()),
        SubmitOutcome::PositionInactive => Err(ApiError::BadRequest(
            "This position is not accepting applications".to_string(),
        )),
        SubmitOutcome::InvalidAnswers(e) => Err(ApiError::invalid("answers", e.to_string())),
        SubmitOutcome::AlreadyApplied => Err(ApiError::Conflict(
            "An application with this email already exists for this position".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_shared::models::exec_position::validate_answers;
    use serde_json::json;

    fn position(questions: serde_json::Value) -> PositionRequest {
        serde_json::from_value(json!({
            "title": "Treasurer",
            "description": "Keeps the books",
            "questions": questions
        }))
        .unwrap()
    }

    #[test]
    fn test_position_defaults_to_active() {
        let req = position(json!([]));
        assert!(req.is_active);
        assert!(req.check().is_ok());
    }

    #[test]
    fn test_choice_question_without_options_rejected() {
        let req = position(json!([
            { "id": "q1", "label": "Preferred night", "type": "select", "required": true }
        ]));

        match req.check() {
            Err(ApiError::ValidationError(details)) => assert_eq!(details[0].field, "questions"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_stored_questions_are_trimmed() {
        let req = position(json!([
            { "id": " why ", "label": " Why you? ", "type": "textarea", "required": true },
            { "id": "night", "label": "Night", "type": "radio", "options": [" Mon ", "", "Wed"] }
        ]));
        assert!(req.check().is_ok());

        let input = req.into_input();
        assert_eq!(input.questions[0].id, "why");
        assert_eq!(input.questions[0].label, "Why you?");
        assert_eq!(input.questions[1].options, vec!["Mon", "Wed"]);

        let answers: Vec<Answer> = serde_json::from_value(json!([
            { "question_id": "why", "value": "I like spreadsheets" },
            { "question_id": "night", "value": "Mon" }
        ]))
        .unwrap();
        assert!(validate_answers(&input.questions, &answers).is_ok());
    }

    #[test]
    fn test_unknown_question_type_fails_to_parse() {
        let parsed = serde_json::from_value::<PositionRequest>(json!({
            "title": "Treasurer",
            "description": "Keeps the books",
            "questions": [{ "id": "q1", "label": "Upload", "type": "file" }]
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_application_answers_parse() {
        let req: ApplicationRequest = serde_json::from_value(json!({
            "name": "Rae",
            "email": "rae@example.org",
            "phone": "555-0102",
            "answers": [
                { "question_id": "why", "value": "I like spreadsheets" },
                { "question_id": "nights", "value": ["Mon", "Wed"] },
                { "question_id": "years", "value": 3 }
            ]
        }))
        .unwrap();

        assert!(req.validate().is_ok());
        assert_eq!(req.answers.len(), 3);
    }
}
