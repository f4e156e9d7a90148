/// Account endpoints
///
/// Sign-up is gated by a shared passcode (`REGISTRATION_PASSCODE`). Login
/// only verifies credentials and returns the account; there are no sessions
/// or tokens.
///
/// # Endpoints
///
/// - `POST   /api/accounts` - Sign up (requires passcode)
/// - `POST   /api/accounts/login` - Verify email and password
/// - `GET    /api/accounts/:id` - Get account
/// - `PUT    /api/accounts/:id` - Update profile, optionally the password
/// - `DELETE /api/accounts/:id` - Delete account

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{PathId, ValidatedJson},
    response::{self, Created, JsonResponse},
    routes::{clean, empty_as_none, require},
};
use axum::extract::State;
use hearth_shared::{
    auth::{
        passcode::{check_passcode, PasscodeCheck},
        password,
    },
    models::account::{Account, CreateAccount, UpdateAccount},
};
use serde::Deserialize;
use validator::Validate;

/// Sign-up request
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    /// Shared registration passcode; a missing one is treated as wrong
    #[serde(default)]
    pub passcode: String,

    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(max = 50, message = "Phone must be at most 50 characters"))]
    pub phone: String,

    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

/// Profile update; omitted fields are left unchanged
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAccountRequest {
    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(length(max = 50, message = "Phone must be at most 50 characters"))]
    pub phone: Option<String>,

    #[serde(default, deserialize_with = "empty_as_none")]
    pub password: Option<String>,

    pub profile_completed: Option<bool>,
}

fn not_found() -> ApiError {
    ApiError::NotFound("Account not found".to_string())
}

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized("Invalid email or password".to_string())
}

/// Creates an account
///
/// The passcode is checked before anything touches the database.
///
/// # Errors
///
/// - `401 Unauthorized`: Wrong passcode, or sign-up disabled
/// - `400 Bad Request`: Validation failed
/// - `409 Conflict`: Email already registered
pub async fn signup(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SignupRequest>,
) -> ApiResult<Created> {
    match check_passcode(state.config.signup.passcode.as_deref(), &req.passcode) {
        PasscodeCheck::Accepted => {}
        PasscodeCheck::Rejected => {
            tracing::warn!("Sign-up rejected, wrong passcode");
            return Err(ApiError::Unauthorized("Invalid registration passcode".to_string()));
        }
        PasscodeCheck::SignupDisabled => {
            return Err(ApiError::Unauthorized("Registration is currently closed".to_string()));
        }
    }

    require(&[
        ("name", &req.name),
        ("email", &req.email),
        ("phone", &req.phone),
    ])?;
    password::validate_password(&req.password).map_err(|e| ApiError::invalid("password", e))?;

    if Account::find_by_email(&state.db, &req.email).await?.is_some() {
        return Err(ApiError::Conflict(
            "An account with this email already exists".to_string(),
        ));
    }

    let password_hash = password::hash_password(&req.password)?;

    let account = Account::create(
        &state.db,
        CreateAccount {
            name: clean(&req.name),
            email: clean(&req.email),
            phone: clean(&req.phone),
            password_hash,
        },
    )
    .await?;

    tracing::info!(account_id = %account.id, "Account created");
    response::created("account", account)
}

pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<JsonResponse> {
    let account = Account::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(invalid_credentials)?;

    if !password::verify_password(&req.password, &account.password_hash)? {
        tracing::info!(account_id = %account.id, "Login failed");
        return Err(invalid_credentials());
    }

    tracing::info!(account_id = %account.id, "Login succeeded");
    response::ok("account", account)
}

pub async fn get_account(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> ApiResult<JsonResponse> {
    let account = Account::find_by_id(&state.db, id)
        .await?
        .ok_or_else(not_found)?;
    response::ok("account", account)
}

pub async fn update_account(
    State(state): State<AppState>,
    PathId(id): PathId,
    ValidatedJson(req): ValidatedJson<UpdateAccountRequest>,
) -> ApiResult<JsonResponse> {
    let password_hash = match req.password.as_deref() {
        Some(new_password) => {
            password::validate_password(new_password)
                .map_err(|e| ApiError::invalid("password", e))?;
            Some(password::hash_password(new_password)?)
        }
        None => None,
    };

    let account = Account::update(
        &state.db,
        id,
        UpdateAccount {
            name: req.name,
            phone: req.phone,
            password_hash,
            profile_completed: req.profile_completed,
        },
    )
    .await?
    .ok_or_else(not_found)?;

    response::ok("account", account)
}

pub async fn delete_account(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> ApiResult<JsonResponse> {
    if !Account::delete(&state.db, id).await? {
        return Err(not_found());
    }

    tracing::info!(account_id = %id, "Account deleted");
    Ok(response::message("Account deleted successfully"))
}
