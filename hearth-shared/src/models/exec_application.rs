/// Applications to executive / volunteer positions
///
/// # Schema
///
/// ```sql
/// CREATE TYPE application_status AS ENUM ('pending', 'approved', 'rejected');
///
/// CREATE TABLE exec_applications (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     position_id UUID NOT NULL REFERENCES exec_positions(id) ON DELETE CASCADE,
///     name VARCHAR(255) NOT NULL,
///     email VARCHAR(255) NOT NULL,      -- unique per position on LOWER(email)
///     phone VARCHAR(50) NOT NULL,
///     answers JSONB NOT NULL DEFAULT '[]',
///     status application_status NOT NULL DEFAULT 'pending',
///     submitted_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::exec_position::{validate_answers, Answer, AnswerError, ExecPosition};
use super::search::{non_blank, push_page, push_search};
use crate::pagination::{Page, PageRequest, Pagination};

const COLUMNS: &str =
    "id, position_id, name, email, phone, answers, status, submitted_at, updated_at";

/// Review status; reviewers may move an application between any two states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "application_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ExecApplication {
    pub id: Uuid,
    pub position_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub answers: Json<Vec<Answer>>,
    pub status: ApplicationStatus,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ApplicantDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Outcome of [`ExecApplication::submit`]
#[derive(Debug)]
pub enum SubmitOutcome {
    Submitted(ExecApplication),
    PositionNotFound,
    PositionInactive,
    InvalidAnswers(AnswerError),
    AlreadyApplied,
}

/// Outcome of [`ExecApplication::update`]
#[derive(Debug)]
pub enum ReviewOutcome {
    Updated(ExecApplication),
    NotFound,
    AlreadyApplied,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicationFilter {
    pub position_id: Option<Uuid>,
    pub status: Option<ApplicationStatus>,

    /// Matched against name and email
    pub search: Option<String>,
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ApplicationFilter) {
    if let Some(position_id) = filter.position_id {
        qb.push(" AND position_id = ").push_bind(position_id);
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    push_search(qb, &["name", "email"], non_blank(&filter.search));
}

impl ExecApplication {
    /// Submits an application after checking the position and the answers
    pub async fn submit(
        pool: &PgPool,
        position_id: Uuid,
        applicant: ApplicantDetails,
        answers: Vec<Answer>,
    ) -> Result<SubmitOutcome, sqlx::Error> {
        let Some(position) = ExecPosition::find_by_id(pool, position_id).await? else {
            return Ok(SubmitOutcome::PositionNotFound);
        };

        if !position.is_active {
            return Ok(SubmitOutcome::PositionInactive);
        }

        if let Err(e) = validate_answers(&position.questions, &answers) {
            return Ok(SubmitOutcome::InvalidAnswers(e));
        }

        if Self::email_taken(pool, position_id, &applicant.email, None).await? {
            return Ok(SubmitOutcome::AlreadyApplied);
        }

        let query = format!(
            "INSERT INTO exec_applications (position_id, name, email, phone, answers)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );

        let application = sqlx::query_as::<_, ExecApplication>(&query)
            .bind(position_id)
            .bind(applicant.name)
            .bind(applicant.email)
            .bind(applicant.phone)
            .bind(Json(answers))
            .fetch_one(pool)
            .await?;

        tracing::info!(
            position_id = %position_id,
            application_id = %application.id,
            "Application submitted"
        );

        Ok(SubmitOutcome::Submitted(application))
    }

    async fn email_taken(
        pool: &PgPool,
        position_id: Uuid,
        email: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (
                 SELECT 1 FROM exec_applications
                 WHERE position_id = $1 AND LOWER(email) = LOWER($2)
                   AND ($3::uuid IS NULL OR id <> $3)
             )",
        )
        .bind(position_id)
        .bind(email.trim())
        .bind(exclude)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM exec_applications WHERE id = $1");

        sqlx::query_as::<_, ExecApplication>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        filter: &ApplicationFilter,
        page: &PageRequest,
    ) -> Result<Page<Self>, sqlx::Error> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM exec_applications WHERE TRUE");
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

        let mut select =
            QueryBuilder::new(format!("SELECT {COLUMNS} FROM exec_applications WHERE TRUE"));
        push_filters(&mut select, filter);
        select.push(" ORDER BY submitted_at DESC");
        push_page(&mut select, page);
        let items = select.build_query_as::<ExecApplication>().fetch_all(pool).await?;

        Ok(Page {
            items,
            pagination: Pagination::new(page, total),
        })
    }

    /// Updates applicant details and status
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        applicant: ApplicantDetails,
        status: ApplicationStatus,
    ) -> Result<ReviewOutcome, sqlx::Error> {
        let Some(current) = Self::find_by_id(pool, id).await? else {
            return Ok(ReviewOutcome::NotFound);
        };

        if Self::email_taken(pool, current.position_id, &applicant.email, Some(id)).await? {
            return Ok(ReviewOutcome::AlreadyApplied);
        }

        let query = format!(
            "UPDATE exec_applications SET
                 name = $2, email = $3, phone = $4, status = $5, updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );

        let updated = sqlx::query_as::<_, ExecApplication>(&query)
            .bind(id)
            .bind(applicant.name)
            .bind(applicant.email)
            .bind(applicant.phone)
            .bind(status)
            .fetch_optional(pool)
            .await?;

        let Some(application) = updated else {
            return Ok(ReviewOutcome::NotFound);
        };

        if current.status != application.status {
            tracing::info!(
                application_id = %id,
                from = current.status.as_str(),
                to = application.status.as_str(),
                "Application status changed"
            );
        }

        Ok(ReviewOutcome::Updated(application))
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM exec_applications WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
