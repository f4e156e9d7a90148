/// Executive / volunteer positions and their application forms
///
/// Each position carries its own list of custom questions. Applications
/// (see [`super::exec_application`]) answer those questions and are checked
/// against them before they are stored.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE exec_positions (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL,
///     questions JSONB NOT NULL DEFAULT '[]',
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, PgPool, Postgres, QueryBuilder};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use super::search::{non_blank, push_page, push_search};
use crate::pagination::{Page, PageRequest, Pagination};

const COLUMNS: &str = "id, title, description, questions, is_active, created_at, updated_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Text,
    Textarea,
    Select,
    Radio,
    Checkbox,
    Email,
    Number,
}

impl QuestionType {
    /// Answer must come from the question's options
    pub fn has_options(&self) -> bool {
        matches!(
            self,
            QuestionType::Select | QuestionType::Radio | QuestionType::Checkbox
        )
    }
}

/// One custom question on a position's application form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub label: String,

    #[serde(rename = "type")]
    pub kind: QuestionType,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub options: Vec<String>,
}

/// A submitted answer; checkbox questions take a list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Text(String),
    Number(f64),
    Choices(Vec<String>),
}

impl AnswerValue {
    fn is_blank(&self) -> bool {
        match self {
            AnswerValue::Text(text) => text.trim().is_empty(),
            AnswerValue::Number(_) => false,
            AnswerValue::Choices(choices) => choices.iter().all(|c| c.trim().is_empty()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: String,
    pub value: AnswerValue,
}

/// Problems with a position's question list
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuestionError {
    #[error("Question {0} is missing an id")]
    MissingId(usize),

    #[error("Question '{0}' is missing a label")]
    MissingLabel(String),

    #[error("Question id '{0}' is used more than once")]
    DuplicateId(String),

    #[error("Question '{0}' needs at least one option")]
    MissingOptions(String),
}

/// Problems with an application's answers
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnswerError {
    #[error("Answer refers to unknown question '{0}'")]
    UnknownQuestion(String),

    #[error("Question '{0}' was answered more than once")]
    DuplicateAnswer(String),

    #[error("'{0}' is required")]
    MissingRequired(String),

    #[error("'{label}' must be one of the listed options")]
    InvalidOption { label: String },

    #[error("'{0}' must be a valid email address")]
    InvalidEmail(String),

    #[error("'{0}' must be a number")]
    InvalidNumber(String),

    #[error("'{0}' expects a single answer")]
    UnexpectedList(String),
}

/// Checks a question list before it is saved on a position
pub fn validate_questions(questions: &[Question]) -> Result<(), QuestionError> {
    let mut seen = HashSet::new();

    for (index, question) in questions.iter().enumerate() {
        let id = question.id.trim();
        if id.is_empty() {
            return Err(QuestionError::MissingId(index + 1));
        }
        if question.label.trim().is_empty() {
            return Err(QuestionError::MissingLabel(id.to_string()));
        }
        if !seen.insert(id) {
            return Err(QuestionError::DuplicateId(id.to_string()));
        }
        if question.kind.has_options() && question.options.iter().all(|o| o.trim().is_empty()) {
            return Err(QuestionError::MissingOptions(question.label.clone()));
        }
    }

    Ok(())
}

/// Checks application answers against the position's questions
pub fn validate_answers(questions: &[Question], answers: &[Answer]) -> Result<(), AnswerError> {
    let by_id: HashMap<&str, &Question> =
        questions.iter().map(|q| (q.id.as_str(), q)).collect();

    let mut answered: HashMap<&str, &AnswerValue> = HashMap::new();
    for answer in answers {
        let id = answer.question_id.as_str();
        if !by_id.contains_key(id) {
            return Err(AnswerError::UnknownQuestion(id.to_string()));
        }
        if answered.insert(id, &answer.value).is_some() {
            return Err(AnswerError::DuplicateAnswer(id.to_string()));
        }
    }

    for question in questions {
        let value = answered
            .get(question.id.as_str())
            .copied()
            .filter(|v| !v.is_blank());

        match value {
            None if question.required => {
                return Err(AnswerError::MissingRequired(question.label.clone()))
            }
            None => {}
            Some(value) => check_value(question, value)?,
        }
    }

    Ok(())
}

fn check_value(question: &Question, value: &AnswerValue) -> Result<(), AnswerError> {
    let label = || question.label.clone();
    let in_options = |choice: &str| question.options.iter().any(|o| o == choice);

    match (question.kind, value) {
        (QuestionType::Checkbox, AnswerValue::Choices(choices)) => {
            if choices.iter().all(|c| in_options(c)) {
                Ok(())
            } else {
                Err(AnswerError::InvalidOption { label: label() })
            }
        }
        (kind, AnswerValue::Text(choice)) if kind.has_options() => {
            if in_options(choice) {
                Ok(())
            } else {
                Err(AnswerError::InvalidOption { label: label() })
            }
        }
        (kind, AnswerValue::Number(_)) if kind.has_options() => {
            Err(AnswerError::InvalidOption { label: label() })
        }
        (QuestionType::Number, AnswerValue::Number(_)) => Ok(()),
        (QuestionType::Number, AnswerValue::Text(text)) => text
            .trim()
            .parse::<f64>()
            .map(|_| ())
            .map_err(|_| AnswerError::InvalidNumber(label())),
        (QuestionType::Email, AnswerValue::Text(text)) => {
            if looks_like_email(text.trim()) {
                Ok(())
            } else {
                Err(AnswerError::InvalidEmail(label()))
            }
        }
        (QuestionType::Email, AnswerValue::Number(_)) => Err(AnswerError::InvalidEmail(label())),
        (_, AnswerValue::Choices(_)) => Err(AnswerError::UnexpectedList(label())),
        // free text accepts anything
        _ => Ok(()),
    }
}

fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ExecPosition {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub questions: Json<Vec<Question>>,

    /// Inactive positions stay listed but do not accept applications
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ExecPositionInput {
    pub title: String,
    pub description: String,
    pub questions: Vec<Question>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecPositionFilter {
    /// Matched against title and description
    pub search: Option<String>,
    pub active: Option<bool>,
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ExecPositionFilter) {
    push_search(qb, &["title", "description"], non_blank(&filter.search));
    if let Some(active) = filter.active {
        qb.push(" AND is_active = ").push_bind(active);
    }
}

impl ExecPosition {
    pub async fn create(pool: &PgPool, data: ExecPositionInput) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO exec_positions (title, description, questions, is_active)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, ExecPosition>(&query)
            .bind(data.title)
            .bind(data.description)
            .bind(Json(data.questions))
            .bind(data.is_active)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM exec_positions WHERE id = $1");

        sqlx::query_as::<_, ExecPosition>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Another position with the same title, ignoring case
    pub async fn find_duplicate(
        pool: &PgPool,
        title: &str,
        exclude: Option<Uuid>,
    ) -> Result<Option<Uuid>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT id FROM exec_positions
             WHERE LOWER(title) = LOWER($1) AND ($2::uuid IS NULL OR id <> $2)
             LIMIT 1",
        )
        .bind(title.trim())
        .bind(exclude)
        .fetch_optional(pool)
        .await
    }

    pub async fn list(
        pool: &PgPool,
        filter: &ExecPositionFilter,
        page: &PageRequest,
    ) -> Result<Page<Self>, sqlx::Error> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM exec_positions WHERE TRUE");
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

        let mut select =
            QueryBuilder::new(format!("SELECT {COLUMNS} FROM exec_positions WHERE TRUE"));
        push_filters(&mut select, filter);
        select.push(" ORDER BY is_active DESC, created_at DESC");
        push_page(&mut select, page);
        let items = select.build_query_as::<ExecPosition>().fetch_all(pool).await?;

        Ok(Page {
            items,
            pagination: Pagination::new(page, total),
        })
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: ExecPositionInput,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE exec_positions SET
                 title = $2, description = $3, questions = $4, is_active = $5,
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, ExecPosition>(&query)
            .bind(id)
            .bind(data.title)
            .bind(data.description)
            .bind(Json(data.questions))
            .bind(data.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Deletes the position and its applications
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM exec_positions WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: &str, kind: QuestionType, required: bool, options: &[&str]) -> Question {
        Question {
            id: id.to_string(),
            label: format!("Label {id}"),
            kind,
            required,
            options: options.iter().map(|o| o.to_string()).collect(),
        }
    }

    fn answer(id: &str, value: AnswerValue) -> Answer {
        Answer {
            question_id: id.to_string(),
            value,
        }
    }

    fn form() -> Vec<Question> {
        vec![
            question("why", QuestionType::Textarea, true, &[]),
            question("year", QuestionType::Select, true, &["First", "Second", "Third"]),
            question("days", QuestionType::Checkbox, false, &["Mon", "Wed", "Fri"]),
            question("hours", QuestionType::Number, false, &[]),
            question("ref", QuestionType::Email, false, &[]),
        ]
    }

    #[test]
    fn test_question_json_uses_type_key() {
        let parsed: Question = serde_json::from_str(
            r#"{"id":"q1","label":"Why?","type":"textarea","required":true}"#,
        )
        .unwrap();
        assert_eq!(parsed.kind, QuestionType::Textarea);
        assert!(parsed.options.is_empty());
    }

    #[test]
    fn test_validate_questions() {
        assert!(validate_questions(&form()).is_ok());

        let mut duplicated = form();
        duplicated.push(question("why", QuestionType::Text, false, &[]));
        assert_eq!(
            validate_questions(&duplicated),
            Err(QuestionError::DuplicateId("why".to_string()))
        );

        let no_options = vec![question("pick", QuestionType::Radio, true, &[])];
        assert!(matches!(
            validate_questions(&no_options),
            Err(QuestionError::MissingOptions(_))
        ));

        let no_id = vec![question(" ", QuestionType::Text, false, &[])];
        assert_eq!(validate_questions(&no_id), Err(QuestionError::MissingId(1)));
    }

    #[test]
    fn test_complete_answers_accepted() {
        let answers = vec![
            answer("why", AnswerValue::Text("I love organizing".to_string())),
            answer("year", AnswerValue::Text("Second".to_string())),
            answer(
                "days",
                AnswerValue::Choices(vec!["Mon".to_string(), "Fri".to_string()]),
            ),
            answer("hours", AnswerValue::Number(5.0)),
            answer("ref", AnswerValue::Text("mentor@example.org".to_string())),
        ];
        assert_eq!(validate_answers(&form(), &answers), Ok(()));
    }

    #[test]
    fn test_missing_required_answer() {
        let answers = vec![answer("year", AnswerValue::Text("First".to_string()))];
        assert_eq!(
            validate_answers(&form(), &answers),
            Err(AnswerError::MissingRequired("Label why".to_string()))
        );

        let blank = vec![
            answer("why", AnswerValue::Text("   ".to_string())),
            answer("year", AnswerValue::Text("First".to_string())),
        ];
        assert!(matches!(
            validate_answers(&form(), &blank),
            Err(AnswerError::MissingRequired(_))
        ));
    }

    #[test]
    fn test_option_answers_must_match() {
        let answers = vec![
            answer("why", AnswerValue::Text("Because".to_string())),
            answer("year", AnswerValue::Text("Fifth".to_string())),
        ];
        assert!(matches!(
            validate_answers(&form(), &answers),
            Err(AnswerError::InvalidOption { .. })
        ));

        let answers = vec![
            answer("why", AnswerValue::Text("Because".to_string())),
            answer("year", AnswerValue::Text("First".to_string())),
            answer("days", AnswerValue::Choices(vec!["Sun".to_string()])),
        ];
        assert!(matches!(
            validate_answers(&form(), &answers),
            Err(AnswerError::InvalidOption { .. })
        ));
    }

    #[test]
    fn test_unknown_and_duplicate_answers() {
        let unknown = vec![answer("color", AnswerValue::Text("blue".to_string()))];
        assert_eq!(
            validate_answers(&form(), &unknown),
            Err(AnswerError::UnknownQuestion("color".to_string()))
        );

        let twice = vec![
            answer("why", AnswerValue::Text("a".to_string())),
            answer("why", AnswerValue::Text("b".to_string())),
        ];
        assert_eq!(
            validate_answers(&form(), &twice),
            Err(AnswerError::DuplicateAnswer("why".to_string()))
        );
    }

    #[test]
    fn test_typed_answers() {
        let base = || {
            vec![
                answer("why", AnswerValue::Text("x".to_string())),
                answer("year", AnswerValue::Text("Third".to_string())),
            ]
        };

        let mut answers = base();
        answers.push(answer("hours", AnswerValue::Text("ten".to_string())));
        assert!(matches!(
            validate_answers(&form(), &answers),
            Err(AnswerError::InvalidNumber(_))
        ));

        let mut answers = base();
        answers.push(answer("hours", AnswerValue::Text(" 7.5 ".to_string())));
        assert!(validate_answers(&form(), &answers).is_ok());

        let mut answers = base();
        answers.push(answer("ref", AnswerValue::Text("not-an-email".to_string())));
        assert!(matches!(
            validate_answers(&form(), &answers),
            Err(AnswerError::InvalidEmail(_))
        ));

        let mut answers = base();
        answers[0] = answer("why", AnswerValue::Choices(vec!["a".to_string()]));
        assert!(matches!(
            validate_answers(&form(), &answers),
            Err(AnswerError::UnexpectedList(_))
        ));
    }

    #[test]
    fn test_answer_value_untagged_parsing() {
        let parsed: Vec<Answer> = serde_json::from_str(
            r#"[{"question_id":"a","value":"text"},
                {"question_id":"b","value":3},
                {"question_id":"c","value":["x","y"]}]"#,
        )
        .unwrap();

        assert_eq!(parsed[0].value, AnswerValue::Text("text".to_string()));
        assert_eq!(parsed[1].value, AnswerValue::Number(3.0));
        assert_eq!(
            parsed[2].value,
            AnswerValue::Choices(vec!["x".to_string(), "y".to_string()])
        );
    }
}
