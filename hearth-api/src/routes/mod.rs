/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `events`: Events, per-event registrations and registration
/// - `registrations`: Registration management and check-in
/// - `books`, `videos`, `articles`: Content libraries
/// - `exec_positions`, `applications`: Positions and their applications
/// - `accounts`: Passcode-gated sign-up, login, and account management
/// - `analytics`: Organization-wide summary

pub mod accounts;
pub mod analytics;
pub mod applications;
pub mod articles;
pub mod books;
pub mod events;
pub mod exec_positions;
pub mod health;
pub mod registrations;
pub mod videos;

use crate::error::{ApiError, ApiResult, ValidationErrorDetail};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

/// Fails with one detail per blank field, e.g. `"title is required"`
pub(crate) fn require(fields: &[(&str, &str)]) -> ApiResult<()> {
    let missing: Vec<ValidationErrorDetail> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| ValidationErrorDetail::new(*field, format!("{} is required", field)))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ApiError::ValidationError(missing))
    }
}

/// Trimmed copy of a required text field
pub(crate) fn clean(value: &str) -> String {
    value.trim().to_string()
}

/// Optional text where `""` means absent
pub(crate) fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty()))
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    // Accept full ISO timestamps by keeping the date part
    let date_part = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// `YYYY-MM-DD`, or an ISO timestamp whose date part is used
pub(crate) fn calendar_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date `{}`", raw)))
}

/// Optional form of [`calendar_date`]; `""` means absent
pub(crate) fn optional_calendar_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => parse_date(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date `{}`", raw))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Form {
        #[serde(default, deserialize_with = "empty_as_none")]
        image_url: Option<String>,

        #[serde(deserialize_with = "calendar_date")]
        date: NaiveDate,

        #[serde(default, deserialize_with = "optional_calendar_date")]
        published_on: Option<NaiveDate>,
    }

    #[test]
    fn test_require_reports_each_blank_field() {
        assert!(require(&[("title", "Dune"), ("author", "Herbert")]).is_ok());

        match require(&[("title", "  "), ("author", "Herbert"), ("category", "")]) {
            Err(ApiError::ValidationError(details)) => {
                assert_eq!(details.len(), 2);
                assert_eq!(details[0].field, "title");
                assert_eq!(details[0].message, "title is required");
                assert_eq!(details[1].field, "category");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_form_helpers() {
        let form: Form = serde_json::from_str(
            r#"{"image_url": "  ", "date": "2025-06-01T18:30:00.000Z", "published_on": ""}"#,
        )
        .unwrap();

        assert_eq!(form.image_url, None);
        assert_eq!(form.date, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        assert_eq!(form.published_on, None);

        let form: Form = serde_json::from_str(r#"{"date": "2025-06-01"}"#).unwrap();
        assert_eq!(form.published_on, None);
    }

    #[test]
    fn test_invalid_date_rejected() {
        assert!(serde_json::from_str::<Form>(r#"{"date": "June 1st"}"#).is_err());
        assert!(serde_json::from_str::<Form>(r#"{"date": "2025-13-01"}"#).is_err());
    }
}
