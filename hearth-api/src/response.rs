/// Success envelope builders
///
/// Every successful response is a JSON object with `"success": true` and the
/// payload under a resource-specific key:
///
/// ```json
/// { "success": true, "books": [...], "pagination": { "page": 1, ... } }
/// ```

use crate::error::ApiResult;
use axum::{http::StatusCode, Json};
use hearth_shared::pagination::Page;
use serde::Serialize;
use serde_json::{Map, Value};

pub type JsonResponse = Json<Value>;
pub type Created = (StatusCode, Json<Value>);

fn envelope() -> Map<String, Value> {
    let mut body = Map::new();
    body.insert("success".to_string(), Value::Bool(true));
    body
}

/// `{ success: true, <key>: value }`
pub fn ok<T: Serialize>(key: &str, value: T) -> ApiResult<JsonResponse> {
    let mut body = envelope();
    body.insert(key.to_string(), serde_json::to_value(value)?);
    Ok(Json(Value::Object(body)))
}

/// Same as [`ok`] with status 201
pub fn created<T: Serialize>(key: &str, value: T) -> ApiResult<Created> {
    Ok((StatusCode::CREATED, ok(key, value)?))
}

/// `{ success: true, <key>: items, pagination }`
pub fn page<T: Serialize>(key: &str, page: Page<T>) -> ApiResult<JsonResponse> {
    let mut body = envelope();
    body.insert(key.to_string(), serde_json::to_value(page.items)?);
    body.insert("pagination".to_string(), serde_json::to_value(page.pagination)?);
    Ok(Json(Value::Object(body)))
}

/// `{ success: true, message }`
pub fn message(text: impl Into<String>) -> JsonResponse {
    let mut body = envelope();
    body.insert("message".to_string(), Value::String(text.into()));
    Json(Value::Object(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_shared::pagination::{PageRequest, Pagination};

    #[test]
    fn test_ok_envelope() {
        let Json(body) = ok("book", serde_json::json!({ "title": "Dune" })).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["book"]["title"], "Dune");
    }

    #[test]
    fn test_created_status() {
        let (status, Json(body)) = created("video", 1).unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["video"], 1);
    }

    #[test]
    fn test_page_envelope() {
        let page = Page {
            items: vec!["a", "b"],
            pagination: Pagination::new(&PageRequest::new(2, 2), 5),
        };

        let Json(body) = super::page("articles", page).unwrap();
        assert_eq!(body["articles"].as_array().unwrap().len(), 2);
        assert_eq!(body["pagination"]["page"], 2);
        assert_eq!(body["pagination"]["total"], 5);
        assert_eq!(body["pagination"]["pages"], 3);
    }

    #[test]
    fn test_message_envelope() {
        let Json(body) = message("Event deleted");
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Event deleted");
    }
}
