/// Book library endpoints
///
/// # Endpoints
///
/// - `GET    /api/books` - List books (`search`, `category`, paging)
/// - `POST   /api/books` - Create book
/// - `GET    /api/books/:id` - Get book
/// - `PUT    /api/books/:id` - Replace book
/// - `DELETE /api/books/:id` - Delete book

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiQuery, PathId, ValidatedJson},
    response::{self, Created, JsonResponse},
    routes::{clean, empty_as_none, require},
};
use axum::extract::State;
use hearth_shared::{
    models::{
        book::{Book, BookInput},
        search::ContentFilter,
    },
    pagination::PageRequest,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct BookRequest {
    #[validate(length(max = 255, message = "Title must be at most 255 characters"))]
    pub title: String,

    #[validate(length(max = 255, message = "Author must be at most 255 characters"))]
    pub author: String,

    pub description: String,

    #[validate(length(max = 100, message = "Category must be at most 100 characters"))]
    pub category: String,

    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(url(message = "Cover image URL must be a valid URL"))]
    pub cover_image_url: Option<String>,

    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(url(message = "Link must be a valid URL"))]
    pub link_url: Option<String>,

    #[validate(range(min = 0, max = 9999, message = "Published year must be between 0 and 9999"))]
    pub published_year: Option<i32>,

    pub created_by: Option<Uuid>,
}

impl BookRequest {
    fn check(&self) -> ApiResult<()> {
        require(&[
            ("title", &self.title),
            ("author", &self.author),
            ("description", &self.description),
            ("category", &self.category),
        ])
    }

    fn into_input(self) -> BookInput {
        BookInput {
            title: clean(&self.title),
            author: clean(&self.author),
            description: self.description.trim().to_string(),
            category: clean(&self.category),
            cover_image_url: self.cover_image_url,
            link_url: self.link_url,
            published_year: self.published_year,
            created_by: self.created_by,
        }
    }
}

const DUPLICATE: &str = "A book with this title and author already exists";

fn not_found() -> ApiError {
    ApiError::NotFound("Book not found".to_string())
}

pub async fn list_books(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<ContentFilter>,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> ApiResult<JsonResponse> {
    let books = Book::list(&state.db, &filter, &page).await?;
    response::page("books", books)
}

pub async fn create_book(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<BookRequest>,
) -> ApiResult<Created> {
    req.check()?;

    if Book::find_duplicate(&state.db, &req.title, &req.author, None)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(DUPLICATE.to_string()));
    }

    let book = Book::create(&state.db, req.into_input()).await?;
    tracing::info!(book_id = %book.id, "Book created");
    response::created("book", book)
}

pub async fn get_book(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> ApiResult<JsonResponse> {
    let book = Book::find_by_id(&state.db, id).await?.ok_or_else(not_found)?;
    response::ok("book", book)
}

pub async fn update_book(
    State(state): State<AppState>,
    PathId(id): PathId,
    ValidatedJson(req): ValidatedJson<BookRequest>,
) -> ApiResult<JsonResponse> {
    req.check()?;

    if Book::find_by_id(&state.db, id).await?.is_none() {
        return Err(not_found());
    }

    if Book::find_duplicate(&state.db, &req.title, &req.author, Some(id))
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(DUPLICATE.to_string()));
    }

    let book = Book::update(&state.db, id, req.into_input())
        .await?
        .ok_or_else(not_found)?;
    response::ok("book", book)
}

pub async fn delete_book(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> ApiResult<JsonResponse> {
    if !Book::delete(&state.db, id).await? {
        return Err(not_found());
    }

    tracing::info!(book_id = %id, "Book deleted");
    Ok(response::message("Book deleted successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_optional_urls_accept_blank() {
        let req: BookRequest = serde_json::from_value(json!({
            "title": "The Market Gardener",
            "author": "J-M Fortier",
            "description": "Small-scale farming",
            "category": "Gardening",
            "cover_image_url": "",
            "link_url": "https://example.org/book"
        }))
        .unwrap();

        assert!(req.validate().is_ok());
        assert!(req.check().is_ok());
        assert_eq!(req.cover_image_url, None);
    }

    #[test]
    fn test_bad_url_rejected() {
        let req: BookRequest = serde_json::from_value(json!({
            "title": "T",
            "author": "A",
            "description": "D",
            "category": "C",
            "link_url": "not a url"
        }))
        .unwrap();

        assert!(req.validate().unwrap_err().field_errors().contains_key("link_url"));
    }

    #[test]
    fn test_missing_author_rejected() {
        let req: BookRequest = serde_json::from_value(json!({
            "title": "T",
            "author": " ",
            "description": "D",
            "category": "C"
        }))
        .unwrap();

        assert!(req.check().is_err());
    }
}
