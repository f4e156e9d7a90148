/// Article library endpoints
///
/// # Endpoints
///
/// - `GET    /api/articles` - List articles (`search`, `category`, paging)
/// - `POST   /api/articles` - Create article
/// - `GET    /api/articles/:id` - Get article
/// - `PUT    /api/articles/:id` - Replace article
/// - `DELETE /api/articles/:id` - Delete article

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiQuery, PathId, ValidatedJson},
    response::{self, Created, JsonResponse},
    routes::{clean, empty_as_none, optional_calendar_date, require},
};
use axum::extract::State;
use chrono::NaiveDate;
use hearth_shared::{
    models::{
        article::{Article, ArticleInput},
        search::ContentFilter,
    },
    pagination::PageRequest,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct ArticleRequest {
    #[validate(length(max = 255, message = "Title must be at most 255 characters"))]
    pub title: String,

    #[validate(length(max = 255, message = "Author must be at most 255 characters"))]
    pub author: String,

    pub description: String,

    #[validate(length(max = 100, message = "Category must be at most 100 characters"))]
    pub category: String,

    #[validate(url(message = "Article URL must be a valid URL"))]
    pub article_url: String,

    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(url(message = "Image URL must be a valid URL"))]
    pub image_url: Option<String>,

    #[serde(default, deserialize_with = "optional_calendar_date")]
    pub published_on: Option<NaiveDate>,

    pub created_by: Option<Uuid>,
}

impl ArticleRequest {
    fn check(&self) -> ApiResult<()> {
        require(&[
            ("title", &self.title),
            ("author", &self.author),
            ("description", &self.description),
            ("category", &self.category),
            ("article_url", &self.article_url),
        ])
    }

    fn into_input(self) -> ArticleInput {
        ArticleInput {
            title: clean(&self.title),
            author: clean(&self.author),
            description: self.description.trim().to_string(),
            category: clean(&self.category),
            article_url: clean(&self.article_url),
            image_url: self.image_url,
            published_on: self.published_on,
            created_by: self.created_by,
        }
    }
}

const DUPLICATE: &str = "An article with this title and author already exists";

fn not_found() -> ApiError {
    ApiError::NotFound("Article not found".to_string())
}

pub async fn list_articles(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<ContentFilter>,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> ApiResult<JsonResponse> {
    let articles = Article::list(&state.db, &filter, &page).await?;
    response::page("articles", articles)
}

pub async fn create_article(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ArticleRequest>,
) -> ApiResult<Created> {
    req.check()?;

    if Article::find_duplicate(&state.db, &req.title, &req.author, None)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(DUPLICATE.to_string()));
    }

    let article = Article::create(&state.db, req.into_input()).await?;
    tracing::info!(article_id = %article.id, "Article created");
    response::created("article", article)
}

pub async fn get_article(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> ApiResult<JsonResponse> {
    let article = Article::find_by_id(&state.db, id)
        .await?
        .ok_or_else(not_found)?;
    response::ok("article", article)
}

pub async fn update_article(
    State(state): State<AppState>,
    PathId(id): PathId,
    ValidatedJson(req): ValidatedJson<ArticleRequest>,
) -> ApiResult<JsonResponse> {
    req.check()?;

    if Article::find_by_id(&state.db, id).await?.is_none() {
        return Err(not_found());
    }

    if Article::find_duplicate(&state.db, &req.title, &req.author, Some(id))
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(DUPLICATE.to_string()));
    }

    let article = Article::update(&state.db, id, req.into_input())
        .await?
        .ok_or_else(not_found)?;
    response::ok("article", article)
}

pub async fn delete_article(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> ApiResult<JsonResponse> {
    if !Article::delete(&state.db, id).await? {
        return Err(not_found());
    }

    tracing::info!(article_id = %id, "Article deleted");
    Ok(response::message("Article deleted successfully"))
}
