/// Video library endpoints
///
/// # Endpoints
///
/// - `GET    /api/videos` - List videos (`search`, `category`, paging)
/// - `POST   /api/videos` - Create video
/// - `GET    /api/videos/:id` - Get video
/// - `PUT    /api/videos/:id` - Replace video
/// - `DELETE /api/videos/:id` - Delete video

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
        search::ContentFilter,
        video::{Video, VideoInput},
    },
    pagination::PageRequest,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct VideoRequest {
    #[validate(length(max = 255, message = "Title must be at most 255 characters"))]
    pub title: String,

    #[validate(length(max = 255, message = "Author must be at most 255 characters"))]
    pub author: String,

    pub description: String,

    #[validate(length(max = 100, message = "Category must be at most 100 characters"))]
    pub category: String,

    #[validate(url(message = "Video URL must be a valid URL"))]
    pub video_url: String,

    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(url(message = "Thumbnail URL must be a valid URL"))]
    pub thumbnail_url: Option<String>,

    #[serde(default, deserialize_with = "empty_as_none")]
    pub duration: Option<String>,

    pub created_by: Option<Uuid>,
}

impl VideoRequest {
    fn check(&self) -> ApiResult<()> {
        require(&[
            ("title", &self.title),
            ("author", &self.author),
            ("description", &self.description),
            ("category", &self.category),
            ("video_url", &self.video_url),
        ])
    }

    fn into_input(self) -> VideoInput {
        VideoInput {
            title: clean(&self.title),
            author: clean(&self.author),
            description: self.description.trim().to_string(),
            category: clean(&self.category),
            video_url: clean(&self.video_url),
            thumbnail_url: self.thumbnail_url,
            duration: self.duration,
            created_by: self.created_by,
        }
    }
}

const DUPLICATE: &str = "A video with this title and author already exists";

fn not_found() -> ApiError {
    ApiError::NotFound("Video not found".to_string())
}

pub async fn list_videos(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<ContentFilter>,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> ApiResult<JsonResponse> {
    let videos = Video::list(&state.db, &filter, &page).await?;
    response::page("videos", videos)
}

pub async fn create_video(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<VideoRequest>,
) -> ApiResult<Created> {
    req.check()?;

    if Video::find_duplicate(&state.db, &req.title, &req.author, None)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(DUPLICATE.to_string()));
    }

    let video = Video::create(&state.db, req.into_input()).await?;
    tracing::info!(video_id = %video.id, "Video created");
    response::created("video", video)
}

pub async fn get_video(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> ApiResult<JsonResponse> {
    let video = Video::find_by_id(&state.db, id).await?.ok_or_else(not_found)?;
    response::ok("video", video)
}

pub async fn update_video(
    State(state): State<AppState>,
    PathId(id): PathId,
    ValidatedJson(req): ValidatedJson<VideoRequest>,
) -> ApiResult<JsonResponse> {
    req.check()?;

    if Video::find_by_id(&state.db, id).await?.is_none() {
        return Err(not_found());
    }

    if Video::find_duplicate(&state.db, &req.title, &req.author, Some(id))
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(DUPLICATE.to_string()));
    }

    let video = Video::update(&state.db, id, req.into_input())
        .await?
        .ok_or_else(not_found)?;
    response::ok("video", video)
}

pub async fn delete_video(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> ApiResult<JsonResponse> {
    if !Video::delete(&state.db, id).await? {
        return Err(not_found());
    }

    tracing::info!(video_id = %id, "Video deleted");
    Ok(response::message("Video deleted successfully"))
}
