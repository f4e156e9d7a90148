/// Video library
///
/// Duplicate rule: same (title, author), case-insensitive.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use super::search::{push_content_filter, push_page, ContentFilter};
use crate::pagination::{Page, PageRequest, Pagination};

const COLUMNS: &str = "id, title, author, description, category, video_url, thumbnail_url, \
     duration, created_by, created_at, updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Video {
    pub id: Uuid,
    pub title: String,

    /// Speaker or channel
    pub author: String,

    pub description: String,
    pub category: String,
    pub video_url: String,
    pub thumbnail_url: Option<String>,

    /// Display duration, e.g. "12:45"
    pub duration: Option<String>,

    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct VideoInput {
    pub title: String,
    pub author: String,
    pub description: String,
    pub category: String,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub duration: Option<String>,
    pub created_by: Option<Uuid>,
}

impl Video {
    pub async fn create(pool: &PgPool, data: VideoInput) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO videos (title, author, description, category, video_url,
                                 thumbnail_url, duration, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, Video>(&query)
            .bind(data.title)
            .bind(data.author)
            .bind(data.description)
            .bind(data.category)
            .bind(data.video_url)
            .bind(data.thumbnail_url)
            .bind(data.duration)
            .bind(data.created_by)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM videos WHERE id = $1");

        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_duplicate(
        pool: &PgPool,
        title: &str,
        author: &str,
        exclude: Option<Uuid>,
    ) -> Result<Option<Uuid>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT id FROM videos
             WHERE LOWER(title) = LOWER($1) AND LOWER(author) = LOWER($2)
               AND ($3::uuid IS NULL OR id <> $3)
             LIMIT 1",
        )
        .bind(title.trim())
        .bind(author.trim())
        .bind(exclude)
        .fetch_optional(pool)
        .await
    }

    pub async fn list(
        pool: &PgPool,
        filter: &ContentFilter,
        page: &PageRequest,
    ) -> Result<Page<Self>, sqlx::Error> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM videos WHERE TRUE");
        push_content_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

        let mut select = QueryBuilder::new(format!("SELECT {COLUMNS} FROM videos WHERE TRUE"));
        push_content_filter(&mut select, filter);
        select.push(" ORDER BY created_at DESC");
        push_page(&mut select, page);
        let items = select.build_query_as::<Video>().fetch_all(pool).await?;

        Ok(Page {
            items,
            pagination: Pagination::new(page, total),
        })
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: VideoInput,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE videos SET
                 title = $2, author = $3, description = $4, category = $5,
                 video_url = $6, thumbnail_url = $7, duration = $8,
                 created_by = COALESCE($9, created_by),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .bind(data.title)
            .bind(data.author)
            .bind(data.description)
            .bind(data.category)
            .bind(data.video_url)
            .bind(data.thumbnail_url)
            .bind(data.duration)
            .bind(data.created_by)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
