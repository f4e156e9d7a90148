/// Article library
///
/// Articles link out to content hosted elsewhere; only metadata is stored.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use super::search::{push_content_filter, push_page, ContentFilter};
use crate::pagination::{Page, PageRequest, Pagination};

const COLUMNS: &str = "id, title, author, description, category, article_url, image_url, \
     published_on, created_by, created_at, updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub description: String,
    pub category: String,
    pub article_url: String,
    pub image_url: Option<String>,
    pub published_on: Option<NaiveDate>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ArticleInput {
    pub title: String,
    pub author: String,
    pub description: String,
    pub category: String,
    pub article_url: String,
    pub image_url: Option<String>,
    pub published_on: Option<NaiveDate>,
    pub created_by: Option<Uuid>,
}

impl Article {
    pub async fn create(pool: &PgPool, data: ArticleInput) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO articles (title, author, description, category, article_url,
                                   image_url, published_on, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, Article>(&query)
            .bind(data.title)
            .bind(data.author)
            .bind(data.description)
            .bind(data.category)
            .bind(data.article_url)
            .bind(data.image_url)
            .bind(data.published_on)
            .bind(data.created_by)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM articles WHERE id = $1");

        sqlx::query_as::<_, Article>(&query)
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
            "SELECT id FROM articles
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
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM articles WHERE TRUE");
        push_content_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

        let mut select = QueryBuilder::new(format!("SELECT {COLUMNS} FROM articles WHERE TRUE"));
        push_content_filter(&mut select, filter);
        select.push(" ORDER BY COALESCE(published_on, created_at::date) DESC, created_at DESC");
        push_page(&mut select, page);
        let items = select.build_query_as::<Article>().fetch_all(pool).await?;

        Ok(Page {
            items,
            pagination: Pagination::new(page, total),
        })
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: ArticleInput,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE articles SET
                 title = $2, author = $3, description = $4, category = $5,
                 article_url = $6, image_url = $7, published_on = $8,
                 created_by = COALESCE($9, created_by),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, Article>(&query)
            .bind(id)
            .bind(data.title)
            .bind(data.author)
            .bind(data.description)
            .bind(data.category)
            .bind(data.article_url)
            .bind(data.image_url)
            .bind(data.published_on)
            .bind(data.created_by)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
