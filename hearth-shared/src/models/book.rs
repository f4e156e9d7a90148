/// Library books
///
/// Books are identified for duplicate purposes by their (title, author)
/// pair, compared case-insensitively. The same rule is backed by a unique
/// index so concurrent creates cannot slip past the application check.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE books (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     author VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL,
///     category VARCHAR(100) NOT NULL,
///     cover_image_url VARCHAR(1024),
///     link_url VARCHAR(1024),
///     published_year INTEGER,
///     created_by UUID REFERENCES accounts(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use super::search::{push_content_filter, push_page, ContentFilter};
use crate::pagination::{Page, PageRequest, Pagination};

const COLUMNS: &str = "id, title, author, description, category, cover_image_url, link_url, \
     published_year, created_by, created_at, updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub description: String,
    pub category: String,
    pub cover_image_url: Option<String>,

    /// Where to read or buy the book
    pub link_url: Option<String>,

    pub published_year: Option<i32>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct BookInput {
    pub title: String,
    pub author: String,
    pub description: String,
    pub category: String,
    pub cover_image_url: Option<String>,
    pub link_url: Option<String>,
    pub published_year: Option<i32>,
    pub created_by: Option<Uuid>,
}

impl Book {
    pub async fn create(pool: &PgPool, data: BookInput) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO books (title, author, description, category, cover_image_url,
                                link_url, published_year, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, Book>(&query)
            .bind(data.title)
            .bind(data.author)
            .bind(data.description)
            .bind(data.category)
            .bind(data.cover_image_url)
            .bind(data.link_url)
            .bind(data.published_year)
            .bind(data.created_by)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM books WHERE id = $1");

        sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Id of another book with the same title and author, ignoring case
    pub async fn find_duplicate(
        pool: &PgPool,
        title: &str,
        author: &str,
        exclude: Option<Uuid>,
    ) -> Result<Option<Uuid>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT id FROM books
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
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM books WHERE TRUE");
        push_content_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

        let mut select = QueryBuilder::new(format!("SELECT {COLUMNS} FROM books WHERE TRUE"));
        push_content_filter(&mut select, filter);
        select.push(" ORDER BY created_at DESC");
        push_page(&mut select, page);
        let items = select.build_query_as::<Book>().fetch_all(pool).await?;

        Ok(Page {
            items,
            pagination: Pagination::new(page, total),
        })
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: BookInput,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE books SET
                 title = $2, author = $3, description = $4, category = $5,
                 cover_image_url = $6, link_url = $7, published_year = $8,
                 created_by = COALESCE($9, created_by),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .bind(data.title)
            .bind(data.author)
            .bind(data.description)
            .bind(data.category)
            .bind(data.cover_image_url)
            .bind(data.link_url)
            .bind(data.published_year)
            .bind(data.created_by)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
