/// Community events
///
/// An event carries a `capacity` where `0` means unlimited, and a
/// `registered_attendees` counter that tracks registrations currently
/// holding a seat (every status except `cancelled`).
///
/// Seats are taken and released with single conditional `UPDATE`
/// statements ([`Event::reserve_seat`], [`Event::release_seat`]) so two
/// concurrent registrations can never both pass the capacity check.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE events (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL,
///     location VARCHAR(255) NOT NULL,
///     date DATE NOT NULL,
///     start_time VARCHAR(32) NOT NULL,
///     end_time VARCHAR(32) NOT NULL,
///     category VARCHAR(100) NOT NULL,
///     capacity INTEGER NOT NULL DEFAULT 0,
///     image_url VARCHAR(1024),
///     speakers JSONB NOT NULL DEFAULT '[]',
///     price DOUBLE PRECISION NOT NULL DEFAULT 0,
///     registered_attendees INTEGER NOT NULL DEFAULT 0,
///     created_by UUID REFERENCES accounts(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::search::{non_blank, push_equals_ignore_case, push_page, push_search};
use crate::pagination::{Page, PageRequest, Pagination};

const COLUMNS: &str = "id, title, description, location, date, start_time, end_time, category, \
     capacity, image_url, speakers, price, registered_attendees, created_by, created_at, updated_at";

/// A speaker or host listed on an event page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Speaker {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub date: NaiveDate,

    /// Free-form start time as entered by organizers, e.g. "18:30"
    pub start_time: String,
    pub end_time: String,

    pub category: String,

    /// Maximum attendees; 0 = unlimited
    pub capacity: i32,

    pub image_url: Option<String>,
    pub speakers: Json<Vec<Speaker>>,
    pub price: f64,

    /// Registrations currently holding a seat
    pub registered_attendees: i32,

    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Whether a registration fits: capacity 0 always admits
pub fn has_open_seat(capacity: i32, registered_attendees: i32) -> bool {
    capacity == 0 || registered_attendees < capacity
}

impl Event {
    pub fn is_unlimited(&self) -> bool {
        self.capacity == 0
    }

    pub fn has_open_seat(&self) -> bool {
        has_open_seat(self.capacity, self.registered_attendees)
    }

    /// Seats left, or None for unlimited events
    pub fn remaining_spots(&self) -> Option<i32> {
        if self.is_unlimited() {
            None
        } else {
            Some((self.capacity - self.registered_attendees).max(0))
        }
    }
}

/// Full set of editable event fields, used for both create and update
#[derive(Debug, Clone)]
pub struct EventInput {
    pub title: String,
    pub description: String,
    pub location: String,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub category: String,
    pub capacity: i32,
    pub image_url: Option<String>,
    pub speakers: Vec<Speaker>,
    pub price: f64,
    pub created_by: Option<Uuid>,
}

/// Which side of today an event falls on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventWindow {
    Upcoming,
    Past,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventFilter {
    /// Matched against title, description and location
    pub search: Option<String>,
    pub category: Option<String>,
    pub when: Option<EventWindow>,
}

/// Inclusive date bounds used by analytics
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &EventFilter, today: NaiveDate) {
    push_search(
        qb,
        &["title", "description", "location"],
        non_blank(&filter.search),
    );
    push_equals_ignore_case(qb, "category", non_blank(&filter.category));

    match filter.when {
        Some(EventWindow::Upcoming) => {
            qb.push(" AND date >= ").push_bind(today);
        }
        Some(EventWindow::Past) => {
            qb.push(" AND date < ").push_bind(today);
        }
        None => {}
    }
}

impl Event {
    pub async fn create(pool: &PgPool, data: EventInput) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO events (title, description, location, date, start_time, end_time,
                                 category, capacity, image_url, speakers, price, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING {COLUMNS}"
        );

        let event = sqlx::query_as::<_, Event>(&query)
            .bind(data.title)
            .bind(data.description)
            .bind(data.location)
            .bind(data.date)
            .bind(data.start_time)
            .bind(data.end_time)
            .bind(data.category)
            .bind(data.capacity)
            .bind(data.image_url)
            .bind(Json(data.speakers))
            .bind(data.price)
            .bind(data.created_by)
            .fetch_one(pool)
            .await?;

        tracing::info!(event_id = %event.id, "Event created");
        Ok(event)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM events WHERE id = $1");

        sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Another event with the same title (case-insensitive) on the same date
    pub async fn find_duplicate(
        pool: &PgPool,
        title: &str,
        date: NaiveDate,
        exclude: Option<Uuid>,
    ) -> Result<Option<Uuid>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT id FROM events
             WHERE LOWER(title) = LOWER($1) AND date = $2
               AND ($3::uuid IS NULL OR id <> $3)
             LIMIT 1",
        )
        .bind(title.trim())
        .bind(date)
        .bind(exclude)
        .fetch_optional(pool)
        .await
    }

    /// Filtered page of events, soonest first
    pub async fn list(
        pool: &PgPool,
        filter: &EventFilter,
        page: &PageRequest,
    ) -> Result<Page<Self>, sqlx::Error> {
        let today = Utc::now().date_naive();

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM events WHERE TRUE");
        push_filters(&mut count, filter, today);
        let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

        let mut select = QueryBuilder::new(format!("SELECT {COLUMNS} FROM events WHERE TRUE"));
        push_filters(&mut select, filter, today);
        select.push(" ORDER BY date ASC, start_time ASC, created_at ASC");
        push_page(&mut select, page);
        let items = select.build_query_as::<Event>().fetch_all(pool).await?;

        Ok(Page {
            items,
            pagination: Pagination::new(page, total),
        })
    }

    /// Every event whose date falls in the range, for analytics
    pub async fn list_in_range(pool: &PgPool, range: &DateRange) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM events
             WHERE ($1::date IS NULL OR date >= $1)
               AND ($2::date IS NULL OR date <= $2)
             ORDER BY date ASC"
        );

        sqlx::query_as::<_, Event>(&query)
            .bind(range.from)
            .bind(range.to)
            .fetch_all(pool)
            .await
    }

    /// Replaces the editable fields; `registered_attendees` is left alone
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: EventInput,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE events SET
                 title = $2, description = $3, location = $4, date = $5,
                 start_time = $6, end_time = $7, category = $8, capacity = $9,
                 image_url = $10, speakers = $11, price = $12,
                 created_by = COALESCE($13, created_by),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .bind(data.title)
            .bind(data.description)
            .bind(data.location)
            .bind(data.date)
            .bind(data.start_time)
            .bind(data.end_time)
            .bind(data.category)
            .bind(data.capacity)
            .bind(data.image_url)
            .bind(Json(data.speakers))
            .bind(data.price)
            .bind(data.created_by)
            .fetch_optional(pool)
            .await
    }

    /// Deletes the event; its registrations go with it (ON DELETE CASCADE)
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Takes one seat if the event has room
    ///
    /// Check and increment happen in one statement. Returns the updated
    /// event, or None when the event is missing or full.
    pub async fn reserve_seat(conn: &mut PgConnection, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE events
             SET registered_attendees = registered_attendees + 1, updated_at = NOW()
             WHERE id = $1 AND (capacity = 0 OR registered_attendees < capacity)
             RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Gives one seat back; the counter never drops below zero
    pub async fn release_seat(conn: &mut PgConnection, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE events
             SET registered_attendees = GREATEST(registered_attendees - 1, 0), updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .execute(conn)
        .await?;

        Ok(())
    }

    pub async fn exists(conn: &mut PgConnection, id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM events WHERE id = $1)")
            .bind(id)
            .fetch_one(conn)
            .await
    }
}
