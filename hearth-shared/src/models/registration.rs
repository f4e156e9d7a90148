/// Event registrations and check-in
///
/// A registration holds a seat on its event unless it is `cancelled`. Every
/// operation that changes whether a registration holds a seat runs in a
/// transaction together with the matching [`Event::reserve_seat`] or
/// [`Event::release_seat`] call, so the event counter always equals the
/// number of seat-holding registrations.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE registration_status AS ENUM ('confirmed', 'cancelled', 'waitlist');
///
/// CREATE TABLE registrations (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     event_id UUID NOT NULL REFERENCES events(id) ON DELETE CASCADE,
///     name VARCHAR(255) NOT NULL,
///     email VARCHAR(255) NOT NULL,        -- unique per event on LOWER(email)
///     phone VARCHAR(50) NOT NULL,
///     gender VARCHAR(50),
///     age INTEGER,
///     dietary_restrictions TEXT,
///     emergency_contact TEXT,
///     notes TEXT,
///     status registration_status NOT NULL DEFAULT 'confirmed',
///     registered_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     checked_in_at TIMESTAMPTZ
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::event::{DateRange, Event};
use super::search::{non_blank, push_page, push_search};
use crate::pagination::{Page, PageRequest, Pagination};

const COLUMNS: &str = "id, event_id, name, email, phone, gender, age, dietary_restrictions, \
     emergency_contact, notes, status, registered_at, checked_in_at";

/// Registration status; any value may be set from any other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "registration_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Confirmed,
    Cancelled,
    Waitlist,
}

impl RegistrationStatus {
    pub const ALL: [RegistrationStatus; 3] = [
        RegistrationStatus::Confirmed,
        RegistrationStatus::Cancelled,
        RegistrationStatus::Waitlist,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Confirmed => "confirmed",
            RegistrationStatus::Cancelled => "cancelled",
            RegistrationStatus::Waitlist => "waitlist",
        }
    }

    /// Counted in the event's `registered_attendees`
    pub fn holds_seat(&self) -> bool {
        !matches!(self, RegistrationStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Registration {
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub gender: Option<String>,
    pub age: Option<i32>,
    pub dietary_restrictions: Option<String>,
    pub emergency_contact: Option<String>,
    pub notes: Option<String>,
    pub status: RegistrationStatus,
    pub registered_at: DateTime<Utc>,
    pub checked_in_at: Option<DateTime<Utc>>,
}

/// Attendee details submitted with a registration
#[derive(Debug, Clone)]
pub struct AttendeeDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub gender: Option<String>,
    pub age: Option<i32>,
    pub dietary_restrictions: Option<String>,
    pub emergency_contact: Option<String>,
    pub notes: Option<String>,
}

/// Outcome of [`Registration::register`]
#[derive(Debug)]
pub enum RegisterOutcome {
    Registered {
        registration: Registration,
        event: Event,
    },
    EventNotFound,
    EventFull,
    AlreadyRegistered,
}

/// Outcome of [`Registration::update`]
#[derive(Debug)]
pub enum UpdateOutcome {
    Updated(Registration),
    NotFound,
    EventFull,
    AlreadyRegistered,
}

/// Outcome of [`Registration::check_in`]
#[derive(Debug)]
pub enum CheckInOutcome {
    CheckedIn(Registration),
    NotFound,
    AlreadyCheckedIn,
    Cancelled,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationFilter {
    pub event_id: Option<Uuid>,
    pub status: Option<RegistrationStatus>,

    /// Matched against name and email
    pub search: Option<String>,
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &RegistrationFilter) {
    if let Some(event_id) = filter.event_id {
        qb.push(" AND event_id = ").push_bind(event_id);
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    push_search(qb, &["name", "email"], non_blank(&filter.search));
}

/// Another registration on the event with the same email or name
async fn find_conflict(
    conn: &mut PgConnection,
    event_id: Uuid,
    email: &str,
    name: &str,
    exclude: Option<Uuid>,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS (
             SELECT 1 FROM registrations
             WHERE event_id = $1
               AND (LOWER(email) = LOWER($2) OR LOWER(name) = LOWER($3))
               AND ($4::uuid IS NULL OR id <> $4)
         )",
    )
    .bind(event_id)
    .bind(email.trim())
    .bind(name.trim())
    .bind(exclude)
    .fetch_one(conn)
    .await
}

impl Registration {
    /// Registers an attendee for an event
    ///
    /// Takes a seat first (404 and capacity outcomes come from that step),
    /// then checks for an existing registration with the same email or name.
    /// The insert and the counter increment commit together.
    pub async fn register(
        pool: &PgPool,
        event_id: Uuid,
        details: AttendeeDetails,
    ) -> Result<RegisterOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let Some(event) = Event::reserve_seat(&mut tx, event_id).await? else {
            let exists = Event::exists(&mut tx, event_id).await?;
            tx.rollback().await?;
            if exists {
                tracing::info!(event_id = %event_id, "Registration rejected, event is full");
                return Ok(RegisterOutcome::EventFull);
            }
            return Ok(RegisterOutcome::EventNotFound);
        };

        if find_conflict(&mut tx, event_id, &details.email, &details.name, None).await? {
            tx.rollback().await?;
            return Ok(RegisterOutcome::AlreadyRegistered);
        }

        let query = format!(
            "INSERT INTO registrations (event_id, name, email, phone, gender, age,
                                        dietary_restrictions, emergency_contact, notes, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'confirmed')
             RETURNING {COLUMNS}"
        );

        let registration = sqlx::query_as::<_, Registration>(&query)
            .bind(event_id)
            .bind(details.name)
            .bind(details.email)
            .bind(details.phone)
            .bind(details.gender)
            .bind(details.age)
            .bind(details.dietary_restrictions)
            .bind(details.emergency_contact)
            .bind(details.notes)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            event_id = %event_id,
            registration_id = %registration.id,
            registered_attendees = event.registered_attendees,
            "Attendee registered"
        );

        Ok(RegisterOutcome::Registered {
            registration,
            event,
        })
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM registrations WHERE id = $1");

        sqlx::query_as::<_, Registration>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Filtered page of registrations, newest first
    pub async fn list(
        pool: &PgPool,
        filter: &RegistrationFilter,
        page: &PageRequest,
    ) -> Result<Page<Self>, sqlx::Error> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM registrations WHERE TRUE");
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

        let mut select =
            QueryBuilder::new(format!("SELECT {COLUMNS} FROM registrations WHERE TRUE"));
        push_filters(&mut select, filter);
        select.push(" ORDER BY registered_at DESC");
        push_page(&mut select, page);
        let items = select.build_query_as::<Registration>().fetch_all(pool).await?;

        Ok(Page {
            items,
            pagination: Pagination::new(page, total),
        })
    }

    /// Registrations for analytics: optionally one event, optionally a
    /// `registered_at` date range
    pub async fn list_for_analytics(
        pool: &PgPool,
        event_id: Option<Uuid>,
        range: &DateRange,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM registrations
             WHERE ($1::uuid IS NULL OR event_id = $1)
               AND ($2::date IS NULL OR registered_at::date >= $2)
               AND ($3::date IS NULL OR registered_at::date <= $3)
             ORDER BY registered_at ASC"
        );

        sqlx::query_as::<_, Registration>(&query)
            .bind(event_id)
            .bind(range.from)
            .bind(range.to)
            .fetch_all(pool)
            .await
    }

    /// Replaces attendee details and status
    ///
    /// Moving out of `cancelled` takes a seat (and fails when the event is
    /// full); moving into `cancelled` gives one back.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        details: AttendeeDetails,
        status: RegistrationStatus,
    ) -> Result<UpdateOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let current = sqlx::query_as::<_, Registration>(&format!(
            "SELECT {COLUMNS} FROM registrations WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(current) = current else {
            tx.rollback().await?;
            return Ok(UpdateOutcome::NotFound);
        };

        if find_conflict(&mut tx, current.event_id, &details.email, &details.name, Some(id)).await? {
            tx.rollback().await?;
            return Ok(UpdateOutcome::AlreadyRegistered);
        }

        match (current.status.holds_seat(), status.holds_seat()) {
            (false, true) => {
                if Event::reserve_seat(&mut tx, current.event_id).await?.is_none() {
                    tx.rollback().await?;
                    return Ok(UpdateOutcome::EventFull);
                }
            }
            (true, false) => Event::release_seat(&mut tx, current.event_id).await?,
            _ => {}
        }

        let query = format!(
            "UPDATE registrations SET
                 name = $2, email = $3, phone = $4, gender = $5, age = $6,
                 dietary_restrictions = $7, emergency_contact = $8, notes = $9, status = $10
             WHERE id = $1
             RETURNING {COLUMNS}"
        );

        let updated = sqlx::query_as::<_, Registration>(&query)
            .bind(id)
            .bind(details.name)
            .bind(details.email)
            .bind(details.phone)
            .bind(details.gender)
            .bind(details.age)
            .bind(details.dietary_restrictions)
            .bind(details.emergency_contact)
            .bind(details.notes)
            .bind(status)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        if current.status != status {
            tracing::info!(
                registration_id = %id,
                from = current.status.as_str(),
                to = status.as_str(),
                "Registration status changed"
            );
        }

        Ok(UpdateOutcome::Updated(updated))
    }

    /// Deletes a registration and frees its seat
    ///
    /// Returns the deleted row, or None if it did not exist.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let deleted = sqlx::query_as::<_, Registration>(&format!(
            "DELETE FROM registrations WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(registration) = &deleted {
            if registration.status.holds_seat() {
                Event::release_seat(&mut tx, registration.event_id).await?;
            }
        }

        tx.commit().await?;
        Ok(deleted)
    }

    /// Stamps `checked_in_at` for a non-cancelled registration
    pub async fn check_in(pool: &PgPool, id: Uuid) -> Result<CheckInOutcome, sqlx::Error> {
        let query = format!(
            "UPDATE registrations SET checked_in_at = NOW()
             WHERE id = $1 AND checked_in_at IS NULL AND status <> 'cancelled'
             RETURNING {COLUMNS}"
        );

        let updated = sqlx::query_as::<_, Registration>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        if let Some(registration) = updated {
            tracing::info!(
                registration_id = %id,
                event_id = %registration.event_id,
                "Attendee checked in"
            );
            return Ok(CheckInOutcome::CheckedIn(registration));
        }

        Ok(match Self::find_by_id(pool, id).await? {
            None => CheckInOutcome::NotFound,
            Some(r) if r.status == RegistrationStatus::Cancelled => CheckInOutcome::Cancelled,
            Some(_) => CheckInOutcome::AlreadyCheckedIn,
        })
    }

    /// Clears `checked_in_at`; None when the registration does not exist
    pub async fn undo_check_in(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE registrations SET checked_in_at = NULL WHERE id = $1 RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, Registration>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_cancelled_releases_seat() {
        assert!(RegistrationStatus::Confirmed.holds_seat());
        assert!(RegistrationStatus::Waitlist.holds_seat());
        assert!(!RegistrationStatus::Cancelled.holds_seat());
    }

    #[test]
    fn test_status_serde_lowercase() {
        for status in RegistrationStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));

            let parsed: RegistrationStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_unknown_status_rejected() {
        assert!(serde_json::from_str::<RegistrationStatus>("\"attended\"").is_err());
    }

    #[test]
    fn test_filter_sql() {
        let filter = RegistrationFilter {
            event_id: Some(Uuid::nil()),
            status: Some(RegistrationStatus::Waitlist),
            search: Some("ana".to_string()),
        };
        let mut qb: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM registrations WHERE TRUE");
        push_filters(&mut qb, &filter);

        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) FROM registrations WHERE TRUE AND event_id = $1 AND status = $2 \
             AND (name ILIKE $3 OR email ILIKE $4)"
        );
    }
}
