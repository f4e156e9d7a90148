/// Member accounts
///
/// Accounts are created through the passcode-gated sign-up flow and are
/// referenced (without enforcement beyond `ON DELETE SET NULL`) by the
/// `created_by` column of events and library items.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE accounts (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     email VARCHAR(255) NOT NULL,          -- unique on LOWER(email)
///     phone VARCHAR(50) NOT NULL,
///     password_hash VARCHAR(255) NOT NULL,
///     profile_completed BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const COLUMNS: &str =
    "id, name, email, phone, password_hash, profile_completed, created_at, updated_at";

/// A member account
///
/// The password hash is never serialized into responses.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,

    /// Argon2id PHC string
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// Set once the member has filled in the rest of their profile
    pub profile_completed: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an account (password already hashed)
#[derive(Debug, Clone)]
pub struct CreateAccount {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
}

/// Account fields a member may change; None leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct UpdateAccount {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub password_hash: Option<String>,
    pub profile_completed: Option<bool>,
}

impl Account {
    pub async fn create(pool: &PgPool, data: CreateAccount) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO accounts (name, email, phone, password_hash)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, Account>(&query)
            .bind(data.name)
            .bind(data.email)
            .bind(data.phone)
            .bind(data.password_hash)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM accounts WHERE id = $1");

        sqlx::query_as::<_, Account>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Case-insensitive email lookup
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM accounts WHERE LOWER(email) = LOWER($1)");

        sqlx::query_as::<_, Account>(&query)
            .bind(email.trim())
            .fetch_optional(pool)
            .await
    }

    /// Applies the non-None fields; returns None when the account does not exist
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateAccount,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE accounts SET
                 name = COALESCE($2, name),
                 phone = COALESCE($3, phone),
                 password_hash = COALESCE($4, password_hash),
                 profile_completed = COALESCE($5, profile_completed),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, Account>(&query)
            .bind(id)
            .bind(data.name)
            .bind(data.phone)
            .bind(data.password_hash)
            .bind(data.profile_completed)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_not_serialized() {
        let account = Account {
            id: Uuid::new_v4(),
            name: "Amara Okafor".to_string(),
            email: "amara@example.org".to_string(),
            phone: "555-0101".to_string(),
            password_hash: "$argon2id$v=19$secret".to_string(),
            profile_completed: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&account).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "amara@example.org");
        assert_eq!(json["profile_completed"], false);
    }

    #[test]
    fn test_update_account_default_changes_nothing() {
        let update = UpdateAccount::default();
        assert!(update.name.is_none());
        assert!(update.phone.is_none());
        assert!(update.password_hash.is_none());
        assert!(update.profile_completed.is_none());
    }
}
