//! Postgres-backed user store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rootcause::Report;
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use ticketgate_access::{Principal, StoreError, UserStore};
use ticketgate_core::UserId;
use tracing::instrument;

/// Row type for user queries.
#[derive(FromRow)]
struct PrincipalRow {
    id: String,
    username: String,
    email: String,
    password: Option<String>,
    avatar: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PrincipalRow {
    fn try_into_principal(self) -> Result<Principal, Report<StoreError>> {
        let id = UserId::from_str(&self.id).map_err(|e| StoreError::Decode {
            details: e.to_string(),
        })?;
        Ok(Principal::with_all_fields(
            id,
            self.username,
            self.email,
            self.password,
            self.avatar,
            self.created_at,
            self.updated_at,
        ))
    }
}

fn query_failed(e: sqlx::Error) -> StoreError {
    StoreError::Query {
        details: e.to_string(),
    }
}

/// `UserStore` over the `users` table.
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Creates a new store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    #[instrument(skip(self))]
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Principal>, Report<StoreError>> {
        let row: Option<PrincipalRow> = sqlx::query_as(
            r#"
            SELECT id, username, email, password, avatar, created_at, updated_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_failed)?;

        row.map(PrincipalRow::try_into_principal).transpose()
    }

    /// A single statement, so concurrent first logins for the same
    /// username resolve inside Postgres.
    #[instrument(skip(self, principal), fields(username = %principal.username()))]
    async fn upsert_on_username_conflict(
        &self,
        principal: &Principal,
    ) -> Result<Principal, Report<StoreError>> {
        let row: PrincipalRow = sqlx::query_as(
            r#"
            INSERT INTO users (id, username, email, password, avatar, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (username) DO UPDATE
            SET password = EXCLUDED.password,
                avatar = EXCLUDED.avatar,
                updated_at = EXCLUDED.updated_at
            RETURNING id, username, email, password, avatar, created_at, updated_at
            "#,
        )
        .bind(principal.id().to_string())
        .bind(principal.username())
        .bind(principal.email())
        .bind(principal.password_hash())
        .bind(principal.avatar())
        .bind(principal.created_at())
        .bind(principal.updated_at())
        .fetch_one(&self.pool)
        .await
        .map_err(query_failed)?;

        row.try_into_principal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str) -> PrincipalRow {
        let now = Utc::now();
        PrincipalRow {
            id: id.to_string(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: Some("$argon2id$...".to_string()),
            avatar: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn row_converts_to_principal() {
        let id = UserId::new();
        let principal = row(&id.to_string()).try_into_principal().expect("convert");

        assert_eq!(principal.id(), id);
        assert_eq!(principal.username(), "alice");
        assert_eq!(principal.password_hash(), Some("$argon2id$..."));
    }

    #[test]
    fn invalid_id_is_decode_error() {
        let err = row("usr_garbage").try_into_principal().unwrap_err();
        assert!(matches!(err.current_context(), StoreError::Decode { .. }));
    }
}
