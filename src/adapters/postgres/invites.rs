//! PostgreSQL implementation of InviteRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode, GroupId, InviteId, UserId};
use crate::domain::group::MemberRole;
use crate::domain::invite::{GroupInvite, InviteCode, InviteStatus};
use crate::ports::{InviteRepository, InviteUse};

use super::rows::{db_error, invalid_column, opt_dt, opt_ts, parse_enum, to_i32, to_u32, ts, violates};

#[derive(Clone)]
pub struct PostgresInviteRepository {
    pool: PgPool,
}

impl PostgresInviteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct InviteRow {
    id: Uuid,
    code: String,
    group_id: Uuid,
    created_by: Uuid,
    created_by_role: String,
    status: String,
    max_uses: Option<i32>,
    uses_count: i32,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<InviteRow> for GroupInvite {
    type Error = DomainError;

    fn try_from(row: InviteRow) -> Result<Self, Self::Error> {
        let code = InviteCode::normalize(&row.code).map_err(|_| invalid_column("invite code", &row.code))?;
        Ok(GroupInvite {
            id: InviteId::from_uuid(row.id),
            code,
            group_id: GroupId::from_uuid(row.group_id),
            created_by: UserId::from_uuid(row.created_by),
            created_by_role: parse_enum("creator role", &row.created_by_role, MemberRole::parse)?,
            status: parse_enum("invite status", &row.status, InviteStatus::parse)?,
            max_uses: row.max_uses.map(|m| to_u32("max_uses", m)).transpose()?,
            uses_count: to_u32("uses_count", row.uses_count)?,
            expires_at: opt_ts(row.expires_at),
            created_at: ts(row.created_at),
        })
    }
}

/// Counts one use unless the invite is at its limit.
pub(super) async fn count_invite_use(
    conn: &mut PgConnection,
    id: &InviteId,
) -> Result<InviteUse, DomainError> {
    let counted = sqlx::query(
        r#"
        UPDATE group_invites
        SET uses_count = uses_count + 1
        WHERE id = $1 AND (max_uses IS NULL OR uses_count < max_uses)
        "#,
    )
    .bind(id.as_uuid())
    .execute(&mut *conn)
    .await
    .map_err(db_error("count invite use"))?;

    if counted.rows_affected() == 1 {
        return Ok(InviteUse::Counted);
    }

    let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM group_invites WHERE id = $1)")
        .bind(id.as_uuid())
        .fetch_one(&mut *conn)
        .await
        .map_err(db_error("fetch invite"))?;

    Ok(if exists { InviteUse::OverLimit } else { InviteUse::NotCounted })
}

#[async_trait]
impl InviteRepository for PostgresInviteRepository {
    async fn find_by_code(&self, code: &InviteCode) -> Result<Option<GroupInvite>, DomainError> {
        let row: Option<InviteRow> = sqlx::query_as(
            r#"
            SELECT id, code, group_id, created_by, created_by_role, status,
                   max_uses, uses_count, expires_at, created_at
            FROM group_invites
            WHERE code = $1
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("fetch invite"))?;

        row.map(GroupInvite::try_from).transpose()
    }

    async fn save(&self, invite: &GroupInvite) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO group_invites (
                id, code, group_id, created_by, created_by_role, status,
                max_uses, uses_count, expires_at, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(invite.id.as_uuid())
        .bind(invite.code.as_str())
        .bind(invite.group_id.as_uuid())
        .bind(invite.created_by.as_uuid())
        .bind(invite.created_by_role.as_str())
        .bind(invite.status.as_str())
        .bind(invite.max_uses.map(to_i32))
        .bind(to_i32(invite.uses_count))
        .bind(opt_dt(&invite.expires_at))
        .bind(invite.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if violates(&e, "group_invites_code_key") {
                return DomainError::new(ErrorCode::Conflict, "Invite code already exists");
            }
            db_error("save invite")(e)
        })?;

        Ok(())
    }
}
