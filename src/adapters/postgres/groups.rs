//! PostgreSQL implementation of GroupRepository.
//!
//! `seat_member` runs inside the sale transaction owned by the transaction
//! repository, so a paid seat and its sale row commit together.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::domain::foundation::{
    DomainError, ErrorCode, GroupId, MembershipId, Timestamp, UserId,
};
use crate::domain::group::{Group, GroupMembership, GroupStatus, MemberRole, MemberStatus};
use crate::ports::GroupRepository;

use super::rows::{db_error, opt_dt, opt_ts, parse_enum, to_i32, to_u32, ts, money, violates};

const CURRENT_MEMBER_KEY: &str = "group_members_current_key";

const GROUP_COLUMNS: &str = "id, name, created_by, share_price, share_limit, member_count, \
     status, duration_days, start_date, end_date, allow_member_invites, created_at, updated_at";

/// PostgreSQL implementation of the GroupRepository port.
#[derive(Clone)]
pub struct PostgresGroupRepository {
    pool: PgPool,
}

impl PostgresGroupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct GroupRow {
    id: Uuid,
    name: String,
    created_by: Uuid,
    share_price: i64,
    share_limit: i32,
    member_count: i32,
    status: String,
    duration_days: i32,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    allow_member_invites: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<GroupRow> for Group {
    type Error = DomainError;

    fn try_from(row: GroupRow) -> Result<Self, Self::Error> {
        Ok(Group {
            id: GroupId::from_uuid(row.id),
            name: row.name,
            created_by: UserId::from_uuid(row.created_by),
            share_price: money(row.share_price),
            share_limit: to_u32("share_limit", row.share_limit)?,
            member_count: to_u32("member_count", row.member_count)?,
            status: parse_enum("group status", &row.status, GroupStatus::parse)?,
            duration_days: to_u32("duration_days", row.duration_days)?,
            start_date: opt_ts(row.start_date),
            end_date: opt_ts(row.end_date),
            allow_member_invites: row.allow_member_invites,
            created_at: ts(row.created_at),
            updated_at: ts(row.updated_at),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MembershipRow {
    id: Uuid,
    group_id: Uuid,
    user_id: Uuid,
    role: String,
    status: String,
    joined_at: DateTime<Utc>,
}

impl TryFrom<MembershipRow> for GroupMembership {
    type Error = DomainError;

    fn try_from(row: MembershipRow) -> Result<Self, Self::Error> {
        Ok(GroupMembership {
            id: MembershipId::from_uuid(row.id),
            group_id: GroupId::from_uuid(row.group_id),
            user_id: UserId::from_uuid(row.user_id),
            role: parse_enum("member role", &row.role, MemberRole::parse)?,
            status: parse_enum("member status", &row.status, MemberStatus::parse)?,
            joined_at: ts(row.joined_at),
        })
    }
}

fn already_member() -> DomainError {
    DomainError::new(
        ErrorCode::AlreadyMember,
        "User already has a membership in this group",
    )
}

/// Seats a buyer on `conn`: locks the group row, inserts the membership and
/// writes the new seat count.
///
/// `None` when the user already holds a current membership; nothing is
/// written then.
pub(super) async fn seat_member(
    conn: &mut PgConnection,
    membership: &GroupMembership,
    now: Timestamp,
) -> Result<Option<(Group, bool)>, DomainError> {
    // Serialises concurrent joins into the same group.
    let row: Option<GroupRow> = sqlx::query_as(&format!(
        "SELECT {} FROM groups WHERE id = $1 FOR UPDATE",
        GROUP_COLUMNS
    ))
    .bind(membership.group_id.as_uuid())
    .fetch_optional(&mut *conn)
    .await
    .map_err(db_error("lock group"))?;

    let mut group = match row {
        Some(row) => Group::try_from(row)?,
        None => {
            return Err(DomainError::new(
                ErrorCode::GroupNotFound,
                format!("Group not found: {}", membership.group_id),
            ))
        }
    };

    let inserted = sqlx::query(
        r#"
        INSERT INTO group_members (id, group_id, user_id, role, status, joined_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (group_id, user_id) WHERE status <> 'left' DO NOTHING
        "#,
    )
    .bind(membership.id.as_uuid())
    .bind(membership.group_id.as_uuid())
    .bind(membership.user_id.as_uuid())
    .bind(membership.role.as_str())
    .bind(membership.status.as_str())
    .bind(membership.joined_at.as_datetime())
    .execute(&mut *conn)
    .await
    .map_err(db_error("insert membership"))?;

    if inserted.rows_affected() == 0 {
        return Ok(None);
    }

    let activated = group.record_join(now);

    sqlx::query(
        r#"
        UPDATE groups SET
            member_count = $2,
            status = $3,
            start_date = $4,
            end_date = $5,
            updated_at = $6
        WHERE id = $1
        "#,
    )
    .bind(group.id.as_uuid())
    .bind(to_i32(group.member_count))
    .bind(group.status.as_str())
    .bind(opt_dt(&group.start_date))
    .bind(opt_dt(&group.end_date))
    .bind(group.updated_at.as_datetime())
    .execute(&mut *conn)
    .await
    .map_err(db_error("update group seats"))?;

    Ok(Some((group, activated)))
}

#[async_trait]
impl GroupRepository for PostgresGroupRepository {
    async fn find_by_id(&self, id: &GroupId) -> Result<Option<Group>, DomainError> {
        let row: Option<GroupRow> =
            sqlx::query_as(&format!("SELECT {} FROM groups WHERE id = $1", GROUP_COLUMNS))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("fetch group"))?;

        row.map(Group::try_from).transpose()
    }

    async fn save(&self, group: &Group) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO groups (
                id, name, created_by, share_price, share_limit, member_count, status,
                duration_days, start_date, end_date, allow_member_invites, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                share_price = EXCLUDED.share_price,
                share_limit = EXCLUDED.share_limit,
                member_count = EXCLUDED.member_count,
                status = EXCLUDED.status,
                duration_days = EXCLUDED.duration_days,
                start_date = EXCLUDED.start_date,
                end_date = EXCLUDED.end_date,
                allow_member_invites = EXCLUDED.allow_member_invites,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(group.id.as_uuid())
        .bind(&group.name)
        .bind(group.created_by.as_uuid())
        .bind(group.share_price.minor())
        .bind(to_i32(group.share_limit))
        .bind(to_i32(group.member_count))
        .bind(group.status.as_str())
        .bind(to_i32(group.duration_days))
        .bind(opt_dt(&group.start_date))
        .bind(opt_dt(&group.end_date))
        .bind(group.allow_member_invites)
        .bind(group.created_at.as_datetime())
        .bind(group.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db_error("save group"))?;

        Ok(())
    }

    async fn save_membership(&self, membership: &GroupMembership) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO group_members (id, group_id, user_id, role, status, joined_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(membership.id.as_uuid())
        .bind(membership.group_id.as_uuid())
        .bind(membership.user_id.as_uuid())
        .bind(membership.role.as_str())
        .bind(membership.status.as_str())
        .bind(membership.joined_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if violates(&e, CURRENT_MEMBER_KEY) {
                return already_member();
            }
            db_error("save membership")(e)
        })?;

        Ok(())
    }

    async fn find_owner(&self, group_id: &GroupId) -> Result<Option<GroupMembership>, DomainError> {
        let row: Option<MembershipRow> = sqlx::query_as(
            r#"
            SELECT id, group_id, user_id, role, status, joined_at
            FROM group_members
            WHERE group_id = $1 AND role = 'owner' AND status <> 'left'
            ORDER BY joined_at
            LIMIT 1
            "#,
        )
        .bind(group_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("fetch group owner"))?;

        row.map(GroupMembership::try_from).transpose()
    }

    async fn find_current_membership(
        &self,
        group_id: &GroupId,
        user_id: &UserId,
    ) -> Result<Option<GroupMembership>, DomainError> {
        let row: Option<MembershipRow> = sqlx::query_as(
            r#"
            SELECT id, group_id, user_id, role, status, joined_at
            FROM group_members
            WHERE group_id = $1 AND user_id = $2 AND status <> 'left'
            "#,
        )
        .bind(group_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("fetch membership"))?;

        row.map(GroupMembership::try_from).transpose()
    }

    async fn count_owned(&self, owner_id: &UserId) -> Result<u32, DomainError> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM group_members
            WHERE user_id = $1 AND role = 'owner' AND status <> 'left'
            "#,
        )
        .bind(owner_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("count owned groups"))?;

        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }
}
