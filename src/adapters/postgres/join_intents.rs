//! PostgreSQL implementation of JoinIntentRepository.
//!
//! The partial unique index `join_intents_pending_key` keeps one initiated
//! intent per (user, group). Status changes are `UPDATE ... WHERE status =
//! 'initiated'` and report whether a row moved.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{
    DomainError, ErrorCode, GroupId, JoinIntentId, Timestamp, UserId,
};
use crate::domain::invite::InviteCode;
use crate::domain::join::{JoinIntent, JoinIntentStatus, PaymentMethod};
use crate::ports::{CreateIntentOutcome, JoinIntentRepository};

use super::rows::{db_error, invalid_column, money, parse_enum, ts};

const INTENT_COLUMNS: &str = "id, invite_code, group_id, user_id, amount, currency, \
     payment_method, order_id, payment_id, status, created_at, updated_at";

#[derive(Clone)]
pub struct PostgresJoinIntentRepository {
    pool: PgPool,
}

impl PostgresJoinIntentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Tells a lost race from a missing row after a guarded update.
    async fn moved(&self, id: &JoinIntentId, rows_affected: u64) -> Result<bool, DomainError> {
        if rows_affected == 1 {
            return Ok(true);
        }
        match self.find_by_id(id).await? {
            Some(_) => Ok(false),
            None => Err(DomainError::new(
                ErrorCode::JoinIntentNotFound,
                format!("Join intent not found: {}", id),
            )),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct IntentRow {
    id: Uuid,
    invite_code: String,
    group_id: Uuid,
    user_id: Uuid,
    amount: i64,
    currency: String,
    payment_method: String,
    order_id: Option<String>,
    payment_id: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<IntentRow> for JoinIntent {
    type Error = DomainError;

    fn try_from(row: IntentRow) -> Result<Self, Self::Error> {
        Ok(JoinIntent {
            id: JoinIntentId::from_uuid(row.id),
            invite_code: InviteCode::normalize(&row.invite_code)
                .map_err(|_| invalid_column("invite code", &row.invite_code))?,
            group_id: GroupId::from_uuid(row.group_id),
            user_id: UserId::from_uuid(row.user_id),
            amount: money(row.amount),
            currency: row.currency,
            payment_method: parse_enum("payment method", &row.payment_method, PaymentMethod::parse)?,
            order_id: row.order_id,
            payment_id: row.payment_id,
            status: parse_enum("intent status", &row.status, JoinIntentStatus::parse)?,
            created_at: ts(row.created_at),
            updated_at: ts(row.updated_at),
        })
    }
}

#[async_trait]
impl JoinIntentRepository for PostgresJoinIntentRepository {
    async fn create_if_no_pending(&self, intent: &JoinIntent) -> Result<CreateIntentOutcome, DomainError> {
        // A competing intent may leave `initiated` between the failed insert
        // and the read, so try twice before giving up.
        for _ in 0..2 {
            let inserted = sqlx::query(
                r#"
                INSERT INTO join_intents (
                    id, invite_code, group_id, user_id, amount, currency, payment_method,
                    order_id, payment_id, status, created_at, updated_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                ON CONFLICT (user_id, group_id) WHERE status = 'initiated' DO NOTHING
                "#,
            )
            .bind(intent.id.as_uuid())
            .bind(intent.invite_code.as_str())
            .bind(intent.group_id.as_uuid())
            .bind(intent.user_id.as_uuid())
            .bind(intent.amount.minor())
            .bind(&intent.currency)
            .bind(intent.payment_method.as_str())
            .bind(&intent.order_id)
            .bind(&intent.payment_id)
            .bind(intent.status.as_str())
            .bind(intent.created_at.as_datetime())
            .bind(intent.updated_at.as_datetime())
            .execute(&self.pool)
            .await
            .map_err(db_error("insert join intent"))?;

            if inserted.rows_affected() == 1 {
                return Ok(CreateIntentOutcome::Created(intent.clone()));
            }
            if let Some(existing) = self.find_pending(&intent.user_id, &intent.group_id).await? {
                return Ok(CreateIntentOutcome::Existing(existing));
            }
        }

        Err(DomainError::new(
            ErrorCode::Conflict,
            "Join intent changed concurrently, retry the join",
        ))
    }

    async fn find_by_id(&self, id: &JoinIntentId) -> Result<Option<JoinIntent>, DomainError> {
        let row: Option<IntentRow> =
            sqlx::query_as(&format!("SELECT {} FROM join_intents WHERE id = $1", INTENT_COLUMNS))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("fetch join intent"))?;

        row.map(JoinIntent::try_from).transpose()
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<JoinIntent>, DomainError> {
        let row: Option<IntentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM join_intents WHERE order_id = $1 ORDER BY created_at DESC LIMIT 1",
            INTENT_COLUMNS
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("fetch join intent by order"))?;

        row.map(JoinIntent::try_from).transpose()
    }

    async fn find_pending(
        &self,
        user_id: &UserId,
        group_id: &GroupId,
    ) -> Result<Option<JoinIntent>, DomainError> {
        let row: Option<IntentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM join_intents \
             WHERE user_id = $1 AND group_id = $2 AND status = 'initiated'",
            INTENT_COLUMNS
        ))
        .bind(user_id.as_uuid())
        .bind(group_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("fetch pending join intent"))?;

        row.map(JoinIntent::try_from).transpose()
    }

    async fn count_open_for_invite(&self, code: &InviteCode) -> Result<u32, DomainError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM join_intents WHERE invite_code = $1 AND status = 'initiated'",
        )
        .bind(code.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("count open join intents"))?;

        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    async fn set_order_id(&self, id: &JoinIntentId, order_id: &str) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE join_intents SET order_id = $2, updated_at = NOW() \
             WHERE id = $1 AND status = 'initiated'",
        )
        .bind(id.as_uuid())
        .bind(order_id)
        .execute(&self.pool)
        .await
        .map_err(db_error("record order id"))?;

        if self.moved(id, result.rows_affected()).await? {
            Ok(())
        } else {
            Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                "Join intent is no longer initiated",
            ))
        }
    }

    async fn mark_paid(
        &self,
        id: &JoinIntentId,
        payment_id: &str,
        now: Timestamp,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            "UPDATE join_intents SET status = 'paid', payment_id = $2, updated_at = $3 \
             WHERE id = $1 AND status = 'initiated'",
        )
        .bind(id.as_uuid())
        .bind(payment_id)
        .bind(now.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db_error("mark join intent paid"))?;

        self.moved(id, result.rows_affected()).await
    }

    async fn mark_failed(&self, id: &JoinIntentId, now: Timestamp) -> Result<bool, DomainError> {
        let result = sqlx::query(
            "UPDATE join_intents SET status = 'failed', updated_at = $2 \
             WHERE id = $1 AND status = 'initiated'",
        )
        .bind(id.as_uuid())
        .bind(now.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db_error("mark join intent failed"))?;

        self.moved(id, result.rows_affected()).await
    }

    async fn expire(&self, id: &JoinIntentId, now: Timestamp) -> Result<bool, DomainError> {
        let result = sqlx::query(
            "UPDATE join_intents SET status = 'expired', updated_at = $2 \
             WHERE id = $1 AND status = 'initiated'",
        )
        .bind(id.as_uuid())
        .bind(now.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db_error("expire join intent"))?;

        self.moved(id, result.rows_affected()).await
    }
}
