//! PostgreSQL implementation of EarningsLedger.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgExecutor, PgPool};
use uuid::Uuid;

use crate::domain::fees::EarningsBucket;
use crate::domain::foundation::{DomainError, Money, Timestamp, UserId};
use crate::domain::ledger::{EarningsAccount, MaturationOutcome};
use crate::ports::EarningsLedger;

use super::rows::{db_error, money, ts};

#[derive(Clone)]
pub struct PostgresEarningsLedger {
    pool: PgPool,
}

impl PostgresEarningsLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EarningsRow {
    owner_id: Uuid,
    withdrawable_balance: i64,
    pending_balance: i64,
    total_earned: i64,
    updated_at: DateTime<Utc>,
}

impl From<EarningsRow> for EarningsAccount {
    fn from(row: EarningsRow) -> Self {
        EarningsAccount {
            owner_id: UserId::from_uuid(row.owner_id),
            withdrawable_balance: money(row.withdrawable_balance),
            pending_balance: money(row.pending_balance),
            total_earned: money(row.total_earned),
            updated_at: ts(row.updated_at),
        }
    }
}

/// Creates an empty earnings row for the owner unless one exists.
async fn open_account(
    conn: &mut PgConnection,
    owner_id: &UserId,
    now: Timestamp,
) -> Result<(), DomainError> {
    sqlx::query(
        r#"
        INSERT INTO earnings (owner_id, withdrawable_balance, pending_balance, total_earned, updated_at)
        VALUES ($1, 0, 0, 0, $2)
        ON CONFLICT (owner_id) DO NOTHING
        "#,
    )
    .bind(owner_id.as_uuid())
    .bind(now.as_datetime())
    .execute(&mut *conn)
    .await
    .map_err(db_error("open earnings account"))?;
    Ok(())
}

/// Adds a sale's net to one bucket and to the lifetime total.
pub(super) async fn credit_account<'e, E>(
    executor: E,
    owner_id: &UserId,
    bucket: EarningsBucket,
    net: Money,
    now: Timestamp,
) -> Result<EarningsAccount, DomainError>
where
    E: PgExecutor<'e>,
{
    let (pending, withdrawable) = match bucket {
        EarningsBucket::Pending => (net, Money::ZERO),
        EarningsBucket::Withdrawable => (Money::ZERO, net),
    };

    let row: EarningsRow = sqlx::query_as(
        r#"
        INSERT INTO earnings (owner_id, withdrawable_balance, pending_balance, total_earned, updated_at)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (owner_id) DO UPDATE SET
            withdrawable_balance = earnings.withdrawable_balance + EXCLUDED.withdrawable_balance,
            pending_balance = earnings.pending_balance + EXCLUDED.pending_balance,
            total_earned = earnings.total_earned + EXCLUDED.total_earned,
            updated_at = EXCLUDED.updated_at
        RETURNING owner_id, withdrawable_balance, pending_balance, total_earned, updated_at
        "#,
    )
    .bind(owner_id.as_uuid())
    .bind(withdrawable.minor())
    .bind(pending.minor())
    .bind(net.minor())
    .bind(now.as_datetime())
    .fetch_one(executor)
    .await
    .map_err(db_error("credit earnings"))?;

    Ok(row.into())
}

/// Takes `amount` out of the withdrawable balance in one guarded UPDATE.
///
/// Returns the balance seen when it is short; nothing is written then.
pub(super) async fn reserve_withdrawable(
    conn: &mut PgConnection,
    owner_id: &UserId,
    amount: Money,
    now: Timestamp,
) -> Result<Result<(), Money>, DomainError> {
    open_account(conn, owner_id, now).await?;

    let reserved = sqlx::query(
        r#"
        UPDATE earnings SET
            withdrawable_balance = withdrawable_balance - $2,
            updated_at = $3
        WHERE owner_id = $1 AND withdrawable_balance >= $2
        "#,
    )
    .bind(owner_id.as_uuid())
    .bind(amount.minor())
    .bind(now.as_datetime())
    .execute(&mut *conn)
    .await
    .map_err(db_error("reserve earnings"))?;

    if reserved.rows_affected() == 1 {
        return Ok(Ok(()));
    }

    let (available,): (i64,) =
        sqlx::query_as("SELECT withdrawable_balance FROM earnings WHERE owner_id = $1")
            .bind(owner_id.as_uuid())
            .fetch_one(&mut *conn)
            .await
            .map_err(db_error("fetch earnings balance"))?;
    Ok(Err(money(available)))
}

/// Puts a reserved amount back into the withdrawable balance.
pub(super) async fn restore_withdrawable(
    conn: &mut PgConnection,
    owner_id: &UserId,
    amount: Money,
    now: Timestamp,
) -> Result<(), DomainError> {
    open_account(conn, owner_id, now).await?;

    sqlx::query(
        r#"
        UPDATE earnings SET
            withdrawable_balance = withdrawable_balance + $2,
            updated_at = $3
        WHERE owner_id = $1
        "#,
    )
    .bind(owner_id.as_uuid())
    .bind(amount.minor())
    .bind(now.as_datetime())
    .execute(&mut *conn)
    .await
    .map_err(db_error("restore earnings"))?;
    Ok(())
}

#[async_trait]
impl EarningsLedger for PostgresEarningsLedger {
    async fn find(&self, owner_id: &UserId) -> Result<Option<EarningsAccount>, DomainError> {
        let row: Option<EarningsRow> = sqlx::query_as(
            r#"
            SELECT owner_id, withdrawable_balance, pending_balance, total_earned, updated_at
            FROM earnings WHERE owner_id = $1
            "#,
        )
        .bind(owner_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("fetch earnings"))?;

        Ok(row.map(EarningsAccount::from))
    }

    async fn credit(
        &self,
        owner_id: &UserId,
        bucket: EarningsBucket,
        net: Money,
        now: Timestamp,
    ) -> Result<EarningsAccount, DomainError> {
        credit_account(&self.pool, owner_id, bucket, net, now).await
    }

    async fn mature(
        &self,
        owner_id: &UserId,
        now: Timestamp,
        limit: usize,
    ) -> Result<MaturationOutcome, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error("begin transaction"))?;

        // Rows claimed by a concurrent pass are skipped, never matured twice.
        let (count, sum): (i64, i64) = sqlx::query_as(
            r#"
            WITH due AS (
                SELECT id FROM group_transactions
                WHERE owner_id = $1
                  AND status = 'paid'
                  AND pending_release_at IS NOT NULL
                  AND pending_release_at <= $2
                ORDER BY pending_release_at, id
                LIMIT $3
                FOR UPDATE SKIP LOCKED
            ), cleared AS (
                UPDATE group_transactions t
                SET pending_release_at = NULL, updated_at = $2
                FROM due
                WHERE t.id = due.id
                RETURNING t.net
            )
            SELECT COUNT(*), COALESCE(SUM(net), 0)::BIGINT FROM cleared
            "#,
        )
        .bind(owner_id.as_uuid())
        .bind(now.as_datetime())
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("clear matured holds"))?;

        if count == 0 {
            tx.rollback().await.map_err(db_error("roll back"))?;
            return Ok(MaturationOutcome::default());
        }

        let due = money(sum);
        open_account(&mut *tx, owner_id, now).await?;
        // Clamped to the pending balance so a drifted row cannot go negative.
        let (moved,): (i64,) = sqlx::query_as(
            r#"
            WITH moved AS (
                SELECT owner_id, LEAST(pending_balance, $2) AS amount
                FROM earnings WHERE owner_id = $1
                FOR UPDATE
            )
            UPDATE earnings e SET
                pending_balance = e.pending_balance - moved.amount,
                withdrawable_balance = e.withdrawable_balance + moved.amount,
                updated_at = $3
            FROM moved
            WHERE e.owner_id = moved.owner_id
            RETURNING moved.amount
            "#,
        )
        .bind(owner_id.as_uuid())
        .bind(due.minor())
        .bind(now.as_datetime())
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("mature earnings"))?;
        let matured = money(moved);
        tx.commit().await.map_err(db_error("commit maturation"))?;

        if matured != due {
            tracing::error!(
                alert = "reconciliation",
                owner_id = %owner_id,
                due = %due,
                matured = %matured,
                "Pending earnings smaller than matured transactions"
            );
        }

        Ok(MaturationOutcome {
            matured,
            transactions: usize::try_from(count).unwrap_or(0),
        })
    }
}
