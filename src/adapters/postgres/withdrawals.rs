//! PostgreSQL implementation of WithdrawalRepository.
//!
//! Reservation and refund run in the same transaction as the withdrawal row
//! write. The partial unique index `withdrawal_requests_open_key` keeps one
//! open request per (owner, source) even under concurrent requests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::domain::foundation::{
    DomainError, ErrorCode, Money, Timestamp, UserId, WithdrawalId,
};
use crate::domain::ledger::{insufficient_funds, Direction, WalletEntry, WalletSource};
use crate::domain::withdrawal::{
    PayoutDetails, PayoutMethod, WithdrawalFilter, WithdrawalRequest, WithdrawalSource,
    WithdrawalStatus,
};
use crate::ports::WithdrawalRepository;

use super::earnings::{reserve_withdrawable, restore_withdrawable};
use super::rows::{db_error, money, parse_enum, ts, violates};
use super::wallet::apply_wallet;

const OPEN_REQUEST_KEY: &str = "withdrawal_requests_open_key";

const WITHDRAWAL_COLUMNS: &str = "id, owner_id, source, amount, payout_method, payout_details, \
     status, payout_id, utr, reject_reason, created_at, updated_at";

#[derive(Clone)]
pub struct PostgresWithdrawalRepository {
    pool: PgPool,
}

impl PostgresWithdrawalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WithdrawalRow {
    id: Uuid,
    owner_id: Uuid,
    source: String,
    amount: i64,
    payout_method: String,
    payout_details: Json<PayoutDetails>,
    status: String,
    payout_id: Option<String>,
    utr: Option<String>,
    reject_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<WithdrawalRow> for WithdrawalRequest {
    type Error = DomainError;

    fn try_from(row: WithdrawalRow) -> Result<Self, Self::Error> {
        Ok(WithdrawalRequest {
            id: WithdrawalId::from_uuid(row.id),
            owner_id: UserId::from_uuid(row.owner_id),
            source: parse_enum("withdrawal source", &row.source, WithdrawalSource::parse)?,
            amount: money(row.amount),
            payout_method: parse_enum("payout method", &row.payout_method, PayoutMethod::parse)?,
            payout_details: row.payout_details.0,
            status: parse_enum("withdrawal status", &row.status, WithdrawalStatus::parse)?,
            payout_id: row.payout_id,
            utr: row.utr,
            reject_reason: row.reject_reason,
            created_at: ts(row.created_at),
            updated_at: ts(row.updated_at),
        })
    }
}

fn duplicate_request() -> DomainError {
    DomainError::new(
        ErrorCode::DuplicateRequest,
        "An open withdrawal request already exists",
    )
}

fn withdrawal_not_found(id: &WithdrawalId) -> DomainError {
    DomainError::new(
        ErrorCode::WithdrawalNotFound,
        format!("Withdrawal request not found: {}", id),
    )
}

/// Takes the request amount out of its source balance on `conn`.
async fn reserve(conn: &mut PgConnection, request: &WithdrawalRequest) -> Result<(), DomainError> {
    match request.source {
        WithdrawalSource::Wallet => {
            let entry = WalletEntry::new(WalletSource::Withdrawal, "Withdrawal request")
                .with_reference(request.id.to_string())
                .with_idempotency_key(format!("withdrawal:{}", request.id));
            apply_wallet(
                conn,
                &request.owner_id,
                Direction::Debit,
                request.amount,
                entry,
                request.created_at,
            )
            .await?;
        }
        WithdrawalSource::Earnings => {
            let reserved =
                reserve_withdrawable(conn, &request.owner_id, request.amount, request.created_at)
                    .await?;
            if let Err(available) = reserved {
                return Err(insufficient_funds(available, request.amount));
            }
        }
    }
    Ok(())
}

/// Puts a rejected request's amount back into its source balance on `conn`.
async fn refund(
    conn: &mut PgConnection,
    request: &WithdrawalRequest,
    now: Timestamp,
) -> Result<(), DomainError> {
    match request.source {
        WithdrawalSource::Wallet => {
            let entry = WalletEntry::new(WalletSource::Refund, "Withdrawal refund")
                .with_reference(request.id.to_string())
                .with_idempotency_key(format!("withdrawal-refund:{}", request.id));
            apply_wallet(conn, &request.owner_id, Direction::Credit, request.amount, entry, now)
                .await?;
        }
        WithdrawalSource::Earnings => {
            restore_withdrawable(conn, &request.owner_id, request.amount, now).await?;
        }
    }
    Ok(())
}

#[async_trait]
impl WithdrawalRepository for PostgresWithdrawalRepository {
    async fn find_by_id(&self, id: &WithdrawalId) -> Result<Option<WithdrawalRequest>, DomainError> {
        let row: Option<WithdrawalRow> = sqlx::query_as(&format!(
            "SELECT {} FROM withdrawal_requests WHERE id = $1",
            WITHDRAWAL_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("fetch withdrawal"))?;

        row.map(WithdrawalRequest::try_from).transpose()
    }

    async fn list(&self, filter: &WithdrawalFilter) -> Result<Vec<WithdrawalRequest>, DomainError> {
        let rows: Vec<WithdrawalRow> = sqlx::query_as(&format!(
            "SELECT {} FROM withdrawal_requests \
             WHERE ($1::uuid IS NULL OR owner_id = $1) \
               AND ($2::text IS NULL OR status = $2) \
               AND ($3::text IS NULL OR source = $3) \
             ORDER BY created_at DESC",
            WITHDRAWAL_COLUMNS
        ))
        .bind(filter.owner_id.map(|o| *o.as_uuid()))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.source.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list withdrawals"))?;

        rows.into_iter().map(WithdrawalRequest::try_from).collect()
    }

    async fn open_total(&self, owner_id: &UserId) -> Result<Money, DomainError> {
        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(amount), 0)::BIGINT FROM withdrawal_requests
            WHERE owner_id = $1 AND status IN ('requested', 'approved', 'processing')
            "#,
        )
        .bind(owner_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("sum open withdrawals"))?;

        Ok(money(total))
    }

    async fn create_reserving(&self, request: &WithdrawalRequest) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error("begin transaction"))?;

        let open: Option<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT id FROM withdrawal_requests
            WHERE owner_id = $1 AND source = $2
              AND status IN ('requested', 'approved', 'processing')
            LIMIT 1
            "#,
        )
        .bind(request.owner_id.as_uuid())
        .bind(request.source.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("check open withdrawals"))?;
        if open.is_some() {
            return Err(duplicate_request());
        }

        // Dropping `tx` on any error below rolls the reservation back.
        reserve(&mut *tx, request).await?;

        sqlx::query(
            r#"
            INSERT INTO withdrawal_requests (
                id, owner_id, source, amount, payout_method, payout_details,
                status, payout_id, utr, reject_reason, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(request.id.as_uuid())
        .bind(request.owner_id.as_uuid())
        .bind(request.source.as_str())
        .bind(request.amount.minor())
        .bind(request.payout_method.as_str())
        .bind(Json(&request.payout_details))
        .bind(request.status.as_str())
        .bind(&request.payout_id)
        .bind(&request.utr)
        .bind(&request.reject_reason)
        .bind(request.created_at.as_datetime())
        .bind(request.updated_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if violates(&e, OPEN_REQUEST_KEY) {
                return duplicate_request();
            }
            db_error("insert withdrawal")(e)
        })?;

        tx.commit().await.map_err(db_error("commit withdrawal"))?;
        Ok(())
    }

    async fn update_if_status(
        &self,
        request: &WithdrawalRequest,
        expected: WithdrawalStatus,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE withdrawal_requests SET
                status = $3,
                payout_id = $4,
                utr = $5,
                reject_reason = $6,
                updated_at = $7
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(request.id.as_uuid())
        .bind(expected.as_str())
        .bind(request.status.as_str())
        .bind(&request.payout_id)
        .bind(&request.utr)
        .bind(&request.reject_reason)
        .bind(request.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db_error("update withdrawal"))?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }
        match self.find_by_id(&request.id).await? {
            Some(_) => Ok(false),
            None => Err(withdrawal_not_found(&request.id)),
        }
    }

    async fn reject_with_refund(
        &self,
        id: &WithdrawalId,
        reason: &str,
        now: Timestamp,
    ) -> Result<WithdrawalRequest, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error("begin transaction"))?;

        let row: Option<WithdrawalRow> = sqlx::query_as(&format!(
            "SELECT {} FROM withdrawal_requests WHERE id = $1 FOR UPDATE",
            WITHDRAWAL_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("lock withdrawal"))?;

        let mut request = match row {
            Some(row) => WithdrawalRequest::try_from(row)?,
            None => return Err(withdrawal_not_found(id)),
        };
        if let Err(e) = request.reject(reason, now) {
            return Err(DomainError::new(ErrorCode::InvalidStateTransition, e.to_string())
                .with_detail("current", request.status.as_str()));
        }

        refund(&mut *tx, &request, now).await?;

        sqlx::query(
            r#"
            UPDATE withdrawal_requests SET status = $2, reject_reason = $3, updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(request.id.as_uuid())
        .bind(request.status.as_str())
        .bind(&request.reject_reason)
        .bind(request.updated_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(db_error("mark withdrawal rejected"))?;

        tx.commit().await.map_err(db_error("commit rejection"))?;
        Ok(request)
    }
}
