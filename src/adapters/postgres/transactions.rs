//! PostgreSQL implementation of GroupTransactionRepository.
//!
//! `group_transactions_payment_id_key` makes the payment id unique, so a
//! second finalization of the same payment never writes a second row.
//! `commit_sale` claims that id and applies the seat, the earnings credit
//! and the invite use in the same database transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::domain::fees::EarningsBucket;
use crate::domain::foundation::{DomainError, ErrorCode, GroupId, Percentage, TransactionId, UserId};
use crate::domain::ledger::{GroupTransaction, TransactionStatus};
use crate::ports::{
    CommittedSale, GroupTransactionRepository, InviteUse, Page, PageRequest, SaleCommit,
    SaleOutcome, SaleRecord,
};

use super::earnings::credit_account;
use super::groups::seat_member;
use super::invites::count_invite_use;
use super::rows::{db_error, invalid_column, money, opt_dt, opt_ts, parse_enum, ts, violates};

const PAYMENT_ID_KEY: &str = "group_transactions_payment_id_key";

const TRANSACTION_COLUMNS: &str = "id, group_id, owner_id, buyer_id, gross, fee_percent, \
     fee_amount, net, order_id, payment_id, status, pending_release_at, created_at, updated_at";

#[derive(Clone)]
pub struct PostgresGroupTransactionRepository {
    pool: PgPool,
}

impl PostgresGroupTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn replayed(&self, payment_id: &str) -> Result<SaleOutcome, DomainError> {
        self.find_by_payment_id(payment_id)
            .await?
            .map(SaleOutcome::Replayed)
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::Conflict,
                    format!("Payment {} conflicted but no paid row was found", payment_id),
                )
            })
    }

    /// A pending row that another commit already settled, or that was refunded.
    async fn settled_elsewhere(
        &self,
        id: &TransactionId,
        payment_id: &str,
    ) -> Result<SaleOutcome, DomainError> {
        if let Some(existing) = self.find_by_payment_id(payment_id).await? {
            return Ok(SaleOutcome::Replayed(existing));
        }
        let current = self.find_by_id(id).await?.ok_or_else(|| {
            DomainError::new(
                ErrorCode::TransactionNotFound,
                format!("Transaction not found: {}", id),
            )
        })?;
        match current.status {
            TransactionStatus::Paid => Ok(SaleOutcome::Replayed(current)),
            _ => Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                "Transaction was refunded",
            )),
        }
    }
}

async fn insert_row<'e, E>(executor: E, tx: &GroupTransaction, on_conflict: &str) -> Result<u64, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        r#"
        INSERT INTO group_transactions (
            id, group_id, owner_id, buyer_id, gross, fee_percent, fee_amount, net,
            order_id, payment_id, status, pending_release_at, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        {}
        "#,
        on_conflict
    );
    let result = sqlx::query(&sql)
        .bind(tx.id.as_uuid())
        .bind(tx.group_id.as_uuid())
        .bind(tx.owner_id.as_uuid())
        .bind(tx.buyer_id.as_uuid())
        .bind(tx.gross.minor())
        .bind(i16::from(tx.fee_percent.value()))
        .bind(tx.fee_amount.minor())
        .bind(tx.net.minor())
        .bind(&tx.order_id)
        .bind(&tx.payment_id)
        .bind(tx.status.as_str())
        .bind(opt_dt(&tx.pending_release_at))
        .bind(tx.created_at.as_datetime())
        .bind(tx.updated_at.as_datetime())
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: Uuid,
    group_id: Uuid,
    owner_id: Uuid,
    buyer_id: Uuid,
    gross: i64,
    fee_percent: i16,
    fee_amount: i64,
    net: i64,
    order_id: Option<String>,
    payment_id: Option<String>,
    status: String,
    pending_release_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for GroupTransaction {
    type Error = DomainError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        let fee_percent = u8::try_from(row.fee_percent)
            .ok()
            .and_then(|p| Percentage::try_new(p).ok())
            .ok_or_else(|| invalid_column("fee_percent", &row.fee_percent.to_string()))?;

        Ok(GroupTransaction {
            id: TransactionId::from_uuid(row.id),
            group_id: GroupId::from_uuid(row.group_id),
            owner_id: UserId::from_uuid(row.owner_id),
            buyer_id: UserId::from_uuid(row.buyer_id),
            gross: money(row.gross),
            fee_percent,
            fee_amount: money(row.fee_amount),
            net: money(row.net),
            order_id: row.order_id,
            payment_id: row.payment_id,
            status: parse_enum("transaction status", &row.status, TransactionStatus::parse)?,
            pending_release_at: opt_ts(row.pending_release_at),
            created_at: ts(row.created_at),
            updated_at: ts(row.updated_at),
        })
    }
}

#[async_trait]
impl GroupTransactionRepository for PostgresGroupTransactionRepository {
    async fn find_by_id(&self, id: &TransactionId) -> Result<Option<GroupTransaction>, DomainError> {
        let row: Option<TransactionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM group_transactions WHERE id = $1",
            TRANSACTION_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("fetch transaction"))?;

        row.map(GroupTransaction::try_from).transpose()
    }

    async fn find_by_payment_id(&self, payment_id: &str) -> Result<Option<GroupTransaction>, DomainError> {
        let row: Option<TransactionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM group_transactions WHERE payment_id = $1",
            TRANSACTION_COLUMNS
        ))
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("fetch transaction by payment"))?;

        row.map(GroupTransaction::try_from).transpose()
    }

    async fn find_pending_by_order_id(&self, order_id: &str) -> Result<Option<GroupTransaction>, DomainError> {
        let row: Option<TransactionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM group_transactions \
             WHERE order_id = $1 AND status = 'pending' \
             ORDER BY created_at DESC LIMIT 1",
            TRANSACTION_COLUMNS
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("fetch pending transaction by order"))?;

        row.map(GroupTransaction::try_from).transpose()
    }

    async fn find_pending_for(
        &self,
        group_id: &GroupId,
        buyer_id: &UserId,
    ) -> Result<Option<GroupTransaction>, DomainError> {
        let row: Option<TransactionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM group_transactions \
             WHERE group_id = $1 AND buyer_id = $2 AND status = 'pending' \
             ORDER BY created_at DESC LIMIT 1",
            TRANSACTION_COLUMNS
        ))
        .bind(group_id.as_uuid())
        .bind(buyer_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("fetch pending purchase"))?;

        row.map(GroupTransaction::try_from).transpose()
    }

    async fn insert_pending(&self, tx: &GroupTransaction) -> Result<(), DomainError> {
        insert_row(&self.pool, tx, "")
            .await
            .map_err(db_error("insert pending transaction"))?;
        Ok(())
    }

    async fn commit_sale(&self, commit: &SaleCommit) -> Result<SaleOutcome, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error("begin transaction"))?;

        // Claim the payment id. A concurrent commit of the same id waits on
        // the unique index and then finds the row taken.
        let transaction = match &commit.record {
            SaleRecord::New(sale) => {
                let inserted = insert_row(&mut *tx, sale, "ON CONFLICT (payment_id) DO NOTHING")
                    .await
                    .map_err(db_error("insert paid transaction"))?;
                if inserted == 0 {
                    tx.rollback().await.map_err(db_error("roll back"))?;
                    return self.replayed(&commit.payment_id).await;
                }
                sale.clone()
            }
            SaleRecord::SettlePending {
                id,
                pending_release_at,
            } => {
                let settled: Result<Option<TransactionRow>, sqlx::Error> = sqlx::query_as(&format!(
                    r#"
                    UPDATE group_transactions SET
                        status = 'paid',
                        payment_id = $2,
                        pending_release_at = $3,
                        updated_at = $4
                    WHERE id = $1 AND status = 'pending'
                    RETURNING {}
                    "#,
                    TRANSACTION_COLUMNS
                ))
                .bind(id.as_uuid())
                .bind(&commit.payment_id)
                .bind(opt_dt(pending_release_at))
                .bind(commit.now.as_datetime())
                .fetch_optional(&mut *tx)
                .await;

                match settled {
                    Ok(Some(row)) => GroupTransaction::try_from(row)?,
                    Ok(None) => {
                        tx.rollback().await.map_err(db_error("roll back"))?;
                        return self.settled_elsewhere(id, &commit.payment_id).await;
                    }
                    Err(e) if violates(&e, PAYMENT_ID_KEY) => {
                        tx.rollback().await.map_err(db_error("roll back"))?;
                        return self.replayed(&commit.payment_id).await;
                    }
                    Err(e) => return Err(db_error("settle transaction")(e)),
                }
            }
        };

        // Any error below drops `tx` and rolls the claim back with it.
        let seated = seat_member(&mut *tx, &commit.membership, commit.now).await?;

        let earnings = if transaction.net.is_zero() {
            None
        } else {
            let bucket = EarningsBucket::for_release(transaction.pending_release_at);
            Some(credit_account(&mut *tx, &transaction.owner_id, bucket, transaction.net, commit.now).await?)
        };

        let invite_use = match (&seated, &commit.invite_id) {
            (Some(_), Some(invite_id)) => count_invite_use(&mut *tx, invite_id).await?,
            _ => InviteUse::NotCounted,
        };

        tx.commit().await.map_err(db_error("commit sale"))?;

        let (seated, group_activated) = match seated {
            Some((group, activated)) => (Some(group), activated),
            None => (None, false),
        };
        Ok(SaleOutcome::Committed(CommittedSale {
            transaction,
            seated,
            group_activated,
            earnings,
            invite_use,
        }))
    }

    async fn list_paid_by_owner(
        &self,
        owner_id: &UserId,
        page: PageRequest,
    ) -> Result<Page<GroupTransaction>, DomainError> {
        let (total,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM group_transactions WHERE owner_id = $1 AND status = 'paid'",
        )
        .bind(owner_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("count owner sales"))?;

        let rows: Vec<TransactionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM group_transactions \
             WHERE owner_id = $1 AND status = 'paid' \
             ORDER BY created_at DESC \
             LIMIT $2 OFFSET $3",
            TRANSACTION_COLUMNS
        ))
        .bind(owner_id.as_uuid())
        .bind(i64::from(page.limit))
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list owner sales"))?;

        let items = rows
            .into_iter()
            .map(GroupTransaction::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let total = u64::try_from(total).unwrap_or(0);
        let has_more = ((page.offset() + items.len()) as u64) < total;

        Ok(Page {
            items,
            total,
            has_more,
        })
    }
}
