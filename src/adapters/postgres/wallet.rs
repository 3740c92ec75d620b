//! PostgreSQL implementation of WalletLedger.
//!
//! A mutation is one guarded `UPDATE wallets ... RETURNING balance` plus one
//! `wallet_transactions` insert inside a single transaction. Debits carry
//! `WHERE balance >= amount` so the balance can never go negative.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::domain::foundation::{
    DomainError, ErrorCode, Money, Timestamp, UserId, WalletId, WalletTransactionId,
};
use crate::domain::ledger::{
    insufficient_funds, Direction, WalletAccount, WalletEntry, WalletMutation, WalletSource,
    WalletTransaction, WalletTransactionFilter,
};
use crate::ports::{Page, WalletLedger};

use super::rows::{db_error, money, opt_dt, parse_enum, ts, violates};

const IDEMPOTENCY_KEY: &str = "wallet_transactions_idempotency_key";

const WALLET_TX_COLUMNS: &str = "id, wallet_id, direction, amount, balance_after, source, \
     description, reference, idempotency_key, created_at";

#[derive(Clone)]
pub struct PostgresWalletLedger {
    pool: PgPool,
}

impl PostgresWalletLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn mutate(
        &self,
        owner_id: &UserId,
        direction: Direction,
        amount: Money,
        entry: WalletEntry,
    ) -> Result<WalletMutation, DomainError> {
        let key = entry.idempotency_key.clone();
        let mut tx = self.pool.begin().await.map_err(db_error("begin transaction"))?;

        match apply_wallet(&mut *tx, owner_id, direction, amount, entry, Timestamp::now()).await {
            Ok(mutation) => {
                tx.commit().await.map_err(db_error("commit wallet mutation"))?;
                Ok(mutation)
            }
            Err(e) if is_idempotency_race(&e) => {
                tx.rollback().await.map_err(db_error("roll back"))?;
                // The competing writer committed the row under our key.
                let key = key.unwrap_or_default();
                let mut conn = self.pool.acquire().await.map_err(db_error("acquire connection"))?;
                find_by_key(&mut *conn, &key)
                    .await?
                    .map(WalletMutation::Replayed)
                    .ok_or(e)
            }
            Err(e) => Err(e),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WalletRow {
    id: Uuid,
    owner_id: Uuid,
    balance: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<WalletRow> for WalletAccount {
    fn from(row: WalletRow) -> Self {
        WalletAccount {
            id: WalletId::from_uuid(row.id),
            owner_id: UserId::from_uuid(row.owner_id),
            balance: money(row.balance),
            created_at: ts(row.created_at),
            updated_at: ts(row.updated_at),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WalletTxRow {
    id: Uuid,
    wallet_id: Uuid,
    direction: String,
    amount: i64,
    balance_after: i64,
    source: String,
    description: String,
    reference: Option<String>,
    idempotency_key: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<WalletTxRow> for WalletTransaction {
    type Error = DomainError;

    fn try_from(row: WalletTxRow) -> Result<Self, Self::Error> {
        Ok(WalletTransaction {
            id: WalletTransactionId::from_uuid(row.id),
            wallet_id: WalletId::from_uuid(row.wallet_id),
            direction: parse_enum("direction", &row.direction, Direction::parse)?,
            amount: money(row.amount),
            balance_after: money(row.balance_after),
            source: parse_enum("wallet source", &row.source, WalletSource::parse)?,
            description: row.description,
            reference: row.reference,
            idempotency_key: row.idempotency_key,
            created_at: ts(row.created_at),
        })
    }
}

fn is_idempotency_race(e: &DomainError) -> bool {
    e.code == ErrorCode::Conflict && e.details.contains_key("idempotency_key")
}

async fn find_by_key(
    conn: &mut PgConnection,
    key: &str,
) -> Result<Option<WalletTransaction>, DomainError> {
    let row: Option<WalletTxRow> = sqlx::query_as(&format!(
        "SELECT {} FROM wallet_transactions WHERE idempotency_key = $1",
        WALLET_TX_COLUMNS
    ))
    .bind(key)
    .fetch_optional(&mut *conn)
    .await
    .map_err(db_error("fetch wallet transaction by key"))?;

    row.map(WalletTransaction::try_from).transpose()
}

/// Applies one wallet mutation on `conn` and appends its log row.
///
/// Runs inside the caller's transaction; withdrawal reservation and refund
/// reuse it so the wallet change commits with the withdrawal row.
pub(super) async fn apply_wallet(
    conn: &mut PgConnection,
    owner_id: &UserId,
    direction: Direction,
    amount: Money,
    entry: WalletEntry,
    now: Timestamp,
) -> Result<WalletMutation, DomainError> {
    if let Some(key) = &entry.idempotency_key {
        if let Some(existing) = find_by_key(conn, key).await? {
            return Ok(WalletMutation::Replayed(existing));
        }
    }
    if amount.is_zero() || amount.is_negative() {
        return Err(DomainError::validation("amount", "Amount must be positive"));
    }

    let updated: Option<(Uuid, i64)> = match direction {
        Direction::Credit => {
            let opened = WalletAccount::open(*owner_id, now);
            sqlx::query_as(
                r#"
                INSERT INTO wallets (id, owner_id, balance, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $4)
                ON CONFLICT (owner_id) DO UPDATE SET
                    balance = wallets.balance + EXCLUDED.balance,
                    updated_at = EXCLUDED.updated_at
                RETURNING id, balance
                "#,
            )
            .bind(opened.id.as_uuid())
            .bind(owner_id.as_uuid())
            .bind(amount.minor())
            .bind(now.as_datetime())
            .fetch_optional(&mut *conn)
            .await
            .map_err(db_error("credit wallet"))?
        }
        Direction::Debit => sqlx::query_as(
            r#"
            UPDATE wallets SET balance = balance - $2, updated_at = $3
            WHERE owner_id = $1 AND balance >= $2
            RETURNING id, balance
            "#,
        )
        .bind(owner_id.as_uuid())
        .bind(amount.minor())
        .bind(now.as_datetime())
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_error("debit wallet"))?,
    };

    let (wallet_id, balance_after) = match updated {
        Some(row) => row,
        None => {
            let available: Option<(i64,)> =
                sqlx::query_as("SELECT balance FROM wallets WHERE owner_id = $1")
                    .bind(owner_id.as_uuid())
                    .fetch_optional(&mut *conn)
                    .await
                    .map_err(db_error("read wallet balance"))?;
            let available = available.map(|(b,)| money(b)).unwrap_or(Money::ZERO);
            return Err(insufficient_funds(available, amount));
        }
    };

    let record = WalletTransaction::record(
        WalletId::from_uuid(wallet_id),
        direction,
        amount,
        money(balance_after),
        entry,
        now,
    );

    sqlx::query(
        r#"
        INSERT INTO wallet_transactions (
            id, wallet_id, direction, amount, balance_after, source,
            description, reference, idempotency_key, created_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(record.id.as_uuid())
    .bind(record.wallet_id.as_uuid())
    .bind(record.direction.as_str())
    .bind(record.amount.minor())
    .bind(record.balance_after.minor())
    .bind(record.source.as_str())
    .bind(&record.description)
    .bind(&record.reference)
    .bind(&record.idempotency_key)
    .bind(record.created_at.as_datetime())
    .execute(&mut *conn)
    .await
    .map_err(|e| {
        if violates(&e, IDEMPOTENCY_KEY) {
            return DomainError::new(ErrorCode::Conflict, "Wallet mutation already recorded")
                .with_detail("idempotency_key", record.idempotency_key.clone().unwrap_or_default());
        }
        db_error("append wallet transaction")(e)
    })?;

    Ok(WalletMutation::Applied(record))
}

/// Escapes LIKE wildcards in user search input.
fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

const FILTER_CLAUSE: &str = r#"
    w.owner_id = $1
    AND ($2::text IS NULL OR t.direction = $2)
    AND ($3::text IS NULL OR t.source = $3)
    AND ($4::text IS NULL OR t.description ILIKE $4)
    AND ($5::timestamptz IS NULL OR t.created_at >= $5)
    AND ($6::timestamptz IS NULL OR t.created_at <= $6)
"#;

#[async_trait]
impl WalletLedger for PostgresWalletLedger {
    async fn find_account(&self, owner_id: &UserId) -> Result<Option<WalletAccount>, DomainError> {
        let row: Option<WalletRow> = sqlx::query_as(
            "SELECT id, owner_id, balance, created_at, updated_at FROM wallets WHERE owner_id = $1",
        )
        .bind(owner_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("fetch wallet"))?;

        Ok(row.map(WalletAccount::from))
    }

    async fn credit(
        &self,
        owner_id: &UserId,
        amount: Money,
        entry: WalletEntry,
    ) -> Result<WalletMutation, DomainError> {
        self.mutate(owner_id, Direction::Credit, amount, entry).await
    }

    async fn debit(
        &self,
        owner_id: &UserId,
        amount: Money,
        entry: WalletEntry,
    ) -> Result<WalletMutation, DomainError> {
        self.mutate(owner_id, Direction::Debit, amount, entry).await
    }

    async fn transactions(
        &self,
        owner_id: &UserId,
        filter: &WalletTransactionFilter,
    ) -> Result<Page<WalletTransaction>, DomainError> {
        let direction = filter.direction.map(|d| d.as_str());
        let source = filter.source.map(|s| s.as_str());
        let search = filter.search.as_deref().map(like_pattern);
        let from = opt_dt(&filter.from);
        let to = opt_dt(&filter.to);

        let (total,): (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM wallet_transactions t \
             JOIN wallets w ON w.id = t.wallet_id WHERE {}",
            FILTER_CLAUSE
        ))
        .bind(owner_id.as_uuid())
        .bind(direction)
        .bind(source)
        .bind(&search)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("count wallet transactions"))?;

        let rows: Vec<WalletTxRow> = sqlx::query_as(&format!(
            "SELECT t.id, t.wallet_id, t.direction, t.amount, t.balance_after, t.source, \
                    t.description, t.reference, t.idempotency_key, t.created_at \
             FROM wallet_transactions t \
             JOIN wallets w ON w.id = t.wallet_id \
             WHERE {} \
             ORDER BY t.created_at DESC, t.id DESC \
             LIMIT $7 OFFSET $8",
            FILTER_CLAUSE
        ))
        .bind(owner_id.as_uuid())
        .bind(direction)
        .bind(source)
        .bind(&search)
        .bind(from)
        .bind(to)
        .bind(i64::from(filter.limit()))
        .bind(filter.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list wallet transactions"))?;

        let items = rows
            .into_iter()
            .map(WalletTransaction::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let total = u64::try_from(total).unwrap_or(0);
        let has_more = ((filter.offset() + items.len()) as u64) < total;

        Ok(Page {
            items,
            total,
            has_more,
        })
    }
}
