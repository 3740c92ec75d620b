//! Conversions shared by the Postgres adapters.

use chrono::{DateTime, Utc};

use crate::domain::foundation::{DomainError, ErrorCode, Money, Timestamp};

/// Wraps a sqlx failure with what was being attempted.
pub(super) fn db_error(action: &'static str) -> impl Fn(sqlx::Error) -> DomainError {
    move |e| DomainError::database(format!("Failed to {}: {}", action, e))
}

/// True when `err` is a unique violation on the named constraint or index.
pub(super) fn violates(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.constraint() == Some(constraint),
        _ => false,
    }
}

/// Error for a stored value the domain does not recognise.
pub(super) fn invalid_column(column: &str, value: &str) -> DomainError {
    DomainError::new(
        ErrorCode::DatabaseError,
        format!("Invalid {} value: {}", column, value),
    )
}

/// Parses a text enum column with the type's own `parse`.
pub(super) fn parse_enum<T>(
    column: &str,
    value: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T, DomainError> {
    parse(value).ok_or_else(|| invalid_column(column, value))
}

/// Reads a non-negative INTEGER column.
pub(super) fn to_u32(column: &str, value: i32) -> Result<u32, DomainError> {
    u32::try_from(value).map_err(|_| invalid_column(column, &value.to_string()))
}

/// Writes a u32 into an INTEGER column.
pub(super) fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

pub(super) fn money(minor: i64) -> Money {
    Money::from_minor(minor)
}

pub(super) fn ts(dt: DateTime<Utc>) -> Timestamp {
    Timestamp::from_datetime(dt)
}

pub(super) fn opt_ts(dt: Option<DateTime<Utc>>) -> Option<Timestamp> {
    dt.map(Timestamp::from_datetime)
}

pub(super) fn opt_dt(ts: &Option<Timestamp>) -> Option<DateTime<Utc>> {
    ts.map(|t| *t.as_datetime())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::join::JoinIntentStatus;

    #[test]
    fn parse_enum_rejects_unknown_values() {
        let err = parse_enum("status", "pending_review", JoinIntentStatus::parse).unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(err.message.contains("pending_review"));
    }

    #[test]
    fn parse_enum_accepts_known_values() {
        let status = parse_enum("status", "paid", JoinIntentStatus::parse).unwrap();
        assert_eq!(status, JoinIntentStatus::Paid);
    }

    #[test]
    fn negative_counts_are_rejected() {
        assert!(to_u32("member_count", -1).is_err());
        assert_eq!(to_u32("member_count", 4).unwrap(), 4);
    }

    #[test]
    fn oversized_counts_saturate() {
        assert_eq!(to_i32(u32::MAX), i32::MAX);
        assert_eq!(to_i32(7), 7);
    }
}
