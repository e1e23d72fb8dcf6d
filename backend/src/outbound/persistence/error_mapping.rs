//! Shared Diesel error classification for the booking repositories.
//!
//! Each adapter turns a [`DieselFailure`] into its own port error; this
//! module only decides which kind of failure occurred and logs it once.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::models::CorruptRow;
use super::pool::PoolError;

/// PostgreSQL reports SQLSTATE 40P01 with this message; Diesel has no kind
/// for it.
const DEADLOCK_MESSAGE: &str = "deadlock detected";

/// Coarse classification of a Diesel error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DieselFailure {
    /// A unique or primary key constraint rejected the write.
    UniqueViolation { constraint: Option<String> },
    /// A foreign key constraint rejected the write.
    ForeignKeyViolation { constraint: Option<String> },
    /// The transaction lost a serialization race or was picked as a
    /// deadlock victim, and may be retried.
    Serialization,
    /// The connection dropped mid-operation.
    Connection,
    /// Anything else.
    Query(&'static str),
}

impl DieselFailure {
    /// Whether the named constraint caused the violation.
    pub(crate) fn violates(&self, name: &str) -> bool {
        match self {
            Self::UniqueViolation { constraint } | Self::ForeignKeyViolation { constraint } => {
                constraint.as_deref() == Some(name)
            }
            _ => false,
        }
    }
}

/// Classify a Diesel error, logging the driver detail at debug level.
pub(crate) fn classify_diesel_error(error: DieselError, operation: &str) -> DieselFailure {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), %operation, "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            %operation,
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => DieselFailure::Query("record not found"),
        DieselError::QueryBuilderError(_) => DieselFailure::Query("database query error"),
        DieselError::DatabaseError(kind, info) => {
            let constraint = info.constraint_name().map(str::to_owned);
            match kind {
                DatabaseErrorKind::UniqueViolation => DieselFailure::UniqueViolation { constraint },
                DatabaseErrorKind::ForeignKeyViolation => {
                    DieselFailure::ForeignKeyViolation { constraint }
                }
                DatabaseErrorKind::SerializationFailure => DieselFailure::Serialization,
                DatabaseErrorKind::ClosedConnection => DieselFailure::Connection,
                _ if info.message().starts_with(DEADLOCK_MESSAGE) => DieselFailure::Serialization,
                _ => DieselFailure::Query("database error"),
            }
        }
        _ => DieselFailure::Query("database error"),
    }
}

/// Map pool errors into a port-specific connection error constructor.
pub(crate) fn map_pool_error_with<E, C>(error: PoolError, connection: C) -> E
where
    C: FnOnce(String) -> E,
{
    connection(error.into_message())
}

/// Render a corrupt row as a port-specific query error.
pub(crate) fn map_corrupt_row_with<E, Q>(error: CorruptRow, query: Q) -> E
where
    Q: FnOnce(String) -> E,
{
    query(error.to_string())
}

#[cfg(test)]
mod tests {
    //! Regression coverage for Diesel error classification.

    use rstest::rstest;

    use super::*;

    fn database_error(kind: DatabaseErrorKind) -> DieselError {
        DieselError::DatabaseError(kind, Box::new("driver message".to_owned()))
    }

    #[rstest]
    #[case(DatabaseErrorKind::SerializationFailure, DieselFailure::Serialization)]
    #[case(DatabaseErrorKind::ClosedConnection, DieselFailure::Connection)]
    #[case(
        DatabaseErrorKind::UniqueViolation,
        DieselFailure::UniqueViolation { constraint: None }
    )]
    #[case(
        DatabaseErrorKind::ForeignKeyViolation,
        DieselFailure::ForeignKeyViolation { constraint: None }
    )]
    #[case(DatabaseErrorKind::CheckViolation, DieselFailure::Query("database error"))]
    fn database_kinds_are_classified(
        #[case] kind: DatabaseErrorKind,
        #[case] expected: DieselFailure,
    ) {
        assert_eq!(classify_diesel_error(database_error(kind), "test"), expected);
    }

    #[rstest]
    fn deadlock_victim_is_retryable() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::Unknown,
            Box::new("deadlock detected".to_owned()),
        );
        assert_eq!(
            classify_diesel_error(error, "test"),
            DieselFailure::Serialization
        );
    }

    #[rstest]
    fn not_found_is_a_query_failure() {
        assert_eq!(
            classify_diesel_error(DieselError::NotFound, "test"),
            DieselFailure::Query("record not found")
        );
    }

    #[rstest]
    fn violation_without_constraint_name_matches_nothing() {
        let failure = DieselFailure::UniqueViolation { constraint: None };
        assert!(!failure.violates("ticket_pkey"));
    }

    #[rstest]
    fn named_violation_matches_its_constraint() {
        let failure = DieselFailure::ForeignKeyViolation {
            constraint: Some("purchases_customer_fkey".to_owned()),
        };
        assert!(failure.violates("purchases_customer_fkey"));
        assert!(!failure.violates("ticket_flight_fkey"));
    }

    #[rstest]
    fn pool_message_is_forwarded() {
        let message: String = map_pool_error_with(PoolError::checkout("timed out"), |m| m);
        assert_eq!(message, "timed out");
    }
}
