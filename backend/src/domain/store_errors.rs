//! Mapping from driven-port errors to domain errors.
//!
//! Connection failures become `ServiceUnavailable`, the only retryable code.
//! Query failures are unexpected and become `InternalError`.

use super::error::{Error, ErrorCode};
use super::ports::{CatalogRepositoryError, IdentityRepositoryError, TicketLedgerError};

pub(crate) fn map_ledger_error(error: TicketLedgerError) -> Error {
    let message = error.to_string();
    match error {
        TicketLedgerError::FlightNotFound { .. } => Error::new(ErrorCode::FlightNotFound, message),
        TicketLedgerError::FlightCancelled { .. } => {
            Error::new(ErrorCode::FlightCancelled, message)
        }
        TicketLedgerError::SoldOut { .. } => Error::new(ErrorCode::SoldOut, message),
        TicketLedgerError::CustomerNotFound { .. } => {
            Error::new(ErrorCode::CustomerNotFound, message)
        }
        TicketLedgerError::IdempotencyConflict { .. } => {
            Error::new(ErrorCode::IdempotencyConflict, message)
        }
        TicketLedgerError::AllocationConflict { .. } => {
            Error::new(ErrorCode::AllocationConflict, message)
        }
        TicketLedgerError::Connection { message } => {
            Error::service_unavailable(format!("ticket ledger unavailable: {message}"))
        }
        TicketLedgerError::Query { message } => {
            Error::internal(format!("ticket ledger error: {message}"))
        }
    }
}

pub(crate) fn map_catalog_error(error: CatalogRepositoryError) -> Error {
    match error {
        CatalogRepositoryError::Duplicate { message } => Error::conflict(message),
        CatalogRepositoryError::UnknownReference { message } => Error::invalid_reference(message),
        CatalogRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("catalog repository unavailable: {message}"))
        }
        CatalogRepositoryError::Query { message } => {
            Error::internal(format!("catalog repository error: {message}"))
        }
    }
}

pub(crate) fn map_identity_error(error: IdentityRepositoryError) -> Error {
    let message = error.to_string();
    match error {
        IdentityRepositoryError::Duplicate { .. } => Error::duplicate_registration(message),
        IdentityRepositoryError::UnknownAirline { .. } => Error::invalid_reference(message),
        IdentityRepositoryError::AgentNotFound { .. } => {
            Error::new(ErrorCode::AgentNotFound, message)
        }
        IdentityRepositoryError::AlreadyAffiliated { .. } => Error::conflict(message),
        IdentityRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("identity repository unavailable: {message}"))
        }
        IdentityRepositoryError::Query { message } => {
            Error::internal(format!("identity repository error: {message}"))
        }
    }
}
