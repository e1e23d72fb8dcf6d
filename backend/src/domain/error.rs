//! Domain-level error types.
//!
//! These errors are transport agnostic. Callers of the booking engine map
//! them onto whatever envelope their surface uses; the [`ErrorCode`] is the
//! stable part of the contract and every failure kind gets its own code.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stable machine-readable error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The request is malformed or fails validation.
    InvalidRequest,
    /// A flight's departure is not strictly before its arrival.
    InvalidTimeRange,
    /// A referenced airline, airplane, or airport does not exist.
    InvalidReference,
    /// The actor lacks the approval or permission required.
    PermissionDenied,
    /// The actor is not an approved Admin of the relevant airline.
    NotAdmin,
    /// The booking agent has no work-for relation with the flight's airline.
    AgentNotAuthorizedForAirline,
    /// The flight does not exist.
    FlightNotFound,
    /// The customer does not exist.
    CustomerNotFound,
    /// The booking agent does not exist.
    AgentNotFound,
    /// The airline staff member does not exist.
    StaffNotFound,
    /// The flight is cancelled and cannot be sold.
    FlightCancelled,
    /// Every seat on the flight has been issued.
    SoldOut,
    /// Ticket allocation collided with a concurrent allocation.
    AllocationConflict,
    /// An account with the same identity already exists.
    DuplicateRegistration,
    /// The resource already exists or the relation is already present.
    Conflict,
    /// An idempotency key was reused with a different request.
    IdempotencyConflict,
    /// The backing store is temporarily unavailable.
    ServiceUnavailable,
    /// An unexpected error occurred inside the domain.
    InternalError,
}

/// Coarse failure class used to pick retry and messaging policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// A referenced entity is absent.
    NotFound,
    /// The request collides with existing state.
    Conflict,
    /// The actor may not perform the operation.
    PermissionDenied,
    /// The input is malformed.
    Validation,
    /// The store failed; the only class callers may retry.
    TransientStore,
    /// Unexpected failure.
    Internal,
}

impl ErrorCode {
    /// Failure class this code belongs to.
    ///
    /// # Examples
    /// ```
    /// use airline_backend::domain::{ErrorCategory, ErrorCode};
    ///
    /// assert_eq!(ErrorCode::SoldOut.category(), ErrorCategory::Conflict);
    /// assert_eq!(ErrorCode::NotAdmin.category(), ErrorCategory::PermissionDenied);
    /// ```
    pub const fn category(self) -> ErrorCategory {
        match self {
            Self::InvalidRequest | Self::InvalidTimeRange | Self::InvalidReference => {
                ErrorCategory::Validation
            }
            Self::PermissionDenied | Self::NotAdmin | Self::AgentNotAuthorizedForAirline => {
                ErrorCategory::PermissionDenied
            }
            Self::FlightNotFound
            | Self::CustomerNotFound
            | Self::AgentNotFound
            | Self::StaffNotFound => ErrorCategory::NotFound,
            Self::FlightCancelled
            | Self::SoldOut
            | Self::AllocationConflict
            | Self::DuplicateRegistration
            | Self::Conflict
            | Self::IdempotencyConflict => ErrorCategory::Conflict,
            Self::ServiceUnavailable => ErrorCategory::TransientStore,
            Self::InternalError => ErrorCategory::Internal,
        }
    }

    /// Whether a caller may safely re-invoke the failed operation.
    pub const fn is_retryable(self) -> bool {
        matches!(self.category(), ErrorCategory::TransientStore)
    }

    const fn fallback_message(self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid request",
            Self::InvalidTimeRange => "departure must precede arrival",
            Self::InvalidReference => "unknown reference",
            Self::PermissionDenied => "permission denied",
            Self::NotAdmin => "admin permission required",
            Self::AgentNotAuthorizedForAirline => "agent does not work for this airline",
            Self::FlightNotFound => "flight not found",
            Self::CustomerNotFound => "customer not found",
            Self::AgentNotFound => "booking agent not found",
            Self::StaffNotFound => "airline staff not found",
            Self::FlightCancelled => "flight is cancelled",
            Self::SoldOut => "flight is sold out",
            Self::AllocationConflict => "ticket allocation conflict",
            Self::DuplicateRegistration => "account already registered",
            Self::Conflict => "conflict",
            Self::IdempotencyConflict => "idempotency key reused with a different request",
            Self::ServiceUnavailable => "service unavailable",
            Self::InternalError => "internal error",
        }
    }
}

/// Domain error payload.
///
/// ## Invariants
/// - `message` is non-empty once trimmed of whitespace.
///
/// # Examples
/// ```
/// use airline_backend::domain::{Error, ErrorCode};
///
/// let err = Error::new(ErrorCode::FlightNotFound, "missing");
/// assert_eq!(err.code(), ErrorCode::FlightNotFound);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(deny_unknown_fields)]
#[serde(try_from = "ErrorDto", into = "ErrorDto")]
pub struct Error {
    code: ErrorCode,
    message: String,
    details: Option<Value>,
}

/// Validation errors emitted by the fallible constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorValidationError {
    EmptyMessage,
}

impl fmt::Display for ErrorValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyMessage => write!(f, "error message must not be empty"),
        }
    }
}

impl std::error::Error for ErrorValidationError {}

impl Error {
    /// Create a new error. A blank message is replaced with the code's
    /// default description.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        match Self::try_new(code, message) {
            Ok(value) => value,
            Err(ErrorValidationError::EmptyMessage) => Self {
                code,
                message: code.fallback_message().to_owned(),
                details: None,
            },
        }
    }

    /// Fallible constructor that validates the message content.
    pub fn try_new(code: ErrorCode, message: impl Into<String>) -> Result<Self, ErrorValidationError> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(ErrorValidationError::EmptyMessage);
        }
        Ok(Self {
            code,
            message,
            details: None,
        })
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Failure class of the error code.
    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    /// Whether the failed call may be retried.
    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Supplementary error details.
    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Attach structured details to the error.
    ///
    /// # Examples
    /// ```
    /// use airline_backend::domain::{Error, ErrorCode};
    /// use serde_json::json;
    ///
    /// let err = Error::new(ErrorCode::SoldOut, "no seats left")
    ///     .with_details(json!({ "flightNum": "101" }));
    /// assert!(err.details().is_some());
    /// ```
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Convenience constructor for [`ErrorCode::InvalidRequest`].
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// Convenience constructor for [`ErrorCode::InvalidReference`].
    pub fn invalid_reference(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidReference, message)
    }

    /// Convenience constructor for [`ErrorCode::PermissionDenied`].
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PermissionDenied, message)
    }

    /// Convenience constructor for [`ErrorCode::NotAdmin`].
    pub fn not_admin(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotAdmin, message)
    }

    /// Convenience constructor for [`ErrorCode::Conflict`].
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    /// Convenience constructor for [`ErrorCode::DuplicateRegistration`].
    pub fn duplicate_registration(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DuplicateRegistration, message)
    }

    /// Convenience constructor for [`ErrorCode::ServiceUnavailable`].
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    /// Convenience constructor for [`ErrorCode::InternalError`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDto {
    code: ErrorCode,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl From<Error> for ErrorDto {
    fn from(value: Error) -> Self {
        Self {
            code: value.code,
            message: value.message,
            details: value.details,
        }
    }
}

impl TryFrom<ErrorDto> for Error {
    type Error = ErrorValidationError;

    fn try_from(value: ErrorDto) -> Result<Self, Self::Error> {
        let ErrorDto {
            code,
            message,
            details,
        } = value;

        let mut error = Error::try_new(code, message)?;
        error.details = details;
        Ok(error)
    }
}

#[cfg(test)]
mod tests;
