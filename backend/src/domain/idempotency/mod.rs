//! Idempotency primitives for safe purchase retries.
//!
//! - [`IdempotencyKey`]: validated UUID chosen by the client for one logical
//!   purchase.
//! - [`PurchaseFingerprint`]: SHA-256 of the logical purchase request, used
//!   to tell a genuine retry from a reused key.
//!
//! The key and fingerprint are written on the purchase row inside the same
//! transaction as the ticket, so a retry after a transient failure either
//! finds the committed purchase or finds nothing at all.

mod fingerprint;
mod key;

pub use fingerprint::{FingerprintError, PurchaseFingerprint, PurchaseSubject};
pub use key::{IdempotencyKey, IdempotencyKeyValidationError};

/// How a stored stamp relates to an incoming one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StampComparison {
    /// Same key, same request: replay the stored ticket.
    Replay,
    /// Same key, different request.
    Conflict,
}

/// Compare the fingerprint stored under a key with the incoming one.
///
/// # Examples
/// ```
/// use airline_backend::domain::idempotency::{
///     PurchaseFingerprint, StampComparison, compare_fingerprints,
/// };
///
/// let a = PurchaseFingerprint::from_bytes([1; 32]);
/// let b = PurchaseFingerprint::from_bytes([2; 32]);
/// assert_eq!(compare_fingerprints(&a, &a), StampComparison::Replay);
/// assert_eq!(compare_fingerprints(&a, &b), StampComparison::Conflict);
/// ```
pub fn compare_fingerprints(
    stored: &PurchaseFingerprint,
    incoming: &PurchaseFingerprint,
) -> StampComparison {
    if stored == incoming {
        StampComparison::Replay
    } else {
        StampComparison::Conflict
    }
}
