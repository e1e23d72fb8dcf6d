//! SHA-256 fingerprints of logical purchase requests.

use std::fmt;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::domain::identity::{BookingAgentId, CustomerEmail};
use crate::domain::inventory::FlightKey;

/// Errors raised while computing or decoding a fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FingerprintError {
    InvalidHex { message: String },
    InvalidLength { expected: usize, actual: usize },
    Serialization { message: String },
}

impl fmt::Display for FingerprintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidHex { message } => write!(f, "fingerprint is not hex: {message}"),
            Self::InvalidLength { expected, actual } => {
                write!(f, "fingerprint must be {expected} bytes, got {actual}")
            }
            Self::Serialization { message } => {
                write!(f, "failed to serialise purchase request: {message}")
            }
        }
    }
}

impl std::error::Error for FingerprintError {}

/// The fields that make two purchase requests "the same request".
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseSubject<'a> {
    pub flight: &'a FlightKey,
    pub customer: &'a CustomerEmail,
    pub booking_agent: Option<BookingAgentId>,
}

/// SHA-256 digest of a [`PurchaseSubject`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PurchaseFingerprint([u8; 32]);

impl PurchaseFingerprint {
    /// Fingerprint a purchase request.
    ///
    /// Struct fields serialise in declaration order, so the JSON encoding is
    /// already canonical.
    pub fn of(subject: &PurchaseSubject<'_>) -> Result<Self, FingerprintError> {
        let bytes = serde_json::to_vec(subject).map_err(|err| FingerprintError::Serialization {
            message: err.to_string(),
        })?;
        Ok(Self(Sha256::digest(&bytes).into()))
    }

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Decode the stored lowercase hex form.
    pub fn from_hex(raw: &str) -> Result<Self, FingerprintError> {
        let bytes = hex::decode(raw).map_err(|err| FingerprintError::InvalidHex {
            message: err.to_string(),
        })?;
        let actual = bytes.len();
        let array: [u8; 32] = bytes
            .try_into()
            .map_err(|_| FingerprintError::InvalidLength {
                expected: 32,
                actual,
            })?;
        Ok(Self(array))
    }

    /// Lowercase hex form used for storage.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for PurchaseFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for purchase fingerprints.

    use rstest::{fixture, rstest};

    use super::*;
    use crate::domain::identity::AirlineName;
    use crate::domain::inventory::FlightNumber;

    #[fixture]
    fn flight() -> FlightKey {
        FlightKey::new(
            AirlineName::new("AA").expect("airline"),
            FlightNumber::new("101").expect("flight number"),
        )
    }

    #[fixture]
    fn customer() -> CustomerEmail {
        CustomerEmail::new("ada@example.com").expect("email")
    }

    #[rstest]
    fn identical_requests_share_a_fingerprint(flight: FlightKey, customer: CustomerEmail) {
        let subject = PurchaseSubject {
            flight: &flight,
            customer: &customer,
            booking_agent: None,
        };
        let a = PurchaseFingerprint::of(&subject).expect("fingerprint");
        let b = PurchaseFingerprint::of(&subject).expect("fingerprint");
        assert_eq!(a, b);
    }

    #[rstest]
    fn agent_changes_the_fingerprint(flight: FlightKey, customer: CustomerEmail) {
        let direct = PurchaseFingerprint::of(&PurchaseSubject {
            flight: &flight,
            customer: &customer,
            booking_agent: None,
        })
        .expect("fingerprint");
        let assisted = PurchaseFingerprint::of(&PurchaseSubject {
            flight: &flight,
            customer: &customer,
            booking_agent: Some(BookingAgentId::new(3).expect("agent id")),
        })
        .expect("fingerprint");
        assert_ne!(direct, assisted);
    }

    #[rstest]
    fn hex_form_is_reversible() {
        let fingerprint = PurchaseFingerprint::from_bytes([0xab; 32]);
        let hex = fingerprint.to_hex();
        assert_eq!(hex.len(), 64);
        assert_eq!(PurchaseFingerprint::from_hex(&hex), Ok(fingerprint));
    }

    #[rstest]
    fn short_hex_is_rejected() {
        assert_eq!(
            PurchaseFingerprint::from_hex("abcd"),
            Err(FingerprintError::InvalidLength {
                expected: 32,
                actual: 2
            })
        );
    }
}
