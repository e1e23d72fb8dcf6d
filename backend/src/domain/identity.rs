//! Actor identities, staff permissions, and the explicit actor context.
//!
//! Every booking-engine call receives an [`ActorContext`] describing who is
//! acting. The context is resolved once at the authentication boundary and
//! passed by value; nothing in the domain reads ambient session state.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Maximum length of names, usernames, and emails as stored.
pub const IDENTIFIER_MAX: usize = 50;

/// Validation errors for identity value objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityValidationError {
    Empty { field: &'static str },
    SurroundingWhitespace { field: &'static str },
    TooLong { field: &'static str, max: usize },
    InvalidEmail { field: &'static str },
    InvalidAgentId,
    UnknownPermission { value: String },
}

impl fmt::Display for IdentityValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{field} must not be empty"),
            Self::SurroundingWhitespace { field } => {
                write!(f, "{field} must not start or end with whitespace")
            }
            Self::TooLong { field, max } => write!(f, "{field} must be at most {max} characters"),
            Self::InvalidEmail { field } => write!(f, "{field} must be an email address"),
            Self::InvalidAgentId => write!(f, "booking agent id must be a positive integer"),
            Self::UnknownPermission { value } => write!(f, "unknown permission type: {value}"),
        }
    }
}

impl std::error::Error for IdentityValidationError {}

fn validate_text(value: &str, field: &'static str) -> Result<(), IdentityValidationError> {
    if value.is_empty() {
        return Err(IdentityValidationError::Empty { field });
    }
    if value.trim() != value {
        return Err(IdentityValidationError::SurroundingWhitespace { field });
    }
    if value.chars().count() > IDENTIFIER_MAX {
        return Err(IdentityValidationError::TooLong {
            field,
            max: IDENTIFIER_MAX,
        });
    }
    Ok(())
}

fn validate_email(value: &str, field: &'static str) -> Result<(), IdentityValidationError> {
    validate_text(value, field)?;
    match value.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(IdentityValidationError::InvalidEmail { field }),
    }
}

macro_rules! text_identifier {
    ($(#[$meta:meta])* $name:ident, $field:literal, $validate:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Validate and construct the identifier.
            pub fn new(value: impl Into<String>) -> Result<Self, IdentityValidationError> {
                let value = value.into();
                $validate(&value, $field)?;
                Ok(Self(value))
            }

            /// Borrow the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.0.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdentityValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }
    };
}

text_identifier!(
    /// Airline name; the human-assigned unique key of an airline.
    AirlineName,
    "airline name",
    validate_text
);
text_identifier!(
    /// Unique login name of an airline staff member.
    StaffUsername,
    "staff username",
    validate_text
);
text_identifier!(
    /// Email identifying a customer.
    CustomerEmail,
    "customer email",
    validate_email
);
text_identifier!(
    /// Email identifying a booking agent.
    AgentEmail,
    "agent email",
    validate_email
);

/// Numeric booking agent id used for commission attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct BookingAgentId(i32);

impl BookingAgentId {
    /// Validate and construct an agent id.
    ///
    /// # Examples
    /// ```
    /// use airline_backend::domain::BookingAgentId;
    ///
    /// assert!(BookingAgentId::new(7).is_ok());
    /// assert!(BookingAgentId::new(0).is_err());
    /// ```
    pub fn new(value: i32) -> Result<Self, IdentityValidationError> {
        if value <= 0 {
            return Err(IdentityValidationError::InvalidAgentId);
        }
        Ok(Self(value))
    }

    /// Raw integer value.
    pub fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for BookingAgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<BookingAgentId> for i32 {
    fn from(value: BookingAgentId) -> Self {
        value.0
    }
}

impl TryFrom<i32> for BookingAgentId {
    type Error = IdentityValidationError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Staff permission kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Permission {
    Admin,
    Operator,
}

impl Permission {
    /// Stored representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Operator => "Operator",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = IdentityValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Admin" => Ok(Self::Admin),
            "Operator" => Ok(Self::Operator),
            other => Err(IdentityValidationError::UnknownPermission {
                value: other.to_owned(),
            }),
        }
    }
}

/// Approval state of a booking agent or staff account. Moves one way only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalState {
    Pending,
    Approved,
}

impl ApprovalState {
    /// Map the stored `approved` flag.
    pub const fn from_flag(approved: bool) -> Self {
        if approved {
            Self::Approved
        } else {
            Self::Pending
        }
    }

    /// Whether the account may exercise write privileges.
    pub const fn is_approved(self) -> bool {
        matches!(self, Self::Approved)
    }
}

/// Coarse actor role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Customer,
    BookingAgent,
    AirlineStaff,
}

/// The three actor kinds, each carrying its own identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Actor {
    Customer {
        email: CustomerEmail,
    },
    BookingAgent {
        email: AgentEmail,
        agent_id: BookingAgentId,
    },
    AirlineStaff {
        username: StaffUsername,
        airline: AirlineName,
    },
}

impl Actor {
    /// Role of this actor.
    pub const fn role(&self) -> ActorRole {
        match self {
            Self::Customer { .. } => ActorRole::Customer,
            Self::BookingAgent { .. } => ActorRole::BookingAgent,
            Self::AirlineStaff { .. } => ActorRole::AirlineStaff,
        }
    }

    /// Uniform identity key, unique across actor kinds.
    ///
    /// # Examples
    /// ```
    /// use airline_backend::domain::{Actor, CustomerEmail};
    ///
    /// let actor = Actor::Customer {
    ///     email: CustomerEmail::new("ada@example.com").expect("valid email"),
    /// };
    /// assert_eq!(actor.identity_key(), "customer:ada@example.com");
    /// ```
    pub fn identity_key(&self) -> String {
        match self {
            Self::Customer { email } => format!("customer:{email}"),
            Self::BookingAgent { email, .. } => format!("booking_agent:{email}"),
            Self::AirlineStaff { username, .. } => format!("airline_staff:{username}"),
        }
    }
}

/// Who is acting, with the approval and permission facts needed to
/// authorise the call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorContext {
    actor: Actor,
    approval: ApprovalState,
    permissions: BTreeSet<Permission>,
}

impl ActorContext {
    /// Context for a customer. Customers need no approval.
    pub fn customer(email: CustomerEmail) -> Self {
        Self {
            actor: Actor::Customer { email },
            approval: ApprovalState::Approved,
            permissions: BTreeSet::new(),
        }
    }

    /// Context for a booking agent.
    pub fn booking_agent(email: AgentEmail, agent_id: BookingAgentId, approval: ApprovalState) -> Self {
        Self {
            actor: Actor::BookingAgent { email, agent_id },
            approval,
            permissions: BTreeSet::new(),
        }
    }

    /// Context for an airline staff member.
    pub fn airline_staff(
        username: StaffUsername,
        airline: AirlineName,
        approval: ApprovalState,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> Self {
        Self {
            actor: Actor::AirlineStaff { username, airline },
            approval,
            permissions: permissions.into_iter().collect(),
        }
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn role(&self) -> ActorRole {
        self.actor.role()
    }

    pub fn approval(&self) -> ApprovalState {
        self.approval
    }

    pub fn permissions(&self) -> &BTreeSet<Permission> {
        &self.permissions
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    pub fn identity_key(&self) -> String {
        self.actor.identity_key()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for identity value objects.

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("")]
    #[case(" padded")]
    #[case("no-at-sign")]
    #[case("@example.com")]
    #[case("ada@")]
    fn customer_email_rejects_malformed_input(#[case] raw: &str) {
        assert!(CustomerEmail::new(raw).is_err());
    }

    #[rstest]
    fn airline_name_rejects_overlong_values() {
        let raw = "x".repeat(IDENTIFIER_MAX + 1);
        let err = AirlineName::new(raw).expect_err("too long");
        assert_eq!(
            err,
            IdentityValidationError::TooLong {
                field: "airline name",
                max: IDENTIFIER_MAX
            }
        );
    }

    #[rstest]
    #[case(Permission::Admin, "Admin")]
    #[case(Permission::Operator, "Operator")]
    fn permission_parses_stored_form(#[case] permission: Permission, #[case] raw: &str) {
        assert_eq!(raw.parse::<Permission>().expect("known permission"), permission);
        assert_eq!(permission.as_str(), raw);
    }

    #[rstest]
    fn permission_rejects_unknown_kinds() {
        assert!("Janitor".parse::<Permission>().is_err());
    }

    #[rstest]
    fn identity_keys_are_distinct_across_kinds() {
        let customer = ActorContext::customer(CustomerEmail::new("a@b.c").expect("email"));
        let agent = ActorContext::booking_agent(
            AgentEmail::new("a@b.c").expect("email"),
            BookingAgentId::new(1).expect("id"),
            ApprovalState::Approved,
        );
        assert_ne!(customer.identity_key(), agent.identity_key());
        assert_eq!(agent.role(), ActorRole::BookingAgent);
    }

    #[rstest]
    fn staff_context_collects_permissions() {
        let ctx = ActorContext::airline_staff(
            StaffUsername::new("alice").expect("username"),
            AirlineName::new("Delta").expect("airline"),
            ApprovalState::Approved,
            [Permission::Operator, Permission::Operator],
        );
        assert!(ctx.has_permission(Permission::Operator));
        assert!(!ctx.has_permission(Permission::Admin));
        assert_eq!(ctx.permissions().len(), 1);
    }

    #[rstest]
    fn actor_serialises_as_tagged_union() {
        let actor = Actor::AirlineStaff {
            username: StaffUsername::new("alice").expect("username"),
            airline: AirlineName::new("Delta").expect("airline"),
        };
        let value = serde_json::to_value(&actor).expect("serialise actor");
        assert_eq!(value["kind"], "airline_staff");
        assert_eq!(value["airline"], "Delta");
    }
}
