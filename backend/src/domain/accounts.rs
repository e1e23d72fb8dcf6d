//! Registered accounts for the three actor kinds.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::identity::{
    ActorContext, AgentEmail, AirlineName, ApprovalState, BookingAgentId, CustomerEmail,
    Permission, StaffUsername,
};

/// Postal address captured at customer registration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostalAddress {
    pub building_number: String,
    pub street: String,
    pub city: String,
    pub state: String,
}

/// Travel document details of a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelDocument {
    pub passport_number: String,
    pub passport_expiration: NaiveDate,
    pub passport_country: String,
}

/// A customer account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub email: CustomerEmail,
    pub name: String,
    pub phone_number: Option<String>,
    pub address: Option<PostalAddress>,
    pub passport: Option<TravelDocument>,
    pub date_of_birth: Option<NaiveDate>,
}

impl Customer {
    /// Minimal customer with only the required fields.
    pub fn new(email: CustomerEmail, name: impl Into<String>) -> Self {
        Self {
            email,
            name: name.into(),
            phone_number: None,
            address: None,
            passport: None,
            date_of_birth: None,
        }
    }
}

/// A booking agent account together with its airline affiliations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingAgent {
    pub email: AgentEmail,
    pub agent_id: BookingAgentId,
    pub approval: ApprovalState,
    pub airlines: BTreeSet<AirlineName>,
}

impl BookingAgent {
    /// A freshly registered, unaffiliated agent.
    pub fn pending(email: AgentEmail, agent_id: BookingAgentId) -> Self {
        Self {
            email,
            agent_id,
            approval: ApprovalState::Pending,
            airlines: BTreeSet::new(),
        }
    }

    /// Whether the agent has a work-for relation with `airline`.
    pub fn works_for(&self, airline: &AirlineName) -> bool {
        self.airlines.contains(airline)
    }

    /// Actor context for this agent.
    pub fn actor_context(&self) -> ActorContext {
        ActorContext::booking_agent(self.email.clone(), self.agent_id, self.approval)
    }
}

/// Personal details supplied when registering a staff member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffRegistration {
    pub username: StaffUsername,
    pub airline: AirlineName,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
}

/// A staff member of exactly one airline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffMember {
    pub username: StaffUsername,
    pub airline: AirlineName,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub approval: ApprovalState,
    pub permissions: BTreeSet<Permission>,
}

impl StaffMember {
    /// Actor context for this staff member.
    pub fn actor_context(&self) -> ActorContext {
        ActorContext::airline_staff(
            self.username.clone(),
            self.airline.clone(),
            self.approval,
            self.permissions.iter().copied(),
        )
    }
}

/// Initial standing of a newly registered staff member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffBootstrap {
    pub approval: ApprovalState,
    pub permissions: BTreeSet<Permission>,
}

impl StaffBootstrap {
    /// Decide the initial standing given whether the airline already has an
    /// Admin. The first staff member of an airline without one becomes its
    /// approved Admin; everyone else starts pending with no permissions.
    ///
    /// # Examples
    /// ```
    /// use airline_backend::domain::{ApprovalState, Permission, StaffBootstrap};
    ///
    /// let first = StaffBootstrap::for_airline(false);
    /// assert!(first.permissions.contains(&Permission::Admin));
    /// assert_eq!(StaffBootstrap::for_airline(true).approval, ApprovalState::Pending);
    /// ```
    pub fn for_airline(admin_exists: bool) -> Self {
        if admin_exists {
            Self {
                approval: ApprovalState::Pending,
                permissions: BTreeSet::new(),
            }
        } else {
            Self {
                approval: ApprovalState::Approved,
                permissions: BTreeSet::from([Permission::Admin]),
            }
        }
    }

    /// Build the stored staff member from the registration.
    pub fn apply(self, registration: StaffRegistration) -> StaffMember {
        StaffMember {
            username: registration.username,
            airline: registration.airline,
            first_name: registration.first_name,
            last_name: registration.last_name,
            date_of_birth: registration.date_of_birth,
            approval: self.approval,
            permissions: self.permissions,
        }
    }
}

/// Result of approving an agent for an airline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentApproval {
    /// The agent's global flag flipped during this call.
    pub newly_approved: bool,
    /// A work-for row was created during this call.
    pub affiliation_added: bool,
}
