//! Driving ports for account registration and actor resolution.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{
    ActorContext, AgentEmail, BookingAgent, BookingAgentId, Customer, CustomerEmail, Error,
    StaffMember, StaffRegistration, StaffUsername,
};

/// Fields of a new booking agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterAgentRequest {
    pub email: AgentEmail,
    pub agent_id: BookingAgentId,
}

/// Driving port for self-service registration.
#[async_trait]
pub trait RegistrationCommand: Send + Sync {
    /// Register a customer; the email must be unused.
    async fn register_customer(&self, customer: Customer) -> Result<Customer, Error>;

    /// Register a pending booking agent; email and id must be unused.
    async fn register_agent(&self, request: RegisterAgentRequest) -> Result<BookingAgent, Error>;

    /// Register a staff member of an existing airline. The first staff member
    /// of an airline with no Admin becomes its approved Admin.
    async fn register_staff(&self, registration: StaffRegistration) -> Result<StaffMember, Error>;
}

/// An identity already proven by the authentication layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum AuthenticatedIdentity {
    Customer(CustomerEmail),
    BookingAgent(AgentEmail),
    AirlineStaff(StaffUsername),
}

/// Driving port that turns an authenticated identity into an [`ActorContext`].
#[async_trait]
pub trait ActorDirectory: Send + Sync {
    /// Load the actor's current approval state and permissions.
    async fn resolve_actor(&self, identity: &AuthenticatedIdentity) -> Result<ActorContext, Error>;
}
