//! Port for accounts, approvals, permissions, and agent affiliations.
//!
//! `register_staff` and `approve_agent_for_airline` are compound writes and
//! must be atomic in every adapter.

use async_trait::async_trait;

use crate::domain::{
    AgentApproval, AgentEmail, AirlineName, BookingAgent, BookingAgentId, Customer,
    CustomerEmail, Permission, StaffMember, StaffRegistration, StaffUsername,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by identity repository adapters.
    pub enum IdentityRepositoryError {
        /// An account with the same identity already exists.
        Duplicate { message: String } => "account already exists: {message}",
        /// The staff member's airline does not exist.
        UnknownAirline { airline: String } => "airline {airline} does not exist",
        /// The booking agent does not exist.
        AgentNotFound { agent: String } => "booking agent {agent} not found",
        /// The agent already works for the airline.
        AlreadyAffiliated { agent: String, airline: String } =>
            "booking agent {agent} already works for {airline}",
        /// Repository connection could not be established.
        Connection { message: String } => "identity repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "identity repository query failed: {message}",
    }
}

/// Port for actor accounts and the approval workflow's state.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityRepository: Send + Sync {
    /// Insert a customer; the email must be unused.
    async fn insert_customer(&self, customer: &Customer) -> Result<(), IdentityRepositoryError>;

    /// Find a customer by email.
    async fn find_customer(
        &self,
        email: &CustomerEmail,
    ) -> Result<Option<Customer>, IdentityRepositoryError>;

    /// Insert a pending agent; email and agent id must both be unused.
    async fn insert_agent(&self, agent: &BookingAgent) -> Result<(), IdentityRepositoryError>;

    /// Find an agent, with affiliations, by email.
    async fn find_agent(
        &self,
        email: &AgentEmail,
    ) -> Result<Option<BookingAgent>, IdentityRepositoryError>;

    /// Find an agent, with affiliations, by numeric id.
    async fn find_agent_by_id(
        &self,
        agent_id: BookingAgentId,
    ) -> Result<Option<BookingAgent>, IdentityRepositoryError>;

    /// Register a staff member, applying the first-Admin rule under a per-
    /// airline lock so two first registrations cannot both become Admin.
    async fn register_staff(
        &self,
        registration: &StaffRegistration,
    ) -> Result<StaffMember, IdentityRepositoryError>;

    /// Find a staff member, with permissions, by username.
    async fn find_staff(
        &self,
        username: &StaffUsername,
    ) -> Result<Option<StaffMember>, IdentityRepositoryError>;

    /// Flip the agent's approval flag and add the work-for row in one step.
    /// Re-approving is a no-op reported through [`AgentApproval`].
    async fn approve_agent_for_airline(
        &self,
        email: &AgentEmail,
        airline: &AirlineName,
    ) -> Result<AgentApproval, IdentityRepositoryError>;

    /// Approve pending staff of `airline` among `usernames`; returns how many
    /// flipped. Staff of other airlines are left untouched.
    async fn approve_staff(
        &self,
        usernames: &[StaffUsername],
        airline: &AirlineName,
    ) -> Result<u64, IdentityRepositoryError>;

    /// Grant a permission. Returns `false` if it was already held.
    async fn grant_permission(
        &self,
        username: &StaffUsername,
        permission: Permission,
    ) -> Result<bool, IdentityRepositoryError>;

    /// Add a work-for row for an existing agent.
    async fn add_affiliation(
        &self,
        email: &AgentEmail,
        airline: &AirlineName,
    ) -> Result<(), IdentityRepositoryError>;

    /// Unapproved agents with no work-for row for `airline`.
    async fn pending_agents(
        &self,
        airline: &AirlineName,
    ) -> Result<Vec<BookingAgent>, IdentityRepositoryError>;

    /// Unapproved staff of `airline`.
    async fn pending_staff(
        &self,
        airline: &AirlineName,
    ) -> Result<Vec<StaffMember>, IdentityRepositoryError>;
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;

    use super::*;

    #[rstest]
    fn already_affiliated_names_both_sides() {
        let err = IdentityRepositoryError::already_affiliated("agent@example.com", "United");
        let msg = err.to_string();
        assert!(msg.contains("agent@example.com"));
        assert!(msg.contains("United"));
    }

    #[rstest]
    fn connection_errors_are_distinct_from_query_errors() {
        assert_ne!(
            IdentityRepositoryError::connection("down"),
            IdentityRepositoryError::query("down")
        );
    }
}
