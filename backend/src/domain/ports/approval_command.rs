//! Driving port for the approval workflow.
//!
//! Every operation requires an approved Admin and acts on that Admin's
//! airline only.

use async_trait::async_trait;

use crate::domain::{
    ActorContext, AgentApproval, AgentEmail, BookingAgent, Error, Permission, StaffMember,
    StaffUsername,
};

/// Driving port for approvals, permission grants, and affiliations.
#[async_trait]
pub trait ApprovalCommand: Send + Sync {
    /// Approve an agent and affiliate it with the Admin's airline atomically.
    /// Repeating the call is a no-op.
    async fn approve_agent(
        &self,
        actor: &ActorContext,
        agent: &AgentEmail,
    ) -> Result<AgentApproval, Error>;

    /// Approve pending staff of the Admin's airline; returns the number that
    /// changed state.
    async fn approve_staff(
        &self,
        actor: &ActorContext,
        usernames: &[StaffUsername],
    ) -> Result<u64, Error>;

    /// Grant a permission to a staff member of the Admin's airline. Returns
    /// `false` when the permission was already held.
    async fn grant_permission(
        &self,
        actor: &ActorContext,
        username: &StaffUsername,
        permission: Permission,
    ) -> Result<bool, Error>;

    /// Affiliate an already-approved agent with the Admin's airline.
    async fn add_agent_to_airline(
        &self,
        actor: &ActorContext,
        agent: &AgentEmail,
    ) -> Result<(), Error>;

    /// Agents awaiting approval by the Admin's airline.
    async fn pending_agents(&self, actor: &ActorContext) -> Result<Vec<BookingAgent>, Error>;

    /// Staff of the Admin's airline awaiting approval.
    async fn pending_staff(&self, actor: &ActorContext) -> Result<Vec<StaffMember>, Error>;
}
