//! Approval workflow service.
//!
//! Approval flags only ever move from pending to approved. Every operation
//! is scoped to the acting Admin's airline: an Admin cannot approve, grant,
//! or list on behalf of another airline.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::domain::authorization::require_admin;
use crate::domain::ports::{ApprovalCommand, IdentityRepository};
use crate::domain::store_errors::map_identity_error;
use crate::domain::{
    ActorContext, AgentApproval, AgentEmail, BookingAgent, Error, ErrorCode, Permission,
    StaffMember, StaffUsername,
};

/// Approval service implementing [`ApprovalCommand`].
#[derive(Clone)]
pub struct ApprovalService<I> {
    identities: Arc<I>,
}

impl<I> ApprovalService<I> {
    /// Create an approval service over the identity repository.
    pub fn new(identities: Arc<I>) -> Self {
        Self { identities }
    }
}

impl<I> ApprovalService<I>
where
    I: IdentityRepository,
{
    async fn load_agent(&self, email: &AgentEmail) -> Result<BookingAgent, Error> {
        self.identities
            .find_agent(email)
            .await
            .map_err(map_identity_error)?
            .ok_or_else(|| {
                Error::new(
                    ErrorCode::AgentNotFound,
                    format!("booking agent {email} not found"),
                )
            })
    }
}

#[async_trait]
impl<I> ApprovalCommand for ApprovalService<I>
where
    I: IdentityRepository,
{
    async fn approve_agent(
        &self,
        actor: &ActorContext,
        agent: &AgentEmail,
    ) -> Result<AgentApproval, Error> {
        let grant = require_admin(actor)?;
        let outcome = self
            .identities
            .approve_agent_for_airline(agent, grant.airline)
            .await
            .map_err(map_identity_error)?;
        info!(
            %agent,
            airline = %grant.airline,
            admin = %grant.username,
            newly_approved = outcome.newly_approved,
            affiliation_added = outcome.affiliation_added,
            "booking agent approved"
        );
        Ok(outcome)
    }

    async fn approve_staff(
        &self,
        actor: &ActorContext,
        usernames: &[StaffUsername],
    ) -> Result<u64, Error> {
        let grant = require_admin(actor)?;
        if usernames.is_empty() {
            return Ok(0);
        }
        let approved = self
            .identities
            .approve_staff(usernames, grant.airline)
            .await
            .map_err(map_identity_error)?;
        info!(
            airline = %grant.airline,
            admin = %grant.username,
            requested = usernames.len(),
            approved,
            "staff approved"
        );
        Ok(approved)
    }

    async fn grant_permission(
        &self,
        actor: &ActorContext,
        username: &StaffUsername,
        permission: Permission,
    ) -> Result<bool, Error> {
        let grant = require_admin(actor)?;
        let target = self
            .identities
            .find_staff(username)
            .await
            .map_err(map_identity_error)?
            .ok_or_else(|| {
                Error::new(
                    ErrorCode::StaffNotFound,
                    format!("staff member {username} not found"),
                )
            })?;
        if &target.airline != grant.airline {
            return Err(Error::not_admin(format!(
                "staff member {} is not an Admin of {}",
                grant.username, target.airline
            )));
        }
        let granted = self
            .identities
            .grant_permission(username, permission)
            .await
            .map_err(map_identity_error)?;
        info!(%username, %permission, admin = %grant.username, granted, "permission granted");
        Ok(granted)
    }

    async fn add_agent_to_airline(
        &self,
        actor: &ActorContext,
        agent: &AgentEmail,
    ) -> Result<(), Error> {
        let grant = require_admin(actor)?;
        let existing = self.load_agent(agent).await?;
        if !existing.approval.is_approved() {
            return Err(Error::conflict(format!(
                "booking agent {agent} is awaiting approval"
            )));
        }
        self.identities
            .add_affiliation(agent, grant.airline)
            .await
            .map_err(map_identity_error)?;
        info!(%agent, airline = %grant.airline, "booking agent affiliated");
        Ok(())
    }

    async fn pending_agents(&self, actor: &ActorContext) -> Result<Vec<BookingAgent>, Error> {
        let grant = require_admin(actor)?;
        self.identities
            .pending_agents(grant.airline)
            .await
            .map_err(map_identity_error)
    }

    async fn pending_staff(&self, actor: &ActorContext) -> Result<Vec<StaffMember>, Error> {
        let grant = require_admin(actor)?;
        self.identities
            .pending_staff(grant.airline)
            .await
            .map_err(map_identity_error)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for the approval workflow.

    use std::collections::BTreeSet;

    use rstest::{fixture, rstest};

    use super::*;
    use crate::domain::ports::{IdentityRepositoryError, MockIdentityRepository};
    use crate::domain::{ApprovalState, StaffRegistration, StaffBootstrap};
    use crate::test_support::fixtures::{
        admin_actor, agent_actor, agent_email, agent_id, airline, staff_actor, username,
    };

    #[fixture]
    fn identities() -> MockIdentityRepository {
        MockIdentityRepository::new()
    }

    fn make_service(identities: MockIdentityRepository) -> ApprovalService<MockIdentityRepository> {
        ApprovalService::new(Arc::new(identities))
    }

    fn staff_of(name: &str, airline_name: &str) -> StaffMember {
        StaffBootstrap::for_airline(true).apply(StaffRegistration {
            username: username(name),
            airline: airline(airline_name),
            first_name: "Kim".to_owned(),
            last_name: "Lee".to_owned(),
            date_of_birth: None,
        })
    }

    fn agent(approval: ApprovalState) -> BookingAgent {
        BookingAgent {
            email: agent_email("sam@agency.com"),
            agent_id: agent_id(7),
            approval,
            airlines: BTreeSet::new(),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn approve_agent_uses_admin_airline(mut identities: MockIdentityRepository) {
        identities
            .expect_approve_agent_for_airline()
            .withf(|email, name| email.as_str() == "sam@agency.com" && name == &airline("AA"))
            .times(1)
            .return_once(|_, _| {
                Ok(AgentApproval {
                    newly_approved: true,
                    affiliation_added: true,
                })
            });

        let service = make_service(identities);
        let outcome = service
            .approve_agent(&admin_actor("bob", "AA"), &agent_email("sam@agency.com"))
            .await
            .expect("approval succeeds");

        assert!(outcome.newly_approved);
    }

    #[rstest]
    #[tokio::test]
    async fn approve_agent_is_refused_to_non_admins(mut identities: MockIdentityRepository) {
        identities.expect_approve_agent_for_airline().times(0);

        let service = make_service(identities);
        let operator = staff_actor("op", "AA", ApprovalState::Approved, [Permission::Operator]);
        let err = service
            .approve_agent(&operator, &agent_email("sam@agency.com"))
            .await
            .expect_err("operators cannot approve");

        assert_eq!(err.code(), ErrorCode::NotAdmin);
    }

    #[rstest]
    #[tokio::test]
    async fn unapproved_admin_cannot_approve(mut identities: MockIdentityRepository) {
        identities.expect_approve_staff().times(0);

        let service = make_service(identities);
        let pending = staff_actor("bob", "AA", ApprovalState::Pending, [Permission::Admin]);
        let err = service
            .approve_staff(&pending, &[username("kim")])
            .await
            .expect_err("pending admin");

        assert_eq!(err.code(), ErrorCode::PermissionDenied);
    }

    #[rstest]
    #[tokio::test]
    async fn approve_staff_passes_admin_airline(mut identities: MockIdentityRepository) {
        identities
            .expect_approve_staff()
            .withf(|names, name| names.len() == 2 && name == &airline("AA"))
            .times(1)
            .return_once(|_, _| Ok(1));

        let service = make_service(identities);
        let approved = service
            .approve_staff(&admin_actor("bob", "AA"), &[username("kim"), username("lee")])
            .await
            .expect("approval succeeds");

        assert_eq!(approved, 1);
    }

    #[rstest]
    #[tokio::test]
    async fn approving_no_staff_skips_the_store(mut identities: MockIdentityRepository) {
        identities.expect_approve_staff().times(0);

        let service = make_service(identities);
        let approved = service
            .approve_staff(&admin_actor("bob", "AA"), &[])
            .await
            .expect("empty approval");

        assert_eq!(approved, 0);
    }

    #[rstest]
    #[tokio::test]
    async fn grant_permission_within_airline(mut identities: MockIdentityRepository) {
        let target = staff_of("kim", "AA");
        identities
            .expect_find_staff()
            .times(1)
            .return_once(move |_| Ok(Some(target)));
        identities
            .expect_grant_permission()
            .withf(|name, permission| name.as_str() == "kim" && *permission == Permission::Operator)
            .times(1)
            .return_once(|_, _| Ok(true));

        let service = make_service(identities);
        let granted = service
            .grant_permission(&admin_actor("bob", "AA"), &username("kim"), Permission::Operator)
            .await
            .expect("grant succeeds");

        assert!(granted);
    }

    #[rstest]
    #[tokio::test]
    async fn grant_permission_across_airlines_is_refused(mut identities: MockIdentityRepository) {
        let target = staff_of("kim", "Delta");
        identities
            .expect_find_staff()
            .times(1)
            .return_once(move |_| Ok(Some(target)));
        identities.expect_grant_permission().times(0);

        let service = make_service(identities);
        let err = service
            .grant_permission(&admin_actor("bob", "AA"), &username("kim"), Permission::Admin)
            .await
            .expect_err("other airline");

        assert_eq!(err.code(), ErrorCode::NotAdmin);
    }

    #[rstest]
    #[tokio::test]
    async fn grant_permission_to_unknown_staff(mut identities: MockIdentityRepository) {
        identities
            .expect_find_staff()
            .times(1)
            .return_once(|_| Ok(None));

        let service = make_service(identities);
        let err = service
            .grant_permission(&admin_actor("bob", "AA"), &username("ghost"), Permission::Admin)
            .await
            .expect_err("missing staff");

        assert_eq!(err.code(), ErrorCode::StaffNotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn add_agent_requires_approved_agent(mut identities: MockIdentityRepository) {
        let pending = agent(ApprovalState::Pending);
        identities
            .expect_find_agent()
            .times(1)
            .return_once(move |_| Ok(Some(pending)));
        identities.expect_add_affiliation().times(0);

        let service = make_service(identities);
        let err = service
            .add_agent_to_airline(&admin_actor("bob", "AA"), &agent_email("sam@agency.com"))
            .await
            .expect_err("pending agent");

        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[rstest]
    #[tokio::test]
    async fn add_agent_twice_is_a_conflict(mut identities: MockIdentityRepository) {
        let approved = agent(ApprovalState::Approved);
        identities
            .expect_find_agent()
            .times(1)
            .return_once(move |_| Ok(Some(approved)));
        identities
            .expect_add_affiliation()
            .times(1)
            .return_once(|_, _| {
                Err(IdentityRepositoryError::already_affiliated("sam@agency.com", "AA"))
            });

        let service = make_service(identities);
        let err = service
            .add_agent_to_airline(&admin_actor("bob", "AA"), &agent_email("sam@agency.com"))
            .await
            .expect_err("already affiliated");

        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[rstest]
    #[tokio::test]
    async fn pending_lists_require_admin(identities: MockIdentityRepository) {
        let service = make_service(identities);
        let actor = agent_actor("sam@agency.com", 7, ApprovalState::Approved);

        let agents = service.pending_agents(&actor).await.expect_err("agent");
        let staff = service.pending_staff(&actor).await.expect_err("agent");

        assert_eq!(agents.code(), ErrorCode::PermissionDenied);
        assert_eq!(staff.code(), ErrorCode::PermissionDenied);
    }
}
