//! Account registration and actor resolution.
//!
//! Registration never grants privileges by itself except for the first staff
//! member of an airline without an Admin, which the identity repository
//! decides atomically. Actor resolution always reads current state so a
//! revoked or pending account cannot act on a stale context.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::domain::ports::{
    ActorDirectory, AuthenticatedIdentity, CatalogRepository, IdentityRepository,
    RegisterAgentRequest, RegistrationCommand,
};
use crate::domain::store_errors::{map_catalog_error, map_identity_error};
use crate::domain::{
    ActorContext, BookingAgent, Customer, Error, ErrorCode, StaffMember, StaffRegistration,
};

/// Registration service implementing [`RegistrationCommand`] and
/// [`ActorDirectory`].
#[derive(Clone)]
pub struct RegistrationService<C, I> {
    catalog: Arc<C>,
    identities: Arc<I>,
}

impl<C, I> RegistrationService<C, I> {
    pub fn new(catalog: Arc<C>, identities: Arc<I>) -> Self {
        Self {
            catalog,
            identities,
        }
    }
}

#[async_trait]
impl<C, I> RegistrationCommand for RegistrationService<C, I>
where
    C: CatalogRepository,
    I: IdentityRepository,
{
    async fn register_customer(&self, customer: Customer) -> Result<Customer, Error> {
        self.identities
            .insert_customer(&customer)
            .await
            .map_err(map_identity_error)?;
        info!(customer = %customer.email, "customer registered");
        Ok(customer)
    }

    async fn register_agent(&self, request: RegisterAgentRequest) -> Result<BookingAgent, Error> {
        let agent = BookingAgent::pending(request.email, request.agent_id);
        self.identities
            .insert_agent(&agent)
            .await
            .map_err(map_identity_error)?;
        info!(agent = %agent.email, agent_id = %agent.agent_id, "booking agent registered");
        Ok(agent)
    }

    async fn register_staff(&self, registration: StaffRegistration) -> Result<StaffMember, Error> {
        let airline = self
            .catalog
            .find_airline(&registration.airline)
            .await
            .map_err(map_catalog_error)?;
        if airline.is_none() {
            return Err(Error::invalid_reference(format!(
                "airline {} does not exist",
                registration.airline
            )));
        }
        let member = self
            .identities
            .register_staff(&registration)
            .await
            .map_err(map_identity_error)?;
        info!(
            username = %member.username,
            airline = %member.airline,
            approved = member.approval.is_approved(),
            "staff member registered"
        );
        Ok(member)
    }
}

#[async_trait]
impl<C, I> ActorDirectory for RegistrationService<C, I>
where
    C: CatalogRepository,
    I: IdentityRepository,
{
    async fn resolve_actor(&self, identity: &AuthenticatedIdentity) -> Result<ActorContext, Error> {
        match identity {
            AuthenticatedIdentity::Customer(email) => self
                .identities
                .find_customer(email)
                .await
                .map_err(map_identity_error)?
                .map(|customer| ActorContext::customer(customer.email))
                .ok_or_else(|| {
                    Error::new(ErrorCode::CustomerNotFound, format!("customer {email} not found"))
                }),
            AuthenticatedIdentity::BookingAgent(email) => self
                .identities
                .find_agent(email)
                .await
                .map_err(map_identity_error)?
                .map(|agent| agent.actor_context())
                .ok_or_else(|| {
                    Error::new(
                        ErrorCode::AgentNotFound,
                        format!("booking agent {email} not found"),
                    )
                }),
            AuthenticatedIdentity::AirlineStaff(username) => self
                .identities
                .find_staff(username)
                .await
                .map_err(map_identity_error)?
                .map(|member| member.actor_context())
                .ok_or_else(|| {
                    Error::new(
                        ErrorCode::StaffNotFound,
                        format!("staff member {username} not found"),
                    )
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for registration and actor resolution.

    use rstest::{fixture, rstest};

    use super::*;
    use crate::domain::ports::{
        IdentityRepositoryError, MockCatalogRepository, MockIdentityRepository,
    };
    use crate::domain::{Airline, ApprovalState, Permission, StaffBootstrap};
    use crate::test_support::fixtures::{agent_email, agent_id, airline, customer_email, username};

    type Service = RegistrationService<MockCatalogRepository, MockIdentityRepository>;

    struct Mocks {
        catalog: MockCatalogRepository,
        identities: MockIdentityRepository,
    }

    #[fixture]
    fn mocks() -> Mocks {
        Mocks {
            catalog: MockCatalogRepository::new(),
            identities: MockIdentityRepository::new(),
        }
    }

    fn make_service(mocks: Mocks) -> Service {
        RegistrationService::new(Arc::new(mocks.catalog), Arc::new(mocks.identities))
    }

    fn registration(airline_name: &str) -> StaffRegistration {
        StaffRegistration {
            username: username("bob"),
            airline: airline(airline_name),
            first_name: "Bob".to_owned(),
            last_name: "Builder".to_owned(),
            date_of_birth: None,
        }
    }

    #[rstest]
    #[tokio::test]
    async fn duplicate_customer_is_reported(mut mocks: Mocks) {
        mocks
            .identities
            .expect_insert_customer()
            .times(1)
            .return_once(|_| Err(IdentityRepositoryError::duplicate("ada@example.com")));

        let service = make_service(mocks);
        let err = service
            .register_customer(Customer::new(customer_email("ada@example.com"), "Ada"))
            .await
            .expect_err("duplicate email");

        assert_eq!(err.code(), ErrorCode::DuplicateRegistration);
    }

    #[rstest]
    #[tokio::test]
    async fn new_agents_start_pending(mut mocks: Mocks) {
        mocks
            .identities
            .expect_insert_agent()
            .withf(|agent| agent.approval == ApprovalState::Pending && agent.airlines.is_empty())
            .times(1)
            .return_once(|_| Ok(()));

        let service = make_service(mocks);
        let agent = service
            .register_agent(RegisterAgentRequest {
                email: agent_email("sam@agency.com"),
                agent_id: agent_id(7),
            })
            .await
            .expect("agent registered");

        assert_eq!(agent.approval, ApprovalState::Pending);
    }

    #[rstest]
    #[tokio::test]
    async fn staff_of_unknown_airline_is_rejected(mut mocks: Mocks) {
        mocks
            .catalog
            .expect_find_airline()
            .times(1)
            .return_once(|_| Ok(None));
        mocks.identities.expect_register_staff().times(0);

        let service = make_service(mocks);
        let err = service
            .register_staff(registration("Nowhere"))
            .await
            .expect_err("airline missing");

        assert_eq!(err.code(), ErrorCode::InvalidReference);
    }

    #[rstest]
    #[tokio::test]
    async fn first_staff_member_comes_back_as_admin(mut mocks: Mocks) {
        mocks
            .catalog
            .expect_find_airline()
            .times(1)
            .return_once(|name| {
                Ok(Some(Airline {
                    name: name.clone(),
                }))
            });
        mocks
            .identities
            .expect_register_staff()
            .times(1)
            .return_once(|reg| Ok(StaffBootstrap::for_airline(false).apply(reg.clone())));

        let service = make_service(mocks);
        let member = service
            .register_staff(registration("AA"))
            .await
            .expect("staff registered");

        assert!(member.approval.is_approved());
        assert!(member.permissions.contains(&Permission::Admin));
    }

    #[rstest]
    #[tokio::test]
    async fn resolve_staff_reflects_stored_permissions(mut mocks: Mocks) {
        let stored = StaffBootstrap::for_airline(false).apply(registration("AA"));
        mocks
            .identities
            .expect_find_staff()
            .times(1)
            .return_once(move |_| Ok(Some(stored)));

        let service = make_service(mocks);
        let ctx = service
            .resolve_actor(&AuthenticatedIdentity::AirlineStaff(username("bob")))
            .await
            .expect("actor resolved");

        assert!(ctx.has_permission(Permission::Admin));
        assert_eq!(ctx.identity_key(), "airline_staff:bob");
    }

    #[rstest]
    #[tokio::test]
    async fn resolving_unknown_agent_fails(mut mocks: Mocks) {
        mocks
            .identities
            .expect_find_agent()
            .times(1)
            .return_once(|_| Ok(None));

        let service = make_service(mocks);
        let err = service
            .resolve_actor(&AuthenticatedIdentity::BookingAgent(agent_email("x@y.z")))
            .await
            .expect_err("unknown agent");

        assert_eq!(err.code(), ErrorCode::AgentNotFound);
    }
}
