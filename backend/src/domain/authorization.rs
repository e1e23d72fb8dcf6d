//! Authorization checks over an [`ActorContext`].
//!
//! Each guard returns the identity facts the caller needs next, so a passing
//! check cannot be separated from the values it vouched for.

use super::error::Error;
use super::identity::{
    Actor, ActorContext, AgentEmail, AirlineName, BookingAgentId, CustomerEmail, Permission,
    StaffUsername,
};

/// An approved staff member holding Admin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminGrant<'a> {
    pub username: &'a StaffUsername,
    pub airline: &'a AirlineName,
}

/// An approved booking agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentGrant<'a> {
    pub email: &'a AgentEmail,
    pub agent_id: BookingAgentId,
}

fn approved_staff(ctx: &ActorContext) -> Result<(&StaffUsername, &AirlineName), Error> {
    let Actor::AirlineStaff { username, airline } = ctx.actor() else {
        return Err(Error::permission_denied("only airline staff may do this"));
    };
    if !ctx.approval().is_approved() {
        return Err(Error::permission_denied(format!(
            "staff member {username} is not approved"
        )));
    }
    Ok((username, airline))
}

/// Require an approved Admin of any airline; the grant names which one.
pub fn require_admin(ctx: &ActorContext) -> Result<AdminGrant<'_>, Error> {
    let (username, airline) = approved_staff(ctx)?;
    if !ctx.has_permission(Permission::Admin) {
        return Err(Error::not_admin(format!(
            "staff member {username} does not hold Admin for {airline}"
        )));
    }
    Ok(AdminGrant { username, airline })
}

/// Require an approved Admin of `airline`.
pub fn require_admin_of<'a>(
    ctx: &'a ActorContext,
    airline: &AirlineName,
) -> Result<AdminGrant<'a>, Error> {
    let grant = require_admin(ctx)?;
    if grant.airline != airline {
        return Err(Error::not_admin(format!(
            "staff member {} is not an Admin of {airline}",
            grant.username
        )));
    }
    Ok(grant)
}

/// Require an approved staff member of `airline` holding Operator or Admin.
pub fn require_flight_operator<'a>(
    ctx: &'a ActorContext,
    airline: &AirlineName,
) -> Result<&'a StaffUsername, Error> {
    let (username, own_airline) = approved_staff(ctx)?;
    if own_airline != airline {
        return Err(Error::permission_denied(format!(
            "staff member {username} does not work for {airline}"
        )));
    }
    if !(ctx.has_permission(Permission::Operator) || ctx.has_permission(Permission::Admin)) {
        return Err(Error::permission_denied(format!(
            "staff member {username} holds neither Operator nor Admin"
        )));
    }
    Ok(username)
}

/// Require any approved staff member; returns their airline.
pub fn require_staff(ctx: &ActorContext) -> Result<&AirlineName, Error> {
    approved_staff(ctx).map(|(_, airline)| airline)
}

/// Require an approved booking agent.
pub fn require_selling_agent(ctx: &ActorContext) -> Result<AgentGrant<'_>, Error> {
    let Actor::BookingAgent { email, agent_id } = ctx.actor() else {
        return Err(Error::permission_denied("only booking agents may sell tickets"));
    };
    if !ctx.approval().is_approved() {
        return Err(Error::permission_denied(format!(
            "booking agent {email} is not approved"
        )));
    }
    Ok(AgentGrant {
        email,
        agent_id: *agent_id,
    })
}

/// Require the customer acting for themself.
pub fn require_customer(ctx: &ActorContext) -> Result<&CustomerEmail, Error> {
    match ctx.actor() {
        Actor::Customer { email } => Ok(email),
        _ => Err(Error::permission_denied("only customers may do this")),
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for authorization guards.

    use rstest::{fixture, rstest};

    use super::*;
    use crate::domain::{ApprovalState, ErrorCategory, ErrorCode};

    #[fixture]
    fn delta() -> AirlineName {
        AirlineName::new("Delta").expect("airline")
    }

    fn staff(approval: ApprovalState, permissions: &[Permission]) -> ActorContext {
        ActorContext::airline_staff(
            StaffUsername::new("alice").expect("username"),
            AirlineName::new("Delta").expect("airline"),
            approval,
            permissions.iter().copied(),
        )
    }

    #[rstest]
    fn approved_admin_passes(delta: AirlineName) {
        let ctx = staff(ApprovalState::Approved, &[Permission::Admin]);
        let grant = require_admin_of(&ctx, &delta).expect("admin");
        assert_eq!(grant.airline, &delta);
    }

    #[rstest]
    fn admin_of_another_airline_is_not_admin() {
        let ctx = staff(ApprovalState::Approved, &[Permission::Admin]);
        let united = AirlineName::new("United").expect("airline");
        let err = require_admin_of(&ctx, &united).expect_err("wrong airline");
        assert_eq!(err.code(), ErrorCode::NotAdmin);
    }

    #[rstest]
    fn unapproved_admin_is_denied() {
        let ctx = staff(ApprovalState::Pending, &[Permission::Admin]);
        let err = require_admin(&ctx).expect_err("pending");
        assert_eq!(err.code(), ErrorCode::PermissionDenied);
    }

    #[rstest]
    fn operator_lacks_admin() {
        let ctx = staff(ApprovalState::Approved, &[Permission::Operator]);
        let err = require_admin(&ctx).expect_err("not admin");
        assert_eq!(err.code(), ErrorCode::NotAdmin);
        assert_eq!(err.category(), ErrorCategory::PermissionDenied);
    }

    #[rstest]
    #[case(&[Permission::Operator])]
    #[case(&[Permission::Admin])]
    fn operator_or_admin_may_change_status(delta: AirlineName, #[case] permissions: &[Permission]) {
        let ctx = staff(ApprovalState::Approved, permissions);
        assert!(require_flight_operator(&ctx, &delta).is_ok());
    }

    #[rstest]
    fn staff_without_permissions_cannot_change_status(delta: AirlineName) {
        let ctx = staff(ApprovalState::Approved, &[]);
        let err = require_flight_operator(&ctx, &delta).expect_err("no permission");
        assert_eq!(err.code(), ErrorCode::PermissionDenied);
    }

    #[rstest]
    fn pending_agent_cannot_sell() {
        let ctx = ActorContext::booking_agent(
            AgentEmail::new("agent@example.com").expect("email"),
            BookingAgentId::new(5).expect("id"),
            ApprovalState::Pending,
        );
        let err = require_selling_agent(&ctx).expect_err("pending");
        assert_eq!(err.code(), ErrorCode::PermissionDenied);
    }

    #[rstest]
    fn customers_cannot_act_as_staff() {
        let ctx = ActorContext::customer(CustomerEmail::new("c@example.com").expect("email"));
        assert!(require_staff(&ctx).is_err());
        assert!(require_customer(&ctx).is_ok());
    }
}
