//! Request actor identity.
//!
//! Credential validation happens in the fronting layer; this service trusts
//! the `x-employee-id` / `x-role` headers it forwards. Every handler gates on
//! the actor's role before touching data.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::routes::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Maker,
    Checker,
    Admin,
    Auditor,
}

impl Role {
    pub fn parse(value: &str) -> Option<Role> {
        match value.to_ascii_uppercase().as_str() {
            "MAKER" => Some(Role::Maker),
            "CHECKER" => Some(Role::Checker),
            "ADMIN" => Some(Role::Admin),
            "AUDITOR" => Some(Role::Auditor),
            _ => None,
        }
    }
}

/// Authenticated actor forwarded by the gateway.
#[derive(Debug, Clone)]
pub struct Actor {
    pub employee_id: String,
    pub role: Role,
}

impl Actor {
    /// Reject the request unless the actor holds one of the allowed roles.
    pub fn require_roles(&self, allowed: &[Role]) -> Result<(), ApiError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(ApiError::forbidden("Role not permitted for this operation"))
        }
    }
}

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let employee_id = parts
            .headers
            .get("x-employee-id")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::unauthorized("Missing x-employee-id header"))?
            .to_string();

        let role = parts
            .headers
            .get("x-role")
            .and_then(|v| v.to_str().ok())
            .and_then(Role::parse)
            .ok_or_else(|| ApiError::unauthorized("Missing or invalid x-role header"))?;

        Ok(Actor { employee_id, role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parse_is_case_insensitive() {
        assert_eq!(Role::parse("maker"), Some(Role::Maker));
        assert_eq!(Role::parse("CHECKER"), Some(Role::Checker));
        assert_eq!(Role::parse("visitor"), None);
    }

    #[test]
    fn require_roles_rejects_outsiders() {
        let actor = Actor {
            employee_id: "E100".into(),
            role: Role::Auditor,
        };
        assert!(actor.require_roles(&[Role::Maker, Role::Admin]).is_err());
        assert!(actor.require_roles(&[Role::Auditor]).is_ok());
    }
}
