use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account roles. `Admin` is the super-role: every role gate lets it through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Donor,
    Receiver,
    Shipper,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Donor => "donor",
            Role::Receiver => "receiver",
            Role::Shipper => "shipper",
            Role::Admin => "admin",
        }
    }

    /// Case-insensitive parse. Unknown strings are `None`, not an error:
    /// rows written by older builds may carry roles we no longer issue.
    pub fn parse(s: &str) -> Option<Role> {
        match s.to_ascii_lowercase().as_str() {
            "user" => Some(Role::User),
            "donor" => Some(Role::Donor),
            "receiver" => Some(Role::Receiver),
            "shipper" => Some(Role::Shipper),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWT claims shared by the REST middleware and the admin impersonation
/// endpoint. Canonical definition lives here in bcx-types to eliminate
/// duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub exp: usize,
    /// Set when an admin is impersonating this user; carries the admin's id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imp_by: Option<Uuid>,
}

impl Claims {
    pub fn role(&self) -> Option<Role> {
        Role::parse(&self.role)
    }

    /// Role gate: true when the caller's role is in `allowed`. Admin always
    /// passes.
    pub fn has_role(&self, allowed: &[Role]) -> bool {
        match self.role() {
            Some(Role::Admin) => true,
            Some(role) => allowed.contains(&role),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips() {
        for role in [Role::User, Role::Donor, Role::Receiver, Role::Shipper, Role::Admin] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("DONOR"), Some(Role::Donor));
        assert_eq!(Role::parse("moderator"), None);
    }

    #[test]
    fn admin_passes_every_gate() {
        let claims = Claims {
            id: Uuid::new_v4(),
            email: "root@example.com".into(),
            role: "admin".into(),
            exp: 0,
            imp_by: None,
        };
        assert!(claims.has_role(&[Role::Donor]));
        assert!(claims.has_role(&[]));
    }

    #[test]
    fn role_gate_rejects_outsiders() {
        let claims = Claims {
            id: Uuid::new_v4(),
            email: "a@b.com".into(),
            role: "shipper".into(),
            exp: 0,
            imp_by: None,
        };
        assert!(claims.has_role(&[Role::Shipper, Role::Donor]));
        assert!(!claims.has_role(&[Role::Donor]));
    }
}
