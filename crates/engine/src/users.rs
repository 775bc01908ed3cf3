//! Acting-user identity.
//!
//! The engine does not authenticate anyone: the HTTP layer resolves the
//! bearer token and hands every operation an [`Actor`], which the engine
//! trusts as-is for authorization decisions.

use crate::EngineError;

/// Platform role of an authenticated user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Admin,
    Beneficiary,
    Donor,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Beneficiary => "beneficiary",
            Self::Donor => "donor",
        }
    }
}

impl TryFrom<&str> for Role {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "admin" => Ok(Self::Admin),
            "beneficiary" => Ok(Self::Beneficiary),
            "donor" => Ok(Self::Donor),
            other => Err(EngineError::InvalidRole(format!("invalid role: {other}"))),
        }
    }
}

/// The authenticated caller of an engine operation.
#[derive(Clone, Debug)]
pub struct Actor {
    pub user_id: String,
    pub role: Role,
}

impl Actor {
    #[must_use]
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
