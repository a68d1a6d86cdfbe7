use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AuthError;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub name: String,
    pub exp: usize,
    pub iat: usize,
}

/// The signed-in user, handed explicitly to every workflow operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub name: String,
}

impl Identity {
    pub fn new(user_id: Uuid, name: impl Into<String>) -> Self {
        Identity {
            user_id,
            name: name.into(),
        }
    }
}

impl TryFrom<&Claims> for Identity {
    type Error = AuthError;

    fn try_from(claims: &Claims) -> Result<Self, Self::Error> {
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidUserId)?;

        Ok(Identity {
            user_id,
            name: claims.name.clone(),
        })
    }
}
