use jsonwebtoken::TokenData;

use crate::{entities::token::Claims, errors::AuthError};

pub trait TokenServiceRepository: Send + Sync {
    /// Decodes a JWT and returns the claims
    fn decode_jwt(&self, token: &str) -> Result<TokenData<Claims>, AuthError>;
}
