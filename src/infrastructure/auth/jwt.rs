use jsonwebtoken::{decode, Validation, TokenData, Algorithm};

use crate::entities::token::Claims;
use crate::repositories::token::TokenServiceRepository;
use crate::settings::{AppConfig, JwtKeys};
use crate::errors::AuthError;

pub const JWT_ALGORITHM: Algorithm = Algorithm::HS512;

/// Verifies bearer tokens minted by the identity provider, which shares the
/// HS512 secret with this service. Tokens are never issued here.
#[derive(Clone)]
pub struct JwtService {
    keys: JwtKeys,
}

impl JwtService {
    pub fn new(config: &AppConfig) -> Self {
        JwtService {
            keys: JwtKeys::from(config),
        }
    }
}

impl TokenServiceRepository for JwtService {
    fn decode_jwt(&self, token: &str) -> Result<TokenData<Claims>, AuthError> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = true;
        validation.leeway = 0;

        decode::<Claims>(
            token,
            &self.keys.decoding,
            &validation
        )
        .map_err(AuthError::from)
    }
}
