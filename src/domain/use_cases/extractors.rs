use actix_web::{FromRequest, HttpRequest, HttpMessage};
use futures_util::future::{ready, Ready};

use crate::{entities::token::{Claims, Identity}, errors::AuthError};

/// Extractor for the signed-in user.
/// Returns 401 if the request carried no valid token.
/// Usage: Add `user: CurrentUser` as a parameter to your handler function.
#[derive(Debug)]
pub struct CurrentUser(pub Identity);

impl FromRequest for CurrentUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let result = match req.extensions().get::<Claims>() {
            Some(claims) => Identity::try_from(claims)
                .map(CurrentUser)
                .map_err(actix_web::Error::from),
            None => Err(AuthError::MissingCredentials.into()),
        };

        ready(result)
    }
}
