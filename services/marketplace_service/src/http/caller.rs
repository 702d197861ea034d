use std::convert::Infallible;
use std::future::{ready, Ready};
use std::str::FromStr;

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest};
use service_core::auth::jwt::verify_token;
use service_core::endpoint_error::EndpointError;
use uuid::Uuid;

use crate::operations::Caller;
use crate::user_account::Role;
use crate::Context;

const BEARER_PREFIX: &str = "Bearer ";

type AuthError = EndpointError<Infallible>;

/// The caller named by the `Authorization` header, `None` when the header is absent.
fn caller_from_request(req: &HttpRequest) -> Result<Option<Caller>, AuthError> {
    let Some(value) = req.headers().get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let token = value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(EndpointError::Unauthenticated)?;

    let ctx = req.app_data::<web::Data<Context>>().ok_or_else(|| {
        tracing::error!("Context is not registered with the application.");
        EndpointError::internal()
    })?;

    let claims = verify_token(&ctx.settings.jwt_secret, token).map_err(|e| {
        tracing::debug!(error = ?e, "Rejected bearer token.");
        EndpointError::Unauthenticated
    })?;
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| EndpointError::Unauthenticated)?;
    let role = Role::from_str(&claims.role).map_err(|_| EndpointError::Unauthenticated)?;

    Ok(Some(Caller { user_id, role }))
}

/// Routes taking a `Caller` answer 401 without a valid bearer token.
impl FromRequest for Caller {
    type Error = AuthError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(caller_from_request(req).and_then(|caller| caller.ok_or(EndpointError::Unauthenticated)))
    }
}

/// Caller of a route open to anonymous requests. An unusable token counts as no token.
#[derive(Debug, Clone)]
pub struct OptionalCaller(pub Option<Caller>);

impl FromRequest for OptionalCaller {
    type Error = AuthError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(match caller_from_request(req) {
            Ok(caller) => Ok(OptionalCaller(caller)),
            Err(EndpointError::Unauthenticated) => Ok(OptionalCaller(None)),
            Err(e) => Err(e),
        })
    }
}
