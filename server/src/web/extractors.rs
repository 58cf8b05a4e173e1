// grocer_server/src/web/extractors.rs

use actix_web::{dev::Payload, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use grocer::{Actor, Role};
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;

pub const USER_ID_HEADER: &str = "X-User-ID";
pub const USER_ROLE_HEADER: &str = "X-User-Role";

/// Caller identity, taken from headers set by the authenticating gateway in
/// front of this service.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedActor(pub Actor);

impl AuthenticatedActor {
  pub fn actor(&self) -> Actor {
    self.0
  }
}

fn header<'a>(req: &'a HttpRequest, name: &str) -> Result<&'a str, AppError> {
  req
    .headers()
    .get(name)
    .and_then(|value| value.to_str().ok())
    .map(str::trim)
    .filter(|value| !value.is_empty())
    .ok_or_else(|| AppError::Auth(format!("Missing or unreadable {} header.", name)))
}

fn extract_actor(req: &HttpRequest) -> Result<Actor, AppError> {
  let id = Uuid::parse_str(header(req, USER_ID_HEADER)?)
    .map_err(|_| AppError::Auth(format!("{} is not a valid UUID.", USER_ID_HEADER)))?;
  let role = header(req, USER_ROLE_HEADER)?
    .parse::<Role>()
    .map_err(AppError::Auth)?;
  Ok(Actor::new(id, role))
}

impl FromRequest for AuthenticatedActor {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let result = extract_actor(req).map(AuthenticatedActor);
    if let Err(e) = &result {
      warn!(error = %e, path = %req.path(), "Rejected unauthenticated request.");
    }
    ready(result)
  }
}
