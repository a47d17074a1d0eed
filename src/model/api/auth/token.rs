use std::marker::PhantomData;

use chrono::{serde::ts_seconds, DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, TokenData, Validation};
use rocket::{
    http::Status,
    request::{FromRequest, Outcome},
    Request, State,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Error;
use crate::model::{api::id::ApiId, common::role::Role, mongodb::Id};

const AUTHORIZATION: &str = "Authorization";
const BEARER: &str = "Bearer ";

/// Which roles a route accepts.
pub trait RoleRequirement {
    fn permits(role: Role) -> bool;
}

/// Any authenticated user.
pub struct AnyRole;

impl RoleRequirement for AnyRole {
    fn permits(_role: Role) -> bool {
        true
    }
}

/// Administrators only.
pub struct AdminRole;

impl RoleRequirement for AdminRole {
    fn permits(role: Role) -> bool {
        role == Role::Admin
    }
}

/// A verified identity, taken from a bearer token, whose role satisfies `R`.
#[derive(Debug)]
pub struct AuthToken<R = AnyRole> {
    pub id: Id,
    pub role: Role,
    pub email: Option<String>,
    phantom: PhantomData<R>,
}

impl<R> AuthToken<R> {
    /// May this identity act as the given voter?
    /// Voters may only act as themselves; admins may act for anyone.
    pub fn may_act_for(&self, voter: Id) -> bool {
        self.role == Role::Admin || self.id == voter
    }
}

/// The user as described inside the token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUser {
    pub id: ApiId,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Token claims: the user plus an expiry datetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user: TokenUser,
    #[serde(rename = "exp", with = "ts_seconds")]
    pub expire_at: DateTime<Utc>,
}

impl Claims {
    /// Verify the signature and expiry of a raw token.
    pub fn decode(token: &str, config: &Config) -> Result<Self, Error> {
        let claims = jsonwebtoken::decode(
            token,
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::new(Algorithm::HS256),
        )
        .map(|data: TokenData<Claims>| data.claims)?;
        Ok(claims)
    }
}

#[rocket::async_trait]
impl<'r, R> FromRequest<'r> for AuthToken<R>
where
    R: RoleRequirement + Send,
{
    type Error = Error;

    /// Get an [`AuthToken`] from the `Authorization` header and check its role.
    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        // Unwrap is safe as `Config` is always managed.
        let config = req.guard::<&State<Config>>().await.unwrap();

        let raw = match req
            .headers()
            .get_one(AUTHORIZATION)
            .and_then(|header| header.strip_prefix(BEARER))
        {
            Some(raw) => raw.trim(),
            None => {
                return Outcome::Failure((
                    Status::Unauthorized,
                    Error::Unauthorized("Missing bearer token".to_string()),
                ))
            }
        };

        let claims = match Claims::decode(raw, config) {
            Ok(claims) => claims,
            Err(err) => {
                debug!("Rejected bearer token: {err}");
                return Outcome::Failure((Status::Unauthorized, err));
            }
        };

        if !R::permits(claims.user.role) {
            return Outcome::Failure((
                Status::Forbidden,
                Error::Forbidden(format!("Role {:?} may not use this route", claims.user.role)),
            ));
        }

        Outcome::Success(Self {
            id: *claims.user.id,
            role: claims.user.role,
            email: claims.user.email,
            phantom: PhantomData,
        })
    }
}
