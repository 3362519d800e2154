use crate::core::AppError;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    Error, FromRequest, HttpMessage, HttpRequest,
};
use futures_util::future::LocalBoxFuture;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use std::rc::Rc;

/// Bearer-token claims. Tokens are issued by an external identity service;
/// this middleware only verifies them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User identity
    pub id: i64,
    pub email: String,
    pub name: String,
    /// Expiration (Unix timestamp), enforced on decode
    pub exp: i64,
}

/// The verified user of the current request, available to handlers as an
/// extractor once `JwtAuth` has run.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub email: String,
    pub name: String,
}

impl FromRequest for CurrentUser {
    type Error = Error;
    type Future = Ready<std::result::Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<CurrentUser>()
                .cloned()
                .ok_or_else(|| AppError::unauthorized("Missing authenticated user").into()),
        )
    }
}

/// JWT authentication middleware
pub struct JwtAuth {
    secret: String,
}

impl JwtAuth {
    pub fn new(secret: String) -> Self {
        Self { secret }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddleware<S>;
    type Future = Ready<std::result::Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddleware {
            service: Rc::new(service),
            secret: self.secret.clone(),
        }))
    }
}

pub struct JwtAuthMiddleware<S> {
    service: Rc<S>,
    secret: String,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, std::result::Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let svc = self.service.clone();
        let secret = self.secret.clone();

        Box::pin(async move {
            let header = req
                .headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok())
                .ok_or_else(|| Error::from(AppError::unauthorized("Missing Authorization header")))?;

            let token = header.strip_prefix("Bearer ").ok_or_else(|| {
                Error::from(AppError::unauthorized("Authorization header is not a bearer token"))
            })?;

            let claims = verify_token(token, &secret).map_err(Error::from)?;

            // Expose the verified user to handlers
            req.extensions_mut().insert(CurrentUser {
                id: claims.id,
                email: claims.email,
                name: claims.name,
            });

            svc.call(req).await
        })
    }
}

/// Verify an HS256 bearer token and return its claims
pub fn verify_token(token: &str, secret: &str) -> crate::core::Result<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::unauthorized(format!("Cannot validate token: {}", e)))
}

/// Sign an HS256 token for the given claims. The API never issues tokens
/// itself; this exists for tooling and tests.
pub fn issue_token(claims: &Claims, secret: &str) -> crate::core::Result<String> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::internal(format!("Failed to sign token: {}", e)))
}
