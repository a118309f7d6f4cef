//! Bearer-token authentication middleware.
//!
//! Wraps the `/api` scope. When a request carries an `Authorization: Bearer <token>` header,
//! the token is verified and the decoded claims are attached to the request; a header that is
//! present but malformed, badly signed or expired is rejected immediately with a 401. A
//! request without the header passes through untouched, so public routes keep working; the
//! per-route ACL middleware decides whether claims are actually required.

use std::{pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    Error,
    HttpMessage,
};
use futures::{
    future::{ok, Ready},
    Future,
};
use log::debug;

use crate::{
    auth::TokenVerifier,
    errors::{AuthError, ServerError},
};

pub struct JwtAuthenticationFactory {
    verifier: TokenVerifier,
}

impl JwtAuthenticationFactory {
    pub fn new(verifier: TokenVerifier) -> Self {
        Self { verifier }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuthenticationFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = JwtAuthenticationService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(JwtAuthenticationService { verifier: self.verifier.clone(), service: Rc::new(service) })
    }
}

pub struct JwtAuthenticationService<S> {
    verifier: TokenVerifier,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthenticationService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let verifier = self.verifier.clone();
        Box::pin(async move {
            let header_value = req.headers().get(header::AUTHORIZATION);
            let Some(header_value) = header_value else {
                return service.call(req).await;
            };
            let token = header_value
                .to_str()
                .ok()
                .and_then(|v| v.strip_prefix("Bearer "))
                .ok_or_else(|| {
                    debug!("💻️ Authorization header is not a bearer token");
                    ServerError::AuthenticationError(AuthError::PoorlyFormattedToken(
                        "Expected a Bearer token".to_string(),
                    ))
                })?;
            let claims = verifier.decode_token(token).map_err(|e| {
                debug!("💻️ Rejecting access token. {e}");
                ServerError::AuthenticationError(e)
            })?;
            req.extensions_mut().insert(claims);
            service.call(req).await
        })
    }
}
