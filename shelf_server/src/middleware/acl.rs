//! Access control middleware. This middleware can be placed on any route or service.
//!
//! It checks the claims attached by the JWT authentication middleware against the access
//! level the route requires. A request without claims, or without the admin flag where
//! [`AccessLevel::Admin`] is required, is rejected with the uniform 401 Unauthorized body;
//! callers cannot tell "not logged in" from "not allowed".

use std::{pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
    HttpMessage,
};
use futures::{
    future::{ok, Ready},
    Future,
};
use log::debug;

use crate::{auth::JwtClaims, errors::ServerError};

/// The two-level role model: any authenticated account, or an admin account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLevel {
    User,
    Admin,
}

pub struct AclMiddlewareFactory {
    required_level: AccessLevel,
}

impl AclMiddlewareFactory {
    pub fn new(required_level: AccessLevel) -> Self {
        AclMiddlewareFactory { required_level }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AclMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AclMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AclMiddlewareService { required_level: self.required_level, service: Rc::new(service) })
    }
}

pub struct AclMiddlewareService<S> {
    required_level: AccessLevel,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AclMiddlewareService<S>
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
        let required_level = self.required_level;
        Box::pin(async move {
            let claims = req.extensions().get::<JwtClaims>().cloned();
            match claims {
                None => {
                    debug!("💻️ No claims on request; access denied");
                    Err(ServerError::Unauthorized.into())
                },
                Some(claims) if required_level == AccessLevel::Admin && !claims.user.admin => {
                    debug!("💻️ {} is not an admin; access denied", claims.user.username);
                    Err(ServerError::Unauthorized.into())
                },
                Some(_) => service.call(req).await,
            }
        })
    }
}
