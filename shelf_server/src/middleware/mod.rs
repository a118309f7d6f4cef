mod acl;
mod jwt;

pub use acl::{AccessLevel, AclMiddlewareFactory, AclMiddlewareService};
pub use jwt::{JwtAuthenticationFactory, JwtAuthenticationService};
