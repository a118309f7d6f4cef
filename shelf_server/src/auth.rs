use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use chrono::{Duration, Utc};
use futures::future::{ready, Ready};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shelf_engine::db_types::Principal;

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

/// The claims embedded in an access token: a snapshot of the principal as of issuance time,
/// the username as subject, and the usual exp/iat pair. The store is not consulted when the
/// token is verified; a hard refresh is the way to pick up account changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub user: Principal,
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

/// Extracts the claims that the JWT middleware attached to the request. Routes that take
/// `JwtClaims` as an argument therefore require a valid bearer token.
impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(req.extensions().get::<JwtClaims>().cloned().ok_or(ServerError::Unauthorized))
    }
}

/// The verification half of the token service, cheap to clone into the auth middleware.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Checks signature, expiry and shape. Pure computation, no store lookup; claims are
    /// trusted as issued (there is no revocation list).
    pub fn decode_token(&self, token: &str) -> Result<JwtClaims, AuthError> {
        decode::<JwtClaims>(token, &self.decoding_key, &self.validation).map(|data| data.claims).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
                    AuthError::PoorlyFormattedToken(e.to_string())
                },
                _ => AuthError::ValidationError(e.to_string()),
            }
        })
    }
}

pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiry: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.reveal().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
            expiry: config.jwt_expiry,
        }
    }

    /// Issues a signed access token for the given principal snapshot. The default expiry
    /// comes from the configuration; refresh tests pass explicit (shorter) durations.
    ///
    /// This method DOES NOT verify that the principal reflects current store data. Callers
    /// authenticate first (login) or hold already-verified claims (refresh).
    pub fn issue_token(&self, principal: Principal, duration: Option<Duration>) -> Result<String, ServerError> {
        let now = Utc::now();
        let expiry = duration.unwrap_or(self.expiry);
        let claims = JwtClaims {
            sub: principal.username.clone(),
            exp: (now + expiry).timestamp(),
            iat: now.timestamp(),
            user: principal,
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ServerError::CouldNotSerializeAccessToken(e.to_string()))
    }

    pub fn verifier(&self) -> TokenVerifier {
        TokenVerifier { decoding_key: self.decoding_key.clone(), validation: self.validation.clone() }
    }
}

#[cfg(test)]
mod test {
    use shelf_engine::db_types::UserId;

    use super::*;

    fn principal() -> Principal {
        Principal { id: UserId(7), username: "anauser".to_string(), name: Some("Ana User".to_string()), admin: false }
    }

    #[test]
    fn issued_tokens_verify_and_round_trip_the_principal() {
        let config = AuthConfig::default();
        let issuer = TokenIssuer::new(&config);
        let token = issuer.issue_token(principal(), None).unwrap();
        let claims = issuer.verifier().decode_token(&token).unwrap();
        assert_eq!(claims.sub, "anauser");
        assert_eq!(claims.user, principal());
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn tokens_from_another_secret_are_rejected() {
        let token = TokenIssuer::new(&AuthConfig::default()).issue_token(principal(), None).unwrap();
        let other = TokenIssuer::new(&AuthConfig::default());
        assert!(other.verifier().decode_token(&token).is_err());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let config = AuthConfig::default();
        let issuer = TokenIssuer::new(&config);
        let token = issuer.issue_token(principal(), Some(Duration::seconds(-120))).unwrap();
        let err = issuer.verifier().decode_token(&token).unwrap_err();
        assert!(matches!(err, AuthError::ExpiredToken));
    }

    #[test]
    fn garbage_is_not_a_token() {
        let issuer = TokenIssuer::new(&AuthConfig::default());
        assert!(issuer.verifier().decode_token("made up nonsense").is_err());
    }

    #[test]
    fn serialized_claims_have_no_password_key() {
        let config = AuthConfig::default();
        let issuer = TokenIssuer::new(&config);
        let token = issuer.issue_token(principal(), None).unwrap();
        let claims = issuer.verifier().decode_token(&token).unwrap();
        let json = serde_json::to_value(&claims).unwrap();
        let user = json["user"].as_object().unwrap();
        assert!(user.get("password").is_none());
        assert!(user.get("passwordHash").is_none());
    }
}
