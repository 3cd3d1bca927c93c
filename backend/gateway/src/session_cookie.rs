//! Signed session cookie.
//!
//! The cookie carries `<session id>.<hex HMAC-SHA256(session id)>`. A missing
//! or tampered cookie starts a fresh session; the new cookie is set on the
//! response by returning the extractor as a response part.

use std::convert::Infallible;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{
        header::{COOKIE, SET_COOKIE},
        request::Parts,
        HeaderValue,
    },
    response::{IntoResponseParts, ResponseParts},
};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use tracing::{debug, warn};

use chatrelay_core::SessionId;

pub const SESSION_COOKIE: &str = "chatrelay_session";

type HmacSha256 = Hmac<Sha256>;

/// Signs and verifies session ids.
#[derive(Clone)]
pub struct SessionSigner {
    mac: HmacSha256,
}

impl SessionSigner {
    pub fn new(secret: &[u8]) -> Result<Self> {
        let mac = HmacSha256::new_from_slice(secret).context("invalid session signing key")?;
        Ok(Self { mac })
    }

    /// A key that lives only as long as this process.
    pub fn random() -> Result<Self> {
        let mut key = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut key);
        Self::new(&key)
    }

    /// Use `secret` when given, otherwise a random per-process key.
    pub fn from_secret(secret: Option<&str>) -> Result<Self> {
        match secret {
            Some(secret) => Self::new(secret.as_bytes()),
            None => {
                warn!("SECRET_KEY not set; using a random key, sessions will not survive a restart");
                Self::random()
            }
        }
    }

    pub fn sign(&self, session: &SessionId) -> String {
        let mut mac = self.mac.clone();
        mac.update(session.as_str().as_bytes());
        format!("{}.{}", session, hex::encode(mac.finalize().into_bytes()))
    }

    /// The session id in `value` if its signature checks out.
    pub fn verify(&self, value: &str) -> Option<SessionId> {
        let (id, signature) = value.rsplit_once('.')?;
        if id.is_empty() {
            return None;
        }
        let signature = hex::decode(signature).ok()?;
        let mut mac = self.mac.clone();
        mac.update(id.as_bytes());
        mac.verify_slice(&signature).ok()?;
        Some(SessionId::new(id))
    }
}

/// Value of cookie `name` in a `Cookie` header.
fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
}

/// The caller's session, created on first contact.
#[derive(Debug)]
pub struct SessionCookie {
    pub id: SessionId,
    set_cookie: Option<HeaderValue>,
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionCookie
where
    Arc<SessionSigner>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let signer = Arc::<SessionSigner>::from_ref(state);

        let existing = parts
            .headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|header| cookie_value(header, SESSION_COOKIE))
            .find_map(|value| signer.verify(value));

        if let Some(id) = existing {
            return Ok(Self {
                id,
                set_cookie: None,
            });
        }

        let id = SessionId::generate();
        debug!(session = %id, "Starting new session");
        let cookie = format!(
            "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax",
            signer.sign(&id)
        );
        Ok(Self {
            id,
            set_cookie: HeaderValue::from_str(&cookie).ok(),
        })
    }
}

impl IntoResponseParts for SessionCookie {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        if let Some(cookie) = self.set_cookie {
            res.headers_mut().append(SET_COOKIE, cookie);
        }
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_id_verifies() {
        let signer = SessionSigner::new(b"secret").unwrap();
        let id = SessionId::generate();
        assert_eq!(signer.verify(&signer.sign(&id)), Some(id));
    }

    #[test]
    fn tampered_or_foreign_cookies_are_rejected() {
        let signer = SessionSigner::new(b"secret").unwrap();
        let other = SessionSigner::new(b"other").unwrap();
        let signed = signer.sign(&SessionId::new("abc"));

        assert!(other.verify(&signed).is_none());
        assert!(signer.verify(&signed.replacen("abc", "abd", 1)).is_none());
        assert!(signer.verify("abc").is_none());
        assert!(signer.verify("abc.zz").is_none());
        assert!(signer.verify(".deadbeef").is_none());
    }

    #[test]
    fn random_keys_differ() {
        let a = SessionSigner::random().unwrap();
        let b = SessionSigner::random().unwrap();
        let id = SessionId::new("abc");
        assert!(b.verify(&a.sign(&id)).is_none());
    }

    #[test]
    fn finds_cookie_among_others() {
        let header = "theme=dark; chatrelay_session=abc.123 ; other=1";
        assert_eq!(cookie_value(header, SESSION_COOKIE), Some("abc.123"));
        assert_eq!(cookie_value("theme=dark", SESSION_COOKIE), None);
    }
}
