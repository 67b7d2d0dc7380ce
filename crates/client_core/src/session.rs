use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::Deserialize;
use shared::domain::Role;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

/// Errors raised while reading the role claim out of a stored token.
/// Every variant is treated as "not authenticated" by route admission;
/// none of them are fatal to the application.
#[derive(Debug, Error)]
pub enum TokenDecodeError {
    #[error("token is not a three-segment JWT")]
    Malformed,
    #[error("token payload is not valid base64url/JSON")]
    InvalidPayload,
    #[error("token payload carries no role claim")]
    MissingRoleClaim,
    #[error("token payload carries an unknown role '{0}'")]
    UnknownRole(String),
}

#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    role: Option<String>,
}

/// Reads the role claim from the payload segment of a bearer token.
///
/// The signature is NOT verified here: the token is opaque to this client
/// and the server re-checks authorization on every privileged endpoint.
/// Route admission based on this claim is a routing convenience, not a
/// security boundary.
pub fn role_from_token(token: &str) -> Result<Role, TokenDecodeError> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(TokenDecodeError::Malformed);
    };

    let decoded = URL_SAFE_NO_PAD
        .decode(payload.as_bytes())
        .map_err(|_| TokenDecodeError::InvalidPayload)?;
    let claims: Claims =
        serde_json::from_slice(&decoded).map_err(|_| TokenDecodeError::InvalidPayload)?;

    let role = claims.role.ok_or(TokenDecodeError::MissingRoleClaim)?;
    role.parse::<Role>()
        .map_err(|err| TokenDecodeError::UnknownRole(err.0))
}

/// The single current session: one bearer-token slot, set at login and
/// cleared at logout, read by every outgoing gateway call. Passed around
/// as an `Arc` so tests can substitute a session without any process-wide
/// mutable state.
#[derive(Debug, Default)]
pub struct Session {
    token: RwLock<Option<String>>,
}

impl Session {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn set_token(&self, token: impl Into<String>) {
        *self.token.write().await = Some(token.into());
    }

    /// Logout: drops the stored credential. The caller routes back to the
    /// public entry screen.
    pub async fn clear(&self) {
        *self.token.write().await = None;
    }

    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }

    /// Role carried by the stored token, or `None` when there is no token
    /// or it does not decode.
    pub async fn role(&self) -> Option<Role> {
        let token = self.token().await?;
        match role_from_token(&token) {
            Ok(role) => Some(role),
            Err(err) => {
                debug!(error = %err, "session: token does not resolve to a role");
                None
            }
        }
    }

    /// Route admission: allow iff the stored token decodes to one of the
    /// required roles. Absent or malformed tokens deny every route.
    pub async fn admit(&self, allowed: &[Role]) -> bool {
        match self.role().await {
            Some(role) => allowed.contains(&role),
            None => false,
        }
    }
}
