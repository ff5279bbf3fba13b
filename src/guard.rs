//! Per-request session guard: admit, silently refresh, or reject.
//!
//! The guard runs once per inbound request and is safe under unbounded
//! concurrency for the same session id; rotation races are tolerated and
//! resolved by the store's last-writer-wins semantics. Every internal
//! failure is logged and collapsed into the opaque
//! [`AuthError::Unauthorized`].

use anyhow::Context;
use axum::http::{
    HeaderMap, HeaderValue,
    header::{COOKIE, InvalidHeaderValue, SET_COOKIE},
};
use tracing::{debug, error, warn};

use crate::error::{AuthError, TokenError};
use crate::issuer::{IssueRequest, issue_tokens};
use crate::state::{AuthConfig, AuthState};
use crate::token::TokenPayload;

/// Successful per-request authentication.
#[derive(Clone, Debug)]
pub struct Authenticated {
    /// Identity decoded from the access token.
    pub user_id: String,
    /// Session id the cookie carries; stable across rotations.
    pub session_id: String,
    /// Refreshed session cookie for the outgoing response.
    pub cookie: HeaderValue,
}

impl Authenticated {
    /// Apply the refreshed cookie to the outgoing response headers.
    pub fn apply_cookie(&self, headers: &mut HeaderMap) {
        headers.insert(SET_COOKIE, self.cookie.clone());
    }
}

/// Closed set of dispositions for a presented session id.
#[derive(Debug)]
enum SessionDisposition {
    /// Access token valid; `last_active` refreshed in place.
    Active { user_id: String },
    /// Access expired, refresh valid, idle window not exceeded; a new pair
    /// was issued under the same session id.
    Refreshed { user_id: String },
    /// No live record for the presented id.
    Unauthenticated,
    /// Idle longer than the lockout window; not silently resurrectable.
    LockedOut,
    /// Tokens failed validation.
    Invalid,
}

/// Decide whether to admit the request, given its headers and client
/// address.
///
/// On admission the returned [`Authenticated`] carries the identity and the
/// cookie mutation to apply to the response; the cookie value never changes
/// across a rotation.
pub async fn authenticate(
    state: &AuthState,
    headers: &HeaderMap,
    client_ip: &str,
) -> Result<Authenticated, AuthError> {
    let Some(session_id) = extract_session_id(headers, state.config().cookie_name()) else {
        debug!("request rejected: no session id presented");
        return Err(AuthError::Unauthorized);
    };

    let disposition = match evaluate_session(state, &session_id, client_ip).await {
        Ok(disposition) => disposition,
        Err(err) => {
            // Fail closed; the detailed cause stays in the logs.
            error!("session evaluation failed: {err:#}");
            return Err(AuthError::Unauthorized);
        }
    };

    let user_id = match disposition {
        SessionDisposition::Active { user_id } | SessionDisposition::Refreshed { user_id } => {
            user_id
        }
        rejection => {
            debug!(disposition = ?rejection, "request rejected");
            return Err(AuthError::Unauthorized);
        }
    };

    let cookie = session_cookie(state.config(), &session_id).map_err(|err| {
        error!("failed to build session cookie: {err}");
        AuthError::Unauthorized
    })?;

    Ok(Authenticated {
        user_id,
        session_id,
        cookie,
    })
}

async fn evaluate_session(
    state: &AuthState,
    session_id: &str,
    client_ip: &str,
) -> anyhow::Result<SessionDisposition> {
    let Some(record) = state
        .store()
        .read(session_id)
        .await
        .context("failed to load session record")?
    else {
        return Ok(SessionDisposition::Unauthenticated);
    };
    let now_ms = state.now_ms();

    match state.codec().validate(&record.access_token, now_ms) {
        Ok(payload) => {
            // The refresh token only has to be present and decodable here;
            // its signature is deliberately not re-checked on the active
            // path.
            if record.refresh_token.is_empty()
                || !state.codec().is_well_formed(&record.refresh_token)
            {
                warn!(%session_id, "access token valid but refresh token unusable");
                return Ok(SessionDisposition::Invalid);
            }
            state
                .store()
                .touch(session_id, now_ms)
                .await
                .context("failed to refresh session activity")?;
            Ok(SessionDisposition::Active {
                user_id: payload.user_id,
            })
        }
        Err(TokenError::Expired) => {
            let idle_ms = now_ms.saturating_sub(record.last_active);
            if idle_ms > state.config().lockout_minutes() * 60_000 {
                // A stale session past the inactivity window is not
                // resurrectable, refresh token or not.
                debug!(%session_id, idle_ms, "session idle past the lockout window");
                return Ok(SessionDisposition::LockedOut);
            }
            if let Err(err) = state.codec().validate(&record.refresh_token, now_ms) {
                debug!(%session_id, error = %err, "refresh token failed validation");
                return Ok(SessionDisposition::Invalid);
            }
            // Rotate: new pair, same session id. The expired access token
            // still carries the identity and the per-session age override.
            let payload: TokenPayload = state
                .codec()
                .decode(&record.access_token)
                .context("failed to decode expired access token")?;
            issue_tokens(
                state,
                IssueRequest {
                    user_id: &payload.user_id,
                    ip: client_ip,
                    token: &payload.token,
                    session_id: Some(session_id),
                    age_minutes: Some(payload.age),
                },
            )
            .await
            .context("failed to rotate session tokens")?;
            debug!(%session_id, "session tokens rotated");
            Ok(SessionDisposition::Refreshed {
                user_id: payload.user_id,
            })
        }
        Err(err) => {
            debug!(%session_id, error = %err, "access token failed validation");
            Ok(SessionDisposition::Invalid)
        }
    }
}

/// Build the `HttpOnly` session cookie; the value is the session id and the
/// lifetime tracks the lockout window.
pub fn session_cookie(
    config: &AuthConfig,
    session_id: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let name = config.cookie_name();
    let max_age = config.lockout_minutes() * 60;
    let mut cookie =
        format!("{name}={session_id}; Path=/; HttpOnly; SameSite=Strict; Max-Age={max_age}");
    if config.secure_cookies() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Pull the session id out of the request: the cookie first, then a header
/// of the same name.
fn extract_session_id(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    if let Some(value) = cookie_value(headers, cookie_name) {
        return Some(value);
    }
    headers
        .get(cookie_name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn cookie_value(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let Some((key, val)) = pair.trim().split_once('=') else {
            continue;
        };
        if key.trim() == cookie_name && !val.trim().is_empty() {
            return Some(val.trim().to_string());
        }
    }
    None
}
