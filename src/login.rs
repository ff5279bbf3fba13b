//! Login and logout orchestration.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::AuthError;
use crate::issuer::{IssueRequest, issue_tokens};
use crate::password::verify_password;
use crate::state::AuthState;

/// Claim set embedded in both session tokens as the opaque cross-check
/// `token` claim.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentityClaims {
    pub user_id: String,
    pub email: String,
}

/// Verify credentials and open a session, returning the session id the
/// caller surfaces as the cookie value.
///
/// Unknown usernames and wrong passwords are indistinguishable to the
/// caller. A user whose `token_id` back-pointer still resolves to a live
/// record re-enters that session instead of minting a new one.
#[instrument(skip(state, password))]
pub async fn login(
    state: &AuthState,
    username: &str,
    password: &str,
    client_ip: &str,
) -> Result<String, AuthError> {
    let Some(user) = state.directory().find_by_username(username).await? else {
        debug!("login rejected: unknown username");
        return Err(AuthError::InvalidCredentials);
    };
    if !verify_password(password, &user.password_hash) {
        debug!("login rejected: password mismatch");
        return Err(AuthError::InvalidCredentials);
    }

    // The store, not the back-pointer, decides whether the old session is
    // still live.
    let existing_session_id = match user.token_id.as_deref() {
        Some(token_id) if !token_id.is_empty() => {
            state.store().read(token_id).await?.map(|_| token_id)
        }
        _ => None,
    };

    let cross_check = state
        .codec()
        .encode(&IdentityClaims {
            user_id: user.user_id.clone(),
            email: user.email.clone(),
        })
        .map_err(|err| AuthError::TokenIssuance(err.into()))?;

    let session_id = issue_tokens(
        state,
        IssueRequest {
            user_id: &user.user_id,
            ip: client_ip,
            token: &cross_check,
            session_id: existing_session_id,
            age_minutes: None,
        },
    )
    .await?;

    state
        .directory()
        .update_token_id(&user.user_id, &session_id)
        .await?;

    debug!(user_id = %user.user_id, reused = existing_session_id.is_some(), "login succeeded");
    Ok(session_id)
}

/// Delete the user's live session, if any.
///
/// A missing back-pointer or an already-evicted record is a no-op success;
/// calling logout twice is fine.
#[instrument(skip(state))]
pub async fn logout(state: &AuthState, user_id: &str) -> Result<(), AuthError> {
    let Some(token_id) = state.directory().find_token_id(user_id).await? else {
        return Ok(());
    };
    if token_id.is_empty() {
        return Ok(());
    }
    state.store().delete(&token_id).await?;
    debug!(session_id = %token_id, "session deleted on logout");
    Ok(())
}
