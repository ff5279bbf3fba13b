//! Token issuance: mint or rotate the access/refresh pair for a session.

use anyhow::Context;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::error::AuthError;
use crate::state::AuthState;
use crate::storage::SessionRecord;
use crate::token::TokenPayload;

/// Inputs for minting or rotating a session's token pair.
#[derive(Debug)]
pub struct IssueRequest<'a> {
    pub user_id: &'a str,
    /// Client address at issuance.
    pub ip: &'a str,
    /// Opaque cross-check claim embedded in both tokens.
    pub token: &'a str,
    /// Reuse an existing session id; `None` mints a new one.
    pub session_id: Option<&'a str>,
    /// Access lifetime override in minutes; `None` uses the configured
    /// default.
    pub age_minutes: Option<i64>,
}

/// Mint or rotate the token pair and write the session record.
///
/// Exactly one store write. On failure the previous record, if any, is left
/// untouched and every cause surfaces as [`AuthError::TokenIssuance`].
pub async fn issue_tokens(
    state: &AuthState,
    request: IssueRequest<'_>,
) -> Result<String, AuthError> {
    let config = state.config();
    let age = request.age_minutes.unwrap_or_else(|| config.access_ttl_minutes());
    let session_id = request
        .session_id
        .map_or_else(new_session_id, str::to_string);
    let now_ms = state.now_ms();
    let now_secs = now_ms / 1000;

    let access = TokenPayload {
        ip: request.ip.to_string(),
        user_id: request.user_id.to_string(),
        token: request.token.to_string(),
        uid: session_id.clone(),
        age,
        exp: Some(now_secs + age * 60),
    };
    let refresh = TokenPayload {
        age: config.refresh_ttl_minutes(),
        exp: Some(now_secs + config.refresh_ttl_minutes() * 60),
        ..access.clone()
    };

    let access_token = state
        .codec()
        .encode(&access)
        .map_err(|err| AuthError::TokenIssuance(err.into()))?;
    let refresh_token = state
        .codec()
        .encode(&refresh)
        .map_err(|err| AuthError::TokenIssuance(err.into()))?;

    let record = SessionRecord {
        access_token,
        refresh_token,
        last_active: now_ms,
    };
    // The record must outlive both tokens plus clock skew.
    let ttl_minutes = config.refresh_ttl_minutes() + age + config.leeway_minutes();
    let ttl = Duration::from_secs(u64::try_from(ttl_minutes).unwrap_or(0) * 60);
    state
        .store()
        .write(&session_id, &record, ttl)
        .await
        .context("failed to write session record")
        .map_err(AuthError::TokenIssuance)?;

    debug!(%session_id, user_id = %request.user_id, "session tokens issued");
    Ok(session_id)
}

fn new_session_id() -> String {
    Uuid::new_v4().simple().to_string()
}
